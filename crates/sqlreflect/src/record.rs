//! Catalog rows and their mapping to entities.

use sqlreflect_sql::Value;

use crate::{DecodeError, Tristate};

/// One catalog row, as field name → value pairs in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style. An existing field of the same name is
    /// overwritten in place.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Result<&Value, DecodeError> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .ok_or_else(|| DecodeError::MissingColumn {
                column: column.to_owned(),
            })
    }

    /// A text column that must not be NULL.
    pub fn string(&self, column: &str) -> Result<String, DecodeError> {
        self.opt_string(column)?
            .ok_or_else(|| DecodeError::UnexpectedNull {
                column: column.to_owned(),
            })
    }

    pub fn opt_string(&self, column: &str) -> Result<Option<String>, DecodeError> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(mismatch(column, "text", other)),
        }
    }

    /// An integer column that must not be NULL.
    pub fn i32(&self, column: &str) -> Result<i32, DecodeError> {
        self.opt_i32(column)?
            .ok_or_else(|| DecodeError::UnexpectedNull {
                column: column.to_owned(),
            })
    }

    pub fn opt_i32(&self, column: &str) -> Result<Option<i32>, DecodeError> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::I16(v) => Ok(Some(i32::from(*v))),
            Value::I32(v) => Ok(Some(*v)),
            Value::I64(v) => i32::try_from(*v)
                .map(Some)
                .map_err(|_| mismatch(column, "integer", &Value::I64(*v))),
            other => Err(mismatch(column, "integer", other)),
        }
    }

    /// A `yes_or_no` column. NULL decodes to [`Tristate::Unknown`].
    pub fn tristate(&self, column: &str) -> Result<Tristate, DecodeError> {
        match self.get(column)? {
            Value::Null => Ok(Tristate::Unknown),
            Value::String(s) => Tristate::from_yes_or_no(column, Some(s.as_str())),
            Value::Bool(b) => Ok(Tristate::from(*b)),
            other => Err(mismatch(column, "yes_or_no", other)),
        }
    }
}

fn mismatch(column: &str, expected: &'static str, actual: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        column: column.to_owned(),
        expected,
        actual: actual.type_name(),
    }
}

/// Types that can be built from a single catalog record.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, DecodeError>;
}

/// Decode every record, stopping at the first failure.
pub fn decode_all<T: FromRecord>(records: &[Record]) -> Result<Vec<T>, DecodeError> {
    records.iter().map(T::from_record).collect()
}
