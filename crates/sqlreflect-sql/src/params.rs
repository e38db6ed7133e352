//! Named parameter values.

use indexmap::IndexMap;

use crate::{ParamName, Value};

/// Values for the named parameters of a statement.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: IndexMap<ParamName, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value under the same name.
    pub fn set(mut self, name: impl Into<ParamName>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Binding rendered SQL to parameter values failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("no value bound for parameter ${name}")]
    Missing { name: ParamName },
}
