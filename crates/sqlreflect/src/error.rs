use thiserror::Error;

use crate::TableIdent;
use crate::queryer::BoxError;

#[derive(Debug, Error)]
pub enum Error {
    /// The catalog query failed to execute.
    #[error("{operation} on {table}: query failed: {source}")]
    Query {
        table: TableIdent,
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// A catalog row could not be mapped to the expected entity.
    #[error("{operation} on {table}: {source}")]
    Decode {
        table: TableIdent,
        operation: &'static str,
        #[source]
        source: DecodeError,
    },

    /// A lookup by name matched nothing.
    #[error("{what} {name:?} not found on {table}")]
    NotFound {
        table: TableIdent,
        what: &'static str,
        name: String,
    },

    #[error("{table} has {count} primary key constraints, expected at most one")]
    AmbiguousPrimaryKey { table: TableIdent, count: usize },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// The table the failing operation was reflecting.
    pub fn table(&self) -> &TableIdent {
        match self {
            Error::Query { table, .. }
            | Error::Decode { table, .. }
            | Error::NotFound { table, .. }
            | Error::AmbiguousPrimaryKey { table, .. } => table,
        }
    }
}

/// Mapping a catalog record to an entity failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing column {column:?}")]
    MissingColumn { column: String },

    #[error("column {column:?}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("column {column:?} is NULL")]
    UnexpectedNull { column: String },

    #[error("column {column:?}: expected YES or NO, got {value:?}")]
    InvalidYesOrNo { column: String, value: String },

    #[error("unknown constraint type {0:?}")]
    UnknownConstraintKind(String),

    #[error("column {column:?} is empty")]
    Empty { column: String },

    #[error("column {column:?}: unknown catalog code {value:?}")]
    UnknownCode { column: String, value: String },

    #[error("foreign key {constraint:?} has no resolvable target")]
    UnresolvedForeignKey { constraint: String },

    #[error("foreign key {constraint:?}: {reason}")]
    InconsistentForeignKey {
        constraint: String,
        reason: &'static str,
    },
}
