//! SELECT AST, rendering, and parameter binding.
//!
//! Catalog queries are built as a typed AST, rendered to a string with
//! automatic `$n` parameter numbering, then bound to concrete values.
//! Identifiers are always quoted, and values only ever travel as bound
//! parameters, so nothing the caller passes in is spliced into SQL text.
//!
//! ```
//! use sqlreflect_sql::*;
//!
//! let stmt = SelectStmt::new()
//!     .columns([SelectColumn::aliased(
//!         Expr::qualified_column("c".into(), "column_name".into()).cast("text"),
//!         "column_name".into(),
//!     )])
//!     .from(TableRef::qualified("information_schema".into(), "columns".into()).alias("c".into()))
//!     .and_where(Expr::qualified_column("c".into(), "table_name".into()).eq(Expr::param("table".into())));
//!
//! let bound = render(&stmt)
//!     .bind(&Params::new().set("table", "person"))
//!     .unwrap();
//! assert_eq!(bound.args, vec![Value::from("person")]);
//! ```

use aliri_braid::braid;

mod expr;
pub use expr::*;

mod params;
pub use params::*;

mod render;
pub use render::*;

mod stmt;
pub use stmt::*;

mod value;
pub use value::*;

/// The name of a schema, table, view, or alias.
#[braid]
pub struct TableName;

/// The name of a column, or a column alias.
#[braid]
pub struct ColumnName;

/// The name of a query parameter.
#[braid]
pub struct ParamName;

/// Result of rendering SQL.
#[derive(Debug, Clone)]
pub struct RenderedSql {
    /// The SQL string with $1, $2, etc. placeholders.
    pub sql: String,

    /// Parameter names in order (maps to $1, $2, etc.).
    pub params: Vec<ParamName>,
}

impl RenderedSql {
    /// Resolve every named parameter against `params`, in placeholder order.
    pub fn bind(&self, params: &Params) -> Result<BoundSql, BindError> {
        let args = self
            .params
            .iter()
            .map(|name| {
                params
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| BindError::Missing { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoundSql {
            sql: self.sql.clone(),
            args,
        })
    }
}

/// SQL text plus the positional arguments for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    /// `args[0]` binds `$1`, and so on.
    pub args: Vec<Value>,
}

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use sqlreflect_sql::Lit;
/// assert_eq!(format!("{}", Lit("f")), "'f'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes, so
/// reserved words like `user` or `order` are safe.
///
/// # Example
/// ```
/// use sqlreflect_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}
