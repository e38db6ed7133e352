//! The table orchestrator.

use std::fmt;
use std::sync::Arc;

use crate::record::Record;
use crate::{
    Column, Constraint, ConstraintKind, DecodeError, Error, KeyColumn, Privilege, Queryer, Result,
    ViewDependency, column, constraint, privilege, view,
};

/// Identity of a table (or view) in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableIdent {
    pub catalog: String,
    pub schema: String,
    pub name: String,
}

impl TableIdent {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Read `{prefix}_catalog`, `{prefix}_schema` and `{prefix}_name`.
    pub(crate) fn from_record(record: &Record, prefix: &str) -> Result<Self, DecodeError> {
        Ok(Self {
            catalog: record.string(&format!("{prefix}_catalog"))?,
            schema: record.string(&format!("{prefix}_schema"))?,
            name: record.string(&format!("{prefix}_name"))?,
        })
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.catalog.is_empty() {
            write!(f, "{}.", self.catalog)?;
        }
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A table in the catalog.
///
/// Holds only its identity and the queryer; everything else is fetched on
/// demand, and fetched again on every call. Cloning is cheap and a `Table`
/// can be shared across tasks.
///
/// ```ignore
/// let person = reflector.table("person").await?;
/// for column in person.columns().await? {
///     println!("{} {}", column.name, column.data_type);
/// }
/// let pk = person.primary_key().await?;
/// ```
#[derive(Clone)]
pub struct Table {
    ident: TableIdent,
    queryer: Arc<dyn Queryer>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("ident", &self.ident)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Build a table handle without checking that it exists.
    pub fn new(queryer: Arc<dyn Queryer>, ident: TableIdent) -> Self {
        Self { ident, queryer }
    }

    pub fn ident(&self) -> &TableIdent {
        &self.ident
    }

    pub fn catalog(&self) -> &str {
        &self.ident.catalog
    }

    pub fn schema(&self) -> &str {
        &self.ident.schema
    }

    pub fn name(&self) -> &str {
        &self.ident.name
    }

    /// All columns, by ascending ordinal position.
    pub async fn columns(&self) -> Result<Vec<Column>> {
        column::columns(self.queryer.as_ref(), &self.ident).await
    }

    /// The column called exactly `name`.
    pub async fn column(&self, name: &str) -> Result<Column> {
        column::column(self.queryer.as_ref(), &self.ident, name).await
    }

    /// All constraints, with foreign keys resolved.
    pub async fn constraints(&self) -> Result<Vec<Constraint>> {
        constraint::constraints(self.queryer.as_ref(), &self.ident).await
    }

    /// Constraints of one kind. Empty when there are none.
    pub async fn constraints_by_type(&self, kind: ConstraintKind) -> Result<Vec<Constraint>> {
        constraint::constraints_by_type(self.queryer.as_ref(), &self.ident, kind).await
    }

    /// The constraint called exactly `name`.
    pub async fn constraint(&self, name: &str) -> Result<Constraint> {
        constraint::constraint(self.queryer.as_ref(), &self.ident, name).await
    }

    /// The primary key.
    ///
    /// Fails with [`Error::NotFound`] when the table has none, and with
    /// [`Error::AmbiguousPrimaryKey`] when the catalog reports several.
    pub async fn primary_key(&self) -> Result<Constraint> {
        let mut keys = self.constraints_by_type(ConstraintKind::PrimaryKey).await?;
        match keys.len() {
            0 => Err(Error::NotFound {
                table: self.ident.clone(),
                what: "primary key",
                name: self.ident.name.clone(),
            }),
            1 => Ok(keys.remove(0)),
            count => Err(Error::AmbiguousPrimaryKey {
                table: self.ident.clone(),
                count,
            }),
        }
    }

    /// Foreign keys, each with its referenced table and columns.
    pub async fn foreign_keys(&self) -> Result<Vec<Constraint>> {
        self.constraints_by_type(ConstraintKind::ForeignKey).await
    }

    /// The key columns of one constraint, by ordinal position.
    pub async fn key_columns(&self, constraint_name: &str) -> Result<Vec<KeyColumn>> {
        constraint::key_columns(self.queryer.as_ref(), &self.ident, constraint_name).await
    }

    /// Privileges granted on this table.
    pub async fn privileges(&self) -> Result<Vec<Privilege>> {
        privilege::privileges(self.queryer.as_ref(), &self.ident).await
    }

    /// Views whose definitions use this table.
    pub async fn in_views(&self) -> Result<Vec<ViewDependency>> {
        view::in_views(self.queryer.as_ref(), &self.ident).await
    }
}

#[cfg(test)]
mod tests;
