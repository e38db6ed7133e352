//! Entry point: look tables up by name and hand out [`Table`] handles.

use std::sync::Arc;

use sqlreflect_sql::{Params, SelectStmt};

use crate::catalog::{self, eq_param, text};
use crate::record::{FromRecord, Record};
use crate::{DecodeError, Error, Queryer, Result, Table, TableIdent};

/// Where [`Reflector::table`] looks when only a name is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectOptions {
    /// `None` matches whatever catalog the server reports. Postgres only
    /// exposes the current database, so this is rarely worth setting.
    pub catalog: Option<String>,
    pub schema: String,
}

impl Default for ReflectOptions {
    fn default() -> Self {
        Self {
            catalog: None,
            schema: "public".to_owned(),
        }
    }
}

impl ReflectOptions {
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }
}

/// Hands out [`Table`]s backed by one shared queryer.
#[derive(Clone)]
pub struct Reflector {
    queryer: Arc<dyn Queryer>,
    options: ReflectOptions,
}

impl std::fmt::Debug for Reflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reflector {
    pub fn new(queryer: impl Queryer + 'static, options: ReflectOptions) -> Self {
        Self::from_arc(Arc::new(queryer), options)
    }

    pub fn from_arc(queryer: Arc<dyn Queryer>, options: ReflectOptions) -> Self {
        Self { queryer, options }
    }

    pub fn options(&self) -> &ReflectOptions {
        &self.options
    }

    pub fn queryer(&self) -> &Arc<dyn Queryer> {
        &self.queryer
    }

    /// Look up `name` in the default schema (and catalog, if set).
    pub async fn table(&self, name: &str) -> Result<Table> {
        let database = self.options.catalog.as_deref();
        self.lookup(database, &self.options.schema, name).await
    }

    /// Look up a table by its full identity.
    pub async fn table_in(&self, name: &str, catalog: &str, schema: &str) -> Result<Table> {
        self.lookup(Some(catalog), schema, name).await
    }

    /// Build a [`Table`] without asking the catalog whether it exists.
    /// Operations on a missing table return empty listings.
    pub fn table_unchecked(&self, ident: TableIdent) -> Table {
        Table::new(self.queryer.clone(), ident)
    }

    async fn lookup(&self, database: Option<&str>, schema: &str, name: &str) -> Result<Table> {
        let requested = TableIdent::new(database.unwrap_or_default(), schema, name);

        let mut stmt = SelectStmt::new()
            .columns(
                ["table_catalog", "table_schema", "table_name", "table_type"]
                    .into_iter()
                    .map(|c| text("t", c)),
            )
            .from(catalog::view("tables", "t"))
            .and_where(eq_param("t", "table_schema", "schema"))
            .and_where(eq_param("t", "table_name", "table"));
        let mut params = Params::new().set("schema", schema).set("table", name);
        if let Some(database) = database {
            stmt = stmt.and_where(eq_param("t", "table_catalog", "catalog"));
            params = params.set("catalog", database);
        }

        let found: Vec<FoundTable> =
            catalog::fetch(self.queryer.as_ref(), &requested, "table", &stmt, &params).await?;
        let Some(found) = found.into_iter().next() else {
            return Err(Error::NotFound {
                table: requested,
                what: "table",
                name: name.to_owned(),
            });
        };

        tracing::debug!(table = %found.ident, kind = %found.table_type, "reflecting table");
        Ok(Table::new(self.queryer.clone(), found.ident))
    }
}

struct FoundTable {
    ident: TableIdent,
    /// `BASE TABLE`, `VIEW`, `FOREIGN` or `LOCAL TEMPORARY`.
    table_type: String,
}

impl FromRecord for FoundTable {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        Ok(FoundTable {
            ident: TableIdent::from_record(r, "table")?,
            table_type: r.string("table_type")?,
        })
    }
}
