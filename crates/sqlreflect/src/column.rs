//! Columns, from `information_schema.columns`.

use sqlreflect_sql::{OrderBy, SelectStmt};

use crate::catalog::{self, col, eq_param, int, text};
use crate::record::{FromRecord, Record};
use crate::{DecodeError, Error, Queryer, Result, TableIdent, Tristate};

/// One column of a table, as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub table: TableIdent,
    pub name: String,
    /// 1-based position within the table.
    pub ordinal_position: i32,
    pub column_default: Option<String>,
    pub is_nullable: Tristate,
    /// SQL standard type name, e.g. `integer` or `character varying`.
    pub data_type: String,
    /// Underlying Postgres type name, e.g. `int4` or `varchar`.
    pub udt_name: Option<String>,
    pub character_maximum_length: Option<i32>,
    pub character_octet_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_precision_radix: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub datetime_precision: Option<i32>,
    pub is_identity: Tristate,
    pub identity_generation: Option<String>,
    /// `ALWAYS` for generated columns, `NEVER` otherwise.
    pub is_generated: Option<String>,
    pub generation_expression: Option<String>,
    pub is_updatable: Tristate,
}

impl FromRecord for Column {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        Ok(Column {
            table: TableIdent::from_record(r, "table")?,
            name: r.string("column_name")?,
            ordinal_position: r.i32("ordinal_position")?,
            column_default: r.opt_string("column_default")?,
            is_nullable: r.tristate("is_nullable")?,
            data_type: r.string("data_type")?,
            udt_name: r.opt_string("udt_name")?,
            character_maximum_length: r.opt_i32("character_maximum_length")?,
            character_octet_length: r.opt_i32("character_octet_length")?,
            numeric_precision: r.opt_i32("numeric_precision")?,
            numeric_precision_radix: r.opt_i32("numeric_precision_radix")?,
            numeric_scale: r.opt_i32("numeric_scale")?,
            datetime_precision: r.opt_i32("datetime_precision")?,
            is_identity: r.tristate("is_identity")?,
            identity_generation: r.opt_string("identity_generation")?,
            is_generated: r.opt_string("is_generated")?,
            generation_expression: r.opt_string("generation_expression")?,
            is_updatable: r.tristate("is_updatable")?,
        })
    }
}

const TEXT_COLUMNS: &[&str] = &[
    "table_catalog",
    "table_schema",
    "table_name",
    "column_name",
    "column_default",
    "is_nullable",
    "data_type",
    "udt_name",
    "is_identity",
    "identity_generation",
    "is_generated",
    "generation_expression",
    "is_updatable",
];

const INT_COLUMNS: &[&str] = &[
    "ordinal_position",
    "character_maximum_length",
    "character_octet_length",
    "numeric_precision",
    "numeric_precision_radix",
    "numeric_scale",
    "datetime_precision",
];

fn select() -> SelectStmt {
    let stmt = SelectStmt::new()
        .columns(TEXT_COLUMNS.iter().map(|c| text("c", c)))
        .columns(INT_COLUMNS.iter().map(|c| int("c", c)))
        .from(catalog::view("columns", "c"))
        .order_by(OrderBy::asc(col("c", "ordinal_position")));
    catalog::scoped(stmt, "c")
}

/// Every column of `table`, by ascending ordinal position.
pub async fn columns(queryer: &dyn Queryer, table: &TableIdent) -> Result<Vec<Column>> {
    catalog::fetch(
        queryer,
        table,
        "columns",
        &select(),
        &catalog::scope_params(table),
    )
    .await
}

/// The column of `table` called exactly `name`.
pub async fn column(queryer: &dyn Queryer, table: &TableIdent, name: &str) -> Result<Column> {
    let stmt = select().and_where(eq_param("c", "column_name", "column"));
    let params = catalog::scope_params(table).set("column", name);
    let mut found: Vec<Column> = catalog::fetch(queryer, table, "column", &stmt, &params).await?;
    if found.is_empty() {
        return Err(Error::NotFound {
            table: table.clone(),
            what: "column",
            name: name.to_owned(),
        });
    }
    Ok(found.remove(0))
}
