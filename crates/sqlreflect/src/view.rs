//! Views that depend on a table, from `information_schema.view_table_usage`
//! joined to `information_schema.views`.

use sqlreflect_sql::{Join, OrderBy, SelectStmt};

use crate::catalog::{self, col, text, text_as};
use crate::record::{FromRecord, Record};
use crate::{DecodeError, Queryer, Result, TableIdent, Tristate};

/// A view whose definition uses the reflected table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDependency {
    pub view: TableIdent,
    /// The view's query text. Never empty.
    pub definition: String,
    pub check_option: Option<String>,
    pub is_updatable: Tristate,
    pub is_insertable_into: Tristate,
}

impl FromRecord for ViewDependency {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        // The catalog hides definitions of views the current role doesn't own.
        let definition = r
            .opt_string("view_definition")?
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| DecodeError::Empty {
                column: "view_definition".to_owned(),
            })?;

        Ok(ViewDependency {
            view: TableIdent::from_record(r, "view")?,
            definition,
            check_option: r.opt_string("check_option")?,
            is_updatable: r.tristate("is_updatable")?,
            is_insertable_into: r.tristate("is_insertable_into")?,
        })
    }
}

/// Views using `table`, by view schema then name.
pub async fn in_views(queryer: &dyn Queryer, table: &TableIdent) -> Result<Vec<ViewDependency>> {
    let stmt = SelectStmt::new()
        .columns([
            text_as("v", "table_catalog", "view_catalog"),
            text_as("v", "table_schema", "view_schema"),
            text_as("v", "table_name", "view_name"),
            text("v", "view_definition"),
            text("v", "check_option"),
            text("v", "is_updatable"),
            text("v", "is_insertable_into"),
        ])
        .from(catalog::view("view_table_usage", "u"))
        .join(Join::inner(
            catalog::view("views", "v"),
            col("v", "table_catalog")
                .eq(col("u", "view_catalog"))
                .and(col("v", "table_schema").eq(col("u", "view_schema")))
                .and(col("v", "table_name").eq(col("u", "view_name"))),
        ))
        .order_by(OrderBy::asc(col("v", "table_schema")))
        .order_by(OrderBy::asc(col("v", "table_name")));
    let stmt = catalog::scoped(stmt, "u");

    catalog::fetch(
        queryer,
        table,
        "in_views",
        &stmt,
        &catalog::scope_params(table),
    )
    .await
}
