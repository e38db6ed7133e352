//! Shared plumbing for `information_schema` queries.
//!
//! Every catalog column is selected through an explicit cast so the
//! queryer only ever sees `text` and `integer`, never the catalog's own
//! domain types (`sql_identifier`, `cardinal_number`, `yes_or_no`, ...).

use sqlreflect_sql::{Expr, Params, SelectColumn, SelectStmt, TableRef, render};

use crate::record::{FromRecord, decode_all};
use crate::{Error, Queryer, Result, TableIdent};

const INFORMATION_SCHEMA: &str = "information_schema";

/// `alias.column`
pub(crate) fn col(alias: &str, column: &str) -> Expr {
    Expr::qualified_column(alias.into(), column.into())
}

/// `alias.column::text AS column`
pub(crate) fn text(alias: &str, column: &str) -> SelectColumn {
    text_as(alias, column, column)
}

/// `alias.column::text AS name`
pub(crate) fn text_as(alias: &str, column: &str, name: &str) -> SelectColumn {
    SelectColumn::aliased(col(alias, column).cast("text"), name.into())
}

/// `alias.column::integer AS column`
pub(crate) fn int(alias: &str, column: &str) -> SelectColumn {
    SelectColumn::aliased(col(alias, column).cast("integer"), column.into())
}

/// `alias.column::text = $param`
pub(crate) fn eq_param(alias: &str, column: &str, param: &str) -> Expr {
    col(alias, column).cast("text").eq(Expr::param(param.into()))
}

/// `information_schema.view alias`
pub(crate) fn view(view: &str, alias: &str) -> TableRef {
    TableRef::qualified(INFORMATION_SCHEMA.into(), view.into()).alias(alias.into())
}

/// Restrict a query to one table through the view's `table_catalog`,
/// `table_schema` and `table_name` columns. Pair with [`scope_params`].
pub(crate) fn scoped(stmt: SelectStmt, alias: &str) -> SelectStmt {
    stmt.and_where(eq_param(alias, "table_catalog", "catalog"))
        .and_where(eq_param(alias, "table_schema", "schema"))
        .and_where(eq_param(alias, "table_name", "table"))
}

pub(crate) fn scope_params(table: &TableIdent) -> Params {
    Params::new()
        .set("catalog", table.catalog.as_str())
        .set("schema", table.schema.as_str())
        .set("table", table.name.as_str())
}

/// Render, bind, execute and decode one catalog query.
pub(crate) async fn fetch<T: FromRecord>(
    queryer: &dyn Queryer,
    table: &TableIdent,
    operation: &'static str,
    stmt: &SelectStmt,
    params: &Params,
) -> Result<Vec<T>> {
    let bound = render(stmt).bind(params).map_err(|e| Error::Query {
        table: table.clone(),
        operation,
        source: Box::new(e),
    })?;

    let records = queryer
        .query(&bound.sql, &bound.args)
        .await
        .map_err(|source| Error::Query {
            table: table.clone(),
            operation,
            source,
        })?;

    let entities = decode_all(&records).map_err(|source| Error::Decode {
        table: table.clone(),
        operation,
        source,
    })?;

    tracing::debug!(%table, operation, rows = entities.len(), "catalog query");
    Ok(entities)
}
