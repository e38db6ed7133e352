//! Table privileges, from `information_schema.table_privileges`.

use sqlreflect_sql::{OrderBy, SelectStmt};

use crate::catalog::{self, col, text};
use crate::record::{FromRecord, Record};
use crate::{DecodeError, Queryer, Result, TableIdent, Tristate};

/// A privilege granted on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    pub table: TableIdent,
    pub grantor: String,
    pub grantee: String,
    /// `SELECT`, `INSERT`, `UPDATE`, `DELETE`, `TRUNCATE`, `REFERENCES` or `TRIGGER`.
    pub privilege_type: String,
    pub is_grantable: Tristate,
    pub with_hierarchy: Tristate,
}

impl FromRecord for Privilege {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        Ok(Privilege {
            table: TableIdent::from_record(r, "table")?,
            grantor: r.string("grantor")?,
            grantee: r.string("grantee")?,
            privilege_type: r.string("privilege_type")?,
            is_grantable: r.tristate("is_grantable")?,
            with_hierarchy: r.tristate("with_hierarchy")?,
        })
    }
}

/// Privileges on `table`, by grantee then privilege type.
pub async fn privileges(queryer: &dyn Queryer, table: &TableIdent) -> Result<Vec<Privilege>> {
    let stmt = SelectStmt::new()
        .columns(
            [
                "table_catalog",
                "table_schema",
                "table_name",
                "grantor",
                "grantee",
                "privilege_type",
                "is_grantable",
                "with_hierarchy",
            ]
            .into_iter()
            .map(|c| text("p", c)),
        )
        .from(catalog::view("table_privileges", "p"))
        .order_by(OrderBy::asc(col("p", "grantee")))
        .order_by(OrderBy::asc(col("p", "privilege_type")));
    let stmt = catalog::scoped(stmt, "p");

    catalog::fetch(
        queryer,
        table,
        "privileges",
        &stmt,
        &catalog::scope_params(table),
    )
    .await
}
