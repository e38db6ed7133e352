//! The query execution seam.
//!
//! Reflection never talks to a driver directly: it hands rendered SQL and
//! bound arguments to a [`Queryer`] and gets [`Record`]s back. The Postgres
//! implementations below trace every call via `tracing`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sqlreflect_sql::Value;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type};
use tracing::Instrument;

use crate::Record;

/// Error type returned by queryers. Anything goes; it ends up as the source
/// of [`crate::Error::Query`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by [`Queryer::query`].
pub type QueryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Record>, BoxError>> + Send + 'a>>;

/// Something that can run a parameterized SELECT against the catalog.
///
/// Implemented for `tokio_postgres::Client`, `deadpool_postgres::Object`
/// and `deadpool_postgres::Pool`. Must be safe to share between tasks:
/// one queryer usually backs every `Table` of a `Reflector`.
pub trait Queryer: Send + Sync {
    /// Execute `sql` with `args` bound to `$1..$n`, returning all rows.
    fn query<'a>(&'a self, sql: &'a str, args: &'a [Value]) -> QueryFuture<'a>;
}

impl<Q: Queryer + ?Sized> Queryer for Arc<Q> {
    fn query<'a>(&'a self, sql: &'a str, args: &'a [Value]) -> QueryFuture<'a> {
        (**self).query(sql, args)
    }
}

impl Queryer for tokio_postgres::Client {
    fn query<'a>(&'a self, sql: &'a str, args: &'a [Value]) -> QueryFuture<'a> {
        Box::pin(traced_query(self, sql, args))
    }
}

impl Queryer for deadpool_postgres::Object {
    fn query<'a>(&'a self, sql: &'a str, args: &'a [Value]) -> QueryFuture<'a> {
        // Deref to the underlying Client to avoid recursion
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(traced_query(client, sql, args))
    }
}

impl Queryer for deadpool_postgres::Pool {
    fn query<'a>(&'a self, sql: &'a str, args: &'a [Value]) -> QueryFuture<'a> {
        Box::pin(async move {
            let conn = self.get().await?;
            let client: &tokio_postgres::Client = &conn;
            traced_query(client, sql, args).await
        })
    }
}

async fn traced_query(
    client: &tokio_postgres::Client,
    sql: &str,
    args: &[Value],
) -> Result<Vec<Record>, BoxError> {
    let span = tracing::debug_span!(
        "db.query",
        sql = %sql,
        params = args.len(),
        rows = tracing::field::Empty,
    );
    let params: Vec<SqlParam<'_>> = args.iter().map(SqlParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect();
    let rows = client.query(sql, &refs).instrument(span.clone()).await?;
    span.record("rows", rows.len());
    let records = rows
        .iter()
        .map(record_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("column {column:?} has unsupported type {ty}")]
    UnsupportedType { column: String, ty: String },

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

/// Convert a tokio-postgres row to a [`Record`], by column type.
///
/// Catalog queries cast every column to `text` or `integer`, so only the
/// scalar types those casts (and plain booleans) produce are accepted.
fn record_from_row(row: &Row) -> Result<Record, RowError> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = match *column.type_() {
            Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
            Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(Value::I16),
            Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(Value::I32),
            Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::I64),
            Type::TEXT | Type::VARCHAR | Type::NAME | Type::BPCHAR => {
                row.try_get::<_, Option<String>>(idx)?.map(Value::String)
            }
            // the single-byte "char" type of pg_catalog
            Type::CHAR => row
                .try_get::<_, Option<i8>>(idx)?
                .map(|c| Value::String(char::from(c as u8).to_string())),
            ref other => {
                return Err(RowError::UnsupportedType {
                    column: column.name().to_owned(),
                    ty: other.name().to_owned(),
                });
            }
        };
        record.push(column.name(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}

/// Wrapper to make our Value usable as a ToSql parameter.
#[derive(Debug)]
struct SqlParam<'a>(&'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::I16(v) => v.to_sql(ty, out),
            Value::I32(v) => v.to_sql(ty, out),
            Value::I64(v) => v.to_sql(ty, out),
            Value::String(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::NAME
                | Type::BPCHAR
        )
    }

    tokio_postgres::types::to_sql_checked!();
}
