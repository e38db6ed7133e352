//! Reflect table structure from the Postgres catalog.
//!
//! This crate reads `information_schema` and turns what it finds into typed
//! entities:
//! - columns, in ordinal order
//! - constraints, by kind, with foreign keys resolved to the table and
//!   columns they reference
//! - privileges granted on the table
//! - views that depend on the table
//!
//! Nothing is cached: every call asks the catalog again.
//!
//! # Usage
//!
//! ```ignore
//! let reflector = Config::from_env()?.connect()?;
//! let person = reflector.table("person").await?;
//!
//! for column in person.columns().await? {
//!     println!("{} {} nullable={}", column.name, column.data_type, column.is_nullable);
//! }
//! for fk in person.foreign_keys().await? {
//!     let target = fk.foreign_key.as_ref().map(|f| &f.referenced);
//!     println!("{} -> {:?}", fk.name, target);
//! }
//! ```
//!
//! # Bring your own connection
//!
//! Reflection goes through the [`Queryer`] trait, implemented for
//! `tokio_postgres::Client` and for deadpool's `Pool` and `Object`. Wrap any
//! of those (or your own implementation) in a [`Reflector`], or build a
//! [`Table`] directly:
//!
//! ```ignore
//! let (client, connection) = tokio_postgres::connect(&url, NoTls).await?;
//! tokio::spawn(connection);
//! let table = Table::new(Arc::new(client), TableIdent::new("app", "public", "person"));
//! let pk = table.primary_key().await?;
//! ```

mod catalog;
mod column;
mod config;
mod constraint;
mod error;
mod privilege;
mod queryer;
mod record;
mod reflector;
mod table;
mod tristate;
mod view;

#[cfg(test)]
mod fake;

pub use column::Column;
pub use config::{Config, ConfigError};
pub use constraint::{Constraint, ConstraintKind, ForeignKeyRef, KeyColumn};
pub use error::{DecodeError, Error};
pub use privilege::Privilege;
pub use queryer::{BoxError, QueryFuture, Queryer};
pub use record::{FromRecord, Record, decode_all};
pub use reflector::{ReflectOptions, Reflector};
pub use table::{Table, TableIdent};
pub use tristate::Tristate;
pub use view::ViewDependency;

pub use sqlreflect_sql::Value;

/// Result type for reflection operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
