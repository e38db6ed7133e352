//! Constraints, from `information_schema.table_constraints`, with foreign
//! keys resolved through `pg_catalog.pg_constraint`.

use std::fmt;
use std::str::FromStr;

use sqlreflect_sql::{Expr, Join, OrderBy, Params, SelectColumn, SelectStmt, TableRef};

use crate::catalog::{self, col, eq_param, int, text, text_as};
use crate::record::{FromRecord, Record};
use crate::{DecodeError, Error, Queryer, Result, TableIdent, Tristate};

/// The closed set of constraint kinds the catalog reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 4] = [
        ConstraintKind::PrimaryKey,
        ConstraintKind::ForeignKey,
        ConstraintKind::Unique,
        ConstraintKind::Check,
    ];

    /// The `constraint_type` value used by the catalog.
    pub fn as_catalog_str(self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::Check => "CHECK",
        }
    }
}

impl FromStr for ConstraintKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintKind::ALL
            .into_iter()
            .find(|kind| kind.as_catalog_str() == s)
            .ok_or_else(|| DecodeError::UnknownConstraintKind(s.to_owned()))
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_catalog_str())
    }
}

/// A named constraint on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub table: TableIdent,
    pub constraint_catalog: String,
    pub constraint_schema: String,
    pub name: String,
    pub kind: ConstraintKind,
    pub is_deferrable: Tristate,
    pub initially_deferred: Tristate,
    /// Set for every [`ConstraintKind::ForeignKey`] returned by this crate.
    pub foreign_key: Option<ForeignKeyRef>,
}

/// What a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub referenced: TableIdent,
    /// The primary key or unique constraint on the referenced table, or
    /// `None` when the target is a unique index with no constraint.
    pub referenced_constraint: Option<String>,
    /// Referencing columns; `columns[i]` references `referenced_columns[i]`.
    pub columns: Vec<String>,
    pub referenced_columns: Vec<String>,
    pub match_option: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

/// One column of a key (primary, unique or foreign).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub constraint_name: String,
    pub column_name: String,
    pub ordinal_position: i32,
    /// For foreign keys, the position of the referenced column in the
    /// referenced key.
    pub position_in_unique_constraint: Option<i32>,
}

impl FromRecord for Constraint {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        Ok(Constraint {
            table: TableIdent::from_record(r, "table")?,
            constraint_catalog: r.string("constraint_catalog")?,
            constraint_schema: r.string("constraint_schema")?,
            name: r.string("constraint_name")?,
            kind: r.string("constraint_type")?.parse()?,
            is_deferrable: r.tristate("is_deferrable")?,
            initially_deferred: r.tristate("initially_deferred")?,
            foreign_key: None,
        })
    }
}

impl FromRecord for KeyColumn {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        Ok(KeyColumn {
            constraint_name: r.string("constraint_name")?,
            column_name: r.string("column_name")?,
            ordinal_position: r.i32("ordinal_position")?,
            position_in_unique_constraint: r.opt_i32("position_in_unique_constraint")?,
        })
    }
}

fn select() -> SelectStmt {
    let stmt = SelectStmt::new()
        .columns(
            [
                "constraint_catalog",
                "constraint_schema",
                "constraint_name",
                "table_catalog",
                "table_schema",
                "table_name",
                "constraint_type",
                "is_deferrable",
                "initially_deferred",
            ]
            .into_iter()
            .map(|c| text("tc", c)),
        )
        .from(catalog::view("table_constraints", "tc"))
        .order_by(OrderBy::asc(col("tc", "constraint_name")));
    catalog::scoped(stmt, "tc")
}

/// Fetch constraints and resolve whichever of them are foreign keys.
async fn load(
    queryer: &dyn Queryer,
    table: &TableIdent,
    operation: &'static str,
    stmt: SelectStmt,
    params: Params,
) -> Result<Vec<Constraint>> {
    let mut constraints: Vec<Constraint> =
        catalog::fetch(queryer, table, operation, &stmt, &params).await?;
    resolve_foreign_keys(queryer, table, &mut constraints).await?;
    Ok(constraints)
}

/// Every constraint on `table`, by name.
pub async fn constraints(queryer: &dyn Queryer, table: &TableIdent) -> Result<Vec<Constraint>> {
    load(
        queryer,
        table,
        "constraints",
        select(),
        catalog::scope_params(table),
    )
    .await
}

/// Constraints on `table` of one kind.
pub async fn constraints_by_type(
    queryer: &dyn Queryer,
    table: &TableIdent,
    kind: ConstraintKind,
) -> Result<Vec<Constraint>> {
    let stmt = select().and_where(eq_param("tc", "constraint_type", "kind"));
    let params = catalog::scope_params(table).set("kind", kind.as_catalog_str());
    let constraints = load(queryer, table, "constraints_by_type", stmt, params).await?;
    debug_assert!(constraints.iter().all(|c| c.kind == kind));
    Ok(constraints)
}

/// The constraint on `table` called exactly `name`.
pub async fn constraint(queryer: &dyn Queryer, table: &TableIdent, name: &str) -> Result<Constraint> {
    let stmt = select().and_where(eq_param("tc", "constraint_name", "constraint"));
    let params = catalog::scope_params(table).set("constraint", name);
    let mut found = load(queryer, table, "constraint", stmt, params).await?;
    if found.is_empty() {
        return Err(Error::NotFound {
            table: table.clone(),
            what: "constraint",
            name: name.to_owned(),
        });
    }
    Ok(found.remove(0))
}

/// Key columns of the constraint `name` on `table`, by ordinal position.
///
/// Check constraints have no key columns and yield an empty list; a name
/// that matches no constraint at all is [`Error::NotFound`].
pub async fn key_columns(
    queryer: &dyn Queryer,
    table: &TableIdent,
    name: &str,
) -> Result<Vec<KeyColumn>> {
    let stmt = SelectStmt::new()
        .columns([
            text("k", "constraint_name"),
            text("k", "column_name"),
            int("k", "ordinal_position"),
            int("k", "position_in_unique_constraint"),
        ])
        .from(catalog::view("key_column_usage", "k"))
        .order_by(OrderBy::asc(col("k", "ordinal_position")));
    let stmt = catalog::scoped(stmt, "k").and_where(eq_param("k", "constraint_name", "constraint"));
    let params = catalog::scope_params(table).set("constraint", name);

    let keys: Vec<KeyColumn> =
        catalog::fetch(queryer, table, "key_columns", &stmt, &params).await?;
    if keys.is_empty() {
        // tell "check constraint" apart from "no such constraint"
        constraint(queryer, table, name).await?;
    }
    Ok(keys)
}

/// One referencing/referenced column pair of a foreign key.
struct ForeignKeyColumn {
    constraint_name: String,
    column_name: String,
    ordinal_position: i32,
    referenced: TableIdent,
    referenced_column: String,
    referenced_constraint: Option<String>,
    match_option: Option<String>,
    update_rule: Option<String>,
    delete_rule: Option<String>,
}

impl FromRecord for ForeignKeyColumn {
    fn from_record(r: &Record) -> Result<Self, DecodeError> {
        Ok(ForeignKeyColumn {
            constraint_name: r.string("constraint_name")?,
            column_name: r.string("column_name")?,
            ordinal_position: r.i32("ordinal_position")?,
            referenced: TableIdent::from_record(r, "referenced")?,
            referenced_column: r.string("referenced_column")?,
            referenced_constraint: r.opt_string("referenced_constraint")?,
            match_option: catalog_code(r, "match_option", match_option)?,
            update_rule: catalog_code(r, "update_rule", referential_action)?,
            delete_rule: catalog_code(r, "delete_rule", referential_action)?,
        })
    }
}

/// `pg_constraint.confmatchtype`, spelled the way `information_schema` does.
fn match_option(code: &str) -> Option<&'static str> {
    Some(match code {
        "f" => "FULL",
        "p" => "PARTIAL",
        "s" => "NONE",
        _ => return None,
    })
}

/// `pg_constraint.confupdtype` / `confdeltype`.
fn referential_action(code: &str) -> Option<&'static str> {
    Some(match code {
        "a" => "NO ACTION",
        "r" => "RESTRICT",
        "c" => "CASCADE",
        "n" => "SET NULL",
        "d" => "SET DEFAULT",
        _ => return None,
    })
}

fn catalog_code(
    r: &Record,
    column: &str,
    decode: fn(&str) -> Option<&'static str>,
) -> Result<Option<String>, DecodeError> {
    r.opt_string(column)?
        .map(|code| {
            decode(&code)
                .map(str::to_owned)
                .ok_or_else(|| DecodeError::UnknownCode {
                    column: column.to_owned(),
                    value: code,
                })
        })
        .transpose()
}

fn pg_catalog(table: &str, alias: &str) -> TableRef {
    TableRef::qualified("pg_catalog".into(), table.into()).alias(alias.into())
}

/// Resolves foreign keys from `pg_constraint`, which knows the owning table
/// (foreign key names are only unique per table) and the referenced columns
/// even when the target is a bare unique index rather than a constraint.
///
/// `conkey[i]` references `confkey[i]`; `array_position` recovers `i` for
/// both sides.
fn foreign_key_select(names: usize) -> SelectStmt {
    let position = || Expr::call("array_position", [col("con", "conkey"), col("a", "attnum")]);
    let referenced_position =
        Expr::call("array_position", [col("con", "confkey"), col("ra", "attnum")]);

    SelectStmt::new()
        .columns([
            text_as("con", "conname", "constraint_name"),
            text_as("a", "attname", "column_name"),
            SelectColumn::aliased(position().cast("integer"), "ordinal_position".into()),
            SelectColumn::aliased(
                Expr::call("current_database", []).cast("text"),
                "referenced_catalog".into(),
            ),
            text_as("rn", "nspname", "referenced_schema"),
            text_as("rt", "relname", "referenced_name"),
            text_as("ra", "attname", "referenced_column"),
            text_as("uc", "conname", "referenced_constraint"),
            text_as("con", "confmatchtype", "match_option"),
            text_as("con", "confupdtype", "update_rule"),
            text_as("con", "confdeltype", "delete_rule"),
        ])
        .from(pg_catalog("pg_constraint", "con"))
        .join(Join::inner(
            pg_catalog("pg_class", "t"),
            col("t", "oid").eq(col("con", "conrelid")),
        ))
        .join(Join::inner(
            pg_catalog("pg_namespace", "n"),
            col("n", "oid").eq(col("t", "relnamespace")),
        ))
        .join(Join::inner(
            pg_catalog("pg_attribute", "a"),
            col("a", "attrelid").eq(col("con", "conrelid")),
        ))
        .join(Join::inner(
            pg_catalog("pg_class", "rt"),
            col("rt", "oid").eq(col("con", "confrelid")),
        ))
        .join(Join::inner(
            pg_catalog("pg_namespace", "rn"),
            col("rn", "oid").eq(col("rt", "relnamespace")),
        ))
        .join(Join::inner(
            pg_catalog("pg_attribute", "ra"),
            col("ra", "attrelid")
                .eq(col("con", "confrelid"))
                .and(referenced_position.eq(position())),
        ))
        // NULL when the target is a unique index with no constraint on it
        .join(Join::left(
            pg_catalog("pg_constraint", "uc"),
            col("uc", "conrelid")
                .eq(col("con", "confrelid"))
                .and(col("uc", "conindid").eq(col("con", "conindid")))
                .and(
                    col("uc", "contype")
                        .cast("text")
                        .in_list([Expr::string("p"), Expr::string("u")]),
                ),
        ))
        .and_where(
            Expr::call("current_database", [])
                .cast("text")
                .eq(Expr::param("catalog".into())),
        )
        .and_where(eq_param("n", "nspname", "schema"))
        .and_where(eq_param("t", "relname", "table"))
        .and_where(col("con", "contype").cast("text").eq(Expr::string("f")))
        .and_where(
            col("con", "conname")
                .cast("text")
                .in_list((0..names).map(|i| Expr::param(format!("fk{i}").into()))),
        )
        .order_by(OrderBy::asc(col("con", "conname")))
        .order_by(OrderBy::asc(position()))
}

/// Assemble one foreign key from its column pairs, refusing row sets that
/// do not describe exactly one target with positions `1..=n`.
fn foreign_key_ref(
    name: &str,
    mut pairs: Vec<&ForeignKeyColumn>,
) -> Result<ForeignKeyRef, DecodeError> {
    pairs.sort_by_key(|p| p.ordinal_position);
    let Some(first) = pairs.first() else {
        return Err(DecodeError::UnresolvedForeignKey {
            constraint: name.to_owned(),
        });
    };
    let inconsistent = |reason| DecodeError::InconsistentForeignKey {
        constraint: name.to_owned(),
        reason,
    };

    if pairs.iter().any(|p| {
        p.referenced != first.referenced || p.referenced_constraint != first.referenced_constraint
    }) {
        return Err(inconsistent("rows name more than one referenced key"));
    }
    if !pairs.iter().map(|p| p.ordinal_position).eq(1..=pairs.len() as i32) {
        return Err(inconsistent("key column positions are not 1..n"));
    }

    Ok(ForeignKeyRef {
        referenced: first.referenced.clone(),
        referenced_constraint: first.referenced_constraint.clone(),
        columns: pairs.iter().map(|p| p.column_name.clone()).collect(),
        referenced_columns: pairs.iter().map(|p| p.referenced_column.clone()).collect(),
        match_option: first.match_option.clone(),
        update_rule: first.update_rule.clone(),
        delete_rule: first.delete_rule.clone(),
    })
}

/// Fill in [`Constraint::foreign_key`] for every foreign key in
/// `constraints`, with one extra query covering all of them.
async fn resolve_foreign_keys(
    queryer: &dyn Queryer,
    table: &TableIdent,
    constraints: &mut [Constraint],
) -> Result<()> {
    const OPERATION: &str = "resolve_foreign_keys";

    let names: Vec<String> = constraints
        .iter()
        .filter(|c| c.kind == ConstraintKind::ForeignKey)
        .map(|c| c.name.clone())
        .collect();
    if names.is_empty() {
        return Ok(());
    }

    let params = names
        .iter()
        .enumerate()
        .fold(catalog::scope_params(table), |params, (i, name)| {
            params.set(format!("fk{i}"), name.as_str())
        });
    let rows: Vec<ForeignKeyColumn> = catalog::fetch(
        queryer,
        table,
        OPERATION,
        &foreign_key_select(names.len()),
        &params,
    )
    .await?;

    for constraint in constraints
        .iter_mut()
        .filter(|c| c.kind == ConstraintKind::ForeignKey)
    {
        let pairs = rows
            .iter()
            .filter(|row| row.constraint_name == constraint.name)
            .collect();
        let foreign_key =
            foreign_key_ref(&constraint.name, pairs).map_err(|source| Error::Decode {
                table: table.clone(),
                operation: OPERATION,
                source,
            })?;
        constraint.foreign_key = Some(foreign_key);
    }

    tracing::debug!(%table, foreign_keys = names.len(), "resolved foreign keys");
    Ok(())
}
