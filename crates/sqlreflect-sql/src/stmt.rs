//! SQL statements.
//!
//! Only SELECT: the catalog is read, never written.

use crate::expr::Expr;
use crate::{ColumnName, TableName};

/// A SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectStmt {
    pub columns: Vec<SelectColumn>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_: Option<Expr>,
    pub order_by: Vec<OrderBy>,
}

/// An output column. Every catalog column is read back by its alias.
#[derive(Debug, Clone)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: ColumnName,
}

impl SelectColumn {
    pub fn aliased(expr: Expr, alias: ColumnName) -> Self {
        Self { expr, alias }
    }
}

/// A schema-qualified table or view, optionally aliased.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub schema: TableName,
    pub table: TableName,
    pub alias: Option<TableName>,
}

impl TableRef {
    pub fn qualified(schema: TableName, table: TableName) -> Self {
        Self {
            schema,
            table,
            alias: None,
        }
    }

    pub fn alias(mut self, alias: TableName) -> Self {
        self.alias = Some(alias);
        self
    }
}

/// A JOIN clause.
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn inner(table: TableRef, on: Expr) -> Self {
        Self {
            kind: JoinKind::Inner,
            table,
            on,
        }
    }

    pub fn left(table: TableRef, on: Expr) -> Self {
        Self {
            kind: JoinKind::Left,
            table,
            on,
        }
    }
}

/// Type of JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// One ascending ORDER BY key.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expr: Expr,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self { expr }
    }
}

impl SelectStmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = SelectColumn>) -> Self {
        self.columns.extend(cols);
        self
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// AND `expr` onto the WHERE clause.
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_ = Some(match self.where_ {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }
}
