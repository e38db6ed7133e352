//! SQL expressions.

use crate::{ColumnName, ParamName, TableName};

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A parameter placeholder (e.g., $table -> $1)
    Param(ParamName),
    /// A column reference
    Column(ColumnRef),
    /// A string literal, for fixed catalog codes such as `contype = 'f'`
    String(String),
    /// Binary operation (e.g., a = b, a AND b)
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `expr IN (a, b, ...)`
    In { expr: Box<Expr>, list: Vec<Expr> },
    /// `expr::type`
    Cast { expr: Box<Expr>, ty: String },
    /// A function call such as `array_position(a, b)`
    Call { name: String, args: Vec<Expr> },
}

/// A column reference qualified with its table alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: TableName,
    pub column: ColumnName,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    And,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::And => "AND",
        }
    }

    /// Higher binds tighter, following Postgres: `=` before `AND`.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::And => 1,
            BinOp::Eq => 2,
        }
    }

    /// `a AND b AND c` regroups freely; `a = b = c` is a syntax error.
    pub fn is_associative(self) -> bool {
        matches!(self, BinOp::And)
    }
}

// Convenience constructors
impl Expr {
    pub fn param(name: ParamName) -> Self {
        Expr::Param(name)
    }

    pub fn qualified_column(table: TableName, column: ColumnName) -> Self {
        Expr::Column(ColumnRef { table, column })
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::String(s.into())
    }

    pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Create an equality expression: self = other
    pub fn eq(self, other: Expr) -> Self {
        self.binop(BinOp::Eq, other)
    }

    /// Create an AND expression: self AND other
    pub fn and(self, other: Expr) -> Self {
        self.binop(BinOp::And, other)
    }

    fn binop(self, op: BinOp, other: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// Create an IN expression: self IN (items...)
    ///
    /// An empty list renders as `FALSE`, since `IN ()` is a syntax error.
    pub fn in_list(self, items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::In {
            expr: Box::new(self),
            list: items.into_iter().collect(),
        }
    }

    /// Create a cast expression: self::ty
    pub fn cast(self, ty: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            ty: ty.into(),
        }
    }
}
