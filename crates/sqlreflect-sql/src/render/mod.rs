//! Render SQL AST to string.

use std::cell::RefCell;
use std::fmt;

use indexmap::IndexMap;

use crate::expr::{ColumnRef, Expr};
use crate::stmt::*;
use crate::{Ident, Lit, ParamName, RenderedSql};

/// Mutable parameter tracking state.
struct ParamState {
    /// Named parameters mapped to their assigned positional index.
    params: IndexMap<ParamName, usize>,
    /// Next parameter index to assign (starts at 1 for `$1`).
    next_param_idx: usize,
}

impl ParamState {
    fn new() -> Self {
        Self {
            params: IndexMap::new(),
            next_param_idx: 1,
        }
    }

    /// Get or create a parameter index.
    fn get_or_insert(&mut self, name: &ParamName) -> usize {
        *self.params.entry(name.clone()).or_insert_with(|| {
            let idx = self.next_param_idx;
            self.next_param_idx += 1;
            idx
        })
    }
}

/// Rendering context that tracks parameter assignment.
///
/// Uses interior mutability (`RefCell`) so that `Render::render` can take `&self`,
/// enabling the `Fmt` wrapper to implement `Display`.
pub struct RenderContext {
    params: RefCell<ParamState>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            params: RefCell::new(ParamState::new()),
        }
    }

    /// Get or create a parameter placeholder index.
    fn param_idx(&self, name: &ParamName) -> usize {
        self.params.borrow_mut().get_or_insert(name)
    }

    /// Finish rendering and return the collected params.
    fn into_params(self) -> Vec<ParamName> {
        self.params.into_inner().params.into_keys().collect()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper for rendering a value via Display.
pub struct Fmt<'a, T: Render>(&'a RenderContext, &'a T);

impl<T: Render> fmt::Display for Fmt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.1.render(self.0, f)
    }
}

const IN_PRECEDENCE: u8 = 3;
const CAST_PRECEDENCE: u8 = 5;

/// Binding strength of `expr` at its top level; atoms never need parens.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::BinOp { op, .. } => op.precedence(),
        Expr::In { .. } => IN_PRECEDENCE,
        Expr::Cast { .. } => CAST_PRECEDENCE,
        Expr::Param(_) | Expr::Column(_) | Expr::String(_) | Expr::Call { .. } => u8::MAX,
    }
}

/// Renders a child expression, parenthesized when it binds looser than
/// `min` allows.
struct Operand<'a> {
    ctx: &'a RenderContext,
    expr: &'a Expr,
    min: u8,
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if precedence(self.expr) < self.min {
            write!(f, "({})", Fmt(self.ctx, self.expr))
        } else {
            write!(f, "{}", Fmt(self.ctx, self.expr))
        }
    }
}

/// Renders a comma-separated argument or item list.
struct List<'a> {
    ctx: &'a RenderContext,
    items: &'a [Expr],
}

impl fmt::Display for List<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Fmt(self.ctx, item))?;
        }
        Ok(())
    }
}

// ============================================================================
// Render implementations
// ============================================================================

/// Trait for types that can be rendered to SQL.
pub trait Render {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Render for Expr {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param(name) => {
                let idx = ctx.param_idx(name);
                write!(f, "${idx}")
            }
            Expr::Column(col) => col.render(ctx, f),
            Expr::String(s) => write!(f, "{}", Lit(s)),
            Expr::BinOp { left, op, right } => {
                let min = if op.is_associative() {
                    op.precedence()
                } else {
                    op.precedence() + 1
                };
                let left = Operand {
                    ctx,
                    expr: left,
                    min,
                };
                let right = Operand {
                    ctx,
                    expr: right,
                    min,
                };
                let op = op.as_str();
                write!(f, "{left} {op} {right}")
            }
            Expr::In { expr, list } => {
                if list.is_empty() {
                    return write!(f, "FALSE");
                }
                let expr = Operand {
                    ctx,
                    expr,
                    min: IN_PRECEDENCE + 1,
                };
                let list = List { ctx, items: list };
                write!(f, "{expr} IN ({list})")
            }
            Expr::Cast { expr, ty } => {
                let expr = Operand {
                    ctx,
                    expr,
                    min: CAST_PRECEDENCE,
                };
                write!(f, "{expr}::{ty}")
            }
            Expr::Call { name, args } => {
                let args = List { ctx, items: args };
                write!(f, "{name}({args})")
            }
        }
    }
}

impl Render for ColumnRef {
    fn render(&self, _ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(self.table.as_str());
        let column = Ident(self.column.as_str());
        write!(f, "{table}.{column}")
    }
}

impl Render for TableRef {
    fn render(&self, _ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = Ident(self.schema.as_str());
        let table = Ident(self.table.as_str());
        write!(f, "{schema}.{table}")?;
        if let Some(alias) = &self.alias {
            let alias = Ident(alias.as_str());
            write!(f, " {alias}")?;
        }
        Ok(())
    }
}

impl Render for SelectStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT")?;

        // Columns
        if self.columns.is_empty() {
            write!(f, " *")?;
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {}", Fmt(ctx, col))?;
            }
        }

        // FROM
        if let Some(from) = &self.from {
            let table = Fmt(ctx, from);
            write!(f, "\nFROM {table}")?;
        }

        // JOINs
        for join in &self.joins {
            let kind = join.kind.as_str();
            let table = Fmt(ctx, &join.table);
            let on = Fmt(ctx, &join.on);
            write!(f, "\n{kind} {table} ON {on}")?;
        }

        // WHERE
        if let Some(where_) = &self.where_ {
            let where_ = Fmt(ctx, where_);
            write!(f, "\nWHERE {where_}")?;
        }

        // ORDER BY
        if !self.order_by.is_empty() {
            write!(f, "\nORDER BY ")?;
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let expr = Fmt(ctx, &order.expr);
                write!(f, "{expr} ASC")?;
            }
        }

        Ok(())
    }
}

impl Render for SelectColumn {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expr = Fmt(ctx, &self.expr);
        let alias = Ident(self.alias.as_str());
        write!(f, "{expr} AS {alias}")
    }
}

/// Render a statement to SQL.
pub fn render(stmt: &impl Render) -> RenderedSql {
    let ctx = RenderContext::new();
    let sql = format!("{}", Fmt(&ctx, stmt));
    RenderedSql {
        sql,
        params: ctx.into_params(),
    }
}
