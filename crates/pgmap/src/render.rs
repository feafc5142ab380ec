//! Statement rendering.
//!
//! Turns statement descriptions into [`SqlBuf`] fragment sequences. All
//! checks happen here, synchronously: column references are validated against
//! their table sources, unsupported shapes fail fast, and enum-typed
//! comparisons get their primitive literals re-encoded before anything is
//! emitted. Constants become bound parameters unless inlining is explicitly
//! enabled and the value is inline-eligible; `LIMIT` is always an inline
//! literal.

use crate::error::{CompileError, MapResult};
use crate::expr::{BinOp, Expr};
use crate::fragment::SqlBuf;
use crate::registry::Registry;
use crate::schema::{Table, TableSource};
use crate::stmt::{Delete, Query, Update};
use crate::value::Value;
use std::borrow::Cow;

/// Rendering knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Render inline-eligible constants as literals instead of parameters.
    pub inline_constants: bool,
}

struct RenderCx<'a> {
    registry: &'a Registry,
    sources: &'a [TableSource],
    opts: RenderOptions,
    /// Column references are qualified only when more than one source is in
    /// scope; single-table statements stay unqualified.
    qualify: bool,
    /// Forces constants to parameters regardless of options (UPDATE SET).
    force_params: bool,
    buf: SqlBuf,
}

impl<'a> RenderCx<'a> {
    fn new(registry: &'a Registry, sources: &'a [TableSource], opts: RenderOptions) -> Self {
        Self {
            registry,
            sources,
            opts,
            qualify: sources.len() > 1,
            force_params: false,
            buf: SqlBuf::new(),
        }
    }

    fn source(&self, index: usize) -> MapResult<&'a TableSource> {
        self.sources
            .get(index)
            .ok_or_else(|| CompileError::UnresolvedSource(index).into())
    }

    fn column(&mut self, source: usize, name: &str) -> MapResult<()> {
        let src = self.source(source)?;
        if src.table.column(name).is_none() {
            return Err(CompileError::unresolved_column(src.qualifier(), name).into());
        }
        if self.qualify {
            self.buf.push_ident(src.qualifier());
            self.buf.push(".");
        }
        self.buf.push_ident(name);
        Ok(())
    }

    fn value(&mut self, value: Value) {
        if !self.force_params && self.opts.inline_constants && value.can_inline() {
            self.buf.push_inline(value);
        } else {
            self.buf.push_param(value);
        }
    }

    fn expr(&mut self, expr: &Expr) -> MapResult<()> {
        match expr {
            Expr::Value(v) => {
                self.value(v.clone());
                Ok(())
            }
            Expr::EnumConst { codec, value } => {
                let technique = self.registry.enum_technique(codec.type_id);
                let encoded = codec.encode_int(*value, technique)?;
                self.value(encoded);
                Ok(())
            }
            Expr::Column { source, name } => self.column(*source, name),
            Expr::Convert { expr, .. } => self.expr(expr),
            Expr::Binary { lhs, op, rhs } => {
                // A column-free subtree folds to a single bound constant.
                if is_constant(expr) {
                    let folded = crate::fold::fold(self.registry, expr)?;
                    self.value(folded);
                    return Ok(());
                }
                let (lhs, rhs) = coerce_pair(lhs, *op, rhs);
                self.operand(lhs.as_ref(), prec(*op))?;
                self.buf.push(" ");
                self.buf.push(op.sql());
                self.buf.push(" ");
                self.operand(rhs.as_ref(), prec(*op))
            }
            Expr::Func { func, arg } => {
                self.buf.push(func.sql());
                self.buf.push("(");
                match arg {
                    Some(arg) => self.expr(arg)?,
                    None => {
                        self.buf.push("*");
                    }
                }
                self.buf.push(")");
                Ok(())
            }
            Expr::IsNull { expr, negate } => {
                self.operand(expr, u8::MAX)?;
                self.buf
                    .push(if *negate { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }
            Expr::Row(items) => {
                self.buf.push("(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buf.push(", ");
                    }
                    self.expr(item)?;
                }
                self.buf.push(")");
                Ok(())
            }
        }
    }

    /// Render a sub-expression, parenthesizing binaries that bind looser
    /// than their parent.
    fn operand(&mut self, expr: &Expr, parent: u8) -> MapResult<()> {
        let needs_parens = matches!(expr, Expr::Binary { op, .. } if prec(*op) < parent);
        if needs_parens {
            self.buf.push("(");
            self.expr(expr)?;
            self.buf.push(")");
            Ok(())
        } else {
            self.expr(expr)
        }
    }

    fn where_clause(&mut self, filters: &[Expr]) -> MapResult<()> {
        for (i, filter) in filters.iter().enumerate() {
            self.buf.push(if i == 0 { " WHERE " } else { " AND " });
            // An OR at the top of one filter must not leak into the AND chain.
            self.operand(filter, prec(BinOp::And))?;
        }
        Ok(())
    }
}

/// True when the expression depends on no row data and can be folded.
fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Value(_) | Expr::EnumConst { .. } => true,
        Expr::Column { .. } | Expr::Func { .. } | Expr::Row(_) => false,
        Expr::Convert { expr, .. } => is_constant(expr),
        Expr::Binary { lhs, rhs, .. } => is_constant(lhs) && is_constant(rhs),
        Expr::IsNull { expr, .. } => is_constant(expr),
    }
}

fn prec(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
        BinOp::Add | BinOp::Sub => 4,
        BinOp::Mul => 5,
    }
}

fn enum_codec(expr: &Expr) -> Option<&crate::enums::EnumCodec> {
    match expr {
        Expr::Convert { codec, .. } | Expr::EnumConst { codec, .. } => Some(codec),
        _ => None,
    }
}

/// When one side of a comparison is enum-typed and the other is a primitive
/// integer constant, replace the constant with an enum constant of the same
/// member so both sides render under the same encoding. Checked left-to-right
/// first, then right-to-left.
fn coerce_pair<'e>(lhs: &'e Expr, op: BinOp, rhs: &'e Expr) -> (Cow<'e, Expr>, Cow<'e, Expr>) {
    if op.is_comparison() {
        if let Some(coerced) = coerce_one(lhs, rhs) {
            return (Cow::Borrowed(lhs), Cow::Owned(coerced));
        }
        if let Some(coerced) = coerce_one(rhs, lhs) {
            return (Cow::Owned(coerced), Cow::Borrowed(rhs));
        }
    }
    (Cow::Borrowed(lhs), Cow::Borrowed(rhs))
}

fn coerce_one(enum_side: &Expr, const_side: &Expr) -> Option<Expr> {
    let codec = enum_codec(enum_side)?;
    let Expr::Value(value) = const_side else {
        return None;
    };
    let value = value.as_i64()?;
    Some(Expr::EnumConst {
        codec: *codec,
        value,
    })
}

fn table_intro(buf: &mut SqlBuf, source: &TableSource) {
    buf.push_ident(&source.table.name);
    if let Some(alias) = &source.alias {
        buf.push(" AS ");
        buf.push_ident(alias);
    }
}

pub(crate) fn render_select(
    registry: &Registry,
    query: &Query,
    opts: RenderOptions,
) -> MapResult<SqlBuf> {
    let sources = query.sources();
    let mut cx = RenderCx::new(registry, &sources, opts);

    cx.buf.push("SELECT ");
    match &query.projection {
        Some(terms) => {
            for (i, (name, expr)) in terms.iter().enumerate() {
                if i > 0 {
                    cx.buf.push(", ");
                }
                cx.expr(expr)?;
                cx.buf.push(" AS ");
                cx.buf.push_ident(name);
            }
        }
        None => {
            // Default projection: every column of every source, in source
            // order. With joins in scope each column gets a `qual_col`
            // output alias so repeated names stay distinct in the result;
            // tuple targets read the columns back positionally in this
            // same order.
            let mut first = true;
            for (si, source) in sources.iter().enumerate() {
                for column in &source.table.columns {
                    if !first {
                        cx.buf.push(", ");
                    }
                    first = false;
                    cx.column(si, &column.name)?;
                    if cx.qualify {
                        let alias = format!("{}_{}", source.qualifier(), column.name);
                        cx.buf.push(" AS ");
                        cx.buf.push_ident(&alias);
                    }
                }
            }
        }
    }

    cx.buf.push(" FROM ");
    table_intro(&mut cx.buf, &query.source);

    for join in &query.joins {
        cx.buf.push(" ");
        cx.buf.push(join.kind.sql());
        cx.buf.push(" ");
        table_intro(&mut cx.buf, &join.source);
        if let Some(on) = &join.on {
            cx.buf.push(" ON ");
            cx.expr(on)?;
        }
    }

    cx.where_clause(&query.filters)?;

    for (i, group) in query.groupings.iter().enumerate() {
        cx.buf.push(if i == 0 { " GROUP BY " } else { ", " });
        cx.expr(group)?;
    }

    for (i, (order, desc)) in query.orderings.iter().enumerate() {
        cx.buf.push(if i == 0 { " ORDER BY " } else { ", " });
        cx.expr(order)?;
        if *desc {
            cx.buf.push(" DESC");
        }
    }

    if let Some(limit) = query.limit {
        // LIMIT takes no parameter; the row cap is part of the statement
        // shape.
        cx.buf.push(" LIMIT ");
        cx.buf.push(&limit.to_string());
    }

    Ok(cx.buf)
}

pub(crate) fn render_insert(table: &Table, rows: &[Vec<Value>]) -> MapResult<SqlBuf> {
    if rows.is_empty() {
        return Err(CompileError::unsupported("INSERT with no rows").into());
    }
    let columns: Vec<_> = table.insert_columns().collect();
    if columns.is_empty() {
        return Err(CompileError::unsupported(format!(
            "table '{}' has no insertable columns",
            table.name
        ))
        .into());
    }

    let mut buf = SqlBuf::new();
    buf.push("INSERT INTO ");
    buf.push_ident(&table.name);
    buf.push(" (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            buf.push(", ");
        }
        buf.push_ident(&column.name);
    }
    buf.push(") VALUES ");
    for (ri, row) in rows.iter().enumerate() {
        if ri > 0 {
            buf.push(", ");
        }
        buf.push("(");
        for (vi, value) in row.iter().enumerate() {
            if vi > 0 {
                buf.push(", ");
            }
            buf.push_param(value.clone());
        }
        buf.push(")");
    }
    Ok(buf)
}

pub(crate) fn render_update(registry: &Registry, update: &Update) -> MapResult<SqlBuf> {
    if update.sets.is_empty() {
        return Err(CompileError::unsupported("UPDATE with no SET clause").into());
    }
    if update.filters.is_empty() && !update.allow_all {
        return Err(CompileError::MissingWhere("UPDATE").into());
    }

    let sources = [TableSource::new(update.table.clone())];
    let mut cx = RenderCx::new(registry, &sources, RenderOptions::default());

    cx.buf.push("UPDATE ");
    cx.buf.push_ident(&update.table.name);
    cx.buf.push(" SET ");
    // Assignment values never inline, whatever the options say.
    cx.force_params = true;
    for (i, (column, expr)) in update.sets.iter().enumerate() {
        if update.table.column(column).is_none() {
            return Err(CompileError::unresolved_column(&update.table.name, column).into());
        }
        if i > 0 {
            cx.buf.push(", ");
        }
        cx.buf.push_ident(column);
        cx.buf.push(" = ");
        cx.expr(expr)?;
    }
    cx.force_params = false;

    cx.where_clause(&update.filters)?;
    Ok(cx.buf)
}

pub(crate) fn render_delete(registry: &Registry, delete: &Delete) -> MapResult<SqlBuf> {
    if delete.filters.is_empty() && !delete.allow_all {
        return Err(CompileError::MissingWhere("DELETE").into());
    }

    let sources = [TableSource::new(delete.table.clone())];
    let mut cx = RenderCx::new(registry, &sources, RenderOptions::default());

    cx.buf.push("DELETE FROM ");
    cx.buf.push_ident(&delete.table.name);
    cx.where_clause(&delete.filters)?;
    Ok(cx.buf)
}
