//! Read plans and the row walk.
//!
//! A read plan ([`ReadNode`]) is built once per target type and cached by the
//! registry; it fixes every resolved column name and conversion up front so
//! the per-row walk does no name resolution of its own beyond the ordinal
//! scan. The walk produces a [`Tree`] of raw values which the target type's
//! [`Field::from_tree`](crate::Field::from_tree) turns into a Rust value.

use crate::convert::ValueConvert;
use crate::error::{MapResult, MappingError};
use crate::field::Field;
use crate::registry::Registry;
use crate::row::RowAccess;
use crate::value::{SqlType, Value};
use std::sync::Arc;

/// One node of a read plan.
#[derive(Debug, Clone)]
pub enum ReadNode {
    /// A positional leaf: consumes the next unused ordinal.
    Leaf {
        ty: SqlType,
        convert: Option<Arc<dyn ValueConvert>>,
    },
    /// A named leaf: consumes the first unused column whose name matches,
    /// scanning from the current floor.
    Named {
        name: String,
        ty: SqlType,
        convert: Option<Arc<dyn ValueConvert>>,
    },
    /// A struct block: child nodes in declaration order.
    Composite {
        type_name: &'static str,
        fields: Vec<ReadNode>,
    },
    /// A tuple block: items are independent regions; the name-scan floor
    /// advances past each completed item so repeated column names in later
    /// items resolve to later ordinals.
    Tuple { items: Vec<ReadNode> },
}

impl ReadNode {
    /// Strip name resolution from the plan: every leaf consumes the next
    /// unused ordinal. Tuple items read this way, so the output aliases a
    /// joined projection emits are never consulted.
    pub fn positional(self) -> ReadNode {
        match self {
            ReadNode::Leaf { .. } => self,
            ReadNode::Named { ty, convert, .. } => ReadNode::Leaf { ty, convert },
            ReadNode::Composite { type_name, fields } => ReadNode::Composite {
                type_name,
                fields: fields.into_iter().map(ReadNode::positional).collect(),
            },
            ReadNode::Tuple { items } => ReadNode::Tuple {
                items: items.into_iter().map(ReadNode::positional).collect(),
            },
        }
    }
}

/// Raw values gathered by a plan walk, shaped like the plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Leaf(Value),
    Branch(Vec<Tree>),
}

impl Tree {
    pub fn leaf(&self) -> Option<&Value> {
        match self {
            Tree::Leaf(v) => Some(v),
            Tree::Branch(_) => None,
        }
    }

    pub fn branch(&self) -> Option<&[Tree]> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Branch(items) => Some(items),
        }
    }

    /// True when every leaf under this node is null.
    pub fn is_all_null(&self) -> bool {
        match self {
            Tree::Leaf(v) => v.is_null(),
            Tree::Branch(items) => items.iter().all(Tree::is_all_null),
        }
    }
}

/// Join a parent path and a member segment with `_`.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}_{segment}")
    }
}

/// Ordinal bookkeeping for one row walk.
///
/// Each ordinal is consumed at most once. Positional reads take the next
/// unused ordinal; named reads scan forward from `floor`, which only moves
/// when a tuple item completes.
#[derive(Debug)]
pub struct Cursor {
    used: Vec<bool>,
    floor: usize,
    /// One past the highest ordinal consumed so far.
    high: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self {
            used: vec![false; len],
            floor: 0,
            high: 0,
        }
    }

    fn consume(&mut self, ordinal: usize) {
        self.used[ordinal] = true;
        if ordinal + 1 > self.high {
            self.high = ordinal + 1;
        }
    }

    fn take_positional(&mut self) -> Result<usize, MappingError> {
        let start = self.floor;
        for i in start..self.used.len() {
            if !self.used[i] {
                self.consume(i);
                return Ok(i);
            }
        }
        Err(MappingError::OrdinalOutOfRange(self.used.len()))
    }

    fn take_named<R: RowAccess>(&mut self, row: &R, name: &str) -> Result<usize, MappingError> {
        for i in self.floor..self.used.len() {
            if self.used[i] {
                continue;
            }
            if let Some(col) = row.name(i) {
                if col.eq_ignore_ascii_case(name) {
                    self.consume(i);
                    return Ok(i);
                }
            }
        }
        Err(MappingError::unresolved_column(name, self.floor))
    }

    /// Seal the region consumed so far; later name scans start after it.
    fn advance_floor(&mut self) {
        if self.high > self.floor {
            self.floor = self.high;
        }
    }
}

/// Walk one plan node against a row, consuming ordinals through `cur`.
pub fn read_tree<R: RowAccess>(
    node: &ReadNode,
    row: &R,
    cur: &mut Cursor,
) -> Result<Tree, MappingError> {
    match node {
        ReadNode::Leaf { convert, .. } => {
            let ordinal = cur.take_positional()?;
            let mut value = row.get(ordinal)?;
            if let Some(convert) = convert {
                value = convert.read(value)?;
            }
            Ok(Tree::Leaf(value))
        }
        ReadNode::Named { name, convert, .. } => {
            let ordinal = cur.take_named(row, name)?;
            let mut value = row.get(ordinal)?;
            if let Some(convert) = convert {
                value = convert.read(value)?;
            }
            Ok(Tree::Leaf(value))
        }
        ReadNode::Composite { fields, .. } => {
            let mut items = Vec::with_capacity(fields.len());
            for field in fields {
                items.push(read_tree(field, row, cur)?);
            }
            Ok(Tree::Branch(items))
        }
        ReadNode::Tuple {
            items: plan_items,
        } => {
            let mut items = Vec::with_capacity(plan_items.len());
            for item in plan_items {
                items.push(read_tree(item, row, cur)?);
                cur.advance_floor();
            }
            Ok(Tree::Branch(items))
        }
    }
}

/// Materialize one row into `T` using the registry's cached plan.
pub fn materialize<T: Field, R: RowAccess>(cx: &Registry, row: &R) -> MapResult<T> {
    let plan = cx.plan::<T>();
    let mut cur = Cursor::new(row.len());
    let tree = read_tree(&plan, row, &mut cur)?;
    Ok(T::from_tree(cx, &tree, "")?)
}

/// Materialize a slice of rows.
pub fn materialize_all<T: Field, R: RowAccess>(cx: &Registry, rows: &[R]) -> MapResult<Vec<T>> {
    let plan = cx.plan::<T>();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cur = Cursor::new(row.len());
        let tree = read_tree(&plan, row, &mut cur)?;
        out.push(T::from_tree(cx, &tree, "")?);
    }
    Ok(out)
}
