//! # Expression and Operator Types
//!
//! This module defines the plan representation that the property deriver and the
//! exploration rules read. It is organized into three layers:
//!
//! ## Scalar Expressions (`Expr`)
//! Scalar expressions represent computations on individual rows: column references,
//! literal values, comparisons and boolean logic. They appear inside join conditions,
//! filters and projections. Join reordering works almost exclusively on
//! column equalities (`a.x = c.x`) found among the conjuncts of a join condition.
//!
//! ## Logical Operators (`LogicalOp`)
//! Logical operators describe *what* to compute. Exploration rules match and rewrite
//! logical joins.
//!
//! ## Physical Operators (`PhysicalOp`)
//! Physical operators describe *how* to execute. The property deriver dispatches on
//! them: `OlapScan` exposes the distribution its table is stored with, `HashJoin` and
//! `NestedLoopJoin` combine their children's distributions, and everything else is
//! treated conservatively.
//!
//! ## Unified `Operator` Enum
//! The `Operator` enum wraps both layers so the memo stores them uniformly. It is a
//! closed union: adding a variant forces every exhaustive `match` over it (notably the
//! property deriver) to decide how the new node behaves.

use crate::properties::DistributionSpec;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Reference to a column.
///
/// Two references denote the same column only if table, name and ordinal all agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub index: u32,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>, index: u32) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref t) = self.table {
            write!(f, "{}.{}", t, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Scalar value for expressions.
///
/// `f64` is wrapped in `OrderedFloat` so that literals can take part in Eq/Hash,
/// which the memo needs to deduplicate expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    /// Days since 1970-01-01.
    Date(i32),
}

/// Scalar expressions used in predicates, projections, join conditions, etc.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    Literal(ScalarValue),
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// Conjunction stored flat, so join conditions decompose without walking nested ANDs.
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// `left = right` over two columns.
    pub fn column_eq(left: ColumnRef, right: ColumnRef) -> Self {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: Box::new(Expr::Column(left)),
            right: Box::new(Expr::Column(right)),
        }
    }

    /// The condition of a join without predicates.
    pub fn always_true() -> Self {
        Expr::Literal(ScalarValue::Bool(true))
    }

    /// Combine predicates with AND. A single predicate is returned unwrapped and an
    /// empty list becomes `TRUE`.
    pub fn conjunction(mut preds: Vec<Expr>) -> Self {
        match preds.len() {
            0 => Expr::always_true(),
            1 => preds.remove(0),
            _ => Expr::And(preds),
        }
    }

    /// Return all column references in this expression.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut cols = Vec::new();
        self.collect_columns(&mut cols);
        cols
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(c) => out.push(c),
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_columns(out),
            Expr::Function { args, .. } => {
                for a in args {
                    a.collect_columns(out);
                }
            }
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.collect_columns(out);
                }
            }
        }
    }

    /// Flatten AND-chains: (A AND (B AND C)) → [A, B, C]. A literal `TRUE` contributes
    /// nothing.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            Expr::Literal(ScalarValue::Bool(true)) => vec![],
            other => vec![other],
        }
    }

    /// If this is `col = col`, the two columns.
    pub fn as_column_equality(&self) -> Option<(&ColumnRef, &ColumnRef)> {
        match self {
            Expr::BinaryOp {
                op: BinaryOp::Eq,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expr::Column(l), Expr::Column(r)) => Some((l, r)),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// SQL join types.
///
/// The join type decides which reorderings preserve the result. Inner and cross joins
/// commute; left-outer joins only reassociate with inner or other left-outer joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    /// Left outer join: all rows from left, matching from right (or NULLs).
    Left,
    /// Right outer join: all rows from right, matching from left (or NULLs).
    Right,
    Full,
    /// Left rows with at least one match on the right. Produces no right columns.
    Semi,
    /// Left rows with no match on the right. Produces no right columns.
    Anti,
    Cross,
}

impl JoinType {
    pub fn is_inner_join(&self) -> bool {
        matches!(self, JoinType::Inner)
    }

    pub fn is_left_outer_join(&self) -> bool {
        matches!(self, JoinType::Left)
    }

    pub fn is_cross_join(&self) -> bool {
        matches!(self, JoinType::Cross)
    }

    /// Whether the join output carries the right child's columns.
    pub fn outputs_right(&self) -> bool {
        !matches!(self, JoinType::Semi | JoinType::Anti)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT OUTER",
            JoinType::Right => "RIGHT OUTER",
            JoinType::Full => "FULL OUTER",
            JoinType::Semi => "SEMI",
            JoinType::Anti => "ANTI",
            JoinType::Cross => "CROSS",
        };
        f.write_str(name)
    }
}

/// Logical operators -- represent *what* to compute, not *how*.
///
/// Children are referenced by group ID in the memo, not stored inline here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Table scan. Always a leaf.
    Scan {
        table: TableRef,
        columns: Vec<ColumnRef>,
        predicate: Option<Expr>,
    },
    Filter {
        predicate: Expr,
    },
    Project {
        exprs: Vec<Expr>,
        aliases: Vec<String>,
    },
    /// The target of the join-reordering rules.
    Join {
        join_type: JoinType,
        condition: Expr,
    },
}

/// Physical operators -- represent *how* to execute a computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOp {
    /// Scan of an OLAP table whose tablets are laid out with `distribution`.
    OlapScan {
        table: TableRef,
        columns: Vec<ColumnRef>,
        distribution: DistributionSpec,
    },
    HashJoin {
        join_type: JoinType,
        condition: Expr,
    },
    NestedLoopJoin {
        join_type: JoinType,
        condition: Expr,
    },
    Filter {
        predicate: Expr,
    },
    Project {
        exprs: Vec<Expr>,
        aliases: Vec<String>,
    },
}

/// Unified operator enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Logical(LogicalOp),
    Physical(PhysicalOp),
}

impl Operator {
    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::Logical(_))
    }

    /// Join type of a logical or physical join.
    pub fn join_type(&self) -> Option<JoinType> {
        match self {
            Operator::Logical(LogicalOp::Join { join_type, .. })
            | Operator::Physical(PhysicalOp::HashJoin { join_type, .. })
            | Operator::Physical(PhysicalOp::NestedLoopJoin { join_type, .. }) => Some(*join_type),
            _ => None,
        }
    }

    /// Condition of a logical or physical join.
    pub fn join_condition(&self) -> Option<&Expr> {
        match self {
            Operator::Logical(LogicalOp::Join { condition, .. })
            | Operator::Physical(PhysicalOp::HashJoin { condition, .. })
            | Operator::Physical(PhysicalOp::NestedLoopJoin { condition, .. }) => Some(condition),
            _ => None,
        }
    }

    /// Distribution a scan produces without any exchange.
    pub fn native_distribution(&self) -> Option<&DistributionSpec> {
        match self {
            Operator::Physical(PhysicalOp::OlapScan { distribution, .. }) => Some(distribution),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOpKind {
    Scan,
    Filter,
    Project,
    Join,
}

impl LogicalOp {
    pub fn kind(&self) -> LogicalOpKind {
        match self {
            LogicalOp::Scan { .. } => LogicalOpKind::Scan,
            LogicalOp::Filter { .. } => LogicalOpKind::Filter,
            LogicalOp::Project { .. } => LogicalOpKind::Project,
            LogicalOp::Join { .. } => LogicalOpKind::Join,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOpKind {
    OlapScan,
    HashJoin,
    NestedLoopJoin,
    Filter,
    Project,
}

impl PhysicalOp {
    pub fn kind(&self) -> PhysicalOpKind {
        match self {
            PhysicalOp::OlapScan { .. } => PhysicalOpKind::OlapScan,
            PhysicalOp::HashJoin { .. } => PhysicalOpKind::HashJoin,
            PhysicalOp::NestedLoopJoin { .. } => PhysicalOpKind::NestedLoopJoin,
            PhysicalOp::Filter { .. } => PhysicalOpKind::Filter,
            PhysicalOp::Project { .. } => PhysicalOpKind::Project,
        }
    }
}
