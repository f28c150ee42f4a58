//! # Declarative Pattern Matching for Exploration Rules
//!
//! Each rule declares a `Pattern` describing the plan shape it rewrites. Matching is
//! purely structural: it looks at operator kinds and child shapes in the memo, never
//! at costs.
//!
//! ## Pattern Language
//!
//! - `Pattern::Operator(matcher, children)`: an expression whose operator satisfies
//!   `matcher` and whose children match the given child patterns.
//! - `Pattern::Any`: any subtree. The child is bound as an opaque group handle.
//! - `Pattern::Leaf`: an expression with no children.
//!
//! ## Bindings
//!
//! A child group usually holds several expressions, and more than one of them may
//! satisfy a nested child pattern. [`bindings`] therefore returns every concrete
//! [`Binding`]: one per combination of matching child expressions. For
//! `Join(Join(Any, Any), Any)` over a top join whose left group holds two joins, that
//! is two bindings, each fixing a different bottom join.

use crate::expr::{LogicalOpKind, Operator, PhysicalOpKind};
use crate::memo::{ExprId, GroupExpression, GroupId, Memo};

/// Pattern for matching expressions in the memo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Match an operator with child patterns.
    Operator(OpMatcher, Vec<Pattern>),
    /// Match any subtree (group).
    Any,
    /// Match a leaf node (no children).
    Leaf,
}

/// Matcher for operator types (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMatcher {
    LogicalOp(LogicalOpKind),
    PhysicalOp(PhysicalOpKind),
    AnyLogical,
    AnyPhysical,
}

impl OpMatcher {
    fn matches(&self, op: &Operator) -> bool {
        match (op, self) {
            (Operator::Logical(l), OpMatcher::LogicalOp(kind)) => l.kind() == *kind,
            (Operator::Physical(p), OpMatcher::PhysicalOp(kind)) => p.kind() == *kind,
            (Operator::Logical(_), OpMatcher::AnyLogical) => true,
            (Operator::Physical(_), OpMatcher::AnyPhysical) => true,
            _ => false,
        }
    }
}

impl Pattern {
    /// Create a pattern that matches a logical join with two any-children.
    pub fn join() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Join),
            vec![Pattern::Any, Pattern::Any],
        )
    }

    /// Create a pattern that matches a logical join where the left child is also a join.
    pub fn join_join_left() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Join),
            vec![Pattern::join(), Pattern::Any],
        )
    }
}

/// A concrete match of a pattern against memo expressions.
#[derive(Debug, Clone)]
pub struct Binding<'m> {
    pub expr_id: ExprId,
    pub expr: &'m GroupExpression,
    pub children: Vec<BoundChild<'m>>,
}

#[derive(Debug, Clone)]
pub enum BoundChild<'m> {
    /// Bound by `Pattern::Any`: the child is opaque.
    Group(GroupId),
    /// Bound by a nested pattern to one expression of the child group.
    Expr(Binding<'m>),
}

impl<'m> Binding<'m> {
    pub fn op(&self) -> &'m Operator {
        &self.expr.op
    }

    pub fn group(&self) -> GroupId {
        self.expr.group
    }

    /// The group of the `index`-th child, whether it was bound opaquely or not.
    pub fn child_group(&self, index: usize) -> Option<GroupId> {
        self.children.get(index).map(|child| match child {
            BoundChild::Group(id) => *id,
            BoundChild::Expr(b) => b.group(),
        })
    }

    pub fn child_binding(&self, index: usize) -> Option<&Binding<'m>> {
        match self.children.get(index) {
            Some(BoundChild::Expr(b)) => Some(b),
            _ => None,
        }
    }
}

/// Check if a memo expression matches a pattern.
pub fn matches(memo: &Memo, expr_id: ExprId, pattern: &Pattern) -> bool {
    !bindings(memo, expr_id, pattern).is_empty()
}

/// All bindings of `pattern` rooted at `expr_id`.
pub fn bindings<'m>(memo: &'m Memo, expr_id: ExprId, pattern: &Pattern) -> Vec<Binding<'m>> {
    let expr = memo.expr(expr_id);
    let child_patterns: &[Pattern] = match pattern {
        Pattern::Any => &[],
        Pattern::Leaf if expr.children.is_empty() => &[],
        Pattern::Leaf => return vec![],
        Pattern::Operator(matcher, child_patterns) => {
            if !matcher.matches(&expr.op) || expr.children.len() != child_patterns.len() {
                return vec![];
            }
            child_patterns
        }
    };

    if matches!(pattern, Pattern::Any | Pattern::Leaf) {
        let children = expr.children.iter().map(|&g| BoundChild::Group(g)).collect();
        return vec![Binding {
            expr_id,
            expr,
            children,
        }];
    }

    // Candidates per child position; a child with no candidate kills the match.
    let mut per_child: Vec<Vec<BoundChild<'m>>> = Vec::with_capacity(child_patterns.len());
    for (&child_gid, child_pattern) in expr.children.iter().zip(child_patterns) {
        let candidates: Vec<BoundChild<'m>> = match child_pattern {
            Pattern::Any => vec![BoundChild::Group(child_gid)],
            _ => memo
                .group(child_gid)
                .exprs()
                .flat_map(|eid| bindings(memo, eid, child_pattern))
                .map(BoundChild::Expr)
                .collect(),
        };
        if candidates.is_empty() {
            return vec![];
        }
        per_child.push(candidates);
    }

    let mut combos: Vec<Vec<BoundChild<'m>>> = vec![Vec::new()];
    for candidates in per_child {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                candidates.iter().map(move |c| {
                    let mut next = prefix.clone();
                    next.push(c.clone());
                    next
                })
            })
            .collect();
    }

    combos
        .into_iter()
        .map(|children| Binding {
            expr_id,
            expr,
            children,
        })
        .collect()
}
