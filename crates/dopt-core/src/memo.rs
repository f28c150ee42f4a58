//! # Memo
//!
//! The memo compactly stores every plan alternative discovered so far. It is organized
//! as a set of **groups** (equivalence classes of logically equivalent plans), each
//! holding several **group expressions**: one operator plus the groups of its children.
//!
//! ```text
//! Group 2: { Join(g0, g1), Join(g1, g0), HashJoin(g0, g1) }
//! Group 0: { Scan(a) }
//! Group 1: { Scan(b) }
//! ```
//!
//! Children are group handles, never expressions, so a single group expression stands
//! for every combination of its children's alternatives.
//!
//! ## Ownership
//!
//! The memo owns all groups and expressions. The property deriver and the exploration
//! rules only borrow it for the duration of one call; a rule's output is a fresh
//! [`RuleResult`] that the caller inserts with [`Memo::add_rule_result`].
//!
//! ## Deduplication
//!
//! Inserting an `(operator, children)` pair that already exists returns the existing
//! expression instead of adding a copy. This is what keeps rule application from
//! looping: commuting a join twice yields the original expression, which is not new.
//! Rule applications themselves are additionally recorded per expression and
//! [`RuleType`].

use crate::expr::{ColumnRef, Expr, JoinType, LogicalOp, Operator, PhysicalOp};
use crate::properties::LogicalProperties;
use crate::rule::{RuleChild, RuleResult, RuleType};
use crate::stats::Statistics;
use std::collections::{HashMap, HashSet};
use tracing::trace;

pub type GroupId = u32;
pub type ExprId = u32;

/// One alternative inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupExpression {
    pub op: Operator,
    pub children: Vec<GroupId>,
    /// The group this expression belongs to.
    pub group: GroupId,
}

/// An equivalence class of plans.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub id: GroupId,
    pub logical_exprs: Vec<ExprId>,
    pub physical_exprs: Vec<ExprId>,
    /// Computed from the first expression inserted into the group.
    pub logical_props: LogicalProperties,
    pub stats: Option<Statistics>,
}

impl Group {
    /// All expressions in the group, logical first.
    pub fn exprs(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.logical_exprs.iter().chain(self.physical_exprs.iter()).copied()
    }
}

#[derive(Debug, Default)]
pub struct Memo {
    groups: Vec<Group>,
    exprs: Vec<GroupExpression>,
    expr_index: HashMap<(Operator, Vec<GroupId>), ExprId>,
    applied_rules: HashSet<(ExprId, RuleType)>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn num_exprs(&self) -> usize {
        self.exprs.len()
    }

    /// # Panics
    /// If `id` was not issued by this memo.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id as usize]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id as usize]
    }

    /// # Panics
    /// If `id` was not issued by this memo.
    pub fn expr(&self, id: ExprId) -> &GroupExpression {
        &self.exprs[id as usize]
    }

    pub fn output_columns(&self, group: GroupId) -> &[ColumnRef] {
        &self.group(group).logical_props.output_columns
    }

    pub fn set_group_stats(&mut self, group: GroupId, stats: Statistics) {
        self.group_mut(group).stats = Some(stats);
    }

    /// Add an expression in a new group, or return the existing one if the same
    /// `(op, children)` was inserted before.
    pub fn add_expr(&mut self, op: Operator, children: Vec<GroupId>) -> (GroupId, ExprId) {
        let (group, expr, _) = self.insert(None, op, children);
        (group, expr)
    }

    /// Add an equivalent expression to an existing group. If the expression already
    /// exists (in this or any other group), the existing id is returned.
    pub fn add_expr_to_group(
        &mut self,
        group: GroupId,
        op: Operator,
        children: Vec<GroupId>,
    ) -> ExprId {
        self.insert(Some(group), op, children).1
    }

    /// Insert a rule result as a new alternative of `group`.
    ///
    /// `RuleChild::NewExpr` children are materialized bottom-up into groups of their
    /// own (reusing an existing group when the same expression is already known).
    /// Returns `None` when the resulting top expression was already in the memo.
    pub fn add_rule_result(&mut self, group: GroupId, result: RuleResult) -> Option<ExprId> {
        let (op, children) = match result {
            RuleResult::Substitution(op, children) => (op, children),
            RuleResult::NewChildren(op, children) => {
                let children = children
                    .into_iter()
                    .map(|child| self.materialize(child))
                    .collect();
                (op, children)
            }
        };
        let (_, expr_id, inserted) = self.insert(Some(group), op, children);
        inserted.then_some(expr_id)
    }

    pub fn rule_applied(&self, expr: ExprId, rule_type: RuleType) -> bool {
        self.applied_rules.contains(&(expr, rule_type))
    }

    pub fn mark_rule_applied(&mut self, expr: ExprId, rule_type: RuleType) {
        self.applied_rules.insert((expr, rule_type));
    }

    fn materialize(&mut self, child: RuleChild) -> GroupId {
        match child {
            RuleChild::Group(id) => id,
            RuleChild::NewExpr(op, children) => {
                let children = children
                    .into_iter()
                    .map(|c| self.materialize(c))
                    .collect();
                self.add_expr(op, children).0
            }
        }
    }

    fn insert(
        &mut self,
        group: Option<GroupId>,
        op: Operator,
        children: Vec<GroupId>,
    ) -> (GroupId, ExprId, bool) {
        let key = (op, children);
        if let Some(&existing) = self.expr_index.get(&key) {
            return (self.expr(existing).group, existing, false);
        }
        let (op, children) = key;

        let group = match group {
            Some(id) => id,
            None => {
                let id = self.groups.len() as GroupId;
                let output_columns = self.derive_output_columns(&op, &children);
                self.groups.push(Group {
                    id,
                    logical_props: LogicalProperties { output_columns },
                    ..Default::default()
                });
                id
            }
        };

        let expr_id = self.exprs.len() as ExprId;
        let is_logical = op.is_logical();
        self.expr_index.insert((op.clone(), children.clone()), expr_id);
        self.exprs.push(GroupExpression {
            op,
            children,
            group,
        });
        let g = self.group_mut(group);
        if is_logical {
            g.logical_exprs.push(expr_id);
        } else {
            g.physical_exprs.push(expr_id);
        }
        trace!("memo: expr {} added to group {}", expr_id, group);
        (group, expr_id, true)
    }

    /// Output columns of a new group, from the expression that created it.
    fn derive_output_columns(&self, op: &Operator, children: &[GroupId]) -> Vec<ColumnRef> {
        let child_columns = |i: usize| -> Vec<ColumnRef> {
            children
                .get(i)
                .map(|&g| self.output_columns(g).to_vec())
                .unwrap_or_default()
        };
        let join_columns = |join_type: &JoinType| -> Vec<ColumnRef> {
            let mut cols = child_columns(0);
            if join_type.outputs_right() {
                cols.extend(child_columns(1));
            }
            cols
        };
        let project_columns = |exprs: &[Expr], aliases: &[String]| -> Vec<ColumnRef> {
            exprs
                .iter()
                .enumerate()
                .map(|(i, e)| match e {
                    Expr::Column(c) => c.clone(),
                    _ => ColumnRef {
                        table: None,
                        name: aliases
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("expr{}", i)),
                        index: i as u32,
                    },
                })
                .collect()
        };

        match op {
            Operator::Logical(LogicalOp::Scan { columns, .. })
            | Operator::Physical(PhysicalOp::OlapScan { columns, .. }) => columns.clone(),
            Operator::Logical(LogicalOp::Join { join_type, .. })
            | Operator::Physical(PhysicalOp::HashJoin { join_type, .. })
            | Operator::Physical(PhysicalOp::NestedLoopJoin { join_type, .. }) => {
                join_columns(join_type)
            }
            Operator::Logical(LogicalOp::Project { exprs, aliases })
            | Operator::Physical(PhysicalOp::Project { exprs, aliases }) => {
                project_columns(exprs, aliases)
            }
            _ => child_columns(0),
        }
    }
}
