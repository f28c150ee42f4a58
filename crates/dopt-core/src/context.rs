//! # Plan Context
//!
//! A short-lived, read-only view of one group expression together with the memo it
//! lives in. Built per call by whoever invokes the property deriver and dropped right
//! after.

use crate::expr::Operator;
use crate::memo::{GroupExpression, GroupId, Memo};
use crate::stats::Statistics;

#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    memo: &'a Memo,
    group_expression: &'a GroupExpression,
}

impl<'a> PlanContext<'a> {
    pub fn new(memo: &'a Memo, group_expression: &'a GroupExpression) -> Self {
        Self {
            memo,
            group_expression,
        }
    }

    pub fn group_expression(&self) -> &'a GroupExpression {
        self.group_expression
    }

    pub fn op(&self) -> &'a Operator {
        &self.group_expression.op
    }

    pub fn arity(&self) -> usize {
        self.group_expression.children.len()
    }

    pub fn child_group(&self, index: usize) -> Option<GroupId> {
        self.group_expression.children.get(index).copied()
    }

    /// Statistics of the group this expression belongs to.
    pub fn stats(&self) -> Option<&'a Statistics> {
        self.memo.group(self.group_expression.group).stats.as_ref()
    }

    pub fn child_stats(&self, index: usize) -> Option<&'a Statistics> {
        self.child_group(index)
            .and_then(|g| self.memo.group(g).stats.as_ref())
    }
}
