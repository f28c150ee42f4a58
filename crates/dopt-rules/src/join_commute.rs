//! # Join Commute Rule
//!
//! `A JOIN B = B JOIN A` for symmetric join types (inner and cross joins).
//!
//! ## Applicability
//!
//! Left, Right, Full, Semi and Anti joins treat their sides differently (a left join
//! keeps every left row) and are never commuted.
//!
//! ## Condition Swapping
//!
//! `A.x = B.y` becomes `B.y = A.x`. Equality is symmetric, but keeping each column on
//! the side of the child it comes from keeps the condition readable. Commuting twice
//! yields the original expression, which the memo deduplicates.

use dopt_core::expr::{BinaryOp, Expr, JoinType, LogicalOp, Operator};
use dopt_core::pattern::{Binding, Pattern};
use dopt_core::rule::{OptContext, Rule, RuleFactory, RuleResult, RuleType};

/// Join commute: `A JOIN B -> B JOIN A`.
pub struct JoinCommute;

impl RuleFactory for JoinCommute {
    fn build(&self) -> Rule {
        Rule::new(RuleType::LogicalJoinCommute, Pattern::join(), swap_children).when(is_commutable)
    }
}

fn is_commutable(binding: &Binding<'_>, _ctx: &OptContext<'_>) -> bool {
    matches!(
        binding.op().join_type(),
        Some(JoinType::Inner | JoinType::Cross)
    )
}

fn swap_children(binding: &Binding<'_>, _ctx: &OptContext<'_>) -> Option<RuleResult> {
    let Operator::Logical(LogicalOp::Join {
        join_type,
        condition,
    }) = binding.op()
    else {
        return None;
    };

    let new_op = Operator::Logical(LogicalOp::Join {
        join_type: *join_type,
        condition: swap_condition_sides(condition),
    });
    Some(RuleResult::Substitution(
        new_op,
        vec![binding.child_group(1)?, binding.child_group(0)?],
    ))
}

/// Swap the sides of every equality in an equi-join condition.
fn swap_condition_sides(expr: &Expr) -> Expr {
    match expr {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left,
            right,
        } => Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: right.clone(),
            right: left.clone(),
        },
        Expr::And(conjuncts) => Expr::And(conjuncts.iter().map(swap_condition_sides).collect()),
        other => other.clone(),
    }
}
