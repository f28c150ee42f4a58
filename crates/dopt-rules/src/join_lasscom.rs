//! # Join L-Asscom Rule
//!
//! Left-associative commutation of two stacked joins:
//!
//! ```text
//!      topJoin                newTopJoin
//!      /     \                 /     \
//! bottomJoin  C   -->  newBottomJoin  B
//!  /    \                  /    \
//! A      B                A      C
//! ```
//!
//! `A` stays on the outer left while `B` and `C` trade places. One application both
//! regroups which pair joins first (associativity) and swaps two operands
//! (commutativity), so together with [`JoinCommute`](crate::join_commute::JoinCommute)
//! it reaches left-deep and bushy orders alike.
//!
//! ## Guards
//!
//! 1. **Structural check**: `A`, `B` and `C` have disjoint outputs and both conditions
//!    only reference columns visible to their join. With an outer join involved, the
//!    top condition must not reference `B`.
//! 2. **Join types**: top and bottom are each inner or left outer. Every other pairing
//!    changes the result (e.g. `(A RIGHT JOIN B) JOIN C` loses `B`-only rows the
//!    rewrite would keep).
//! 3. **Derivable predicate**: the new bottom join needs a condition between `A` and
//!    `C`, either present among the original conjuncts or implied transitively.
//!
//! The new joins keep the original types crosswise: the new bottom join takes the
//! top join's type and the new top join takes the bottom join's type.
//!
//! The rule is experimental and stays out of the default active rule set.

use crate::join_lasscom_helper::{self, LAsscomJoins};
use dopt_core::expr::{JoinType, LogicalOp, Operator};
use dopt_core::pattern::{Binding, Pattern};
use dopt_core::rule::{OptContext, Rule, RuleChild, RuleFactory, RuleResult, RuleType};
use tracing::debug;

/// Join L-Asscom: `(A ⋈ B) ⋈ C → (A ⋈ C) ⋈ B`.
pub struct JoinLAsscom;

impl RuleFactory for JoinLAsscom {
    fn build(&self) -> Rule {
        Rule::new(
            RuleType::LogicalJoinLAsscom,
            Pattern::join_join_left(),
            reassociate,
        )
        .when(structurally_compatible)
        .when(legal_join_types)
        .when(has_a_c_predicate)
        .experimental()
    }
}

fn is_inner_or_left_outer(join_type: JoinType) -> bool {
    join_type.is_inner_join() || join_type.is_left_outer_join()
}

fn structurally_compatible(binding: &Binding<'_>, ctx: &OptContext<'_>) -> bool {
    LAsscomJoins::from_binding(binding)
        .is_some_and(|joins| join_lasscom_helper::check(&joins, ctx.memo))
}

fn legal_join_types(binding: &Binding<'_>, _ctx: &OptContext<'_>) -> bool {
    LAsscomJoins::from_binding(binding).is_some_and(|joins| {
        is_inner_or_left_outer(joins.top_type) && is_inner_or_left_outer(joins.bottom_type)
    })
}

fn has_a_c_predicate(binding: &Binding<'_>, ctx: &OptContext<'_>) -> bool {
    LAsscomJoins::from_binding(binding)
        .and_then(|joins| join_lasscom_helper::new_join_conditions(&joins, ctx.memo))
        .is_some()
}

fn reassociate(binding: &Binding<'_>, ctx: &OptContext<'_>) -> Option<RuleResult> {
    let joins = LAsscomJoins::from_binding(binding)?;
    let conditions = join_lasscom_helper::new_join_conditions(&joins, ctx.memo)?;

    debug!(
        "l-asscom on group {}: ({} ⋈ {}) ⋈ {} -> ({} ⋈ {} ON {:?}) ⋈ {}",
        binding.group(),
        joins.a,
        joins.b,
        joins.c,
        joins.a,
        joins.c,
        conditions.bottom,
        joins.b
    );

    let new_bottom = RuleChild::NewExpr(
        Operator::Logical(LogicalOp::Join {
            join_type: joins.top_type,
            condition: conditions.bottom,
        }),
        vec![RuleChild::Group(joins.a), RuleChild::Group(joins.c)],
    );
    let new_top = Operator::Logical(LogicalOp::Join {
        join_type: joins.bottom_type,
        condition: conditions.top,
    });
    Some(RuleResult::NewChildren(
        new_top,
        vec![new_bottom, RuleChild::Group(joins.b)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dopt_core::expr::{ColumnRef, Expr, TableRef};
    use dopt_core::memo::{ExprId, GroupId, Memo};

    fn col(t: &str, n: &str) -> ColumnRef {
        ColumnRef::new(t, n, 0)
    }

    fn eq(l: &str, r: &str) -> Expr {
        Expr::column_eq(col(l, "k"), col(r, "k"))
    }

    fn scan_op(name: &str) -> Operator {
        Operator::Logical(LogicalOp::Scan {
            table: TableRef {
                schema: "s".into(),
                name: name.into(),
            },
            columns: vec![col(name, "k"), col(name, "v")],
            predicate: None,
        })
    }

    fn join_op(join_type: JoinType, condition: Expr) -> Operator {
        Operator::Logical(LogicalOp::Join {
            join_type,
            condition,
        })
    }

    struct Tree {
        memo: Memo,
        top: ExprId,
        a: GroupId,
        b: GroupId,
        c: GroupId,
    }

    fn tree(top_type: JoinType, top_cond: Expr, bottom_type: JoinType, bottom_cond: Expr) -> Tree {
        let mut memo = Memo::new();
        let (a, _) = memo.add_expr(scan_op("a"), vec![]);
        let (b, _) = memo.add_expr(scan_op("b"), vec![]);
        let (c, _) = memo.add_expr(scan_op("c"), vec![]);
        let (ab, _) = memo.add_expr(join_op(bottom_type, bottom_cond), vec![a, b]);
        let (_, top) = memo.add_expr(join_op(top_type, top_cond), vec![ab, c]);
        Tree { memo, top, a, b, c }
    }

    #[test]
    fn test_inner_inner_moves_a_c_predicate_down() {
        let t = tree(
            JoinType::Inner,
            Expr::And(vec![eq("a", "c"), eq("b", "c")]),
            JoinType::Inner,
            eq("a", "b"),
        );
        let results = JoinLAsscom.build().apply(&t.memo, t.top);
        assert_eq!(
            results,
            vec![RuleResult::NewChildren(
                join_op(JoinType::Inner, Expr::And(vec![eq("a", "b"), eq("b", "c")])),
                vec![
                    RuleChild::NewExpr(
                        join_op(JoinType::Inner, eq("a", "c")),
                        vec![RuleChild::Group(t.a), RuleChild::Group(t.c)],
                    ),
                    RuleChild::Group(t.b),
                ],
            )]
        );
    }

    #[test]
    fn test_left_outer_keeps_conditions_with_their_join_type() {
        let t = tree(JoinType::Left, eq("a", "c"), JoinType::Inner, eq("a", "b"));
        let results = JoinLAsscom.build().apply(&t.memo, t.top);
        assert_eq!(
            results,
            vec![RuleResult::NewChildren(
                join_op(JoinType::Inner, eq("a", "b")),
                vec![
                    RuleChild::NewExpr(
                        join_op(JoinType::Left, eq("a", "c")),
                        vec![RuleChild::Group(t.a), RuleChild::Group(t.c)],
                    ),
                    RuleChild::Group(t.b),
                ],
            )]
        );
    }

    #[test]
    fn test_outer_join_top_condition_may_not_reference_b() {
        let t = tree(
            JoinType::Left,
            Expr::And(vec![eq("a", "c"), eq("b", "c")]),
            JoinType::Inner,
            eq("a", "b"),
        );
        assert!(JoinLAsscom.build().apply(&t.memo, t.top).is_empty());
    }

    #[test]
    fn test_outer_join_needs_top_conjunct_linking_a_and_c() {
        // Passes the structural and join-type guards; `c.k = c.v` never reaches `A`.
        let only_c = Expr::column_eq(col("c", "k"), col("c", "v"));
        let t = tree(JoinType::Left, only_c.clone(), JoinType::Inner, eq("a", "b"));
        let rule = JoinLAsscom.build();
        assert!(rule.apply(&t.memo, t.top).is_empty());

        let pairs = [(JoinType::Left, JoinType::Left), (JoinType::Inner, JoinType::Left)];
        for (top_type, bottom_type) in pairs {
            let t = tree(top_type, only_c.clone(), bottom_type, eq("a", "b"));
            assert!(rule.apply(&t.memo, t.top).is_empty(), "{top_type} over {bottom_type}");
        }
    }

    #[test]
    fn test_predicate_on_unknown_column_is_rejected() {
        let stray = Expr::column_eq(col("a", "k"), col("z", "k"));
        let t = tree(
            JoinType::Inner,
            Expr::And(vec![eq("a", "c"), stray]),
            JoinType::Inner,
            eq("a", "b"),
        );
        assert!(JoinLAsscom.build().apply(&t.memo, t.top).is_empty());
    }

    #[test]
    fn test_is_experimental() {
        let rule = JoinLAsscom.build();
        assert!(rule.is_experimental());
        assert_eq!(rule.rule_type(), RuleType::LogicalJoinLAsscom);
        assert_eq!(rule.pattern(), &Pattern::join_join_left());
    }
}
