//! End-to-end join-reordering tests over a logical memo.
//!
//! The plans are three-table left-deep joins `(A ⋈ B) ⋈ C` over scans that declare
//! their output columns, so the rules can resolve which side each predicate column
//! belongs to.
//!
//! - Scenario 5: `A.x = B.x` below, `B.y = C.y` above. No `A`–`C` predicate exists
//!   or follows, so L-Asscom yields nothing.
//! - Scenario 6: `A.x = B.x` below, `A.x = C.x` above. L-Asscom fires and produces
//!   `(A ⋈ C ON A.x = C.x) ⋈ B ON A.x = B.x`.

use dopt_core::config::ExplorationConfig;
use dopt_core::expr::*;
use dopt_core::memo::{ExprId, GroupId, Memo};
use dopt_core::rule::{RuleChild, RuleFactory, RuleResult, RuleType};
use dopt_rules::default_rule_set;
use dopt_rules::join_commute::JoinCommute;
use dopt_rules::join_lasscom::JoinLAsscom;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn col(table: &str, name: &str) -> ColumnRef {
    ColumnRef::new(table, name, 0)
}

fn equi(lt: &str, lc: &str, rt: &str, rc: &str) -> Expr {
    Expr::column_eq(col(lt, lc), col(rt, rc))
}

fn scan(name: &str) -> Operator {
    Operator::Logical(LogicalOp::Scan {
        table: TableRef {
            schema: "s".into(),
            name: name.into(),
        },
        columns: vec![col(name, "x"), col(name, "y")],
        predicate: None,
    })
}

fn join(join_type: JoinType, condition: Expr) -> Operator {
    Operator::Logical(LogicalOp::Join {
        join_type,
        condition,
    })
}

struct ThreeWay {
    memo: Memo,
    a: GroupId,
    b: GroupId,
    c: GroupId,
    top_group: GroupId,
    top: ExprId,
}

fn three_way(
    top_type: JoinType,
    top_cond: Expr,
    bottom_type: JoinType,
    bottom_cond: Expr,
) -> ThreeWay {
    let mut memo = Memo::new();
    let (a, _) = memo.add_expr(scan("a"), vec![]);
    let (b, _) = memo.add_expr(scan("b"), vec![]);
    let (c, _) = memo.add_expr(scan("c"), vec![]);
    let (ab, _) = memo.add_expr(join(bottom_type, bottom_cond), vec![a, b]);
    let (top_group, top) = memo.add_expr(join(top_type, top_cond), vec![ab, c]);
    ThreeWay {
        memo,
        a,
        b,
        c,
        top_group,
        top,
    }
}

const ALL_JOIN_TYPES: [JoinType; 7] = [
    JoinType::Inner,
    JoinType::Left,
    JoinType::Right,
    JoinType::Full,
    JoinType::Semi,
    JoinType::Anti,
    JoinType::Cross,
];

// ---------------------------------------------------------------------------
// L-Asscom
// ---------------------------------------------------------------------------

#[test]
fn no_a_c_predicate_through_different_b_columns() {
    init_tracing();
    let t = three_way(
        JoinType::Inner,
        equi("b", "y", "c", "y"),
        JoinType::Inner,
        equi("a", "x", "b", "x"),
    );
    assert!(JoinLAsscom.build().apply(&t.memo, t.top).is_empty());
}

#[test]
fn existing_a_c_predicate_moves_to_new_bottom_join() {
    init_tracing();
    let t = three_way(
        JoinType::Inner,
        equi("a", "x", "c", "x"),
        JoinType::Inner,
        equi("a", "x", "b", "x"),
    );
    let results = JoinLAsscom.build().apply(&t.memo, t.top);
    assert_eq!(
        results,
        vec![RuleResult::NewChildren(
            join(JoinType::Inner, equi("a", "x", "b", "x")),
            vec![
                RuleChild::NewExpr(
                    join(JoinType::Inner, equi("a", "x", "c", "x")),
                    vec![RuleChild::Group(t.a), RuleChild::Group(t.c)],
                ),
                RuleChild::Group(t.b),
            ],
        )]
    );
}

#[test]
fn a_c_predicate_derived_through_shared_b_column() {
    init_tracing();
    let t = three_way(
        JoinType::Inner,
        equi("b", "x", "c", "x"),
        JoinType::Inner,
        equi("a", "x", "b", "x"),
    );
    let results = JoinLAsscom.build().apply(&t.memo, t.top);
    assert_eq!(results.len(), 1);
    let RuleResult::NewChildren(new_top, children) = &results[0] else {
        panic!("expected new children, got {:?}", results[0]);
    };
    // Both original predicates stay on the new top join.
    assert_eq!(
        new_top.join_condition(),
        Some(&Expr::And(vec![equi("a", "x", "b", "x"), equi("b", "x", "c", "x")]))
    );
    let RuleChild::NewExpr(new_bottom, _) = &children[0] else {
        panic!("expected a new bottom join");
    };
    assert_eq!(new_bottom.join_condition(), Some(&equi("a", "x", "c", "x")));
}

#[test]
fn no_a_c_predicate_under_outer_join() {
    init_tracing();
    let rule = JoinLAsscom.build();
    for (top_type, bottom_type) in [
        (JoinType::Left, JoinType::Inner),
        (JoinType::Left, JoinType::Left),
        (JoinType::Inner, JoinType::Left),
    ] {
        // Same shape with an `A`-`C` predicate fires.
        let linked = three_way(
            top_type,
            equi("a", "x", "c", "x"),
            bottom_type,
            equi("a", "x", "b", "x"),
        );
        assert_eq!(rule.apply(&linked.memo, linked.top).len(), 1);

        let unlinked = three_way(
            top_type,
            equi("c", "x", "c", "y"),
            bottom_type,
            equi("a", "x", "b", "x"),
        );
        assert!(
            rule.apply(&unlinked.memo, unlinked.top).is_empty(),
            "top={top_type}, bottom={bottom_type}"
        );
    }
}

#[test]
fn fires_only_for_inner_and_left_outer_pairs() {
    init_tracing();
    let rule = JoinLAsscom.build();
    for top_type in ALL_JOIN_TYPES {
        for bottom_type in ALL_JOIN_TYPES {
            let t = three_way(
                top_type,
                equi("a", "x", "c", "x"),
                bottom_type,
                equi("a", "x", "b", "x"),
            );
            let fires = !rule.apply(&t.memo, t.top).is_empty();
            let legal = matches!(top_type, JoinType::Inner | JoinType::Left)
                && matches!(bottom_type, JoinType::Inner | JoinType::Left);
            assert_eq!(fires, legal, "top={top_type}, bottom={bottom_type}");
        }
    }
}

#[test]
fn rewrite_inserts_new_group_for_a_c() {
    init_tracing();
    let mut t = three_way(
        JoinType::Inner,
        equi("a", "x", "c", "x"),
        JoinType::Inner,
        equi("a", "x", "b", "x"),
    );
    let groups_before = t.memo.num_groups();
    let results = JoinLAsscom.build().apply(&t.memo, t.top);
    let result = results.into_iter().next().unwrap();

    let new_top = t.memo.add_rule_result(t.top_group, result.clone()).unwrap();
    t.memo.mark_rule_applied(t.top, RuleType::LogicalJoinLAsscom);

    assert_eq!(t.memo.num_groups(), groups_before + 1);
    assert_eq!(t.memo.expr(new_top).group, t.top_group);
    let new_bottom_group = t.memo.expr(new_top).children[0];
    assert_eq!(t.memo.group(new_bottom_group).logical_exprs.len(), 1);
    assert_eq!(
        t.memo.output_columns(new_bottom_group),
        &[col("a", "x"), col("a", "y"), col("c", "x"), col("c", "y")]
    );

    // Inserting the same alternative twice adds nothing.
    assert_eq!(t.memo.add_rule_result(t.top_group, result), None);
    assert!(t.memo.rule_applied(t.top, RuleType::LogicalJoinLAsscom));
    assert!(!t.memo.rule_applied(new_top, RuleType::LogicalJoinLAsscom));
}

// ---------------------------------------------------------------------------
// Commute
// ---------------------------------------------------------------------------

#[test]
fn commuting_twice_returns_to_the_original() {
    init_tracing();
    let mut memo = Memo::new();
    let (a, _) = memo.add_expr(scan("a"), vec![]);
    let (b, _) = memo.add_expr(scan("b"), vec![]);
    let (g, e) = memo.add_expr(join(JoinType::Inner, equi("a", "x", "b", "x")), vec![a, b]);

    let rule = JoinCommute.build();
    let swapped = rule.apply(&memo, e).into_iter().next().unwrap();
    let e_swapped = memo.add_rule_result(g, swapped).unwrap();
    assert_eq!(memo.expr(e_swapped).children, vec![b, a]);
    assert_eq!(memo.group(g).logical_exprs.len(), 2);

    let back = rule.apply(&memo, e_swapped).into_iter().next().unwrap();
    assert_eq!(memo.add_rule_result(g, back), None);
    assert_eq!(memo.group(g).logical_exprs.len(), 2);
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

#[test]
fn default_rule_set_leaves_out_experimental_rules() {
    let rules = default_rule_set();
    let active: Vec<_> = rules
        .active_rules(&ExplorationConfig::default())
        .iter()
        .map(|r| r.rule_type())
        .collect();
    assert_eq!(active, vec![RuleType::LogicalJoinCommute]);

    let config = ExplorationConfig {
        enable_experimental_rules: true,
        ..Default::default()
    };
    assert_eq!(rules.active_rules(&config).len(), 2);

    let lasscom = rules.rule(RuleType::LogicalJoinLAsscom).unwrap();
    assert!(lasscom.is_experimental());
}

#[test]
fn experimental_rule_applies_when_invoked_directly() {
    init_tracing();
    let t = three_way(
        JoinType::Left,
        equi("a", "y", "c", "y"),
        JoinType::Left,
        equi("a", "x", "b", "x"),
    );
    let rules = default_rule_set();
    let lasscom = rules.rule(RuleType::LogicalJoinLAsscom).unwrap();
    assert_eq!(lasscom.apply(&t.memo, t.top).len(), 1);
}
