//! # L-Assoc-Comm Predicate Helper
//!
//! Pure functions shared by the guard and the transform of
//! [`JoinLAsscom`](crate::join_lasscom::JoinLAsscom). Nothing here holds state between
//! the guard and the transform; each call recomputes what it needs from the binding.
//!
//! ```text
//!      topJoin                newTopJoin
//!      /     \                 /     \
//! bottomJoin  C   -->  newBottomJoin  B
//!  /    \                  /    \
//! A      B                A      C
//! ```
//!
//! ## Side Resolution
//!
//! Every predicate column must belong to exactly one of `A`, `B`, `C` (by the output
//! columns of their groups). Conjuncts are then classified by the sides they touch.
//!
//! ## Predicate Placement
//!
//! - **Inner over inner**: all conjuncts of both joins are pooled. Those whose columns
//!   lie in `A ∪ C` and touch both sides go to the new bottom join; the rest go to the
//!   new top join. If none exists, a column equality `a = c` is derived transitively
//!   from the equivalence classes the pooled equalities induce (`a = b AND b = c`).
//! - **Any outer join involved**: conjuncts do not cross join types. The top
//!   condition moves as a whole to the new bottom join (it must only reference `A` and
//!   `C`, which the structural check enforces) and must contain at least one conjunct
//!   touching both sides; the bottom condition moves as a whole to the new top join.

use dopt_core::expr::{ColumnRef, Expr, JoinType, LogicalOp, Operator};
use dopt_core::memo::{GroupId, Memo};
use dopt_core::pattern::Binding;
use std::collections::HashSet;

/// The pieces of a matched `Join(Join(A, B), C)`.
#[derive(Debug, Clone)]
pub struct LAsscomJoins<'a> {
    pub top_type: JoinType,
    pub top_condition: &'a Expr,
    pub bottom_type: JoinType,
    pub bottom_condition: &'a Expr,
    pub a: GroupId,
    pub b: GroupId,
    pub c: GroupId,
}

impl<'a> LAsscomJoins<'a> {
    /// Unpack a binding of `Join(Join(Any, Any), Any)`.
    pub fn from_binding(binding: &Binding<'a>) -> Option<Self> {
        let Operator::Logical(LogicalOp::Join {
            join_type: top_type,
            condition: top_condition,
        }) = binding.op()
        else {
            return None;
        };
        let bottom = binding.child_binding(0)?;
        let Operator::Logical(LogicalOp::Join {
            join_type: bottom_type,
            condition: bottom_condition,
        }) = bottom.op()
        else {
            return None;
        };
        Some(Self {
            top_type: *top_type,
            top_condition,
            bottom_type: *bottom_type,
            bottom_condition,
            a: bottom.child_group(0)?,
            b: bottom.child_group(1)?,
            c: binding.child_group(1)?,
        })
    }

    fn both_inner(&self) -> bool {
        self.top_type.is_inner_join() && self.bottom_type.is_inner_join()
    }
}

/// Conditions for the rewritten joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJoinConditions {
    /// Condition of `newBottomJoin(A, C)`.
    pub bottom: Expr,
    /// Condition of `newTopJoin(newBottomJoin, B)`.
    pub top: Expr,
}

struct Sides {
    a: HashSet<ColumnRef>,
    b: HashSet<ColumnRef>,
    c: HashSet<ColumnRef>,
}

impl Sides {
    fn of(joins: &LAsscomJoins<'_>, memo: &Memo) -> Self {
        let cols = |g: GroupId| memo.output_columns(g).iter().cloned().collect::<HashSet<_>>();
        Self {
            a: cols(joins.a),
            b: cols(joins.b),
            c: cols(joins.c),
        }
    }

    fn in_a_or_c(&self, col: &ColumnRef) -> bool {
        self.a.contains(col) || self.c.contains(col)
    }

    /// Columns all in `A ∪ C`, at least one in each.
    fn links_a_and_c(&self, pred: &Expr) -> bool {
        let cols = pred.columns();
        cols.iter().all(|c| self.in_a_or_c(c))
            && cols.iter().any(|c| self.a.contains(*c))
            && cols.iter().any(|c| self.c.contains(*c))
    }
}

/// Structural compatibility of the rewrite: the three inputs have disjoint outputs,
/// each condition only references columns its join can see, and when an outer join is
/// involved the top condition does not depend on `B`.
pub fn check(joins: &LAsscomJoins<'_>, memo: &Memo) -> bool {
    let sides = Sides::of(joins, memo);
    if !sides.a.is_disjoint(&sides.b)
        || !sides.a.is_disjoint(&sides.c)
        || !sides.b.is_disjoint(&sides.c)
    {
        return false;
    }

    let bottom_ok = joins
        .bottom_condition
        .columns()
        .iter()
        .all(|c| sides.a.contains(*c) || sides.b.contains(*c));
    let top_ok = joins
        .top_condition
        .columns()
        .iter()
        .all(|c| sides.in_a_or_c(c) || sides.b.contains(*c));
    if !bottom_ok || !top_ok {
        return false;
    }

    joins.both_inner()
        || joins
            .top_condition
            .columns()
            .iter()
            .all(|c| sides.in_a_or_c(c))
}

/// Build the conditions of the rewritten joins, or `None` when no predicate between
/// `A` and `C` can be found or derived.
pub fn new_join_conditions(joins: &LAsscomJoins<'_>, memo: &Memo) -> Option<NewJoinConditions> {
    let sides = Sides::of(joins, memo);

    if !joins.both_inner() {
        let links = joins
            .top_condition
            .conjuncts()
            .iter()
            .any(|pred| sides.links_a_and_c(pred));
        return links.then(|| NewJoinConditions {
            bottom: joins.top_condition.clone(),
            top: joins.bottom_condition.clone(),
        });
    }

    let (bottom, rest): (Vec<Expr>, Vec<Expr>) = joins
        .bottom_condition
        .conjuncts()
        .into_iter()
        .chain(joins.top_condition.conjuncts())
        .cloned()
        .partition(|pred| sides.links_a_and_c(pred));

    let bottom = if bottom.is_empty() {
        let all: Vec<&Expr> = joins
            .bottom_condition
            .conjuncts()
            .into_iter()
            .chain(joins.top_condition.conjuncts())
            .collect();
        vec![derive_a_c_equality(&all, &sides)?]
    } else {
        bottom
    };

    Some(NewJoinConditions {
        bottom: Expr::conjunction(bottom),
        top: Expr::conjunction(rest),
    })
}

/// Find `a = c` implied by the column equalities among `preds`.
///
/// Classes are merged in predicate order and the first `A` and first `C` column of the
/// first class holding both are used, so the result is deterministic.
fn derive_a_c_equality(preds: &[&Expr], sides: &Sides) -> Option<Expr> {
    let mut classes: Vec<Vec<&ColumnRef>> = Vec::new();
    for (l, r) in preds.iter().filter_map(|p| p.as_column_equality()) {
        let li = classes.iter().position(|class| class.contains(&l));
        let ri = classes.iter().position(|class| class.contains(&r));
        match (li, ri) {
            (Some(i), Some(j)) if i == j => {}
            (Some(i), Some(j)) => {
                let (keep, merge) = (i.min(j), i.max(j));
                let merged = classes.remove(merge);
                classes[keep].extend(merged);
            }
            (Some(i), None) => classes[i].push(r),
            (None, Some(j)) => classes[j].push(l),
            (None, None) => classes.push(vec![l, r]),
        }
    }

    classes.iter().find_map(|class| {
        let a_col = class.iter().find(|c| sides.a.contains(**c))?;
        let c_col = class.iter().find(|c| sides.c.contains(**c))?;
        Some(Expr::column_eq((*a_col).clone(), (*c_col).clone()))
    })
}
