//! # Built-in Join-Reordering Rules
//!
//! Exploration rules (logical -> logical) that widen the join-order search space. Each
//! rule type is a factory; [`RuleFactory::build`] produces the `Rule` value that the
//! search driver applies to matching memo expressions.
//!
//! - **`JoinCommute`**: swaps the sides of inner and cross joins (`A ⋈ B -> B ⋈ A`).
//! - **`JoinLAsscom`**: left-associative commutation of two stacked joins
//!   (`(A ⋈ B) ⋈ C -> (A ⋈ C) ⋈ B`) for inner and left-outer joins. Experimental.

pub mod join_commute;
pub mod join_lasscom;
mod join_lasscom_helper;

use dopt_core::rule::{RuleFactory, RuleRegistry};

/// Create a registry with all built-in exploration rules.
///
/// Experimental rules are registered too; [`RuleRegistry::active_rules`] filters them
/// out unless the exploration config enables them.
pub fn default_rule_set() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.add_rule(join_commute::JoinCommute.build());
    registry.add_rule(join_lasscom::JoinLAsscom.build());
    registry
}
