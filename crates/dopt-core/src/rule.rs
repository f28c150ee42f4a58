//! # Rule System
//!
//! An exploration rule rewrites one logical plan shape into an equivalent one,
//! widening the space the cost model chooses from. A rule is plain data:
//!
//! - a **pattern** ([`Pattern`]) selecting the plan shapes it applies to,
//! - an ordered list of **guards**, predicates over the matched nodes that must all
//!   hold,
//! - a **transform** producing either a replacement subtree or nothing, and
//! - a **[`RuleType`]** identity.
//!
//! ```text
//! Rule::new(RuleType::LogicalJoinCommute, Pattern::join(), swap_children)
//!     .when(is_commutable)
//! ```
//!
//! `when` only appends to the guard list; evaluation happens in [`Rule::apply`].
//!
//! ## No Result Is Not an Error
//!
//! A transform returning `None` means the shape matched and the guards passed but no
//! valid rewrite exists (for example, no predicate can be built for a new join). The
//! driver treats it exactly like a guard failure: nothing happens.
//!
//! ## Rule Identity
//!
//! The memo records which `RuleType` has been applied to which expression, so a driver
//! can skip repeated applications and break rewrite cycles (commuting a join back and
//! forth). Rules are stateless and safe to apply any number of times, in any order.
//!
//! ## Rule Registry
//!
//! The `RuleRegistry` collects the built rules. Experimental rules stay out of
//! [`RuleRegistry::active_rules`] unless the configuration enables them, but
//! [`RuleRegistry::rule`] hands out any rule by identity, e.g. for tests.

use crate::config::ExplorationConfig;
use crate::expr::Operator;
use crate::memo::{ExprId, GroupId, Memo};
use crate::pattern::{bindings, Binding, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Stable identity of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    LogicalJoinCommute,
    LogicalJoinLAsscom,
}

impl RuleType {
    pub fn name(&self) -> &'static str {
        match self {
            RuleType::LogicalJoinCommute => "LOGICAL_JOIN_COMMUTE",
            RuleType::LogicalJoinLAsscom => "LOGICAL_JOIN_L_ASSCOM",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Context passed to guards and transforms.
#[derive(Clone, Copy)]
pub struct OptContext<'a> {
    pub memo: &'a Memo,
}

/// A child reference in a rule result: either an existing group or a new sub-expression.
///
/// Rules that regroup joins need a group that does not exist yet. For
///
/// ```text
/// (A ⋈ B) ⋈ C  →  (A ⋈ C) ⋈ B
/// ```
///
/// the rule returns `RuleChild::NewExpr(Join, [Group(A), Group(C)])` and the memo
/// creates (or finds) the group for `A ⋈ C` on insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleChild {
    /// Reference to an existing group in the memo.
    Group(GroupId),
    /// A new sub-expression to be placed in a group of its own.
    NewExpr(Operator, Vec<RuleChild>),
}

/// Result of applying a rule to an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult {
    /// A new expression over existing child groups.
    Substitution(Operator, Vec<GroupId>),
    /// A new expression where some children are new sub-expressions.
    NewChildren(Operator, Vec<RuleChild>),
}

/// A predicate over the matched nodes.
pub type Guard = fn(&Binding<'_>, &OptContext<'_>) -> bool;

/// Builds the replacement subtree, or `None` when no valid rewrite exists.
pub type Transform = fn(&Binding<'_>, &OptContext<'_>) -> Option<RuleResult>;

/// An exploration rule.
#[derive(Clone)]
pub struct Rule {
    rule_type: RuleType,
    pattern: Pattern,
    guards: Vec<Guard>,
    transform: Transform,
    experimental: bool,
}

impl Rule {
    pub fn new(rule_type: RuleType, pattern: Pattern, transform: Transform) -> Self {
        Self {
            rule_type,
            pattern,
            guards: Vec::new(),
            transform,
            experimental: false,
        }
    }

    /// Append a guard. Guards run in the order they were added.
    pub fn when(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    /// Keep this rule out of the default active rule set.
    pub fn experimental(mut self) -> Self {
        self.experimental = true;
        self
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_experimental(&self) -> bool {
        self.experimental
    }

    /// Run guards and transform on one binding.
    pub fn apply_binding(&self, binding: &Binding<'_>, ctx: &OptContext<'_>) -> Option<RuleResult> {
        if let Some(i) = self.guards.iter().position(|guard| !guard(binding, ctx)) {
            trace!(
                "rule {} rejected expr {} at guard {}",
                self.rule_type,
                binding.expr_id,
                i
            );
            return None;
        }
        let result = (self.transform)(binding, ctx);
        match &result {
            Some(_) => debug!("rule {} fired on expr {}", self.rule_type, binding.expr_id),
            None => trace!(
                "rule {} produced no result for expr {}",
                self.rule_type,
                binding.expr_id
            ),
        }
        result
    }

    /// Apply the rule to a memo expression: at most one result per binding of the
    /// pattern, none when the pattern does not match.
    pub fn apply(&self, memo: &Memo, expr_id: ExprId) -> Vec<RuleResult> {
        let ctx = OptContext { memo };
        bindings(memo, expr_id, &self.pattern)
            .iter()
            .filter_map(|binding| self.apply_binding(binding, &ctx))
            .collect()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("rule_type", &self.rule_type)
            .field("pattern", &self.pattern)
            .field("guards", &self.guards.len())
            .field("experimental", &self.experimental)
            .finish()
    }
}

/// Something that builds a [`Rule`].
pub trait RuleFactory {
    fn build(&self) -> Rule;
}

/// Registry of exploration rules.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look a rule up by identity, experimental or not.
    pub fn rule(&self, rule_type: RuleType) -> Option<&Rule> {
        self.rules.iter().find(|r| r.rule_type() == rule_type)
    }

    /// Rules a search driver should apply under `config`.
    pub fn active_rules(&self, config: &ExplorationConfig) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| !config.is_disabled(r.rule_type()))
            .filter(|r| config.enable_experimental_rules || !r.is_experimental())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ColumnRef, Expr, JoinType, LogicalOp, TableRef};

    fn scan_op(name: &str) -> Operator {
        Operator::Logical(LogicalOp::Scan {
            table: TableRef {
                schema: "s".into(),
                name: name.into(),
            },
            columns: vec![ColumnRef::new(name, "x", 0)],
            predicate: None,
        })
    }

    fn join_op(join_type: JoinType) -> Operator {
        Operator::Logical(LogicalOp::Join {
            join_type,
            condition: Expr::always_true(),
        })
    }

    fn swap(binding: &Binding<'_>, _ctx: &OptContext<'_>) -> Option<RuleResult> {
        Some(RuleResult::Substitution(
            binding.op().clone(),
            vec![binding.child_group(1)?, binding.child_group(0)?],
        ))
    }

    fn nothing(_binding: &Binding<'_>, _ctx: &OptContext<'_>) -> Option<RuleResult> {
        None
    }

    fn is_inner(binding: &Binding<'_>, _ctx: &OptContext<'_>) -> bool {
        binding.op().join_type() == Some(JoinType::Inner)
    }

    fn memo_with_join(join_type: JoinType) -> (Memo, ExprId) {
        let mut memo = Memo::new();
        let (g_a, _) = memo.add_expr(scan_op("a"), vec![]);
        let (g_b, _) = memo.add_expr(scan_op("b"), vec![]);
        let (_, e) = memo.add_expr(join_op(join_type), vec![g_a, g_b]);
        (memo, e)
    }

    #[test]
    fn test_rule_type_names() {
        assert_eq!(RuleType::LogicalJoinLAsscom.to_string(), "LOGICAL_JOIN_L_ASSCOM");
        assert_eq!(RuleType::LogicalJoinCommute.name(), "LOGICAL_JOIN_COMMUTE");
    }

    #[test]
    fn test_guards_gate_transform() {
        let rule = Rule::new(RuleType::LogicalJoinCommute, Pattern::join(), swap).when(is_inner);

        let (memo, e) = memo_with_join(JoinType::Inner);
        assert_eq!(rule.apply(&memo, e).len(), 1);

        let (memo, e) = memo_with_join(JoinType::Left);
        assert!(rule.apply(&memo, e).is_empty());
    }

    #[test]
    fn test_no_result_is_a_non_event() {
        let rule = Rule::new(RuleType::LogicalJoinCommute, Pattern::join(), nothing);
        let (memo, e) = memo_with_join(JoinType::Inner);
        assert!(rule.apply(&memo, e).is_empty());
    }

    #[test]
    fn test_pattern_mismatch_yields_nothing() {
        let rule = Rule::new(RuleType::LogicalJoinCommute, Pattern::join_join_left(), swap);
        let (memo, e) = memo_with_join(JoinType::Inner);
        assert!(rule.apply(&memo, e).is_empty());
    }

    #[test]
    fn test_registry_active_rules() {
        let mut registry = RuleRegistry::new();
        registry.add_rule(Rule::new(RuleType::LogicalJoinCommute, Pattern::join(), swap));
        registry.add_rule(
            Rule::new(RuleType::LogicalJoinLAsscom, Pattern::join_join_left(), nothing)
                .experimental(),
        );

        let active: Vec<_> = registry
            .active_rules(&ExplorationConfig::default())
            .iter()
            .map(|r| r.rule_type())
            .collect();
        assert_eq!(active, vec![RuleType::LogicalJoinCommute]);

        let config = ExplorationConfig {
            enable_experimental_rules: true,
            disabled_rules: vec![RuleType::LogicalJoinCommute],
        };
        let active: Vec<_> = registry.active_rules(&config).iter().map(|r| r.rule_type()).collect();
        assert_eq!(active, vec![RuleType::LogicalJoinLAsscom]);

        // Experimental rules remain reachable directly.
        assert!(registry.rule(RuleType::LogicalJoinLAsscom).unwrap().is_experimental());
    }
}
