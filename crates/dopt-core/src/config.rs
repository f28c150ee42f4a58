//! # Exploration Configuration
//!
//! Knobs that decide which exploration rules a search driver sees from
//! [`RuleRegistry::active_rules`](crate::rule::RuleRegistry::active_rules).
//! Rules remain reachable by identity through
//! [`RuleRegistry::rule`](crate::rule::RuleRegistry::rule) regardless of these settings.

use crate::rule::RuleType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Include rules marked experimental in the active rule set.
    pub enable_experimental_rules: bool,
    /// Rules excluded from the active rule set, experimental or not.
    pub disabled_rules: Vec<RuleType>,
}

impl ExplorationConfig {
    pub fn is_disabled(&self, rule_type: RuleType) -> bool {
        self.disabled_rules.contains(&rule_type)
    }
}
