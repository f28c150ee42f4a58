//! # Child Output Property Derivation
//!
//! Computes, bottom-up, the physical properties a plan node's output has, given the
//! properties its children already produce.
//!
//! ```text
//!     parent plan node
//!            ▲
//!            │
//!   child output property
//! ```
//!
//! The caller (the search driver) guarantees every child has been derived first and
//! passes the children's properties in child order.
//!
//! ## Dispatch
//!
//! - **OlapScan**: a hash-distributed table yields that hash distribution; anything
//!   else yields `ANY`.
//! - **HashJoin / NestedLoopJoin**: if the right side is replicated (broadcast), the
//!   join keeps the left side's distribution. Otherwise (shuffle) both sides must be
//!   hash-distributed and the join keeps the left side's distribution.
//! - **Everything else**: `ANY`.
//!
//! The shuffle result is the left child's property as-is. It is not remapped to the
//! join's output columns, so it may name columns the join does not output.
//!
//! ## Failures
//!
//! A binary join without exactly two child properties, or a shuffle join with a
//! non-hash input, is a malformed candidate. Derivation returns an error for it
//! rather than guessing a distribution.

use crate::context::PlanContext;
use crate::cost::Cost;
use crate::error::{OptimizerError, Result};
use crate::expr::{Operator, PhysicalOp, PhysicalOpKind};
use crate::memo::{GroupExpression, Memo};
use crate::properties::{DistributionSpec, PhysicalProperties};
use tracing::{debug, warn};

/// Derives a node's output property from its children's.
#[derive(Debug, Clone)]
pub struct ChildOutputPropertyDeriver {
    request_property: PhysicalProperties,
    children_output_properties: Vec<PhysicalProperties>,
    cur_total_cost: Cost,
}

impl ChildOutputPropertyDeriver {
    pub fn new(
        request_property: PhysicalProperties,
        children_output_properties: Vec<PhysicalProperties>,
        cur_total_cost: Cost,
    ) -> Self {
        Self {
            request_property,
            children_output_properties,
            cur_total_cost,
        }
    }

    pub fn output_properties(&self, ctx: &PlanContext<'_>) -> Result<PhysicalProperties> {
        match ctx.op() {
            Operator::Physical(PhysicalOp::OlapScan { .. }) => {
                self.visit_olap_scan(ctx.op().native_distribution())
            }
            Operator::Physical(PhysicalOp::HashJoin { .. }) => {
                self.visit_binary_join(PhysicalOpKind::HashJoin)
            }
            // Same policy as hash join for now; a nested loop join has no join keys to
            // partition on, so this may diverge.
            Operator::Physical(PhysicalOp::NestedLoopJoin { .. }) => {
                self.visit_binary_join(PhysicalOpKind::NestedLoopJoin)
            }
            Operator::Physical(PhysicalOp::Filter { .. } | PhysicalOp::Project { .. })
            | Operator::Logical(_) => Ok(PhysicalProperties::ANY),
        }
    }

    /// The running cost handed in by the caller, unchanged.
    pub fn cur_total_cost(&self) -> Cost {
        self.cur_total_cost
    }

    pub fn request_property(&self) -> &PhysicalProperties {
        &self.request_property
    }

    fn visit_olap_scan(
        &self,
        distribution: Option<&DistributionSpec>,
    ) -> Result<PhysicalProperties> {
        match distribution {
            Some(spec) if spec.is_hash() => PhysicalProperties::create_hash(spec.clone()),
            _ => Ok(PhysicalProperties::ANY),
        }
    }

    fn visit_binary_join(&self, operator: PhysicalOpKind) -> Result<PhysicalProperties> {
        let [left, right] = self.children_output_properties.as_slice() else {
            warn!(
                "{:?} derived with {} child properties",
                operator,
                self.children_output_properties.len()
            );
            return Err(OptimizerError::JoinChildCount {
                operator,
                actual: self.children_output_properties.len(),
            });
        };

        // broadcast
        if right.distribution_spec().is_replicated() {
            debug!("{:?} broadcast: output {}", operator, left);
            return Ok(left.clone());
        }

        // shuffle
        let left_distribution = left.distribution_spec();
        let right_distribution = right.distribution_spec();
        if !left_distribution.is_hash() || !right_distribution.is_hash() {
            warn!(
                "{:?} shuffle with non-hash input: left={}, right={}",
                operator, left_distribution, right_distribution
            );
            return Err(OptimizerError::NonHashShuffleJoin {
                operator,
                left: left_distribution.clone(),
                right: right_distribution.clone(),
            });
        }

        debug!("{:?} shuffle: output {}", operator, left);
        Ok(left.clone())
    }
}

/// Derive the output property of `group_expression` from its children's output
/// properties (in child order). `running_cost` is carried, not computed.
pub fn derive(
    memo: &Memo,
    group_expression: &GroupExpression,
    children_output_properties: Vec<PhysicalProperties>,
    request_property: PhysicalProperties,
    running_cost: Cost,
) -> Result<PhysicalProperties> {
    let ctx = PlanContext::new(memo, group_expression);
    ChildOutputPropertyDeriver::new(request_property, children_output_properties, running_cost)
        .output_properties(&ctx)
}
