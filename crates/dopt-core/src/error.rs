//! # Optimizer Errors
//!
//! Only fatal conditions are errors here. A malformed candidate plan (a binary join
//! handed the wrong number of child properties, a shuffle join whose inputs are not
//! hash-partitioned) must never reach property derivation; when it does, the search
//! driver gets an `Err` and drops that one candidate instead of costing a plan with a
//! guessed distribution.
//!
//! Rule inapplicability is *not* an error: rules return no result and the driver
//! moves on.

use crate::expr::PhysicalOpKind;
use crate::properties::DistributionSpec;
use thiserror::Error;

/// Result type alias using `OptimizerError`.
pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OptimizerError {
    /// A binary join was derived with a child property count other than two.
    #[error("{operator:?} expects 2 child output properties, got {actual}")]
    JoinChildCount {
        operator: PhysicalOpKind,
        actual: usize,
    },

    /// A shuffle join (right side not replicated) with a non-hash-distributed input.
    #[error("{operator:?} shuffle requires hash-distributed children, got left={left}, right={right}")]
    NonHashShuffleJoin {
        operator: PhysicalOpKind,
        left: DistributionSpec,
        right: DistributionSpec,
    },

    /// `PhysicalProperties::create_hash` was given a non-hash distribution.
    #[error("expected a hash distribution, got {0}")]
    NotHashDistribution(DistributionSpec),
}
