//! # Running Cost
//!
//! The numeric cost formulas belong to the costing subsystem. This crate only carries
//! the accumulated cost of a candidate through property derivation so that the caller
//! can read it back afterwards.

use serde::{Deserialize, Serialize};

/// Accumulated cost of a candidate plan. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Cost {
    pub total: f64,
}

impl Cost {
    pub fn zero() -> Self {
        Self { total: 0.0 }
    }

    pub fn new(total: f64) -> Self {
        Self { total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_ordering() {
        assert!(Cost::zero() < Cost::new(1.0));
        assert_eq!(Cost::new(2.5), Cost::new(2.5));
    }
}
