//! # Statistics
//!
//! Statistics are collected and derived outside this crate; the memo only stores them
//! per group so that a [`PlanContext`](crate::context::PlanContext) can hand them to
//! whoever needs them during derivation (costing, broadcast decisions).

use serde::{Deserialize, Serialize};

/// Statistics for a relation (or group in the memo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub row_count: f64,
    pub total_size_bytes: f64,
}

impl Statistics {
    pub fn new(row_count: f64, total_size_bytes: f64) -> Self {
        Self {
            row_count,
            total_size_bytes,
        }
    }
}
