//! # dopt-core: Property and Exploration Core of a Distributed Cascades Optimizer
//!
//! This crate holds the pieces of a Cascades-style optimizer that are purely local
//! computations over the memo: deriving the data distribution each physical plan node
//! produces, and the framework exploration rules are expressed in. The search driver,
//! cost formulas and statistics collection live elsewhere and call into this crate.
//!
//! ## Module Overview
//!
//! - **`memo`**: groups and group expressions; the structure the driver owns and this
//!   crate borrows.
//! - **`expr`**: scalar expressions and the closed logical/physical operator union.
//! - **`properties`**: `DistributionSpec` and `PhysicalProperties`.
//! - **`deriver`**: bottom-up derivation of a node's output property from its children's.
//! - **`context`**: `PlanContext`, the per-call read view the deriver works on.
//! - **`pattern`**: structural patterns and their bindings in the memo.
//! - **`rule`**: rules as `{pattern, guards, transform, identity}` and the registry.
//! - **`config`**: which rules are active.
//! - **`error`**: fatal derivation errors.
//! - **`cost`** / **`stats`**: values carried through for the costing subsystem.

pub mod config;
pub mod context;
pub mod cost;
pub mod deriver;
pub mod error;
pub mod expr;
pub mod memo;
pub mod pattern;
pub mod properties;
pub mod rule;
pub mod stats;

pub use error::{OptimizerError, Result};
