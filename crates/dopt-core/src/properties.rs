//! # Physical and Logical Properties
//!
//! ## Physical Properties
//!
//! Physical properties describe *how* a plan's output is laid out at runtime. Here that
//! is only the data distribution across execution workers:
//!
//! - **`Any`**: no guarantee about which worker holds which row.
//! - **`Replicated`**: every worker holds a full copy (the build side of a broadcast join).
//! - **`Hash(columns)`**: rows are partitioned by the hash of `columns`, in that order.
//!
//! A sort-order component may join the distribution later; `PhysicalProperties`
//! already wraps the distribution so callers do not need to change when it does.
//!
//! ## The "Any" Property Set
//!
//! `PhysicalProperties::ANY` is both "no requirement" when used as a request and
//! "nothing known" when derived as an output.
//!
//! ## Logical Properties
//!
//! Logical properties are shared by all expressions in a group: the columns the group
//! produces. Join-reordering rules use them to decide which side a predicate belongs to.

use crate::error::{OptimizerError, Result};
use crate::expr::ColumnRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a plan node's output rows are spread across workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionSpec {
    #[default]
    Any,
    Replicated,
    Hash(Vec<ColumnRef>),
}

impl DistributionSpec {
    pub fn is_hash(&self) -> bool {
        matches!(self, DistributionSpec::Hash(_))
    }

    pub fn is_replicated(&self) -> bool {
        matches!(self, DistributionSpec::Replicated)
    }

    pub fn hash_columns(&self) -> Option<&[ColumnRef]> {
        match self {
            DistributionSpec::Hash(cols) => Some(cols),
            _ => None,
        }
    }

    /// Check whether this (provided) distribution meets `required`.
    ///
    /// - `Any` is always met.
    /// - `Replicated` is only met by `Replicated`.
    /// - `Hash(cols)` is only met by a hash distribution on exactly `cols`, in order;
    ///   partitioning on a different column list does not co-locate the same rows.
    pub fn satisfies(&self, required: &DistributionSpec) -> bool {
        match required {
            DistributionSpec::Any => true,
            DistributionSpec::Replicated => self.is_replicated(),
            DistributionSpec::Hash(_) => self == required,
        }
    }
}

impl fmt::Display for DistributionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionSpec::Any => f.write_str("ANY"),
            DistributionSpec::Replicated => f.write_str("REPLICATED"),
            DistributionSpec::Hash(cols) => {
                f.write_str("HASH[")?;
                for (i, c) in cols.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Physical properties of a plan node's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalProperties {
    distribution: DistributionSpec,
}

impl PhysicalProperties {
    pub const ANY: PhysicalProperties = PhysicalProperties {
        distribution: DistributionSpec::Any,
    };

    pub const REPLICATED: PhysicalProperties = PhysicalProperties {
        distribution: DistributionSpec::Replicated,
    };

    /// Wrap a hash distribution. This is a narrowing constructor: any other spec is
    /// rejected rather than silently widened to `ANY`.
    pub fn create_hash(spec: DistributionSpec) -> Result<Self> {
        if !spec.is_hash() {
            return Err(OptimizerError::NotHashDistribution(spec));
        }
        Ok(Self { distribution: spec })
    }

    pub fn distribution_spec(&self) -> &DistributionSpec {
        &self.distribution
    }

    pub fn satisfies(&self, required: &PhysicalProperties) -> bool {
        self.distribution.satisfies(&required.distribution)
    }
}

impl fmt::Display for PhysicalProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{distribution={}}}", self.distribution)
    }
}

/// Logical properties are derived from the logical content of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalProperties {
    /// Output columns of this group.
    pub output_columns: Vec<ColumnRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(cols: &[(&str, &str)]) -> DistributionSpec {
        DistributionSpec::Hash(cols.iter().map(|(t, n)| ColumnRef::new(*t, *n, 0)).collect())
    }

    #[test]
    fn test_create_hash_accepts_only_hash() {
        let props = PhysicalProperties::create_hash(hash(&[("t", "k")])).unwrap();
        assert_eq!(props.distribution_spec(), &hash(&[("t", "k")]));

        assert_eq!(
            PhysicalProperties::create_hash(DistributionSpec::Replicated),
            Err(OptimizerError::NotHashDistribution(DistributionSpec::Replicated))
        );
        assert!(PhysicalProperties::create_hash(DistributionSpec::Any).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = PhysicalProperties::create_hash(hash(&[("t", "k")])).unwrap();
        let b = PhysicalProperties::create_hash(hash(&[("t", "k")])).unwrap();
        let c = PhysicalProperties::create_hash(hash(&[("t", "j")])).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(PhysicalProperties::default(), PhysicalProperties::ANY);
    }

    #[test]
    fn test_satisfies() {
        let any = PhysicalProperties::ANY;
        let replicated = PhysicalProperties::REPLICATED;
        let hk = PhysicalProperties::create_hash(hash(&[("t", "k")])).unwrap();
        let hkj = PhysicalProperties::create_hash(hash(&[("t", "k"), ("t", "j")])).unwrap();

        assert!(any.satisfies(&any));
        assert!(hk.satisfies(&any));
        assert!(replicated.satisfies(&any));

        assert!(replicated.satisfies(&replicated));
        assert!(!hk.satisfies(&replicated));
        assert!(!any.satisfies(&replicated));

        assert!(hk.satisfies(&hk));
        assert!(!hkj.satisfies(&hk));
        assert!(!replicated.satisfies(&hk));
    }

    #[test]
    fn test_display() {
        assert_eq!(PhysicalProperties::ANY.to_string(), "{distribution=ANY}");
        assert_eq!(hash(&[("a", "k"), ("a", "j")]).to_string(), "HASH[a.k, a.j]");
    }
}
