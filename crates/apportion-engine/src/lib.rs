//! Apportion Engine
//!
//! Moves measurements between a coarse partition of a population
//! (supergroups) and a finer partition that refines it (subgroups).
//!
//! The engine provides:
//! - Proportion calculators (categorical and continuous, uniform density)
//! - Mass/density conversion
//! - Disaggregation of supergroup measurements into subgroups
//! - Aggregation of subgroup measurements back into supergroups
//!
//! # Examples
//!
//! ```
//! use apportion_domain::{Attribute, Group, ImputeAction, MembershipMap};
//!
//! let supergroups = vec![Group::new(
//!     "A".into(),
//!     vec![
//!         Attribute::mass("size", 100.0, ImputeAction::Ignore).unwrap(),
//!         Attribute::mass("count", 20.0, ImputeAction::Impute).unwrap(),
//!     ],
//! )
//! .unwrap()];
//! let sub = |id: &str, w: f64| {
//!     Group::new(id.into(), vec![Attribute::mass("w", w, ImputeAction::Ignore).unwrap()]).unwrap()
//! };
//! let subgroups = vec![sub("a1", 30.0), sub("a2", 70.0)];
//! let membership =
//!     MembershipMap::from_pairs(vec![("a1".into(), "A".into()), ("a2".into(), "A".into())]).unwrap();
//!
//! let (groups, report) =
//!     apportion_engine::disaggregate(&supergroups, &subgroups, &membership, "w").unwrap();
//!
//! let count = groups[0].attribute("count").unwrap().numeric_value().unwrap();
//! assert!((count - 6.0).abs() < 1e-9);
//! assert!(report.is_clean());
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
pub mod converter;
mod disaggregator;
mod error;
mod index;
mod proportion;
mod report;

pub use aggregator::Aggregator;
pub use config::EngineConfig;
pub use disaggregator::Disaggregator;
pub use error::EngineError;
pub use index::GroupIndex;
pub use proportion::{
    CategoricalProportions, ContinuousProportions, ProportionCalculator, WeightingDensity,
};
pub use report::{ImputeReport, ImputeWarning};

use apportion_domain::{Group, GroupId, MembershipMap};
use rayon::prelude::*;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Disaggregate with categorical weights taken from `weighting_attribute`
/// and default configuration
pub fn disaggregate(
    supergroups: &[Group],
    subgroups: &[Group],
    membership: &MembershipMap,
    weighting_attribute: &str,
) -> Result<(Vec<Group>, ImputeReport)> {
    Disaggregator::new(CategoricalProportions::new(weighting_attribute)).disaggregate(
        supergroups,
        subgroups,
        membership,
    )
}

/// Aggregate subgroups into the supergroups of `membership` with default
/// configuration
pub fn aggregate(subgroups: &[Group], membership: &MembershipMap) -> Result<(Vec<Group>, ImputeReport)> {
    Aggregator::default().aggregate(&[], subgroups, membership)
}

/// Run `work` for each supergroup, on the rayon pool for large inputs
///
/// Results keep the order of `supergroups`; the first error wins.
pub(crate) fn per_supergroup<T, F>(config: &EngineConfig, supergroups: &[GroupId], work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&GroupId) -> Result<T> + Sync + Send,
{
    if config.use_parallel(supergroups.len()) {
        tracing::debug!("Processing {} supergroups in parallel", supergroups.len());
        supergroups.par_iter().map(&work).collect()
    } else {
        supergroups.iter().map(&work).collect()
    }
}
