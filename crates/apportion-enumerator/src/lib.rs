//! Apportion Enumerator
//!
//! Builds the subgroup → supergroup membership map from group descriptions,
//! so callers never hand-author it.
//!
//! The Enumerator provides:
//! - Cartesian enumeration (every subgroup category recurs in every supergroup)
//! - Ragged enumeration from explicit `(subgroup, supergroup)` pairs
//! - Interval enumeration from breakpoints or labelled intervals
//! - Age-group label parsing (`"0-4 years"`, `"65+ years"`, `"6-23 months"`)
//!
//! # Examples
//!
//! ```
//! use apportion_enumerator::{CartesianEnumerator, Enumerator};
//!
//! let enumerator = CartesianEnumerator::default();
//! let map = enumerator
//!     .enumerate(&["A".to_string(), "B".to_string()], &["x".to_string(), "y".to_string()])
//!     .unwrap();
//!
//! assert_eq!(map.len(), 4);
//! assert_eq!(map.supergroup_of(&"A_x".into()).unwrap().as_str(), "A");
//! ```

#![warn(missing_docs)]

mod age;
mod cartesian;
mod config;
mod error;
mod interval;

pub use age::{AgeGroupEnumerator, AgeGroupParser};
pub use cartesian::CartesianEnumerator;
pub use config::{EnumeratorConfig, MissingSupergroupPolicy};
pub use error::EnumeratorError;
pub use interval::{breakpoint_intervals, IntervalEnumeration, IntervalEnumerator, LabeledInterval};

use apportion_domain::{Group, MembershipMap};

/// Result type alias for enumeration
pub type Result<T> = std::result::Result<T, EnumeratorError>;

/// Turns flat supergroup and subgroup descriptions into a membership map
///
/// Implementations are pure: the same input always yields the same map.
pub trait Enumerator {
    /// Enumerate the subgroup → supergroup map
    fn enumerate(&self, supergroups: &[String], subgroups: &[String]) -> Result<MembershipMap>;

    /// Attribute-less `(supergroups, subgroups)` ready to receive measurements
    fn group_skeletons(
        &self,
        supergroups: &[String],
        subgroups: &[String],
    ) -> Result<(Vec<Group>, Vec<Group>)> {
        let membership = self.enumerate(supergroups, subgroups)?;
        let supers = membership.supergroups().iter().cloned().map(Group::empty).collect();
        let subs = membership.subgroups().cloned().map(Group::empty).collect();
        Ok((supers, subs))
    }
}
