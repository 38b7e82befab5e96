//! Apportion Records
//!
//! Record-level entry points for moving measurements between group
//! levels. Records are flat JSON objects (`serde_json::Map`); reading and
//! writing files is left to the caller.
//!
//! # Examples
//!
//! ```
//! use apportion_records::{GroupingSpec, MeasurementSpec, MembershipSpec, Record};
//! use serde_json::json;
//!
//! let rows = |v: serde_json::Value| -> Vec<Record> {
//!     v.as_array().unwrap().iter().map(|r| r.as_object().unwrap().clone()).collect()
//! };
//! let states = rows(json!([{"state": "WA", "cases": 20}]));
//! let categories = rows(json!([
//!     {"state": "WA", "splitvar": "cat1", "size": 2},
//!     {"state": "WA", "splitvar": "cat2", "size": 6},
//! ]));
//!
//! let grouping = GroupingSpec::new("state", "splitvar", MembershipSpec::Categorical);
//! let measurements = MeasurementSpec::new(["cases"], Vec::<String>::new());
//! let (out, _) =
//!     apportion_records::disaggregate(&states, &categories, &grouping, &measurements).unwrap();
//!
//! assert_eq!(out[1]["cases"], json!(15.0));
//! ```

#![warn(missing_docs)]

pub mod convert;
mod error;
mod imputer;
mod partition;
mod resolve;
mod spec;

pub use error::RecordError;
pub use imputer::RecordImputer;
pub use spec::{GroupingSpec, MeasurementSpec, MembershipSpec};

pub use apportion_engine::{ImputeReport, ImputeWarning};

/// A flat record: field name to JSON scalar
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Result type alias for record operations
pub type Result<T> = std::result::Result<T, RecordError>;

/// Impute subgroup records from supergroup records with default configuration
pub fn disaggregate(
    supergroups: &[Record],
    subgroups: &[Record],
    grouping: &GroupingSpec,
    measurements: &MeasurementSpec,
) -> Result<(Vec<Record>, ImputeReport)> {
    RecordImputer::new(grouping.clone(), measurements.clone()).disaggregate(supergroups, subgroups)
}

/// Sum subgroup records into supergroup records with default configuration
///
/// `supergroups` may be empty when the grouping can be recovered from the
/// subgroup records alone.
pub fn aggregate(
    supergroups: &[Record],
    subgroups: &[Record],
    grouping: &GroupingSpec,
    measurements: &MeasurementSpec,
) -> Result<(Vec<Record>, ImputeReport)> {
    RecordImputer::new(grouping.clone(), measurements.clone()).aggregate(supergroups, subgroups)
}
