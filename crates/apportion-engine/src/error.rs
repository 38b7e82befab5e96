//! Error types for disaggregation and aggregation

use apportion_domain::DomainError;
use thiserror::Error;

/// Errors that can occur while computing weights or moving measurements
/// between group levels
///
/// Every variant names the offending group and, where one is involved,
/// the attribute.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The membership map and the supplied groups disagree
    #[error("Unknown group '{group}': {reason}")]
    UnknownGroup {
        /// Group id
        group: String,
        /// Which side is missing it
        reason: String,
    },

    /// The same group id was supplied twice
    #[error("Group '{group}' supplied more than once")]
    DuplicateGroup {
        /// Group id
        group: String,
    },

    /// A density measurement needs a size measurement the group lacks
    #[error("Group '{group}' has no size measurement '{size}' needed for '{measurement}'")]
    MissingSizeMeasurement {
        /// Group id
        group: String,
        /// Measurement being converted
        measurement: String,
        /// Expected size attribute name
        size: String,
    },

    /// A zero-size group was used as a density denominator
    #[error("Division by zero: group '{group}' has size 0 while converting '{measurement}'")]
    DivisionByZero {
        /// Group id
        group: String,
        /// Measurement being converted
        measurement: String,
    },

    /// A subgroup lacks a measurement its siblings carry
    #[error("Group '{group}' has no measurement '{measurement}'")]
    MissingMeasurement {
        /// Group id
        group: String,
        /// Measurement name
        measurement: String,
    },

    /// Subgroups of one supergroup disagree on a copied attribute
    #[error(
        "Inconsistent copy attribute '{attribute}' under supergroup '{supergroup}': '{first}' vs '{second}'"
    )]
    InconsistentCopyAttribute {
        /// Supergroup being aggregated
        supergroup: String,
        /// Attribute name
        attribute: String,
        /// First value seen
        first: String,
        /// Conflicting value
        second: String,
    },

    /// A subgroup lacks the weighting attribute
    #[error("Group '{group}' has no weighting attribute '{attribute}'")]
    MissingWeightingAttribute {
        /// Group id
        group: String,
        /// Weighting attribute name
        attribute: String,
    },

    /// The weighting attribute has an unusable value
    #[error("Group '{group}' has invalid weighting value for '{attribute}': {value}")]
    InvalidWeightingValue {
        /// Group id
        group: String,
        /// Weighting attribute name
        attribute: String,
        /// Offending value
        value: String,
    },

    /// An attribute marked for imputation is not a mass or density
    #[error("Attribute '{attribute}' on group '{group}' is not a measurement")]
    NotAMeasurement {
        /// Group id
        group: String,
        /// Attribute name
        attribute: String,
    },

    /// Subgroups do not account for their supergroup's weighting total
    #[error(
        "Subgroups of '{supergroup}' do not cover it on '{attribute}': expected {expected}, found {actual}"
    )]
    IncompleteCoverage {
        /// Supergroup id
        supergroup: String,
        /// Weighting attribute name
        attribute: String,
        /// Supergroup value
        expected: String,
        /// Subgroup total
        actual: String,
    },

    /// A calculator returned weights that do not sum to one
    #[error("Weights for supergroup '{supergroup}' sum to {sum}, not 1")]
    UnnormalizedWeights {
        /// Supergroup id
        supergroup: String,
        /// Actual sum
        sum: f64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain invariant violated while building a derived group
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    pub(crate) fn unknown(group: impl ToString, reason: impl Into<String>) -> Self {
        EngineError::UnknownGroup {
            group: group.to_string(),
            reason: reason.into(),
        }
    }
}
