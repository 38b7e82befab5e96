//! Domain construction errors

use thiserror::Error;

/// Errors raised when a domain value would violate one of its invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A group id was empty
    #[error("Group id cannot be empty")]
    EmptyGroupId,

    /// A measurement carried a value that is not a number
    #[error("Measurement '{name}' must be numeric, got {value}")]
    NonNumericMeasurement {
        /// Attribute name
        name: String,
        /// Rendered offending value
        value: String,
    },

    /// A measurement carried a negative or non-finite value
    #[error("Measurement '{name}' must be a finite value >= 0, got {value}")]
    InvalidMeasurementValue {
        /// Attribute name
        name: String,
        /// Offending value
        value: f64,
    },

    /// An impute action that the attribute kind cannot honour
    #[error("Attribute '{name}' of kind {kind} cannot use impute action {action}")]
    InvalidImputeAction {
        /// Attribute name
        name: String,
        /// Requested action
        action: String,
        /// Attribute kind
        kind: String,
    },

    /// Two attributes with the same name on one group
    #[error("Group '{group}' already has an attribute named '{name}'")]
    DuplicateAttribute {
        /// Group id
        group: String,
        /// Attribute name
        name: String,
    },

    /// Interval bounds out of order or not numbers
    #[error("Invalid interval [{lower}, {upper})")]
    InvalidInterval {
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// A set of intervals does not tile its target exactly
    #[error("Intervals do not span {target}: {reason}")]
    IntervalCoverage {
        /// Rendered target interval
        target: String,
        /// What went wrong
        reason: String,
    },

    /// A subgroup was mapped to more than one supergroup
    #[error("Subgroup '{subgroup}' is mapped to both '{first}' and '{second}'")]
    AmbiguousMembership {
        /// Subgroup id
        subgroup: String,
        /// Supergroup it was first mapped to
        first: String,
        /// Conflicting supergroup
        second: String,
    },

    /// A group is both a supergroup and a subgroup without being one-to-one
    #[error("Group '{group}' is both a supergroup and a subgroup but is not mapped one-to-one")]
    NestedMembership {
        /// Group id
        group: String,
    },

    /// A subgroup had no weighting value
    #[error("No weighting value supplied for subgroup '{group}'")]
    MissingWeight {
        /// Subgroup id
        group: String,
    },

    /// A weighting value was negative or not finite
    #[error("Weighting value for subgroup '{group}' must be finite and >= 0, got {value}")]
    InvalidWeight {
        /// Subgroup id
        group: String,
        /// Offending value
        value: f64,
    },
}
