//! Enumerator error types

use apportion_domain::DomainError;
use thiserror::Error;

/// Errors that can occur while enumerating groups
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnumeratorError {
    /// Malformed subgroup/supergroup nesting
    #[error("Group definition error for subgroup '{subgroup}': {reason}")]
    GroupDefinition {
        /// Offending subgroup (or supergroup, for coverage problems)
        subgroup: String,
        /// Supergroups involved, if any
        supergroups: Vec<String>,
        /// What went wrong
        reason: String,
    },

    /// A group label could not be turned into an interval
    #[error("Cannot parse group label '{label}'")]
    UnparseableLabel {
        /// The label
        label: String,
    },

    /// Breakpoints are not strictly increasing or too few
    #[error("Invalid breakpoints: {0}")]
    InvalidBreakpoints(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain invariant violated while building the map
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EnumeratorError {
    pub(crate) fn definition(
        subgroup: impl Into<String>,
        supergroups: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        EnumeratorError::GroupDefinition {
            subgroup: subgroup.into(),
            supergroups,
            reason: reason.into(),
        }
    }
}
