//! Error types for the record adapter

use apportion_domain::DomainError;
use apportion_engine::EngineError;
use apportion_enumerator::EnumeratorError;
use thiserror::Error;

/// Errors that can occur while turning records into groups and back
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A record lacks a field it must carry
    #[error("{side} record {index} has no field '{field}'")]
    MissingField {
        /// "supergroup" or "subgroup"
        side: &'static str,
        /// Position of the record in its input
        index: usize,
        /// Field name
        field: String,
    },

    /// Two records describe the same group in the same partition
    #[error("{side} group '{group}' appears more than once{partition}")]
    DuplicateRecord {
        /// "supergroup" or "subgroup"
        side: &'static str,
        /// Group id
        group: String,
        /// Loop-over partition, empty when there is none
        partition: String,
    },

    /// A field holds a value of the wrong shape
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// What was wrong
        reason: String,
    },

    /// One side has a loop-over partition the other lacks
    #[error("Loop-over partition {partition} has {side} records but no counterpart")]
    LoopKeyMismatch {
        /// The partition key, rendered
        partition: String,
        /// Side that has it
        side: &'static str,
    },

    /// Grouping, measurement or enumerator settings are inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from enumeration
    #[error(transparent)]
    Enumerator(#[from] EnumeratorError),

    /// Error from the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Error from the domain layer
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RecordError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        RecordError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
