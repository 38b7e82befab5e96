//! Attributes and measurements
//!
//! One record type covers both: an `Attribute` whose kind is `Mass` or
//! `Density` is a measurement and may be imputed; a `Plain` attribute can
//! only be copied or ignored when moving across group levels.

use crate::{AttributeValue, DomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to an attribute when moving from one group level to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeAction {
    /// Pass through unchanged to every subgroup (or require agreement when aggregating)
    Copy,
    /// Drop when moving across group levels
    Ignore,
    /// Split by weight (or sum when aggregating)
    Impute,
}

impl ImputeAction {
    /// Get the action name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ImputeAction::Copy => "copy",
            ImputeAction::Ignore => "ignore",
            ImputeAction::Impute => "impute",
        }
    }
}

/// How an attribute behaves under disaggregation
///
/// Mass-like measurements are things like counts, density-like measurements
/// are rates or proportions and need a size to be turned into mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Not a measurement
    Plain,
    /// Additive quantity
    Mass,
    /// Per-unit-size quantity
    Density,
}

impl MeasurementKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Plain => "plain",
            MeasurementKind::Mass => "mass",
            MeasurementKind::Density => "density",
        }
    }

    /// Is this kind a measurement (mass or density)?
    pub fn is_measurement(&self) -> bool {
        !matches!(self, MeasurementKind::Plain)
    }
}

/// A named value on a group
///
/// Validated at construction and immutable afterwards; "modifying" an
/// attribute always produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value: AttributeValue,
    action: ImputeAction,
    kind: MeasurementKind,
}

impl Attribute {
    /// Create a new attribute, validating the action/kind/value combination
    ///
    /// # Errors
    /// - `InvalidImputeAction` if `action` is `Impute` and `kind` is `Plain`
    /// - `NonNumericMeasurement` if a measurement value is not a number
    /// - `InvalidMeasurementValue` if a measurement value is negative or not finite
    pub fn new(
        name: impl Into<String>,
        value: AttributeValue,
        action: ImputeAction,
        kind: MeasurementKind,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        if action == ImputeAction::Impute && !kind.is_measurement() {
            return Err(DomainError::InvalidImputeAction {
                name,
                action: action.as_str().to_string(),
                kind: kind.as_str().to_string(),
            });
        }

        if kind.is_measurement() {
            let Some(number) = value.as_f64() else {
                return Err(DomainError::NonNumericMeasurement {
                    name,
                    value: value.to_string(),
                });
            };
            if !number.is_finite() || number < 0.0 {
                return Err(DomainError::InvalidMeasurementValue { name, value: number });
            }
        }

        Ok(Self {
            name,
            value,
            action,
            kind,
        })
    }

    /// Create a plain (non-measurement) attribute
    pub fn plain(
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
        action: ImputeAction,
    ) -> Result<Self, DomainError> {
        Self::new(name, value.into(), action, MeasurementKind::Plain)
    }

    /// Create a mass-like measurement
    pub fn mass(name: impl Into<String>, value: f64, action: ImputeAction) -> Result<Self, DomainError> {
        Self::new(name, AttributeValue::Number(value), action, MeasurementKind::Mass)
    }

    /// Create a density-like measurement
    pub fn density(name: impl Into<String>, value: f64, action: ImputeAction) -> Result<Self, DomainError> {
        Self::new(name, AttributeValue::Number(value), action, MeasurementKind::Density)
    }

    /// Attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Impute action
    pub fn action(&self) -> ImputeAction {
        self.action
    }

    /// Measurement kind
    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    /// Is this attribute a measurement?
    pub fn is_measurement(&self) -> bool {
        self.kind.is_measurement()
    }

    /// Numeric value of a measurement (or of a numeric plain attribute)
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.as_f64()
    }

    /// Same attribute with a new numeric value
    ///
    /// Used to build derived measurements (split, summed or converted).
    pub fn with_number(&self, value: f64) -> Result<Self, DomainError> {
        Self::new(self.name.clone(), AttributeValue::Number(value), self.action, self.kind)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} ({}, {})",
            self.name,
            self.value,
            self.kind.as_str(),
            self.action.as_str()
        )
    }
}
