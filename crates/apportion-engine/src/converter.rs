//! Mass/density conversion
//!
//! Weights split additive quantities. A density (a rate) is turned into its
//! mass equivalent with the group's size before splitting or summing, then
//! turned back with the size of the group that receives it.

use crate::{EngineError, Result};
use apportion_domain::{Attribute, GroupId, MeasurementKind};

/// Mass equivalent of a measurement
///
/// Masses pass through unchanged; densities are multiplied by `size`.
///
/// # Errors
/// - `NotAMeasurement` for plain attributes
/// - `MissingSizeMeasurement` for a density without `size`
pub fn to_mass(
    group: &GroupId,
    measurement: &Attribute,
    size: Option<&Attribute>,
    size_attribute: &str,
) -> Result<f64> {
    let value = measurement_value(group, measurement)?;
    match measurement.kind() {
        MeasurementKind::Mass => Ok(value),
        MeasurementKind::Density => {
            let size = size_value(group, measurement.name(), size, size_attribute)?;
            Ok(value * size)
        }
        MeasurementKind::Plain => Err(EngineError::NotAMeasurement {
            group: group.to_string(),
            attribute: measurement.name().to_string(),
        }),
    }
}

/// Density from a mass and the group's size
///
/// # Errors
/// - `MissingSizeMeasurement` if `size` is absent
/// - `DivisionByZero` if the size is 0
pub fn to_density(
    group: &GroupId,
    measurement: &str,
    mass: f64,
    size: Option<&Attribute>,
    size_attribute: &str,
) -> Result<f64> {
    let size = size_value(group, measurement, size, size_attribute)?;
    if size == 0.0 {
        return Err(EngineError::DivisionByZero {
            group: group.to_string(),
            measurement: measurement.to_string(),
        });
    }
    Ok(mass / size)
}

/// Rebuild a measurement of `template`'s kind from a mass
pub fn from_mass(
    group: &GroupId,
    template: &Attribute,
    mass: f64,
    size: Option<&Attribute>,
    size_attribute: &str,
) -> Result<Attribute> {
    let value = match template.kind() {
        MeasurementKind::Density => to_density(group, template.name(), mass, size, size_attribute)?,
        _ => mass,
    };
    Ok(template.with_number(value)?)
}

fn measurement_value(group: &GroupId, measurement: &Attribute) -> Result<f64> {
    measurement
        .numeric_value()
        .ok_or_else(|| EngineError::NotAMeasurement {
            group: group.to_string(),
            attribute: measurement.name().to_string(),
        })
}

fn size_value(
    group: &GroupId,
    measurement: &str,
    size: Option<&Attribute>,
    size_attribute: &str,
) -> Result<f64> {
    size.and_then(Attribute::numeric_value)
        .ok_or_else(|| EngineError::MissingSizeMeasurement {
            group: group.to_string(),
            measurement: measurement.to_string(),
            size: size_attribute.to_string(),
        })
}
