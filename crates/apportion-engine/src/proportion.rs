//! Proportion calculators
//!
//! A calculator turns one supergroup and its subgroups into a weight
//! vector. Both built-in calculators assume uniform density: each subgroup
//! gets a share of the supergroup proportional to a raw weighting value
//! `x_ij`. They differ only in where `x_ij` comes from.

use crate::{EngineError, GroupIndex, Result};
use apportion_domain::interval::check_spans_exactly;
use apportion_domain::{
    normalize_weights, Group, GroupId, Interval, MembershipMap, WeightTable, WeightVector,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Computes splitting weights for supergroups
///
/// Implementations must be pure: the weights of one supergroup depend only
/// on that supergroup and its own subgroups, so supergroups can be handled
/// in any order or in parallel.
pub trait ProportionCalculator: Send + Sync {
    /// Raw weighting value `x_ij` of each subgroup of `supergroup`
    fn weighting_values(&self, supergroup: &Group, subgroups: &[&Group]) -> Result<Vec<(GroupId, f64)>>;

    /// Normalized weights of one supergroup
    fn supergroup_weights(&self, supergroup: &Group, subgroups: &[&Group]) -> Result<WeightVector> {
        let values = self.weighting_values(supergroup, subgroups)?;
        Ok(WeightVector::from_values(supergroup.id().clone(), values)?)
    }

    /// Weights for every supergroup in `membership`
    fn compute_weights(
        &self,
        membership: &MembershipMap,
        supergroups: &GroupIndex<'_>,
        subgroups: &GroupIndex<'_>,
    ) -> Result<WeightTable> {
        let mut x_by_group = HashMap::with_capacity(membership.len());
        for id in membership.supergroups() {
            let supergroup = supergroups.require(id, "supergroup")?;
            let members = subgroups.members(membership, id)?;
            x_by_group.extend(self.weighting_values(supergroup, &members)?);
        }
        Ok(normalize_weights(membership, &x_by_group)?)
    }
}

/// Weights from a numeric attribute on each subgroup (e.g. its size)
///
/// ```
/// use apportion_domain::{Attribute, Group, ImputeAction};
/// use apportion_engine::{CategoricalProportions, ProportionCalculator};
///
/// let sub = |id: &str, size: f64| {
///     Group::new(id.into(), vec![Attribute::mass("size", size, ImputeAction::Copy).unwrap()]).unwrap()
/// };
/// let (a1, a2) = (sub("a1", 30.0), sub("a2", 70.0));
///
/// let weights = CategoricalProportions::new("size")
///     .supergroup_weights(&Group::empty("A".into()), &[&a1, &a2])
///     .unwrap();
/// assert!((weights.get(&"a1".into()).unwrap() - 0.3).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CategoricalProportions {
    attribute: String,
    coverage_tolerance: Option<f64>,
}

impl CategoricalProportions {
    /// Weight by the named attribute
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            coverage_tolerance: None,
        }
    }

    /// Require subgroup totals to match the supergroup's own value of the
    /// weighting attribute within a relative tolerance
    pub fn with_coverage_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.coverage_tolerance = tolerance;
        self
    }

    /// Weighting attribute name
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    fn value_of(&self, group: &Group) -> Result<f64> {
        let attribute = group
            .attribute(&self.attribute)
            .ok_or_else(|| EngineError::MissingWeightingAttribute {
                group: group.id().to_string(),
                attribute: self.attribute.clone(),
            })?;
        match attribute.numeric_value() {
            Some(x) if x.is_finite() && x >= 0.0 => Ok(x),
            _ => Err(EngineError::InvalidWeightingValue {
                group: group.id().to_string(),
                attribute: self.attribute.clone(),
                value: attribute.value().to_string(),
            }),
        }
    }

    fn check_coverage(&self, supergroup: &Group, total: f64, tolerance: f64) -> Result<()> {
        let Some(expected) = supergroup
            .attribute(&self.attribute)
            .and_then(|a| a.numeric_value())
        else {
            return Ok(());
        };
        if !is_close(total, expected, tolerance) {
            return Err(EngineError::IncompleteCoverage {
                supergroup: supergroup.id().to_string(),
                attribute: self.attribute.clone(),
                expected: expected.to_string(),
                actual: total.to_string(),
            });
        }
        Ok(())
    }
}

impl ProportionCalculator for CategoricalProportions {
    fn weighting_values(&self, supergroup: &Group, subgroups: &[&Group]) -> Result<Vec<(GroupId, f64)>> {
        let values = subgroups
            .iter()
            .map(|group| self.value_of(group).map(|x| (group.id().clone(), x)))
            .collect::<Result<Vec<_>>>()?;

        if let Some(tolerance) = self.coverage_tolerance {
            let total: f64 = values.iter().map(|(_, x)| x).sum();
            self.check_coverage(supergroup, total, tolerance)?;
        }
        Ok(values)
    }
}

/// Weighting density `x(z)` along a continuous axis
///
/// A subgroup's raw weight is the integral of `x(z)` over its interval.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeightingDensity {
    /// `x(z) = 1`: weight proportional to interval width
    #[default]
    Uniform,
    /// `x(z) = z`, e.g. age itself as the weighting variable
    Identity,
    /// Step function: `values[k]` on `[breakpoints[k], breakpoints[k + 1])`, 0 elsewhere
    PiecewiseConstant {
        /// Strictly increasing step boundaries
        breakpoints: Vec<f64>,
        /// Density on each step, one fewer than `breakpoints`
        values: Vec<f64>,
    },
}

impl WeightingDensity {
    /// Validate the density's parameters
    pub fn validate(&self) -> std::result::Result<(), String> {
        let WeightingDensity::PiecewiseConstant { breakpoints, values } = self else {
            return Ok(());
        };
        if breakpoints.len() != values.len() + 1 {
            return Err(format!(
                "{} breakpoints need {} values, got {}",
                breakpoints.len(),
                breakpoints.len().saturating_sub(1),
                values.len()
            ));
        }
        if breakpoints.windows(2).any(|w| w[0].is_nan() || w[1].is_nan() || w[0] >= w[1]) {
            return Err("breakpoints must be strictly increasing".to_string());
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("density values must be finite and >= 0".to_string());
        }
        Ok(())
    }

    /// Integral of the density over `interval`
    pub fn integrate(&self, interval: &Interval) -> std::result::Result<f64, String> {
        match self {
            WeightingDensity::Uniform => Ok(interval.width()),
            WeightingDensity::Identity => {
                let (a, b) = (interval.lower(), interval.upper());
                if a < 0.0 {
                    return Err(format!("identity density is negative on {}", interval));
                }
                Ok((b * b - a * a) / 2.0)
            }
            WeightingDensity::PiecewiseConstant { breakpoints, values } => {
                self.validate()?;
                breakpoints
                    .windows(2)
                    .zip(values)
                    .map(|(step, value)| -> std::result::Result<f64, String> {
                        let step = Interval::new(step[0], step[1]).map_err(|e| e.to_string())?;
                        Ok(value * interval.overlap_width(&step))
                    })
                    .sum()
            }
        }
    }
}

/// Weights from each subgroup's interval on a continuous axis
///
/// The subgroups must carry an interval-valued attribute (as produced by
/// the interval and age-group enumerators).
#[derive(Debug, Clone)]
pub struct ContinuousProportions {
    attribute: String,
    density: WeightingDensity,
    check_coverage: bool,
}

impl ContinuousProportions {
    /// Uniform density over the interval stored in `attribute`
    pub fn new(attribute: impl Into<String>) -> Self {
        Self::with_density(attribute, WeightingDensity::Uniform)
    }

    /// Custom weighting density
    pub fn with_density(attribute: impl Into<String>, density: WeightingDensity) -> Self {
        Self {
            attribute: attribute.into(),
            density,
            check_coverage: false,
        }
    }

    /// Require subgroup intervals to tile the supergroup's interval exactly
    pub fn with_coverage_check(mut self, enabled: bool) -> Self {
        self.check_coverage = enabled;
        self
    }

    /// Interval attribute name
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Weighting density in use
    pub fn density(&self) -> &WeightingDensity {
        &self.density
    }

    fn interval_of(&self, group: &Group) -> Result<Interval> {
        let attribute = group
            .attribute(&self.attribute)
            .ok_or_else(|| EngineError::MissingWeightingAttribute {
                group: group.id().to_string(),
                attribute: self.attribute.clone(),
            })?;
        attribute
            .value()
            .as_interval()
            .copied()
            .ok_or_else(|| EngineError::InvalidWeightingValue {
                group: group.id().to_string(),
                attribute: self.attribute.clone(),
                value: attribute.value().to_string(),
            })
    }
}

impl ProportionCalculator for ContinuousProportions {
    fn weighting_values(&self, supergroup: &Group, subgroups: &[&Group]) -> Result<Vec<(GroupId, f64)>> {
        let intervals = subgroups
            .iter()
            .map(|group| self.interval_of(group).map(|interval| (*group, interval)))
            .collect::<Result<Vec<_>>>()?;

        if self.check_coverage {
            let target = self.interval_of(supergroup)?;
            let parts: Vec<Interval> = intervals.iter().map(|(_, interval)| *interval).collect();
            check_spans_exactly(&target, &parts).map_err(|e| EngineError::IncompleteCoverage {
                supergroup: supergroup.id().to_string(),
                attribute: self.attribute.clone(),
                expected: target.to_string(),
                actual: e.to_string(),
            })?;
        }

        intervals
            .into_iter()
            .map(|(group, interval)| {
                self.density
                    .integrate(&interval)
                    .map(|x| (group.id().clone(), x))
                    .map_err(|reason| EngineError::InvalidWeightingValue {
                        group: group.id().to_string(),
                        attribute: self.attribute.clone(),
                        value: reason,
                    })
            })
            .collect()
    }
}

/// `math.isclose`-style relative comparison
fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    a == b || (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}
