//! Disaggregation: splitting supergroup measurements into subgroups

use crate::converter::{from_mass, to_mass};
use crate::{
    per_supergroup, EngineConfig, EngineError, GroupIndex, ImputeReport, ImputeWarning,
    ProportionCalculator, Result,
};
use apportion_domain::{Attribute, Group, GroupId, ImputeAction, MeasurementKind, MembershipMap, WeightVector};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Splits supergroup measurements into subgroups
///
/// Every measurement marked `impute` is converted to mass with the
/// supergroup's size, multiplied by the subgroup's weight and converted
/// back with the subgroup's size. All measurements of one call share the
/// weights computed by the calculator.
///
/// A subgroup's own attributes come first in its output and win over a
/// supergroup attribute of the same name.
pub struct Disaggregator<P>
where
    P: ProportionCalculator,
{
    calculator: P,
    config: EngineConfig,
}

impl<P> Disaggregator<P>
where
    P: ProportionCalculator,
{
    /// Create a disaggregator with default configuration
    pub fn new(calculator: P) -> Self {
        Self::with_config(calculator, EngineConfig::default())
    }

    /// Create a disaggregator with explicit configuration
    pub fn with_config(calculator: P, config: EngineConfig) -> Self {
        Self { calculator, config }
    }

    /// The proportion calculator in use
    pub fn calculator(&self) -> &P {
        &self.calculator
    }

    /// The configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Disaggregate `supergroups` into `subgroups`
    ///
    /// Returns one group per subgroup, in the order `subgroups` were given,
    /// plus a report of what was done. The call fails as a whole if any
    /// subgroup cannot be produced.
    ///
    /// # Errors
    /// - `UnknownGroup` if a subgroup is absent from `membership`, or the
    ///   map names a group that was not supplied
    /// - `MissingSizeMeasurement` / `DivisionByZero` from density conversion
    /// - any error of the proportion calculator
    pub fn disaggregate(
        &self,
        supergroups: &[Group],
        subgroups: &[Group],
        membership: &MembershipMap,
    ) -> Result<(Vec<Group>, ImputeReport)> {
        self.config.validate().map_err(EngineError::Config)?;
        let super_index = GroupIndex::build(supergroups)?;
        let sub_index = GroupIndex::build(subgroups)?;

        for subgroup in subgroups {
            if !membership.contains_subgroup(subgroup.id()) {
                return Err(EngineError::unknown(
                    subgroup.id(),
                    "subgroup is not in the membership map",
                ));
            }
        }
        for id in membership.supergroups() {
            super_index.require(id, "supergroup")?;
        }

        info!(
            "Disaggregating {} supergroups into {} subgroups",
            membership.supergroups().len(),
            subgroups.len()
        );

        let outcomes = per_supergroup(&self.config, membership.supergroups(), |id| {
            self.disaggregate_supergroup(id, membership, &super_index, &sub_index)
        })?;

        let mut report = ImputeReport::new();
        let mut produced: HashMap<GroupId, Group> = HashMap::with_capacity(subgroups.len());
        for (groups, partial) in outcomes {
            report.merge(partial);
            produced.extend(groups.into_iter().map(|group| (group.id().clone(), group)));
        }
        let groups: Vec<Group> = subgroups
            .iter()
            .filter_map(|subgroup| produced.remove(subgroup.id()))
            .collect();

        info!(
            "Disaggregation produced {} subgroups, {} measurements, {} warnings",
            groups.len(),
            report.measurements,
            report.warnings.len()
        );
        Ok((groups, report))
    }

    fn disaggregate_supergroup(
        &self,
        id: &GroupId,
        membership: &MembershipMap,
        supergroups: &GroupIndex<'_>,
        subgroups: &GroupIndex<'_>,
    ) -> Result<(Vec<Group>, ImputeReport)> {
        let supergroup = supergroups.require(id, "supergroup")?;
        let members = subgroups.members(membership, id)?;
        let weights = self.calculator.supergroup_weights(supergroup, &members)?;
        self.check_weights(&weights)?;

        let mut report = ImputeReport {
            supergroups: 1,
            subgroups: members.len(),
            ..ImputeReport::default()
        };
        if weights.is_fallback() {
            warn!(
                "Supergroup '{}' has zero weighting total, splitting equally over {} subgroups",
                id,
                members.len()
            );
            report.record_warning(ImputeWarning::ZeroWeightFallback {
                supergroup: id.clone(),
                subgroups: members.len(),
            });
        }

        let mut groups = Vec::with_capacity(members.len());
        for subgroup in members {
            let weight = weights.get(subgroup.id()).ok_or_else(|| {
                EngineError::unknown(subgroup.id(), "calculator returned no weight for subgroup")
            })?;
            groups.push(self.split_into(supergroup, subgroup, weight, &mut report)?);
        }
        Ok((groups, report))
    }

    fn check_weights(&self, weights: &WeightVector) -> Result<()> {
        if weights.is_empty() {
            return Ok(());
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > self.config.weight_tolerance {
            return Err(EngineError::UnnormalizedWeights {
                supergroup: weights.supergroup().to_string(),
                sum,
            });
        }
        Ok(())
    }

    fn split_into(
        &self,
        supergroup: &Group,
        subgroup: &Group,
        weight: f64,
        report: &mut ImputeReport,
    ) -> Result<Group> {
        let size_name = self.config.size_attribute.as_str();
        let supergroup_size = supergroup.attribute(size_name);

        let mut attributes: Vec<Attribute> = subgroup.attributes().to_vec();
        // (position in `attributes`, subgroup mass) of densities awaiting a size
        let mut densities: Vec<(usize, f64)> = Vec::new();
        let mut imputed_size: Option<Attribute> = None;

        for attribute in supergroup.attributes() {
            if subgroup.has_attribute(attribute.name()) {
                debug!(
                    "Subgroup '{}' keeps its own '{}'",
                    subgroup.id(),
                    attribute.name()
                );
                continue;
            }
            match attribute.action() {
                ImputeAction::Ignore => {}
                ImputeAction::Copy => {
                    attributes.push(attribute.clone());
                    report.copied += 1;
                }
                ImputeAction::Impute => {
                    let mass = to_mass(supergroup.id(), attribute, supergroup_size, size_name)? * weight;
                    if attribute.kind() == MeasurementKind::Density {
                        densities.push((attributes.len(), mass));
                        attributes.push(attribute.clone());
                    } else {
                        let imputed = attribute.with_number(mass)?;
                        if imputed.name() == size_name {
                            imputed_size = Some(imputed.clone());
                        }
                        attributes.push(imputed);
                    }
                    report.measurements += 1;
                }
            }
        }

        // The subgroup's own size, or else the size just imputed onto it.
        // A size copied from the supergroup describes the whole supergroup.
        let size = subgroup.attribute(size_name).cloned().or(imputed_size);
        for (position, mass) in densities {
            let rebuilt = from_mass(subgroup.id(), &attributes[position], mass, size.as_ref(), size_name)?;
            attributes[position] = rebuilt;
        }

        Ok(Group::new(subgroup.id().clone(), attributes)?)
    }
}
