//! Aggregation: summing subgroup measurements back into supergroups

use crate::converter::{from_mass, to_mass};
use crate::{per_supergroup, EngineConfig, EngineError, GroupIndex, ImputeReport, Result};
use apportion_domain::{
    Attribute, AttributeValue, Group, GroupId, ImputeAction, MeasurementKind, MembershipMap,
};
use std::collections::HashSet;
use tracing::{debug, info};

/// Sums subgroup measurements into their supergroups
///
/// Needs no model: masses add, densities are added as masses and divided
/// by the summed subgroup sizes. Copied attributes must agree across the
/// subgroups of a supergroup. Ignored attributes are dropped.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: EngineConfig,
}

impl Aggregator {
    /// Create an aggregator
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Aggregate `subgroups` into the supergroups of `membership`
    ///
    /// `supergroups` may supply identifying attributes for some or all
    /// supergroups; those not supplied start empty. An aggregated value
    /// replaces a supplied attribute of the same name. Output follows the
    /// supergroup order of `membership`.
    ///
    /// # Errors
    /// - `UnknownGroup` if a subgroup is absent from `membership` or the map
    ///   names a subgroup that was not supplied
    /// - `InconsistentCopyAttribute` if subgroups disagree on a copied value
    /// - `MissingMeasurement` if only some subgroups carry an imputed measurement
    /// - `MissingSizeMeasurement` / `DivisionByZero` for densities
    pub fn aggregate(
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
        for supergroup in supergroups {
            if !membership.contains_supergroup(supergroup.id()) {
                debug!("Supergroup '{}' has no subgroups, skipping", supergroup.id());
            }
        }

        info!(
            "Aggregating {} subgroups into {} supergroups",
            subgroups.len(),
            membership.supergroups().len()
        );

        let outcomes = per_supergroup(&self.config, membership.supergroups(), |id| {
            let members = sub_index.members(membership, id)?;
            self.aggregate_supergroup(id, super_index.get(id), &members)
        })?;

        let mut report = ImputeReport::new();
        let mut groups = Vec::with_capacity(outcomes.len());
        for (group, partial) in outcomes {
            report.merge(partial);
            groups.push(group);
        }

        info!(
            "Aggregation produced {} supergroups, {} measurements",
            groups.len(),
            report.measurements
        );
        Ok((groups, report))
    }

    fn aggregate_supergroup(
        &self,
        id: &GroupId,
        supplied: Option<&Group>,
        members: &[&Group],
    ) -> Result<(Group, ImputeReport)> {
        let size_name = self.config.size_attribute.as_str();
        let mut report = ImputeReport {
            supergroups: 1,
            subgroups: members.len(),
            ..ImputeReport::default()
        };

        // Sizes are mass-like, so the supergroup size is always their sum
        let total_size = members
            .iter()
            .map(|member| member.attribute(size_name).and_then(Attribute::numeric_value))
            .sum::<Option<f64>>()
            .map(|total| Attribute::mass(size_name, total, ImputeAction::Impute))
            .transpose()?;

        let mut seen = HashSet::new();
        let names: Vec<&str> = members
            .iter()
            .flat_map(|member| member.attributes())
            .map(Attribute::name)
            .filter(|name| seen.insert(*name))
            .collect();

        let mut aggregated = Vec::with_capacity(names.len());
        for name in names {
            let Some(template) = members.iter().find_map(|member| member.attribute(name)) else {
                continue;
            };
            match template.action() {
                ImputeAction::Ignore => {}
                ImputeAction::Copy => {
                    self.check_agreement(id, template, members)?;
                    aggregated.push(template.clone());
                    report.copied += 1;
                }
                ImputeAction::Impute => {
                    aggregated.push(self.sum_measurement(id, template, members, total_size.as_ref())?);
                    report.measurements += 1;
                }
            }
        }

        let mut attributes: Vec<Attribute> = Vec::new();
        if let Some(supplied) = supplied {
            for attribute in supplied.attributes() {
                if aggregated.iter().any(|a| a.name() == attribute.name()) {
                    debug!(
                        "Aggregated '{}' replaces the value supplied for '{}'",
                        attribute.name(),
                        id
                    );
                    continue;
                }
                attributes.push(attribute.clone());
            }
        }
        attributes.extend(aggregated);

        Ok((Group::new(id.clone(), attributes)?, report))
    }

    fn check_agreement(&self, id: &GroupId, template: &Attribute, members: &[&Group]) -> Result<()> {
        for member in members {
            let value = member.attribute(template.name()).map(Attribute::value);
            if !value.is_some_and(|v| same_value(v, template.value())) {
                return Err(EngineError::InconsistentCopyAttribute {
                    supergroup: id.to_string(),
                    attribute: template.name().to_string(),
                    first: template.value().to_string(),
                    second: value.map_or_else(|| "<missing>".to_string(), |v| v.to_string()),
                });
            }
        }
        Ok(())
    }

    fn sum_measurement(
        &self,
        id: &GroupId,
        template: &Attribute,
        members: &[&Group],
        total_size: Option<&Attribute>,
    ) -> Result<Attribute> {
        let size_name = self.config.size_attribute.as_str();
        let mut mass = 0.0;
        let mut kind = template.kind();

        for member in members {
            let measurement = member.attribute(template.name()).ok_or_else(|| {
                EngineError::MissingMeasurement {
                    group: member.id().to_string(),
                    measurement: template.name().to_string(),
                }
            })?;
            // Any density contribution makes the total a density
            if measurement.kind() == MeasurementKind::Density {
                kind = MeasurementKind::Density;
            }
            mass += to_mass(member.id(), measurement, member.attribute(size_name), size_name)?;
        }

        let summed = Attribute::new(
            template.name(),
            AttributeValue::Number(mass),
            ImputeAction::Impute,
            kind,
        )?;
        from_mass(id, &summed, mass, total_size, size_name)
    }
}

/// Equality for copied values; `2020` and `2020.0` agree
fn same_value(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
