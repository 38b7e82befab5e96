//! Record-level disaggregation and aggregation

use crate::convert::{record_attributes, write_attributes};
use crate::partition::{partition, Partition};
use crate::resolve::{ResolvedGrouping, Side};
use crate::{GroupingSpec, MeasurementSpec, Record, RecordError, Result};
use apportion_domain::{Group, GroupId, MembershipMap};
use apportion_engine::{
    Aggregator, CategoricalProportions, ContinuousProportions, Disaggregator, EngineConfig,
    ImputeReport, ProportionCalculator,
};
use apportion_enumerator::EnumeratorConfig;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Moves measurements between supergroup and subgroup records
///
/// Records are flat JSON objects. The grouping spec says which fields name
/// the groups and how the membership map is built; the measurement spec
/// says which fields are imputed, copied or dropped.
#[derive(Debug, Clone)]
pub struct RecordImputer {
    grouping: GroupingSpec,
    measurements: MeasurementSpec,
    engine: EngineConfig,
    enumerator: EnumeratorConfig,
}

impl RecordImputer {
    /// Create an imputer with default engine and enumerator configuration
    pub fn new(grouping: GroupingSpec, measurements: MeasurementSpec) -> Self {
        Self {
            grouping,
            measurements,
            engine: EngineConfig::default(),
            enumerator: EnumeratorConfig::default(),
        }
    }

    /// Use a different engine configuration
    ///
    /// The size attribute is always taken from the measurement spec.
    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine = config;
        self
    }

    /// Use a different enumerator configuration
    pub fn with_enumerator_config(mut self, config: EnumeratorConfig) -> Self {
        self.enumerator = config;
        self
    }

    /// The grouping spec
    pub fn grouping(&self) -> &GroupingSpec {
        &self.grouping
    }

    /// The measurement spec
    pub fn measurements(&self) -> &MeasurementSpec {
        &self.measurements
    }

    /// Impute subgroup records from supergroup records
    ///
    /// `subgroups` define the subgroups and may carry their own fields,
    /// which take precedence over imputed or copied values. Output follows
    /// partition order, then subgroup record order within a partition.
    ///
    /// # Errors
    /// `LoopKeyMismatch` if a partition appears on one side only,
    /// `DuplicateRecord` for a group listed twice in a partition, plus any
    /// enumeration or engine error.
    pub fn disaggregate(
        &self,
        supergroups: &[Record],
        subgroups: &[Record],
    ) -> Result<(Vec<Record>, ImputeReport)> {
        self.validate()?;
        let resolved =
            ResolvedGrouping::resolve(&self.grouping, &self.enumerator, supergroups, subgroups)?;
        let partitions = partition(&self.grouping.loop_over, supergroups, subgroups, true)?;

        info!(
            "Disaggregating {} supergroup records into {} subgroup records over {} partitions",
            supergroups.len(),
            subgroups.len(),
            partitions.len()
        );

        let config = self.engine_config();
        let mut output = Vec::with_capacity(subgroups.len());
        let mut report = ImputeReport::new();

        for part in &partitions {
            let supers = self.groups(&resolved, Side::Supergroup, part)?;
            let subs = self.groups(&resolved, Side::Subgroup, part)?;
            let super_groups: Vec<Group> = supers.iter().map(|(group, _)| group.clone()).collect();
            let sub_groups: Vec<Group> = subs.iter().map(|(group, _)| group.clone()).collect();

            let (groups, partial) = if self.grouping.membership.is_continuous() {
                let calculator = ContinuousProportions::new(self.grouping.subgroup_field.as_str());
                run_disaggregation(calculator, &config, &super_groups, &sub_groups, resolved.membership())?
            } else {
                let calculator = CategoricalProportions::new(self.measurements.weighting_field())
                    .with_coverage_tolerance(config.coverage_tolerance);
                run_disaggregation(calculator, &config, &super_groups, &sub_groups, resolved.membership())?
            };
            report.merge(partial);

            let sources: HashMap<&GroupId, &Record> =
                subs.iter().map(|(group, record)| (group.id(), *record)).collect();
            for group in &groups {
                let mut record = match sources.get(group.id()) {
                    Some(source) => self.defining_fields(source),
                    None => Record::new(),
                };
                write_attributes(&mut record, group, |f| self.grouping.is_defining(f));
                output.push(record);
            }
        }

        debug!("{}", report.summary());
        Ok((output, report))
    }

    /// Sum subgroup records into supergroup records
    ///
    /// `supergroups` may supply some or all supergroups with identifying
    /// fields; a supergroup without a record gets only its grouping and
    /// loop-over fields plus the aggregated values. Output follows
    /// partition order, then membership order.
    ///
    /// # Errors
    /// As for [`RecordImputer::disaggregate`], plus
    /// `InconsistentCopyAttribute` when subgroups disagree on a copied field.
    pub fn aggregate(
        &self,
        supergroups: &[Record],
        subgroups: &[Record],
    ) -> Result<(Vec<Record>, ImputeReport)> {
        self.validate()?;
        let resolved =
            ResolvedGrouping::resolve(&self.grouping, &self.enumerator, supergroups, subgroups)?;
        let partitions = partition(&self.grouping.loop_over, supergroups, subgroups, false)?;

        info!(
            "Aggregating {} subgroup records over {} partitions",
            subgroups.len(),
            partitions.len()
        );

        let aggregator = Aggregator::new(self.engine_config());
        let mut output = Vec::new();
        let mut report = ImputeReport::new();

        for part in &partitions {
            let supplied = self.groups(&resolved, Side::Supergroup, part)?;
            let members = self.groups(&resolved, Side::Subgroup, part)?;
            let supplied_groups: Vec<Group> = supplied.iter().map(|(group, _)| group.clone()).collect();
            let member_groups: Vec<Group> = members.iter().map(|(group, _)| group.clone()).collect();

            let (groups, partial) =
                aggregator.aggregate(&supplied_groups, &member_groups, resolved.membership())?;
            report.merge(partial);

            let sources: HashMap<&GroupId, &Record> =
                supplied.iter().map(|(group, record)| (group.id(), *record)).collect();
            for group in &groups {
                let mut record = match sources.get(group.id()) {
                    Some(source) => self.defining_fields(source),
                    None => {
                        let mut record: Record = part.values.iter().cloned().collect();
                        record.insert(
                            self.grouping.supergroup_field.clone(),
                            resolved.supergroup_value(group.id()),
                        );
                        record
                    }
                };
                write_attributes(&mut record, group, |f| self.grouping.is_defining(f));
                output.push(record);
            }
        }

        debug!("{}", report.summary());
        Ok((output, report))
    }

    fn validate(&self) -> Result<()> {
        self.grouping.validate().map_err(RecordError::Config)?;
        self.measurements.validate().map_err(RecordError::Config)?;
        self.enumerator.validate().map_err(RecordError::Config)?;
        Ok(())
    }

    fn engine_config(&self) -> EngineConfig {
        self.engine
            .clone()
            .with_size_attribute(self.measurements.size_field.as_str())
    }

    /// Groups for one side of a partition, paired with their records
    fn groups<'r>(
        &self,
        resolved: &ResolvedGrouping<'_>,
        side: Side,
        part: &Partition<'r>,
    ) -> Result<Vec<(Group, &'r Record)>> {
        let records = match side {
            Side::Supergroup => &part.supergroups,
            Side::Subgroup => &part.subgroups,
        };

        let mut seen = HashSet::new();
        let mut groups = Vec::with_capacity(records.len());
        for &(index, record) in records {
            let id = resolved.group_id(side, index, record)?;
            if !seen.insert(id.clone()) {
                return Err(RecordError::DuplicateRecord {
                    side: side.as_str(),
                    group: id.to_string(),
                    partition: part.describe(),
                });
            }

            let mut attributes =
                record_attributes(record, &self.measurements, |f| self.grouping.is_defining(f))?;
            if side == Side::Subgroup {
                attributes.extend(resolved.interval_attribute(&id)?);
            }
            groups.push((Group::new(id, attributes)?, record));
        }
        Ok(groups)
    }

    /// The grouping and loop-over fields of a source record
    fn defining_fields(&self, source: &Record) -> Record {
        source
            .iter()
            .filter(|(field, _)| self.grouping.is_defining(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

fn run_disaggregation<P: ProportionCalculator>(
    calculator: P,
    config: &EngineConfig,
    supergroups: &[Group],
    subgroups: &[Group],
    membership: &MembershipMap,
) -> Result<(Vec<Group>, ImputeReport)> {
    Ok(Disaggregator::with_config(calculator, config.clone()).disaggregate(
        supergroups,
        subgroups,
        membership,
    )?)
}
