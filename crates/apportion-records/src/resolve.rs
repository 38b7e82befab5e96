//! Group ids and membership for a set of records

use crate::convert::group_label;
use crate::{GroupingSpec, MembershipSpec, Record, RecordError, Result};
use apportion_domain::interval::breakpoints_equal;
use apportion_domain::{Attribute, AttributeValue, GroupId, ImputeAction, MembershipMap};
use apportion_enumerator::{
    breakpoint_intervals, AgeGroupEnumerator, CartesianEnumerator, EnumeratorConfig,
    IntervalEnumeration, IntervalEnumerator, LabeledInterval,
};
use serde_json::{Number, Value};
use std::collections::HashSet;
use tracing::debug;

/// Which level a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Supergroup,
    Subgroup,
}

impl Side {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Side::Supergroup => "supergroup",
            Side::Subgroup => "subgroup",
        }
    }
}

enum Source {
    Plain(MembershipMap),
    Intervals(IntervalEnumeration),
}

/// Grouping spec resolved against the records of one call
pub(crate) struct ResolvedGrouping<'s> {
    spec: &'s GroupingSpec,
    cartesian: CartesianEnumerator,
    source: Source,
    breakpoints: Option<(Vec<LabeledInterval>, Vec<LabeledInterval>)>,
}

impl<'s> ResolvedGrouping<'s> {
    /// Build the membership map the grouping asks for
    ///
    /// Categories and labels are collected over all records, so every
    /// loop-over partition shares one map.
    pub(crate) fn resolve(
        spec: &'s GroupingSpec,
        config: &EnumeratorConfig,
        supergroups: &[Record],
        subgroups: &[Record],
    ) -> Result<Self> {
        let cartesian = CartesianEnumerator::new(config);
        let mut breakpoints = None;

        let source = match &spec.membership {
            MembershipSpec::Pairs { pairs } => {
                let pairs = pairs
                    .iter()
                    .enumerate()
                    .map(|(index, record)| -> Result<(String, String)> {
                        Ok((
                            label(record, "pair", index, &spec.subgroup_field)?,
                            label(record, "pair", index, &spec.supergroup_field)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Source::Plain(cartesian.enumerate_pairs(&pairs)?)
            }
            MembershipSpec::Categorical => {
                let mut supers = labels(supergroups, Side::Supergroup, &spec.supergroup_field)?;
                supers.extend(labels(subgroups, Side::Subgroup, &spec.supergroup_field)?);
                let subs = labels(subgroups, Side::Subgroup, &spec.subgroup_field)?;
                Source::Plain(cartesian.enumerate_product(&unique(supers), &[unique(subs)])?)
            }
            MembershipSpec::AgeGroups { age_max } => {
                let config = EnumeratorConfig {
                    age_max: *age_max,
                    ..config.clone()
                };
                let supers = unique(labels(supergroups, Side::Supergroup, &spec.supergroup_field)?);
                let subs = unique(labels(subgroups, Side::Subgroup, &spec.subgroup_field)?);
                Source::Intervals(AgeGroupEnumerator::new(&config).enumerate_ages(&supers, &subs)?)
            }
            MembershipSpec::Breakpoints { supergroup, subgroup } => {
                breakpoints = Some((breakpoint_intervals(supergroup)?, breakpoint_intervals(subgroup)?));
                Source::Intervals(
                    IntervalEnumerator::new(config).enumerate_breakpoints(supergroup, subgroup)?,
                )
            }
            MembershipSpec::Map(membership) => Source::Plain(membership.clone()),
        };

        let resolved = Self {
            spec,
            cartesian,
            source,
            breakpoints,
        };
        debug!(
            "Resolved membership: {} supergroups, {} subgroups",
            resolved.membership().supergroups().len(),
            resolved.membership().len()
        );
        Ok(resolved)
    }

    /// The membership map shared by every partition
    pub(crate) fn membership(&self) -> &MembershipMap {
        match &self.source {
            Source::Plain(membership) => membership,
            Source::Intervals(enumeration) => enumeration.membership(),
        }
    }

    /// Id of the group a record describes
    pub(crate) fn group_id(&self, side: Side, index: usize, record: &Record) -> Result<GroupId> {
        let spec = self.spec;
        let field = match side {
            Side::Supergroup => &spec.supergroup_field,
            Side::Subgroup => &spec.subgroup_field,
        };

        if let Some((supers, subs)) = &self.breakpoints {
            let intervals = match side {
                Side::Supergroup => supers,
                Side::Subgroup => subs,
            };
            let value = require(record, side.as_str(), index, field)?;
            return Ok(GroupId::new(breakpoint_label(field, intervals, value)?)?);
        }

        let own = label(record, side.as_str(), index, field)?;
        if side == Side::Subgroup && spec.membership.is_nested_category() {
            let parent = label(record, side.as_str(), index, &spec.supergroup_field)?;
            return Ok(self.cartesian.subgroup_id(&parent, &[own]));
        }
        Ok(GroupId::new(own)?)
    }

    /// Interval attribute the continuous calculator weighs a subgroup by
    pub(crate) fn interval_attribute(&self, id: &GroupId) -> Result<Option<Attribute>> {
        let Source::Intervals(enumeration) = &self.source else {
            return Ok(None);
        };
        let Some(interval) = enumeration.interval_of(id) else {
            return Ok(None);
        };
        let value = AttributeValue::Interval {
            label: id.to_string(),
            interval: *interval,
        };
        Ok(Some(Attribute::plain(
            self.spec.subgroup_field.as_str(),
            value,
            ImputeAction::Ignore,
        )?))
    }

    /// Value written to the supergroup field of a supergroup with no record
    pub(crate) fn supergroup_value(&self, id: &GroupId) -> Value {
        if let (Some(_), Source::Intervals(enumeration)) = (&self.breakpoints, &self.source) {
            if let Some(number) = enumeration
                .interval_of(id)
                .and_then(|interval| Number::from_f64(interval.lower()))
            {
                return Value::Number(number);
            }
        }
        Value::String(id.to_string())
    }
}

/// Field value, or `MissingField`
pub(crate) fn require<'r>(
    record: &'r Record,
    side: &'static str,
    index: usize,
    field: &str,
) -> Result<&'r Value> {
    record.get(field).ok_or_else(|| RecordError::MissingField {
        side,
        index,
        field: field.to_string(),
    })
}

fn label(record: &Record, side: &'static str, index: usize, field: &str) -> Result<String> {
    group_label(field, require(record, side, index, field)?)
}

fn labels(records: &[Record], side: Side, field: &str) -> Result<Vec<String>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| label(record, side.as_str(), index, field))
        .collect()
}

fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn breakpoint_label(field: &str, intervals: &[LabeledInterval], value: &Value) -> Result<String> {
    let lower = value
        .as_f64()
        .ok_or_else(|| RecordError::invalid(field, format!("{} is not a breakpoint", value)))?;
    intervals
        .iter()
        .find(|labeled| breakpoints_equal(labeled.interval.lower(), lower))
        .map(|labeled| labeled.label.clone())
        .ok_or_else(|| RecordError::invalid(field, format!("{} does not start an interval", lower)))
}
