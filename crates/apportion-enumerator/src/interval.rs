//! Interval enumeration along one continuous axis

use crate::{EnumeratorConfig, EnumeratorError, MissingSupergroupPolicy, Result};
use apportion_domain::interval::{breakpoints_equal, check_spans_exactly};
use apportion_domain::{
    Attribute, AttributeValue, DomainError, Group, GroupId, ImputeAction, Interval, MembershipMap,
};
use std::collections::{BTreeMap, HashSet};

/// A named interval, such as `"0-4 years"` → `[0, 5)`
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledInterval {
    /// Group label
    pub label: String,
    /// Range covered by the group
    pub interval: Interval,
}

impl LabeledInterval {
    /// Create a labelled interval
    pub fn new(label: impl Into<String>, interval: Interval) -> Self {
        Self {
            label: label.into(),
            interval,
        }
    }
}

/// Membership map plus the interval each group covers
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEnumeration {
    membership: MembershipMap,
    intervals: BTreeMap<GroupId, Interval>,
}

impl IntervalEnumeration {
    /// The subgroup → supergroup map
    pub fn membership(&self) -> &MembershipMap {
        &self.membership
    }

    /// Consume into the membership map
    pub fn into_membership(self) -> MembershipMap {
        self.membership
    }

    /// Interval covered by a supergroup or subgroup
    pub fn interval_of(&self, group: &GroupId) -> Option<&Interval> {
        self.intervals.get(group)
    }

    /// Skeleton groups carrying only their interval, stored under `attribute_name`
    ///
    /// Returns `(supergroups, subgroups)` in membership order.
    pub fn skeletons(&self, attribute_name: &str) -> Result<(Vec<Group>, Vec<Group>)> {
        let supergroups = self
            .membership
            .supergroups()
            .iter()
            .map(|id| self.skeleton(id, attribute_name))
            .collect::<Result<Vec<_>>>()?;
        let subgroups = self
            .membership
            .subgroups()
            .map(|id| self.skeleton(id, attribute_name))
            .collect::<Result<Vec<_>>>()?;
        Ok((supergroups, subgroups))
    }

    fn skeleton(&self, id: &GroupId, attribute_name: &str) -> Result<Group> {
        let interval = self.intervals.get(id).copied().ok_or_else(|| {
            EnumeratorError::definition(id.as_str(), Vec::new(), "group has no interval")
        })?;
        let value = AttributeValue::Interval {
            label: id.to_string(),
            interval,
        };
        let attribute = Attribute::plain(attribute_name, value, ImputeAction::Ignore)?;
        Ok(Group::new(id.clone(), vec![attribute])?)
    }
}

/// Enumerates subgroups of a continuous axis into containing supergroups
///
/// Intervals are treated as half-open `[lower, upper)`, except that the
/// uppermost supergroup also owns its upper bound. A subgroup belongs to
/// the supergroup containing its lower bound and must end within it.
#[derive(Debug, Clone)]
pub struct IntervalEnumerator {
    require_complete_coverage: bool,
    missing_supergroup: MissingSupergroupPolicy,
}

impl Default for IntervalEnumerator {
    fn default() -> Self {
        Self::new(&EnumeratorConfig::default())
    }
}

impl IntervalEnumerator {
    /// Create an enumerator from configuration
    pub fn new(config: &EnumeratorConfig) -> Self {
        Self {
            require_complete_coverage: config.require_complete_coverage,
            missing_supergroup: config.missing_supergroup,
        }
    }

    /// Enumerate from supergroup and subgroup breakpoints
    ///
    /// `[0, 18, 65, 100]` defines `[0, 18)`, `[18, 65)` and `[65, 100]`.
    /// Group ids are the interval's display form, e.g. `"[0, 18)"`.
    pub fn enumerate_breakpoints(
        &self,
        supergroup_breakpoints: &[f64],
        subgroup_breakpoints: &[f64],
    ) -> Result<IntervalEnumeration> {
        let supergroups = breakpoint_intervals(supergroup_breakpoints)?;
        let subgroups = breakpoint_intervals(subgroup_breakpoints)?;
        self.enumerate_intervals(&supergroups, &subgroups)
    }

    /// Enumerate from labelled supergroup and subgroup intervals
    ///
    /// # Errors
    /// `GroupDefinition` when supergroups overlap, a subgroup straddles a
    /// supergroup boundary, a subgroup has no containing supergroup (under
    /// the `Error` policy), or coverage is required and incomplete.
    pub fn enumerate_intervals(
        &self,
        supergroups: &[LabeledInterval],
        subgroups: &[LabeledInterval],
    ) -> Result<IntervalEnumeration> {
        let mut labels = HashSet::new();
        for supergroup in supergroups {
            if !labels.insert(supergroup.label.as_str()) {
                return Err(EnumeratorError::definition(
                    supergroup.label.as_str(),
                    vec![supergroup.label.clone()],
                    "supergroup listed more than once",
                ));
            }
        }

        let mut sorted: Vec<&LabeledInterval> = supergroups.iter().collect();
        sorted.sort_by(|a, b| a.interval.lower().total_cmp(&b.interval.lower()));
        for pair in sorted.windows(2) {
            if pair[0].interval.overlaps(&pair[1].interval) {
                return Err(EnumeratorError::definition(
                    pair[1].label.as_str(),
                    vec![pair[0].label.clone(), pair[1].label.clone()],
                    "supergroups overlap",
                ));
            }
        }

        let mut members: Vec<(GroupId, Vec<GroupId>)> = supergroups
            .iter()
            .map(|s| GroupId::new(s.label.as_str()).map(|id| (id, Vec::new())))
            .collect::<std::result::Result<_, DomainError>>()?;
        let position: BTreeMap<&str, usize> = supergroups
            .iter()
            .enumerate()
            .map(|(i, s)| (s.label.as_str(), i))
            .collect();
        let mut assigned: Vec<Vec<Interval>> = vec![Vec::new(); supergroups.len()];
        let mut one_to_one: Vec<&LabeledInterval> = Vec::new();

        for subgroup in subgroups {
            match self.locate(&sorted, subgroup)? {
                Some(host) => {
                    let index = position[host.label.as_str()];
                    members[index].1.push(GroupId::new(subgroup.label.as_str())?);
                    assigned[index].push(subgroup.interval);
                }
                None => {
                    tracing::debug!(
                        "Subgroup '{}' has no supergroup, adding it one-to-one",
                        subgroup.label
                    );
                    let id = GroupId::new(subgroup.label.as_str())?;
                    members.push((id.clone(), vec![id]));
                    one_to_one.push(subgroup);
                }
            }
        }

        if self.require_complete_coverage {
            self.check_coverage(supergroups, &assigned, &one_to_one)?;
        }

        let mut intervals = BTreeMap::new();
        for group in supergroups.iter().chain(subgroups) {
            intervals.insert(GroupId::new(group.label.as_str())?, group.interval);
        }

        let membership = MembershipMap::from_supergroups(
            members.into_iter().filter(|(_, subs)| !subs.is_empty()),
        )?;

        tracing::debug!(
            "Enumerated interval membership: {} supergroups, {} subgroups",
            membership.supergroups().len(),
            membership.len()
        );
        Ok(IntervalEnumeration {
            membership,
            intervals,
        })
    }

    /// Find the supergroup owning a subgroup, or `None` if it may be added one-to-one
    fn locate<'a>(
        &self,
        sorted: &[&'a LabeledInterval],
        subgroup: &LabeledInterval,
    ) -> Result<Option<&'a LabeledInterval>> {
        let last = sorted.len().saturating_sub(1);
        let point = subgroup.interval.width() == 0.0;
        let host = sorted
            .iter()
            .enumerate()
            .find(|(i, s)| {
                s.interval
                    .contains_point(subgroup.interval.lower(), point && *i == last)
            })
            .map(|(_, s)| *s);

        if let Some(host) = host {
            let upper = subgroup.interval.upper();
            if upper <= host.interval.upper() || breakpoints_equal(upper, host.interval.upper()) {
                return Ok(Some(host));
            }
        }

        let touching: Vec<String> = sorted
            .iter()
            .filter(|s| s.interval.overlaps(&subgroup.interval))
            .map(|s| s.label.clone())
            .collect();
        if host.is_some() || !touching.is_empty() {
            return Err(EnumeratorError::definition(
                subgroup.label.as_str(),
                touching,
                format!("{} straddles a supergroup boundary", subgroup.interval),
            ));
        }

        match self.missing_supergroup {
            MissingSupergroupPolicy::AddOneToOne => Ok(None),
            MissingSupergroupPolicy::Error => Err(EnumeratorError::definition(
                subgroup.label.as_str(),
                Vec::new(),
                "not contained by any supergroup",
            )),
        }
    }

    fn check_coverage(
        &self,
        supergroups: &[LabeledInterval],
        assigned: &[Vec<Interval>],
        one_to_one: &[&LabeledInterval],
    ) -> Result<()> {
        let all: Vec<Interval> = supergroups
            .iter()
            .chain(one_to_one.iter().copied())
            .map(|s| s.interval)
            .collect();
        if let (Some(lower), Some(upper)) = (
            all.iter().map(Interval::lower).reduce(f64::min),
            all.iter().map(Interval::upper).reduce(f64::max),
        ) {
            let span = Interval::new(lower, upper)?;
            check_spans_exactly(&span, &all).map_err(|e| {
                EnumeratorError::definition(
                    span.to_string(),
                    supergroups.iter().map(|s| s.label.clone()).collect(),
                    e.to_string(),
                )
            })?;
        }

        for (supergroup, parts) in supergroups.iter().zip(assigned) {
            check_spans_exactly(&supergroup.interval, parts).map_err(|e| {
                EnumeratorError::definition(
                    supergroup.label.as_str(),
                    vec![supergroup.label.clone()],
                    format!("subgroups do not cover supergroup: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

/// Turn strictly increasing breakpoints into adjacent intervals
pub fn breakpoint_intervals(breakpoints: &[f64]) -> Result<Vec<LabeledInterval>> {
    if breakpoints.len() < 2 {
        return Err(EnumeratorError::InvalidBreakpoints(format!(
            "need at least two breakpoints, got {}",
            breakpoints.len()
        )));
    }
    breakpoints
        .windows(2)
        .map(|pair| {
            if pair[0].is_nan() || pair[1].is_nan() || pair[0] >= pair[1] {
                return Err(EnumeratorError::InvalidBreakpoints(format!(
                    "breakpoints must be strictly increasing: {} then {}",
                    pair[0], pair[1]
                )));
            }
            let interval = Interval::new(pair[0], pair[1])?;
            Ok(LabeledInterval::new(interval.to_string(), interval))
        })
        .collect()
}
