//! Membership map - the subgroup → supergroup relation of one call

use crate::{DomainError, GroupId};
use std::collections::BTreeMap;

/// Flat, read-only mapping from subgroup id to supergroup id
///
/// Every subgroup belongs to exactly one supergroup. Supergroups are kept
/// in order of first appearance and subgroups in insertion order, so the
/// results built from a map come out in a stable, caller-recognisable order.
/// That a supergroup's subgroups exhaust its population is assumed, not
/// checked here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipMap {
    sub_to_super: BTreeMap<GroupId, GroupId>,
    super_to_sub: BTreeMap<GroupId, Vec<GroupId>>,
    supergroup_order: Vec<GroupId>,
}

impl MembershipMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(subgroup, supergroup)` pairs
    ///
    /// # Errors
    /// - `AmbiguousMembership` if a subgroup is listed twice
    /// - `NestedMembership` if a group is both a supergroup and a subgroup
    ///   without being its own single subgroup
    pub fn from_pairs<I>(pairs: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (GroupId, GroupId)>,
    {
        let mut map = Self::new();
        for (subgroup, supergroup) in pairs {
            if let Some(existing) = map.sub_to_super.get(&subgroup) {
                return Err(DomainError::AmbiguousMembership {
                    subgroup: subgroup.to_string(),
                    first: existing.to_string(),
                    second: supergroup.to_string(),
                });
            }
            if !map.super_to_sub.contains_key(&supergroup) {
                map.supergroup_order.push(supergroup.clone());
            }
            map.super_to_sub
                .entry(supergroup.clone())
                .or_default()
                .push(subgroup.clone());
            map.sub_to_super.insert(subgroup, supergroup);
        }
        map.validate()?;
        Ok(map)
    }

    /// Build a map from `supergroup → [subgroups]` lists
    pub fn from_supergroups<I, S>(super_to_sub: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (GroupId, S)>,
        S: IntoIterator<Item = GroupId>,
    {
        Self::from_pairs(super_to_sub.into_iter().flat_map(|(supergroup, subgroups)| {
            subgroups
                .into_iter()
                .map(move |subgroup| (subgroup, supergroup.clone()))
        }))
    }

    fn validate(&self) -> Result<(), DomainError> {
        for supergroup in &self.supergroup_order {
            if let Some(parent) = self.sub_to_super.get(supergroup) {
                let subgroups = self.subgroups_of(supergroup);
                let one_to_one = parent == supergroup && subgroups.len() == 1;
                if !one_to_one {
                    return Err(DomainError::NestedMembership {
                        group: supergroup.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Supergroup a subgroup belongs to
    pub fn supergroup_of(&self, subgroup: &GroupId) -> Option<&GroupId> {
        self.sub_to_super.get(subgroup)
    }

    /// Subgroups of a supergroup, in insertion order
    pub fn subgroups_of(&self, supergroup: &GroupId) -> &[GroupId] {
        self.super_to_sub
            .get(supergroup)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All supergroups, in order of first appearance
    pub fn supergroups(&self) -> &[GroupId] {
        &self.supergroup_order
    }

    /// All subgroups, grouped by supergroup
    pub fn subgroups(&self) -> impl Iterator<Item = &GroupId> {
        self.supergroup_order
            .iter()
            .flat_map(move |supergroup| self.subgroups_of(supergroup).iter())
    }

    /// `(subgroup, supergroup)` pairs, grouped by supergroup
    pub fn pairs(&self) -> impl Iterator<Item = (&GroupId, &GroupId)> {
        self.supergroup_order.iter().flat_map(move |supergroup| {
            self.subgroups_of(supergroup)
                .iter()
                .map(move |subgroup| (subgroup, supergroup))
        })
    }

    /// Is this id a subgroup in the map?
    pub fn contains_subgroup(&self, id: &GroupId) -> bool {
        self.sub_to_super.contains_key(id)
    }

    /// Is this id a supergroup in the map?
    pub fn contains_supergroup(&self, id: &GroupId) -> bool {
        self.super_to_sub.contains_key(id)
    }

    /// Number of subgroups
    pub fn len(&self) -> usize {
        self.sub_to_super.len()
    }

    /// Is the map empty?
    pub fn is_empty(&self) -> bool {
        self.sub_to_super.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> GroupId {
        GroupId::from(s)
    }

    fn counties() -> MembershipMap {
        MembershipMap::from_pairs(vec![
            (id("Sutter"), id("California")),
            (id("Skagit"), id("Washington")),
            (id("San Juan"), id("Washington")),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_both_directions() {
        let map = counties();
        assert_eq!(map.supergroup_of(&id("Skagit")), Some(&id("Washington")));
        assert_eq!(map.subgroups_of(&id("Washington")), &[id("Skagit"), id("San Juan")]);
        assert!(map.subgroups_of(&id("Oregon")).is_empty());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_supergroup_order_is_first_appearance() {
        let map = counties();
        assert_eq!(map.supergroups(), &[id("California"), id("Washington")]);
        let subgroups: Vec<_> = map.subgroups().cloned().collect();
        assert_eq!(subgroups, vec![id("Sutter"), id("Skagit"), id("San Juan")]);
    }

    #[test]
    fn test_subgroup_in_two_supergroups_rejected() {
        let err = MembershipMap::from_pairs(vec![
            (id("a1"), id("A")),
            (id("a1"), id("B")),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::AmbiguousMembership { .. }));
    }

    #[test]
    fn test_one_to_one_self_mapping_allowed() {
        let map = MembershipMap::from_pairs(vec![
            (id("0-4 years"), id("0-4 years")),
            (id("5-9 years"), id("5-17 years")),
        ])
        .unwrap();
        assert_eq!(map.supergroups().len(), 2);
    }

    #[test]
    fn test_nested_membership_rejected() {
        let err = MembershipMap::from_pairs(vec![
            (id("A"), id("A")),
            (id("a2"), id("A")),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::NestedMembership { .. }));
    }

    #[test]
    fn test_from_supergroups() {
        let map = MembershipMap::from_supergroups(vec![
            (id("A"), vec![id("a1"), id("a2")]),
            (id("B"), vec![id("b1")]),
        ])
        .unwrap();
        assert_eq!(map.supergroup_of(&id("b1")), Some(&id("B")));
        assert_eq!(map.pairs().count(), 3);
    }
}
