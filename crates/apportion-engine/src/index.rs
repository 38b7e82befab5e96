//! Lookup of supplied groups by id

use crate::{EngineError, Result};
use apportion_domain::{Group, GroupId, MembershipMap};
use std::collections::HashMap;

/// Borrowed index over one call's groups
#[derive(Debug, Clone, Default)]
pub struct GroupIndex<'a> {
    groups: HashMap<&'a GroupId, &'a Group>,
}

impl<'a> GroupIndex<'a> {
    /// Index `groups` by id
    ///
    /// # Errors
    /// `DuplicateGroup` if two groups share an id
    pub fn build(groups: &'a [Group]) -> Result<Self> {
        let mut index = HashMap::with_capacity(groups.len());
        for group in groups {
            if index.insert(group.id(), group).is_some() {
                return Err(EngineError::DuplicateGroup {
                    group: group.id().to_string(),
                });
            }
        }
        Ok(Self { groups: index })
    }

    /// Group with this id, if supplied
    pub fn get(&self, id: &GroupId) -> Option<&'a Group> {
        self.groups.get(id).copied()
    }

    /// Group with this id
    ///
    /// # Errors
    /// `UnknownGroup` naming `role` ("supergroup" / "subgroup")
    pub fn require(&self, id: &GroupId, role: &str) -> Result<&'a Group> {
        self.get(id)
            .ok_or_else(|| EngineError::unknown(id, format!("{} is in the membership map but was not supplied", role)))
    }

    /// The supplied subgroups of `supergroup`, in membership order
    pub fn members(&self, membership: &MembershipMap, supergroup: &GroupId) -> Result<Vec<&'a Group>> {
        membership
            .subgroups_of(supergroup)
            .iter()
            .map(|id| self.require(id, "subgroup"))
            .collect()
    }

    /// Number of indexed groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_rejected() {
        let groups = vec![Group::empty("a".into()), Group::empty("a".into())];
        assert!(matches!(
            GroupIndex::build(&groups),
            Err(EngineError::DuplicateGroup { .. })
        ));
    }

    #[test]
    fn test_require_names_missing_group() {
        let groups = vec![Group::empty("a".into())];
        let index = GroupIndex::build(&groups).unwrap();
        assert_eq!(index.len(), 1);
        match index.require(&"b".into(), "subgroup") {
            Err(EngineError::UnknownGroup { group, .. }) => assert_eq!(group, "b"),
            other => panic!("expected unknown group, got {:?}", other),
        }
    }
}
