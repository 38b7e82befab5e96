//! Categorical enumeration: cartesian products and ragged pairs

use crate::{Enumerator, EnumeratorConfig, EnumeratorError, Result};
use apportion_domain::{GroupId, MembershipMap};
use std::collections::HashSet;

/// Enumerates categorical subgroups
///
/// A cartesian subgroup id is the supergroup category followed by each
/// subgroup category, joined by the configured separator: supergroup
/// `"CA"` with subgroup category `"cat1"` becomes `"CA_cat1"`.
#[derive(Debug, Clone)]
pub struct CartesianEnumerator {
    separator: String,
}

impl Default for CartesianEnumerator {
    fn default() -> Self {
        Self::new(&EnumeratorConfig::default())
    }
}

impl CartesianEnumerator {
    /// Create an enumerator using the configured separator
    pub fn new(config: &EnumeratorConfig) -> Self {
        Self {
            separator: config.separator.clone(),
        }
    }

    /// Separator placed between categories
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Subgroup id for a supergroup category and one or more subgroup categories
    pub fn subgroup_id<S: AsRef<str>>(&self, supergroup: &str, categories: &[S]) -> GroupId {
        let mut id = supergroup.to_string();
        for category in categories {
            id.push_str(&self.separator);
            id.push_str(category.as_ref());
        }
        GroupId::from(id)
    }

    /// Cartesian product of the supergroups with every combination of the
    /// subgroup category sets
    ///
    /// Duplicate categories are collapsed. If any input is empty the map
    /// is empty.
    pub fn enumerate_product(
        &self,
        supergroups: &[String],
        category_sets: &[Vec<String>],
    ) -> Result<MembershipMap> {
        let supergroups = dedup(supergroups);
        let sets: Vec<Vec<&str>> = category_sets.iter().map(|set| dedup(set)).collect();

        if supergroups.is_empty() || sets.is_empty() || sets.iter().any(Vec::is_empty) {
            tracing::debug!("Empty category input, returning an empty membership map");
            return Ok(MembershipMap::new());
        }

        let combinations = combinations(&sets);
        let mut pairs = Vec::with_capacity(supergroups.len() * combinations.len());
        for supergroup in &supergroups {
            for combination in &combinations {
                pairs.push((self.subgroup_id(supergroup, combination), GroupId::new(*supergroup)?));
            }
        }

        tracing::debug!(
            "Enumerated cartesian membership: {} supergroups, {} subgroups",
            supergroups.len(),
            pairs.len()
        );
        Ok(MembershipMap::from_pairs(pairs)?)
    }

    /// Ragged enumeration from explicit `(subgroup, supergroup)` pairs
    ///
    /// Subgroup ids are `supergroup + separator + subgroup`, so the same
    /// subgroup category may appear under several supergroups.
    ///
    /// # Errors
    /// `GroupDefinition` if the same pair is listed twice
    pub fn enumerate_pairs(&self, pairs: &[(String, String)]) -> Result<MembershipMap> {
        let mut seen = HashSet::new();
        let mut membership = Vec::with_capacity(pairs.len());
        for (subgroup, supergroup) in pairs {
            if !seen.insert((subgroup.as_str(), supergroup.as_str())) {
                return Err(EnumeratorError::definition(
                    subgroup.as_str(),
                    vec![supergroup.clone()],
                    "pair listed more than once",
                ));
            }
            membership.push((
                self.subgroup_id(supergroup, &[subgroup]),
                GroupId::new(supergroup.as_str())?,
            ));
        }
        Ok(MembershipMap::from_pairs(membership)?)
    }
}

impl Enumerator for CartesianEnumerator {
    fn enumerate(&self, supergroups: &[String], subgroups: &[String]) -> Result<MembershipMap> {
        self.enumerate_product(supergroups, &[subgroups.to_vec()])
    }
}

fn dedup(values: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(String::as_str)
        .filter(|value| seen.insert(*value))
        .collect()
}

fn combinations<'a>(sets: &[Vec<&'a str>]) -> Vec<Vec<&'a str>> {
    sets.iter().fold(vec![Vec::new()], |acc, set| {
        acc.iter()
            .flat_map(|prefix| {
                set.iter().map(move |category| {
                    let mut next = prefix.clone();
                    next.push(*category);
                    next
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_cartesian_ids_and_order() {
        let enumerator = CartesianEnumerator::default();
        let map = enumerator
            .enumerate(&strings(&["CA", "WA"]), &strings(&["cat1", "cat2"]))
            .unwrap();

        let pairs: Vec<(String, String)> = map
            .pairs()
            .map(|(sub, sup)| (sub.to_string(), sup.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("CA_cat1".to_string(), "CA".to_string()),
                ("CA_cat2".to_string(), "CA".to_string()),
                ("WA_cat1".to_string(), "WA".to_string()),
                ("WA_cat2".to_string(), "WA".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_empty_map() {
        let enumerator = CartesianEnumerator::default();
        assert!(enumerator.enumerate(&[], &strings(&["x"])).unwrap().is_empty());
        assert!(enumerator.enumerate(&strings(&["A"]), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let enumerator = CartesianEnumerator::default();
        let map = enumerator
            .enumerate(&strings(&["A", "A"]), &strings(&["x", "y", "x"]))
            .unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_multi_variable_product() {
        let enumerator = CartesianEnumerator::default();
        let map = enumerator
            .enumerate_product(
                &strings(&["A"]),
                &[strings(&["festina", "lente"]), strings(&["1", "2", "3"])],
            )
            .unwrap();

        assert_eq!(map.len(), 6);
        assert!(map.contains_subgroup(&"A_festina_3".into()));
        assert!(map.contains_subgroup(&"A_lente_1".into()));
    }

    #[test]
    fn test_custom_separator() {
        let config = EnumeratorConfig {
            separator: "/".to_string(),
            ..EnumeratorConfig::default()
        };
        let enumerator = CartesianEnumerator::new(&config);
        assert_eq!(enumerator.subgroup_id("A", &["x"]).as_str(), "A/x");
    }

    #[test]
    fn test_ragged_pairs() {
        let enumerator = CartesianEnumerator::default();
        let map = enumerator
            .enumerate_pairs(&[
                ("x".to_string(), "A".to_string()),
                ("y".to_string(), "A".to_string()),
                ("x".to_string(), "B".to_string()),
            ])
            .unwrap();

        assert_eq!(map.subgroups_of(&"A".into()).len(), 2);
        assert_eq!(map.subgroups_of(&"B".into()).len(), 1);
        assert_eq!(map.supergroup_of(&"B_x".into()).unwrap().as_str(), "B");
    }

    #[test]
    fn test_ragged_duplicate_pair_rejected() {
        let enumerator = CartesianEnumerator::default();
        let result = enumerator.enumerate_pairs(&[
            ("x".to_string(), "A".to_string()),
            ("x".to_string(), "A".to_string()),
        ]);
        assert!(matches!(result, Err(EnumeratorError::GroupDefinition { .. })));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    proptest! {
        #[test]
        fn prop_product_covers_every_pair(
            supergroups in prop::collection::btree_set("[a-z]{1,4}", 1..6),
            categories in prop::collection::btree_set("[0-9]{1,3}", 1..6),
        ) {
            let supergroups: Vec<String> = supergroups.into_iter().collect();
            let categories: Vec<String> = categories.into_iter().collect();
            let enumerator = CartesianEnumerator::default();
            let membership = enumerator
                .enumerate_product(&supergroups, &[categories.clone()])
                .unwrap();

            prop_assert_eq!(membership.len(), supergroups.len() * categories.len());
            let distinct: BTreeSet<&GroupId> = membership.subgroups().collect();
            prop_assert_eq!(distinct.len(), membership.len());

            for supergroup in &supergroups {
                let parent = GroupId::from(supergroup.as_str());
                prop_assert_eq!(membership.subgroups_of(&parent).len(), categories.len());
                for category in &categories {
                    let id = enumerator.subgroup_id(supergroup, &[category]);
                    prop_assert_eq!(membership.supergroup_of(&id), Some(&parent));
                }
            }
        }
    }
}
