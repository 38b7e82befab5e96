//! Weight vectors (uniform density assumption)
//!
//! Implements the single normalization formula shared by every proportion
//! calculator: `w_ij = x_ij / x_i`, where `x_i` sums `x_ij` over the
//! subgroups of supergroup `i`. Where `x_i = 0` the weights fall back to an
//! equal split `1 / |S_i|` and the vector is flagged so callers can surface
//! a warning instead of producing `NaN`.

use crate::{DomainError, GroupId, MembershipMap};
use std::collections::{BTreeMap, HashMap};

/// Normalized shares of one supergroup across its subgroups
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    supergroup: GroupId,
    weights: Vec<(GroupId, f64)>,
    fallback: bool,
}

impl WeightVector {
    /// Normalize raw weighting values of one supergroup's subgroups
    ///
    /// # Errors
    /// Returns `InvalidWeight` if any value is negative or not finite
    pub fn from_values(supergroup: GroupId, values: Vec<(GroupId, f64)>) -> Result<Self, DomainError> {
        for (group, value) in &values {
            if !value.is_finite() || *value < 0.0 {
                return Err(DomainError::InvalidWeight {
                    group: group.to_string(),
                    value: *value,
                });
            }
        }

        let total: f64 = values.iter().map(|(_, x)| x).sum();
        let n = values.len();

        if total > 0.0 {
            let weights = values.into_iter().map(|(g, x)| (g, x / total)).collect();
            return Ok(Self {
                supergroup,
                weights,
                fallback: false,
            });
        }

        // Zero total: equal split over however many subgroups there are
        let share = if n > 0 { 1.0 / n as f64 } else { 0.0 };
        let weights = values.into_iter().map(|(g, _)| (g, share)).collect();
        Ok(Self {
            supergroup,
            weights,
            fallback: n > 0,
        })
    }

    /// Supergroup these weights split
    pub fn supergroup(&self) -> &GroupId {
        &self.supergroup
    }

    /// Weight of one subgroup
    pub fn get(&self, subgroup: &GroupId) -> Option<f64> {
        self.weights
            .iter()
            .find(|(g, _)| g == subgroup)
            .map(|(_, w)| *w)
    }

    /// `(subgroup, weight)` pairs in subgroup order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupId, f64)> {
        self.weights.iter().map(|(g, w)| (g, *w))
    }

    /// Sum of weights (1 within tolerance whenever there is a subgroup)
    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Number of subgroups
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Is the vector empty?
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Did the zero-total equal-split fallback apply?
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// Weight vectors for every supergroup of one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    vectors: BTreeMap<GroupId, WeightVector>,
}

impl WeightTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the vector of one supergroup
    pub fn insert(&mut self, vector: WeightVector) {
        self.vectors.insert(vector.supergroup.clone(), vector);
    }

    /// Weight vector of a supergroup
    pub fn get(&self, supergroup: &GroupId) -> Option<&WeightVector> {
        self.vectors.get(supergroup)
    }

    /// All vectors, ordered by supergroup id
    pub fn iter(&self) -> impl Iterator<Item = &WeightVector> {
        self.vectors.values()
    }

    /// Supergroups whose weights fell back to an equal split
    pub fn fallbacks(&self) -> impl Iterator<Item = &WeightVector> {
        self.vectors.values().filter(|v| v.fallback)
    }

    /// Number of supergroups
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl FromIterator<WeightVector> for WeightTable {
    fn from_iter<T: IntoIterator<Item = WeightVector>>(iter: T) -> Self {
        let mut table = Self::new();
        for vector in iter {
            table.insert(vector);
        }
        table
    }
}

/// Compute a weight vector for every supergroup in `membership`
///
/// `x_by_group` holds the weighting value of each subgroup, whether it was
/// a category count or a quantity integrated over a continuous range.
///
/// # Errors
/// - `MissingWeight` if a subgroup has no entry in `x_by_group`
/// - `InvalidWeight` if an entry is negative or not finite
pub fn normalize_weights(
    membership: &MembershipMap,
    x_by_group: &HashMap<GroupId, f64>,
) -> Result<WeightTable, DomainError> {
    membership
        .supergroups()
        .iter()
        .map(|supergroup| {
            let values = membership
                .subgroups_of(supergroup)
                .iter()
                .map(|subgroup| {
                    x_by_group
                        .get(subgroup)
                        .map(|x| (subgroup.clone(), *x))
                        .ok_or_else(|| DomainError::MissingWeight {
                            group: subgroup.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            WeightVector::from_values(supergroup.clone(), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> GroupId {
        GroupId::from(s)
    }

    fn two_states() -> MembershipMap {
        MembershipMap::from_pairs(vec![
            (id("a1"), id("A")),
            (id("a2"), id("A")),
            (id("b1"), id("B")),
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize_categorical() {
        let x = HashMap::from([(id("a1"), 30.0), (id("a2"), 70.0), (id("b1"), 50.0)]);
        let table = normalize_weights(&two_states(), &x).unwrap();

        let a = table.get(&id("A")).unwrap();
        assert!((a.get(&id("a1")).unwrap() - 0.3).abs() < 1e-12);
        assert!((a.get(&id("a2")).unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(table.get(&id("B")).unwrap().get(&id("b1")), Some(1.0));
        assert_eq!(table.fallbacks().count(), 0);
    }

    #[test]
    fn test_zero_total_falls_back_to_equal_split() {
        let x = HashMap::from([(id("a1"), 0.0), (id("a2"), 0.0), (id("b1"), 5.0)]);
        let table = normalize_weights(&two_states(), &x).unwrap();

        let a = table.get(&id("A")).unwrap();
        assert!(a.is_fallback());
        assert_eq!(a.get(&id("a1")), Some(0.5));
        assert_eq!(a.get(&id("a2")), Some(0.5));
        assert!(!a.sum().is_nan());

        let fallbacks: Vec<_> = table.fallbacks().map(|v| v.supergroup().clone()).collect();
        assert_eq!(fallbacks, vec![id("A")]);
    }

    #[test]
    fn test_missing_weight() {
        let x = HashMap::from([(id("a1"), 1.0), (id("a2"), 1.0)]);
        let err = normalize_weights(&two_states(), &x).unwrap_err();
        assert_eq!(err, DomainError::MissingWeight { group: "b1".to_string() });
    }

    #[test]
    fn test_negative_weight() {
        let x = HashMap::from([(id("a1"), -1.0), (id("a2"), 1.0), (id("b1"), 1.0)]);
        assert!(matches!(
            normalize_weights(&two_states(), &x),
            Err(DomainError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_empty_vector_is_not_a_fallback() {
        let vector = WeightVector::from_values(id("A"), vec![]).unwrap();
        assert!(vector.is_empty());
        assert!(!vector.is_fallback());
    }
}
