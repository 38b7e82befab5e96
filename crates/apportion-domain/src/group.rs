//! Group module - the unit that measurements are recorded on

use crate::{Attribute, DomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique key of a group within one call
///
/// Cartesian subgroups use `"{supergroup}_{subgroup}"`, interval groups
/// use their label (e.g. `"0-4 years"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    /// Create a new group id
    ///
    /// # Errors
    /// Returns error if the id is empty
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::EmptyGroupId);
        }
        Ok(Self(value))
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A super- or subgroup together with everything recorded about it
///
/// Groups are immutable snapshots: derived groups are newly constructed.
/// Attribute order is preserved so records can be written back in the
/// order they were read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    attributes: Vec<Attribute>,
}

impl Group {
    /// Create a new group
    ///
    /// # Errors
    /// Returns `DuplicateAttribute` if two attributes share a name
    pub fn new(id: GroupId, attributes: Vec<Attribute>) -> Result<Self, DomainError> {
        for (i, attribute) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|a| a.name() == attribute.name()) {
                return Err(DomainError::DuplicateAttribute {
                    group: id.to_string(),
                    name: attribute.name().to_string(),
                });
            }
        }
        Ok(Self { id, attributes })
    }

    /// A group with no attributes yet
    pub fn empty(id: GroupId) -> Self {
        Self {
            id,
            attributes: Vec::new(),
        }
    }

    /// Group id
    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// All attributes, in insertion order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Only the attributes that are measurements
    pub fn measurements(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_measurement())
    }

    /// Get an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Check whether an attribute exists
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// A new group with one more attribute
    ///
    /// # Errors
    /// Returns `DuplicateAttribute` if the name is already present
    pub fn with_attribute(&self, attribute: Attribute) -> Result<Self, DomainError> {
        let mut attributes = self.attributes.clone();
        attributes.push(attribute);
        Self::new(self.id.clone(), attributes)
    }
}
