//! Apportion Domain Layer
//!
//! This crate contains the value objects shared by every other layer of
//! Apportion. It has no knowledge of records, files or logging; it only
//! defines what a group is, what can be said about it, and how groups relate.
//!
//! ## Key Concepts
//!
//! - **Group**: An immutable snapshot of one partition element, keyed by id
//! - **Attribute**: A named value with an impute action and a measurement kind
//! - **Measurement**: An attribute whose kind is mass-like or density-like
//! - **Membership Map**: The flat subgroup → supergroup relation of one call
//! - **Weight Vector**: Normalized shares of one supergroup across its subgroups
//!
//! ## Architecture
//!
//! - Only `thiserror` and `serde` as external dependencies
//! - Pure value logic, no I/O
//! - Derived groups are always newly constructed, never mutated in place

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribute;
pub mod error;
pub mod group;
pub mod interval;
pub mod membership;
pub mod value;
pub mod weights;

// Re-exports for convenience
pub use attribute::{Attribute, ImputeAction, MeasurementKind};
pub use error::DomainError;
pub use group::{Group, GroupId};
pub use interval::Interval;
pub use membership::MembershipMap;
pub use value::AttributeValue;
pub use weights::{normalize_weights, WeightTable, WeightVector};
