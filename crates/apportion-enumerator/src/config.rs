//! Enumerator configuration

use serde::{Deserialize, Serialize};

/// What to do with a subgroup interval contained by no supergroup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSupergroupPolicy {
    /// Fail with a group definition error
    #[default]
    Error,
    /// Make the subgroup its own (one-to-one) supergroup
    AddOneToOne,
}

/// Configuration for enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumeratorConfig {
    /// Separator between supergroup and subgroup categories in cartesian ids
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Upper bound used for open-ended age groups such as "65+ years"
    #[serde(default = "default_age_max")]
    pub age_max: f64,

    /// Require supergroup intervals to be contiguous and each supergroup's
    /// subgroups to tile it exactly
    #[serde(default = "default_true")]
    pub require_complete_coverage: bool,

    /// Handling of subgroups outside every supergroup
    #[serde(default)]
    pub missing_supergroup: MissingSupergroupPolicy,
}

fn default_separator() -> String {
    "_".to_string()
}

fn default_age_max() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            age_max: default_age_max(),
            require_complete_coverage: true,
            missing_supergroup: MissingSupergroupPolicy::Error,
        }
    }
}

impl EnumeratorConfig {
    /// Permissive configuration: no coverage check, stray subgroups become their own supergroup
    pub fn permissive() -> Self {
        Self {
            require_complete_coverage: false,
            missing_supergroup: MissingSupergroupPolicy::AddOneToOne,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.separator.is_empty() {
            return Err("separator cannot be empty".to_string());
        }
        if !self.age_max.is_finite() || self.age_max <= 0.0 {
            return Err("age_max must be a finite value > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EnumeratorConfig::default();
        assert_eq!(config.separator, "_");
        assert_eq!(config.age_max, 100.0);
        assert!(config.require_complete_coverage);
        assert_eq!(config.missing_supergroup, MissingSupergroupPolicy::Error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = EnumeratorConfig::permissive();
        assert!(!config.require_complete_coverage);
        assert_eq!(config.missing_supergroup, MissingSupergroupPolicy::AddOneToOne);
    }

    #[test]
    fn test_invalid_config() {
        let config = EnumeratorConfig {
            separator: String::new(),
            ..EnumeratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: EnumeratorConfig =
            serde_json::from_str(r#"{"age_max": 85.0, "missing_supergroup": "add_one_to_one"}"#).unwrap();
        assert_eq!(config.age_max, 85.0);
        assert_eq!(config.separator, "_");
        assert_eq!(config.missing_supergroup, MissingSupergroupPolicy::AddOneToOne);
    }
}
