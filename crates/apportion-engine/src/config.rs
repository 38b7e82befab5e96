//! Configuration for the disaggregation and aggregation engines

use serde::{Deserialize, Serialize};

/// Configuration for the engines
///
/// Controls the size measurement name, numeric tolerances and when work
/// is spread across threads.
///
/// # Examples
///
/// ```
/// use apportion_engine::EngineConfig;
///
/// // Default configuration
/// let config = EngineConfig::default();
/// assert_eq!(config.size_attribute, "size");
/// assert!(config.coverage_tolerance.is_none());
///
/// // Strict: subgroup weighting totals must match their supergroup
/// let config = EngineConfig::strict();
/// assert!(config.coverage_tolerance.is_some());
///
/// // Lenient: looser weight tolerance, no coverage check
/// let config = EngineConfig::lenient();
/// assert!(config.weight_tolerance > EngineConfig::default().weight_tolerance);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name of the mass-like size measurement used for density conversion
    /// Default: "size"
    #[serde(default = "default_size_attribute")]
    pub size_attribute: String,

    /// Allowed deviation of a supergroup's weights from summing to 1
    /// Default: 1e-9
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,

    /// Relative tolerance for checking that subgroups account for their
    /// supergroup's weighting total. `None` disables the check.
    /// Default: None
    #[serde(default)]
    pub coverage_tolerance: Option<f64>,

    /// Process supergroups on the rayon thread pool
    /// Default: true
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Minimum number of supergroups before going parallel
    /// Default: 64
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_size_attribute() -> String {
    "size".to_string()
}

fn default_weight_tolerance() -> f64 {
    1e-9
}

fn default_parallel() -> bool {
    true
}

fn default_parallel_threshold() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            size_attribute: default_size_attribute(),
            weight_tolerance: default_weight_tolerance(),
            coverage_tolerance: None,
            parallel: default_parallel(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl EngineConfig {
    /// Strict configuration
    ///
    /// - Coverage check on, relative tolerance 1e-6
    /// - Weight tolerance 1e-9
    pub fn strict() -> Self {
        Self {
            coverage_tolerance: Some(1e-6),
            ..Self::default()
        }
    }

    /// Lenient configuration
    ///
    /// - No coverage check
    /// - Weight tolerance 1e-6
    pub fn lenient() -> Self {
        Self {
            weight_tolerance: 1e-6,
            coverage_tolerance: None,
            ..Self::default()
        }
    }

    /// Builder-style override of the size attribute
    pub fn with_size_attribute(mut self, name: impl Into<String>) -> Self {
        self.size_attribute = name.into();
        self
    }

    /// Should `supergroups` supergroups be processed in parallel?
    pub fn use_parallel(&self, supergroups: usize) -> bool {
        self.parallel && supergroups >= self.parallel_threshold
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.size_attribute.is_empty() {
            return Err("size_attribute cannot be empty".to_string());
        }
        if !self.weight_tolerance.is_finite() || self.weight_tolerance <= 0.0 {
            return Err("weight_tolerance must be a finite value > 0".to_string());
        }
        if let Some(tolerance) = self.coverage_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err("coverage_tolerance must be a finite value >= 0".to_string());
            }
        }
        if self.parallel_threshold == 0 {
            return Err("parallel_threshold must be > 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
