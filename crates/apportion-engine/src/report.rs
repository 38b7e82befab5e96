//! Per-call report returned alongside engine results

use apportion_domain::GroupId;
use std::fmt;

/// Non-fatal condition met during a call
#[derive(Debug, Clone, PartialEq)]
pub enum ImputeWarning {
    /// Every subgroup of the supergroup had weighting value 0, so its
    /// measurements were split equally
    ZeroWeightFallback {
        /// Supergroup split equally
        supergroup: GroupId,
        /// Number of subgroups sharing it
        subgroups: usize,
    },
}

impl fmt::Display for ImputeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeWarning::ZeroWeightFallback { supergroup, subgroups } => write!(
                f,
                "supergroup '{}' has zero weighting total, split equally over {} subgroups",
                supergroup, subgroups
            ),
        }
    }
}

/// What a disaggregation or aggregation call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputeReport {
    /// Warnings, in supergroup order
    pub warnings: Vec<ImputeWarning>,

    /// Supergroups processed
    pub supergroups: usize,

    /// Subgroups processed
    pub subgroups: usize,

    /// Measurement values produced (split or summed)
    pub measurements: usize,

    /// Attribute values copied across levels
    pub copied: usize,
}

impl ImputeReport {
    /// Create new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn record_warning(&mut self, warning: ImputeWarning) {
        self.warnings.push(warning);
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: ImputeReport) {
        self.warnings.extend(other.warnings);
        self.supergroups += other.supergroups;
        self.subgroups += other.subgroups;
        self.measurements += other.measurements;
        self.copied += other.copied;
    }

    /// Did the call finish without warnings?
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Supergroups that fell back to an equal split
    pub fn fallback_supergroups(&self) -> impl Iterator<Item = &GroupId> {
        self.warnings.iter().map(|warning| match warning {
            ImputeWarning::ZeroWeightFallback { supergroup, .. } => supergroup,
        })
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Impute Report".to_string(),
            "=============".to_string(),
            format!("Supergroups: {}", self.supergroups),
            format!("Subgroups: {}", self.subgroups),
            format!("Measurements: {}", self.measurements),
            format!("Copied attributes: {}", self.copied),
        ];

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in &self.warnings {
                lines.push(format!("  {}", warning));
            }
        }

        lines.join("\n")
    }
}
