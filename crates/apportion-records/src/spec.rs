//! Grouping and measurement specifications for record input

use apportion_domain::{ImputeAction, MeasurementKind, MembershipMap};
use serde::{Deserialize, Serialize};

/// How the fields of a record are treated
///
/// Fields listed in `mass` or `density` become imputed measurements,
/// fields in `exclude` are dropped and everything else is copied. The
/// weighting field is ignored unless listed, so it never spills from
/// supergroups onto subgroups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSpec {
    /// Mass-like fields (counts)
    #[serde(default)]
    pub mass: Vec<String>,

    /// Density-like fields (rates, proportions)
    #[serde(default)]
    pub density: Vec<String>,

    /// Fields copied across levels; unlisted fields are copied anyway
    #[serde(default)]
    pub copy: Vec<String>,

    /// Fields dropped from the output
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Field holding each group's size
    #[serde(default = "default_size_field")]
    pub size_field: String,

    /// Field the categorical weights come from; defaults to `size_field`
    #[serde(default)]
    pub weighting_field: Option<String>,
}

fn default_size_field() -> String {
    "size".to_string()
}

impl Default for MeasurementSpec {
    fn default() -> Self {
        Self {
            mass: Vec::new(),
            density: Vec::new(),
            copy: Vec::new(),
            exclude: Vec::new(),
            size_field: default_size_field(),
            weighting_field: None,
        }
    }
}

impl MeasurementSpec {
    /// Spec with the given mass and density fields
    pub fn new<M, D>(mass: M, density: D) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            mass: mass.into_iter().map(Into::into).collect(),
            density: density.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add copied fields
    pub fn with_copy<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.copy.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add excluded fields
    pub fn with_exclude<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Use a different size field
    pub fn with_size_field(mut self, field: impl Into<String>) -> Self {
        self.size_field = field.into();
        self
    }

    /// Take categorical weights from `field` instead of the size field
    pub fn with_weighting_field(mut self, field: impl Into<String>) -> Self {
        self.weighting_field = Some(field.into());
        self
    }

    /// The field categorical weights come from
    pub fn weighting_field(&self) -> &str {
        self.weighting_field.as_deref().unwrap_or(&self.size_field)
    }

    /// How a non-defining field is handled, or `None` if it is dropped
    pub fn treatment(&self, field: &str) -> Option<(ImputeAction, MeasurementKind)> {
        let listed = |fields: &[String]| fields.iter().any(|f| f == field);
        if listed(&self.exclude) {
            None
        } else if listed(&self.mass) {
            Some((ImputeAction::Impute, MeasurementKind::Mass))
        } else if listed(&self.density) {
            Some((ImputeAction::Impute, MeasurementKind::Density))
        } else if listed(&self.copy) {
            Some((ImputeAction::Copy, MeasurementKind::Plain))
        } else if field == self.weighting_field() {
            Some((ImputeAction::Ignore, MeasurementKind::Plain))
        } else {
            Some((ImputeAction::Copy, MeasurementKind::Plain))
        }
    }

    /// Check that field lists are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.size_field.is_empty() {
            return Err("size_field must not be empty".to_string());
        }

        let lists: [(&str, &[String]); 4] = [
            ("mass", &self.mass),
            ("density", &self.density),
            ("copy", &self.copy),
            ("exclude", &self.exclude),
        ];
        for (i, (name, fields)) in lists.iter().enumerate() {
            for field in fields.iter() {
                for (other, other_fields) in &lists[i + 1..] {
                    if other_fields.contains(field) {
                        return Err(format!(
                            "field '{}' is listed under both {} and {}",
                            field, name, other
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Where the membership map comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipSpec {
    /// Explicit pairs: each record names a subgroup category and its
    /// supergroup in the grouping fields
    Pairs {
        /// Records carrying both grouping fields
        pairs: Vec<crate::Record>,
    },

    /// Every supergroup category crossed with every subgroup category
    Categorical,

    /// Age-group labels such as `"0-4 years"` nested by interval
    AgeGroups {
        /// Upper bound used for open-ended labels like `"65+ years"`
        #[serde(default = "default_age_max")]
        age_max: f64,
    },

    /// Numeric breakpoints; records hold each interval's lower bound
    Breakpoints {
        /// Supergroup breakpoints
        supergroup: Vec<f64>,
        /// Subgroup breakpoints
        subgroup: Vec<f64>,
    },

    /// A map computed elsewhere; records hold the group ids verbatim
    #[serde(skip)]
    Map(MembershipMap),
}

fn default_age_max() -> f64 {
    100.0
}

impl MembershipSpec {
    /// Are the groups slices of a continuous variable?
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            MembershipSpec::AgeGroups { .. } | MembershipSpec::Breakpoints { .. }
        )
    }

    /// Are subgroups identified by both grouping fields together?
    pub fn is_nested_category(&self) -> bool {
        matches!(self, MembershipSpec::Pairs { .. } | MembershipSpec::Categorical)
    }
}

/// How records are grouped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingSpec {
    /// Field naming each record's supergroup
    pub supergroup_field: String,

    /// Field naming each record's subgroup
    pub subgroup_field: String,

    /// Where the membership map comes from
    pub membership: MembershipSpec,

    /// Fields whose combinations are processed independently
    #[serde(default)]
    pub loop_over: Vec<String>,
}

impl GroupingSpec {
    /// Create a grouping spec
    pub fn new(
        supergroup_field: impl Into<String>,
        subgroup_field: impl Into<String>,
        membership: MembershipSpec,
    ) -> Self {
        Self {
            supergroup_field: supergroup_field.into(),
            subgroup_field: subgroup_field.into(),
            membership,
            loop_over: Vec::new(),
        }
    }

    /// Age groups named by the same field on both levels
    pub fn age_groups(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            field.clone(),
            field,
            MembershipSpec::AgeGroups {
                age_max: default_age_max(),
            },
        )
    }

    /// Process each combination of `fields` independently
    pub fn with_loop_over<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.loop_over = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Is `field` one of the fields that identify a group or partition?
    pub fn is_defining(&self, field: &str) -> bool {
        field == self.supergroup_field
            || field == self.subgroup_field
            || self.loop_over.iter().any(|f| f == field)
    }

    /// Validate the grouping fields and membership settings
    pub fn validate(&self) -> Result<(), String> {
        if self.supergroup_field.is_empty() || self.subgroup_field.is_empty() {
            return Err("grouping fields must not be empty".to_string());
        }

        if self.membership.is_nested_category() && self.supergroup_field == self.subgroup_field {
            return Err(format!(
                "categorical subgroups need their own field, '{}' names both levels",
                self.subgroup_field
            ));
        }

        if self.loop_over.iter().any(|f| f == &self.supergroup_field || f == &self.subgroup_field) {
            return Err("loop_over must not include a grouping field".to_string());
        }

        if let MembershipSpec::AgeGroups { age_max } = self.membership {
            if !age_max.is_finite() || age_max <= 0.0 {
                return Err("age_max must be positive".to_string());
            }
        }

        Ok(())
    }
}
