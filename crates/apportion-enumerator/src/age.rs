//! Age-group labels such as `"0-4 years"`, `"65+ years"` and `"6-23 months"`

use crate::interval::{IntervalEnumeration, IntervalEnumerator, LabeledInterval};
use crate::{Enumerator, EnumeratorConfig, EnumeratorError, Result};
use apportion_domain::{Group, Interval, MembershipMap};
use regex::Regex;
use std::sync::LazyLock;

/// Converts the numbers captured from a label into `[lower, upper)` in years
type AgeConverter = fn(&[f64]) -> (f64, f64);

const MONTHS_PER_YEAR: f64 = 12.0;

/// Recognised label forms. An upper bound of infinity means "open-ended".
static AGE_PATTERNS: LazyLock<Vec<(Regex, AgeConverter)>> = LazyLock::new(|| {
    vec![
        // "42 years" covers a single year of age
        age_pattern(r"^(\d+) years?$", |x| (x[0], x[0] + 1.0)),
        age_pattern(r"^(\d+)\+ years?$", |x| (x[0], f64::INFINITY)),
        age_pattern(r"^(\d+)-(\d+) years?$", |x| (x[0], x[1] + 1.0)),
        age_pattern(r"^(\d+)-<(\d+) years?$", |x| (x[0], x[1])),
        age_pattern(r"^(\d+) months?-(\d+) years?$", |x| {
            (x[0] / MONTHS_PER_YEAR, x[1] + 1.0)
        }),
        age_pattern(r"^(\d+) months?-<(\d+) years?$", |x| {
            (x[0] / MONTHS_PER_YEAR, x[1])
        }),
        age_pattern(r"^(\d+)-(\d+) months?$", |x| {
            (x[0] / MONTHS_PER_YEAR, (x[1] + 1.0) / MONTHS_PER_YEAR)
        }),
        age_pattern(r"^(\d+)-<(\d+) months?$", |x| {
            (x[0] / MONTHS_PER_YEAR, x[1] / MONTHS_PER_YEAR)
        }),
    ]
});

fn age_pattern(pattern: &str, convert: AgeConverter) -> (Regex, AgeConverter) {
    (Regex::new(pattern).expect("age pattern is valid"), convert)
}

/// Parses age-group labels into intervals measured in years
///
/// Inclusive upper ages are converted to half-open intervals, so
/// `"1-3 years"` and `"1-<4 years"` both become `[1, 4)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeGroupParser {
    age_max: f64,
}

impl Default for AgeGroupParser {
    fn default() -> Self {
        Self::new(&EnumeratorConfig::default())
    }
}

impl AgeGroupParser {
    /// Create a parser; open-ended groups end at the configured `age_max`
    pub fn new(config: &EnumeratorConfig) -> Self {
        Self {
            age_max: config.age_max,
        }
    }

    /// Upper bound used for open-ended groups
    pub fn age_max(&self) -> f64 {
        self.age_max
    }

    /// Parse a label into its interval in years
    ///
    /// # Errors
    /// `UnparseableLabel` if no form matches or the open-ended lower bound
    /// exceeds `age_max`
    pub fn parse(&self, label: &str) -> Result<Interval> {
        let unparseable = || EnumeratorError::UnparseableLabel {
            label: label.to_string(),
        };

        for (regex, convert) in AGE_PATTERNS.iter() {
            let Some(captures) = regex.captures(label) else {
                continue;
            };
            let numbers = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| unparseable())?;

            let (lower, upper) = convert(&numbers);
            let upper = if upper.is_infinite() { self.age_max } else { upper };
            return Interval::new(lower, upper).map_err(|_| unparseable());
        }
        Err(unparseable())
    }

    /// Parse a label, keeping it alongside its interval
    pub fn parse_labeled(&self, label: &str) -> Result<LabeledInterval> {
        Ok(LabeledInterval::new(label, self.parse(label)?))
    }

    /// Is this a recognised age-group label?
    pub fn is_valid(&self, label: &str) -> bool {
        self.parse(label).is_ok()
    }

    /// Do two labels describe the same ages?
    ///
    /// `"1-3 years"` and `"1-<4 years"` are equivalent.
    pub fn equivalent(&self, a: &str, b: &str) -> Result<bool> {
        Ok(self.parse(a)? == self.parse(b)?)
    }
}

/// Enumerates age-group subgroups into age-group supergroups by label
#[derive(Debug, Clone, Default)]
pub struct AgeGroupEnumerator {
    parser: AgeGroupParser,
    intervals: IntervalEnumerator,
}

impl AgeGroupEnumerator {
    /// Create an enumerator from configuration
    pub fn new(config: &EnumeratorConfig) -> Self {
        Self {
            parser: AgeGroupParser::new(config),
            intervals: IntervalEnumerator::new(config),
        }
    }

    /// The label parser
    pub fn parser(&self) -> &AgeGroupParser {
        &self.parser
    }

    /// Enumerate labels, keeping each group's interval
    pub fn enumerate_ages(
        &self,
        supergroups: &[String],
        subgroups: &[String],
    ) -> Result<IntervalEnumeration> {
        let parse = |labels: &[String]| {
            labels
                .iter()
                .map(|label| self.parser.parse_labeled(label))
                .collect::<Result<Vec<_>>>()
        };
        self.intervals
            .enumerate_intervals(&parse(supergroups)?, &parse(subgroups)?)
    }
}

impl Enumerator for AgeGroupEnumerator {
    fn enumerate(&self, supergroups: &[String], subgroups: &[String]) -> Result<MembershipMap> {
        Ok(self.enumerate_ages(supergroups, subgroups)?.into_membership())
    }

    fn group_skeletons(
        &self,
        supergroups: &[String],
        subgroups: &[String],
    ) -> Result<(Vec<Group>, Vec<Group>)> {
        self.enumerate_ages(supergroups, subgroups)?.skeletons("age")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(label: &str) -> (f64, f64) {
        let interval = AgeGroupParser::default().parse(label).unwrap();
        (interval.lower(), interval.upper())
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_label_forms() {
        assert_eq!(bounds("0-4 years"), (0.0, 5.0));
        assert_eq!(bounds("50-64 years"), (50.0, 65.0));
        assert_eq!(bounds("65+ years"), (65.0, 100.0));
        assert_eq!(bounds("0-<1 year"), (0.0, 1.0));
        assert_eq!(bounds("6 months-4 years"), (0.5, 5.0));
        assert_eq!(bounds("6 months-<5 years"), (0.5, 5.0));
        assert_eq!(bounds("6-23 months"), (0.5, 2.0));
        assert_eq!(bounds("0-<6 months"), (0.0, 0.5));
        assert_eq!(bounds("42 years"), (42.0, 43.0));
    }

    #[test]
    fn test_age_max_applies_to_open_groups() {
        let config = EnumeratorConfig {
            age_max: 85.0,
            ..EnumeratorConfig::default()
        };
        let parser = AgeGroupParser::new(&config);
        assert_eq!(parser.parse("65+ years").unwrap().upper(), 85.0);
        assert!(parser.parse("90+ years").is_err());
    }

    #[test]
    fn test_unparseable_labels() {
        let parser = AgeGroupParser::default();
        for label in ["adults", "0-4", "four years", "0-4 years old", ""] {
            assert!(!parser.is_valid(label), "{label} should not parse");
        }
        assert!(matches!(
            parser.parse("adults"),
            Err(EnumeratorError::UnparseableLabel { .. })
        ));
    }

    #[test]
    fn test_equivalent_labels() {
        let parser = AgeGroupParser::default();
        assert!(parser.equivalent("1-3 years", "1-<4 years").unwrap());
        assert!(parser.equivalent("12-23 months", "1 years").unwrap());
        assert!(!parser.equivalent("1-3 years", "1-<3 years").unwrap());
    }

    #[test]
    fn test_enumerate_age_groups() {
        let enumerator = AgeGroupEnumerator::default();
        let map = enumerator
            .enumerate(
                &strings(&["0-17 years", "18+ years"]),
                &strings(&["0-4 years", "5-17 years", "18-64 years", "65+ years"]),
            )
            .unwrap();

        assert_eq!(map.supergroup_of(&"5-17 years".into()).unwrap().as_str(), "0-17 years");
        assert_eq!(map.supergroup_of(&"65+ years".into()).unwrap().as_str(), "18+ years");
        assert_eq!(map.subgroups_of(&"18+ years".into()).len(), 2);
    }

    #[test]
    fn test_misnested_age_groups() {
        let enumerator = AgeGroupEnumerator::default();
        let result = enumerator.enumerate(
            &strings(&["0-17 years", "18+ years"]),
            &strings(&["0-9 years", "10-19 years", "20+ years"]),
        );
        assert!(matches!(result, Err(EnumeratorError::GroupDefinition { .. })));
    }

    #[test]
    fn test_age_skeletons() {
        let enumerator = AgeGroupEnumerator::default();
        let (supers, subs) = enumerator
            .group_skeletons(&strings(&["0-17 years"]), &strings(&["0-4 years", "5-17 years"]))
            .unwrap();

        assert_eq!(supers.len(), 1);
        assert_eq!(subs.len(), 2);
        assert_eq!(
            subs[1].attribute("age").unwrap().value().as_str(),
            Some("5-17 years")
        );
    }
}
