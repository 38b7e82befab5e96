//! Loop-over partitioning of records

use crate::resolve::{require, Side};
use crate::{Record, RecordError, Result};
use serde_json::Value;

/// Records sharing one combination of loop-over values
#[derive(Debug)]
pub(crate) struct Partition<'r> {
    /// Loop-over fields and their values, in `loop_over` order
    pub(crate) values: Vec<(String, Value)>,
    /// `(input index, record)` of each supergroup record
    pub(crate) supergroups: Vec<(usize, &'r Record)>,
    /// `(input index, record)` of each subgroup record
    pub(crate) subgroups: Vec<(usize, &'r Record)>,
}

impl Partition<'_> {
    /// Human-readable key, empty when not looping
    pub(crate) fn describe(&self) -> String {
        if self.values.is_empty() {
            return String::new();
        }
        format!(" in partition {}", self.render())
    }

    fn render(&self) -> String {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn key(&self) -> Vec<&Value> {
        self.values.iter().map(|(_, value)| value).collect()
    }
}

/// Split records by their `loop_over` values
///
/// Partitions come out in order of first appearance, supergroup records
/// first. Without loop-over fields everything lands in one partition.
/// A partition with supergroups but no subgroups is always a mismatch;
/// subgroups without supergroups are a mismatch only when
/// `require_supergroups` is set.
pub(crate) fn partition<'r>(
    loop_over: &[String],
    supergroups: &'r [Record],
    subgroups: &'r [Record],
    require_supergroups: bool,
) -> Result<Vec<Partition<'r>>> {
    if loop_over.is_empty() {
        return Ok(vec![Partition {
            values: Vec::new(),
            supergroups: supergroups.iter().enumerate().collect(),
            subgroups: subgroups.iter().enumerate().collect(),
        }]);
    }

    let mut partitions: Vec<Partition<'r>> = Vec::new();
    for (side, records) in [(Side::Supergroup, supergroups), (Side::Subgroup, subgroups)] {
        for (index, record) in records.iter().enumerate() {
            let values = loop_over
                .iter()
                .map(|field| -> Result<(String, Value)> {
                    Ok((field.clone(), require(record, side.as_str(), index, field)?.clone()))
                })
                .collect::<Result<Vec<(String, Value)>>>()?;

            let key: Vec<&Value> = values.iter().map(|(_, value)| value).collect();
            let position = match partitions.iter().position(|p| p.key() == key) {
                Some(position) => position,
                None => {
                    partitions.push(Partition {
                        values,
                        supergroups: Vec::new(),
                        subgroups: Vec::new(),
                    });
                    partitions.len() - 1
                }
            };

            let members = match side {
                Side::Supergroup => &mut partitions[position].supergroups,
                Side::Subgroup => &mut partitions[position].subgroups,
            };
            members.push((index, record));
        }
    }

    for partition in &partitions {
        if partition.subgroups.is_empty() {
            return Err(mismatch(partition, Side::Supergroup));
        }
        if require_supergroups && partition.supergroups.is_empty() {
            return Err(mismatch(partition, Side::Subgroup));
        }
    }

    Ok(partitions)
}

fn mismatch(partition: &Partition<'_>, side: Side) -> RecordError {
    RecordError::LoopKeyMismatch {
        partition: partition.render(),
        side: side.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_single_partition_without_loop() {
        let supers = records(vec![json!({"a": 1})]);
        let parts = partition(&[], &supers, &[], true).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].supergroups.len(), 1);
        assert_eq!(parts[0].describe(), "");
    }

    #[test]
    fn test_partitions_in_first_seen_order() {
        let loop_over = vec!["state".to_string()];
        let supers = records(vec![
            json!({"state": "WA", "g": "x"}),
            json!({"state": "CA", "g": "x"}),
            json!({"state": "WA", "g": "y"}),
        ]);
        let subs = records(vec![
            json!({"state": "CA", "g": "x1"}),
            json!({"state": "WA", "g": "x1"}),
        ]);

        let parts = partition(&loop_over, &supers, &subs, true).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].values, vec![("state".to_string(), json!("WA"))]);
        assert_eq!(parts[0].supergroups.len(), 2);
        assert_eq!(parts[0].supergroups[1].0, 2);
        assert_eq!(parts[1].subgroups.len(), 1);
        assert_eq!(parts[0].describe(), " in partition {state=\"WA\"}");
    }

    #[test]
    fn test_mismatch() {
        let loop_over = vec!["state".to_string()];
        let supers = records(vec![json!({"state": "WA"})]);
        let subs = records(vec![json!({"state": "WA"}), json!({"state": "OR"})]);

        let result = partition(&loop_over, &supers, &subs, true);
        assert!(matches!(
            result,
            Err(RecordError::LoopKeyMismatch { side: "subgroup", .. })
        ));

        // Aggregation may start from subgroups alone
        assert_eq!(partition(&loop_over, &supers, &subs, false).unwrap().len(), 2);

        let result = partition(&loop_over, &subs, &supers, false);
        assert!(matches!(
            result,
            Err(RecordError::LoopKeyMismatch { side: "supergroup", .. })
        ));
    }

    #[test]
    fn test_missing_loop_field() {
        let loop_over = vec!["state".to_string()];
        let supers = records(vec![json!({"county": "Skagit"})]);
        assert!(matches!(
            partition(&loop_over, &supers, &[], false),
            Err(RecordError::MissingField { .. })
        ));
    }
}
