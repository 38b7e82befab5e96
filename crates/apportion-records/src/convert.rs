//! Conversion between JSON values and attribute values

use crate::{MeasurementSpec, Record, RecordError, Result};
use apportion_domain::{Attribute, AttributeValue, Group};
use serde_json::{Number, Value};

/// Attribute value for a JSON scalar
///
/// Arrays and objects are not flat and are rejected.
pub fn attribute_value(field: &str, value: &Value) -> Result<AttributeValue> {
    match value {
        Value::Null => Ok(AttributeValue::Null),
        Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttributeValue::Integer(i)),
            None => n
                .as_f64()
                .map(AttributeValue::Number)
                .ok_or_else(|| RecordError::invalid(field, format!("{} is not representable", n))),
        },
        Value::String(s) => Ok(AttributeValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => {
            Err(RecordError::invalid(field, "records must be flat"))
        }
    }
}

/// JSON value for an attribute value
///
/// Intervals are written as their label. Non-finite numbers become null.
pub fn json_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Integer(i) => Value::from(*i),
        AttributeValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        AttributeValue::Text(s) => Value::String(s.clone()),
        AttributeValue::Interval { label, .. } => Value::String(label.clone()),
    }
}

/// Text form of a grouping field, used to build group ids
pub fn group_label(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(RecordError::invalid(
            field,
            format!("{} cannot name a group", value),
        )),
    }
}

/// Attributes for every non-defining field of `record`
///
/// `is_defining` picks out the grouping and loop-over fields, which are
/// handled by the caller.
pub fn record_attributes(
    record: &Record,
    spec: &MeasurementSpec,
    is_defining: impl Fn(&str) -> bool,
) -> Result<Vec<Attribute>> {
    let mut attributes = Vec::with_capacity(record.len());
    for (field, value) in record {
        if is_defining(field.as_str()) {
            continue;
        }
        let Some((action, kind)) = spec.treatment(field) else {
            continue;
        };

        let value = attribute_value(field, value)?;
        if kind.is_measurement() && value.as_f64().is_none() {
            return Err(RecordError::invalid(
                field,
                format!("{} measurement must be numeric, got {}", kind.as_str(), value),
            ));
        }
        attributes.push(Attribute::new(field.as_str(), value, action, kind)?);
    }
    Ok(attributes)
}

/// Write the attributes of `group` into `record`, skipping defining fields
///
/// Imputed measurements overwrite whatever the record already holds.
pub fn write_attributes(record: &mut Record, group: &Group, is_defining: impl Fn(&str) -> bool) {
    for attribute in group.attributes() {
        if is_defining(attribute.name()) {
            continue;
        }
        record.insert(attribute.name().to_string(), json_value(attribute.value()));
    }
}

/// Numeric value of a measurement field, for tests and callers that
/// inspect output records
pub fn number(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64)
}
