//! Record-level scenarios: JSON rows in, JSON rows out

use apportion_engine::EngineError;
use apportion_records::{
    aggregate, disaggregate, GroupingSpec, MeasurementSpec, MembershipSpec, Record, RecordError,
    RecordImputer,
};
use apportion_domain::MembershipMap;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("apportion_records=debug,apportion_engine=debug")
        .try_init();
}

fn rows(value: Value) -> Vec<Record> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row.as_object().unwrap().clone())
        .collect()
}

/// Compare records field by field, numbers within a relative tolerance
fn assert_rows_close(actual: &[Record], expected: &[Record]) {
    assert_eq!(actual.len(), expected.len(), "row count");
    for (a, e) in actual.iter().zip(expected) {
        let a_keys: BTreeSet<&String> = a.keys().collect();
        let e_keys: BTreeSet<&String> = e.keys().collect();
        assert_eq!(a_keys, e_keys, "fields of {:?}", a);

        for (field, expected_value) in e {
            let actual_value = &a[field];
            match (actual_value.as_f64(), expected_value.as_f64()) {
                (Some(x), Some(y)) => assert!(
                    (x - y).abs() <= 1e-9 * y.abs().max(1.0),
                    "{}: expected {}, got {}",
                    field,
                    y,
                    x
                ),
                _ => assert_eq!(actual_value, expected_value, "{}", field),
            }
        }
    }
}

fn state_data() -> Vec<Record> {
    rows(json!([
        {
            "state": "California",
            "size": 40,
            "flower": "Eschscholzia californica",
            "some_rate": 1.2,
            "some_count": 10,
            "to_exclude": "wont",
            "to_ignore": "willbe",
        },
        {
            "state": "Washington",
            "size": 8,
            "flower": "Rhododendron macrophyllum",
            "some_rate": 1.3,
            "some_count": 20,
            "to_exclude": "see",
            "to_ignore": "ignored",
        },
    ]))
}

fn age_group_data() -> Vec<Record> {
    rows(json!([
        {
            "age_group": "0-17 years",
            "size": 1800,
            "cases": 180,
            "vaccination_rate": 0.4,
            "collection_date": "2024-01-01",
            "notes": "young",
            "to_exclude": "skip1",
        },
        {
            "age_group": "18+ years",
            "size": 8200,
            "cases": 820,
            "vaccination_rate": 0.8,
            "collection_date": "2024-01-01",
            "notes": "adult",
            "to_exclude": "skip2",
        },
    ]))
}

fn age_subgroup_results() -> Vec<Record> {
    rows(json!([
        {"age_group": "0-4 years", "size": 500.0, "cases": 50.0, "vaccination_rate": 0.4, "collection_date": "2024-01-01"},
        {"age_group": "5-17 years", "size": 1300.0, "cases": 130.0, "vaccination_rate": 0.4, "collection_date": "2024-01-01"},
        {"age_group": "18-64 years", "size": 4700.0, "cases": 470.0, "vaccination_rate": 0.8, "collection_date": "2024-01-01"},
        {"age_group": "65+ years", "size": 3500.0, "cases": 350.0, "vaccination_rate": 0.8, "collection_date": "2024-01-01"},
    ]))
}

fn age_measurements() -> MeasurementSpec {
    MeasurementSpec::new(["cases", "size"], ["vaccination_rate"])
        .with_copy(["collection_date"])
        .with_exclude(["notes", "to_exclude"])
}

fn state_measurements() -> MeasurementSpec {
    MeasurementSpec::new(["some_count"], ["some_rate"]).with_exclude(["to_exclude", "to_ignore"])
}

#[test]
fn test_disaggregate_categorical() {
    init_tracing();
    let subgroup_defs = rows(json!([
        {"state": "California", "splitvar": "cat1", "size": 20},
        {"state": "California", "splitvar": "cat2", "size": 20},
        {"state": "Washington", "splitvar": "cat1", "size": 2},
        {"state": "Washington", "splitvar": "cat2", "size": 6},
    ]));
    let grouping = GroupingSpec::new("state", "splitvar", MembershipSpec::Categorical);

    let (out, report) =
        disaggregate(&state_data(), &subgroup_defs, &grouping, &state_measurements()).unwrap();

    let expected = rows(json!([
        {"splitvar": "cat1", "state": "California", "size": 20, "flower": "Eschscholzia californica", "some_rate": 1.2, "some_count": 5.0},
        {"splitvar": "cat2", "state": "California", "size": 20, "flower": "Eschscholzia californica", "some_rate": 1.2, "some_count": 5.0},
        {"splitvar": "cat1", "state": "Washington", "size": 2, "flower": "Rhododendron macrophyllum", "some_rate": 1.3, "some_count": 5.0},
        {"splitvar": "cat2", "state": "Washington", "size": 6, "flower": "Rhododendron macrophyllum", "some_rate": 1.3, "some_count": 15.0},
    ]));
    assert_rows_close(&out, &expected);
    assert!(report.is_clean());
}

#[test]
fn test_disaggregate_age_groups() {
    init_tracing();
    let subgroups = rows(json!([
        {"age_group": "0-4 years"},
        {"age_group": "5-17 years"},
        {"age_group": "18-64 years"},
        {"age_group": "65+ years"},
    ]));

    let (out, _) = disaggregate(
        &age_group_data(),
        &subgroups,
        &GroupingSpec::age_groups("age_group"),
        &age_measurements(),
    )
    .unwrap();

    assert_rows_close(&out, &age_subgroup_results());
}

#[test]
fn test_aggregate_categorical() {
    let supergroups = rows(json!([
        {"state": "California", "size": 40},
        {"state": "Washington", "size": 8},
    ]));
    let subgroups = rows(json!([
        {"splitvar": "cat1", "state": "California", "size": 20, "flower": "Eschscholzia californica", "some_rate": 1.2, "some_count": 5.0, "to_exclude": "foo", "to_ignore": "bar"},
        {"splitvar": "cat2", "state": "California", "size": 20, "flower": "Eschscholzia californica", "some_rate": 1.2, "some_count": 5.0, "to_exclude": "foz", "to_ignore": "baz"},
        {"splitvar": "cat1", "state": "Washington", "size": 2, "flower": "Rhododendron macrophyllum", "some_rate": 1.3, "some_count": 5.0, "to_exclude": "foo", "to_ignore": "bar"},
        {"splitvar": "cat2", "state": "Washington", "size": 6, "flower": "Rhododendron macrophyllum", "some_rate": 1.3, "some_count": 15.0, "to_exclude": "foz", "to_ignore": "baz"},
    ]));
    let grouping = GroupingSpec::new("state", "splitvar", MembershipSpec::Categorical);

    let (out, _) = aggregate(&supergroups, &subgroups, &grouping, &state_measurements()).unwrap();

    let mut expected = state_data();
    for row in &mut expected {
        row.remove("to_exclude");
        row.remove("to_ignore");
    }
    assert_rows_close(&out, &expected);
}

#[test]
fn test_aggregate_age_groups() {
    let supergroups = rows(json!([{"age_group": "0-17 years"}, {"age_group": "18+ years"}]));

    let (out, report) = aggregate(
        &supergroups,
        &age_subgroup_results(),
        &GroupingSpec::age_groups("age_group"),
        &age_measurements(),
    )
    .unwrap();

    let mut expected = age_group_data();
    for row in &mut expected {
        row.remove("notes");
        row.remove("to_exclude");
    }
    assert_rows_close(&out, &expected);
    assert_eq!(report.subgroups, 4);
}

#[test]
fn test_disaggregate_with_explicit_pairs() {
    let pairs = rows(json!([
        {"state": "California", "county": "Sutter"},
        {"state": "Washington", "county": "Skagit"},
        {"state": "Washington", "county": "San Juan"},
    ]));
    let grouping = GroupingSpec::new("state", "county", MembershipSpec::Pairs { pairs });
    let supergroups = rows(json!([
        {"state": "California", "cases": 10},
        {"state": "Washington", "cases": 20},
    ]));
    let subgroups = rows(json!([
        {"state": "California", "county": "Sutter", "size": 5},
        {"state": "Washington", "county": "Skagit", "size": 3},
        {"state": "Washington", "county": "San Juan", "size": 1},
    ]));

    let (out, _) = disaggregate(
        &supergroups,
        &subgroups,
        &grouping,
        &MeasurementSpec::new(["cases"], Vec::<String>::new()),
    )
    .unwrap();

    let expected = rows(json!([
        {"state": "California", "county": "Sutter", "size": 5, "cases": 10.0},
        {"state": "Washington", "county": "Skagit", "size": 3, "cases": 15.0},
        {"state": "Washington", "county": "San Juan", "size": 1, "cases": 5.0},
    ]));
    assert_rows_close(&out, &expected);
}

#[test]
fn test_disaggregate_with_breakpoints() {
    let grouping = GroupingSpec::new(
        "age_lower",
        "age_lower",
        MembershipSpec::Breakpoints {
            supergroup: vec![0.0, 18.0, 100.0],
            subgroup: vec![0.0, 5.0, 18.0, 65.0, 100.0],
        },
    );
    let supergroups = rows(json!([
        {"age_lower": 0, "cases": 18},
        {"age_lower": 18, "cases": 82},
    ]));
    let subgroups = rows(json!([
        {"age_lower": 0},
        {"age_lower": 5},
        {"age_lower": 18},
        {"age_lower": 65},
    ]));

    let (out, _) = disaggregate(
        &supergroups,
        &subgroups,
        &grouping,
        &MeasurementSpec::new(["cases"], Vec::<String>::new()),
    )
    .unwrap();

    let expected = rows(json!([
        {"age_lower": 0, "cases": 5.0},
        {"age_lower": 5, "cases": 13.0},
        {"age_lower": 18, "cases": 47.0},
        {"age_lower": 65, "cases": 35.0},
    ]));
    assert_rows_close(&out, &expected);
}

#[test]
fn test_disaggregate_with_precomputed_map() {
    let membership = MembershipMap::from_pairs(vec![
        ("north".into(), "region".into()),
        ("south".into(), "region".into()),
    ])
    .unwrap();
    let grouping = GroupingSpec::new("region", "district", MembershipSpec::Map(membership));
    let supergroups = rows(json!([{"region": "region", "cases": 9}]));
    let subgroups = rows(json!([
        {"district": "north", "population": 1},
        {"district": "south", "population": 2},
    ]));
    let measurements =
        MeasurementSpec::new(["cases"], Vec::<String>::new()).with_weighting_field("population");

    let (out, _) = disaggregate(&supergroups, &subgroups, &grouping, &measurements).unwrap();

    let expected = rows(json!([
        {"district": "north", "population": 1, "cases": 3.0},
        {"district": "south", "population": 2, "cases": 6.0},
    ]));
    assert_rows_close(&out, &expected);
}

#[test]
fn test_density_needs_subgroup_size() {
    let membership = MembershipMap::from_pairs(vec![
        ("north".into(), "region".into()),
        ("south".into(), "region".into()),
    ])
    .unwrap();
    let grouping = GroupingSpec::new("region", "district", MembershipSpec::Map(membership));
    let supergroups = rows(json!([{"region": "region", "size": 100, "rate": 0.2}]));
    let subgroups = rows(json!([
        {"district": "north", "population": 30},
        {"district": "south", "population": 70},
    ]));

    // An unlisted size is copied, and a copied size describes the whole region
    let copied = MeasurementSpec::new(Vec::<String>::new(), ["rate"]).with_weighting_field("population");
    match disaggregate(&supergroups, &subgroups, &grouping, &copied) {
        Err(RecordError::Engine(EngineError::MissingSizeMeasurement { group, measurement, .. })) => {
            assert_eq!(group, "north");
            assert_eq!(measurement, "rate");
        }
        other => panic!("expected missing size, got {:?}", other),
    }

    let imputed = MeasurementSpec::new(["size"], ["rate"]).with_weighting_field("population");
    let (out, _) = disaggregate(&supergroups, &subgroups, &grouping, &imputed).unwrap();
    let expected = rows(json!([
        {"district": "north", "population": 30, "size": 30.0, "rate": 0.2},
        {"district": "south", "population": 70, "size": 70.0, "rate": 0.2},
    ]));
    assert_rows_close(&out, &expected);
}

#[test]
fn test_aggregate_copies_equal_numbers() {
    let subgroups = rows(json!([
        {"state": "WA", "splitvar": "a", "cases": 1, "year": 2020},
        {"state": "WA", "splitvar": "b", "cases": 2, "year": 2020.0},
    ]));
    let grouping = GroupingSpec::new("state", "splitvar", MembershipSpec::Categorical);

    let (out, _) = RecordImputer::new(grouping, MeasurementSpec::new(["cases"], Vec::<String>::new()))
        .aggregate(&[], &subgroups)
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["year"].as_f64(), Some(2020.0));
    assert_eq!(out[0]["cases"].as_f64(), Some(3.0));
}

#[test]
fn test_loop_over_partitions() {
    init_tracing();
    let supergroups = rows(json!([
        {"state": "WA", "age_group": "0-17 years", "cases": 18},
        {"state": "WA", "age_group": "18+ years", "cases": 82},
        {"state": "OR", "age_group": "0-17 years", "cases": 36},
        {"state": "OR", "age_group": "18+ years", "cases": 164},
    ]));
    let subgroups = rows(json!([
        {"state": "WA", "age_group": "0-4 years"},
        {"state": "WA", "age_group": "5-17 years"},
        {"state": "WA", "age_group": "18+ years"},
        {"state": "OR", "age_group": "0-4 years"},
        {"state": "OR", "age_group": "5-17 years"},
        {"state": "OR", "age_group": "18+ years"},
    ]));
    let grouping = GroupingSpec::age_groups("age_group").with_loop_over(["state"]);

    let (out, report) = disaggregate(
        &supergroups,
        &subgroups,
        &grouping,
        &MeasurementSpec::new(["cases"], Vec::<String>::new()),
    )
    .unwrap();

    let expected = rows(json!([
        {"state": "WA", "age_group": "0-4 years", "cases": 5.0},
        {"state": "WA", "age_group": "5-17 years", "cases": 13.0},
        {"state": "WA", "age_group": "18+ years", "cases": 82.0},
        {"state": "OR", "age_group": "0-4 years", "cases": 10.0},
        {"state": "OR", "age_group": "5-17 years", "cases": 26.0},
        {"state": "OR", "age_group": "18+ years", "cases": 164.0},
    ]));
    assert_rows_close(&out, &expected);
    assert_eq!(report.supergroups, 4);

    // Aggregating each partition recovers its supergroup rows
    let (back, _) = aggregate(
        &supergroups,
        &out,
        &grouping,
        &MeasurementSpec::new(["cases"], Vec::<String>::new()),
    )
    .unwrap();
    assert_rows_close(&back, &supergroups);
}

#[test]
fn test_loop_over_mismatch() {
    let supergroups = rows(json!([{"state": "WA", "age_group": "0-17 years", "cases": 1}]));
    let subgroups = rows(json!([
        {"state": "WA", "age_group": "0-17 years"},
        {"state": "OR", "age_group": "0-17 years"},
    ]));
    let grouping = GroupingSpec::age_groups("age_group").with_loop_over(["state"]);

    let result = disaggregate(
        &supergroups,
        &subgroups,
        &grouping,
        &MeasurementSpec::new(["cases"], Vec::<String>::new()),
    );
    match result {
        Err(RecordError::LoopKeyMismatch { partition, side }) => {
            assert_eq!(partition, "{state=\"OR\"}");
            assert_eq!(side, "subgroup");
        }
        other => panic!("expected loop key mismatch, got {:?}", other),
    }
}

#[test]
fn test_aggregate_rejects_disagreeing_copies() {
    let subgroups = rows(json!([
        {"state": "WA", "splitvar": "a", "cases": 1, "flower": "rhododendron"},
        {"state": "WA", "splitvar": "b", "cases": 2, "flower": "lupine"},
    ]));
    let grouping = GroupingSpec::new("state", "splitvar", MembershipSpec::Categorical);

    let result = RecordImputer::new(grouping, MeasurementSpec::new(["cases"], Vec::<String>::new()))
        .aggregate(&[], &subgroups);
    match result {
        Err(RecordError::Engine(EngineError::InconsistentCopyAttribute { supergroup, attribute, .. })) => {
            assert_eq!(supergroup, "WA");
            assert_eq!(attribute, "flower");
        }
        other => panic!("expected inconsistent copy attribute, got {:?}", other),
    }
}

#[test]
fn test_misnested_age_groups() {
    let supergroups = rows(json!([
        {"age_group": "0-5 years", "cases": 1},
        {"age_group": "6-11 years", "cases": 1},
    ]));
    let subgroups = rows(json!([
        {"age_group": "0-4 years"},
        {"age_group": "5-8 years"},
        {"age_group": "9-11 years"},
    ]));

    let result = disaggregate(
        &supergroups,
        &subgroups,
        &GroupingSpec::age_groups("age_group"),
        &MeasurementSpec::new(["cases"], Vec::<String>::new()),
    );
    assert!(matches!(
        result,
        Err(RecordError::Enumerator(
            apportion_enumerator::EnumeratorError::GroupDefinition { .. }
        ))
    ));
}
