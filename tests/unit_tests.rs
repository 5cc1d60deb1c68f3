//! Unit tests for the gridagg core
//!
//! These tests exercise the grouping registry, group index construction and
//! the aggregation engine on in-memory fields, without touching disk.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use gridagg::{
    engine,
    errors::{GridAggError, Result},
    field::{CoordinateValues, Field},
    group_index::GroupIndex,
    grouping::{self, GroupKey},
    parallel::{get_parallel_info, ParallelConfig},
    reduction,
};
use ndarray::ArrayD;

fn daily_times(year: i32, month: u32, day: u32, n: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_time(NaiveTime::MIN);
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

/// A (time, lat, lon) field with daily timestamps starting 2000-01-01 and
/// data value = time index, constant across the spatial cells.
fn daily_field(n: usize) -> Field {
    let data: Vec<f64> = (0..n * 3 * 2).map(|i| (i / 6) as f64).collect();
    Field::new(
        "temperature",
        vec!["time".to_string(), "lat".to_string(), "lon".to_string()],
        ArrayD::from_shape_vec(vec![n, 3, 2], data).expect("shape matches data"),
    )
    .expect("rank matches dims")
    .with_coordinate("time", CoordinateValues::Time(daily_times(2000, 1, 1, n)))
    .expect("coordinate length matches extent")
}

#[test]
fn test_error_types() {
    let unknown = GridAggError::UnknownFunction {
        registry: "grouping",
        name: "bogus".to_string(),
    };
    assert!(format!("{}", unknown).contains("Unknown grouping function 'bogus'"));
    assert!(unknown.is_configuration());

    let coord = GridAggError::CoordinateNotFound {
        field: "temperature".to_string(),
        coordinate: "time".to_string(),
    };
    assert!(format!("{}", coord).contains("Coordinate 'time' not found on field 'temperature'"));
    assert!(coord.is_configuration());

    let eval = GridAggError::Evaluation {
        function: "year".to_string(),
        detail: "expected a time coordinate value".to_string(),
    };
    assert!(format!("{}", eval).contains("Function 'year' failed"));
    assert!(!eval.is_configuration());

    let shape = GridAggError::ShapeMismatch {
        group: "2000-01".to_string(),
        expected: vec![3, 2],
        found: vec![3],
    };
    assert!(format!("{}", shape).contains("group '2000-01'"));
    assert!(!shape.is_configuration());
}

#[test]
fn test_group_key_ordering_and_encoding() {
    let jan = GroupKey::YearMonth {
        year: 2000,
        month: 1,
    };
    let feb = GroupKey::YearMonth {
        year: 2000,
        month: 2,
    };
    let dec_1999 = GroupKey::YearMonth {
        year: 1999,
        month: 12,
    };
    assert!(dec_1999 < jan && jan < feb);

    assert_eq!(jan.as_f64(), Some(200001.0));
    assert_eq!(format!("{}", jan), "2000-01");
    assert_eq!(GroupKey::Int(7).as_f64(), Some(7.0));
    assert_eq!(GroupKey::Label("DJF".to_string()).as_f64(), None);
    assert_eq!(format!("{}", GroupKey::Label("DJF".to_string())), "DJF");
}

#[test]
fn test_registries_reject_unknown_names() {
    match grouping::resolve("bogus") {
        Err(GridAggError::UnknownFunction { registry, name }) => {
            assert_eq!(registry, "grouping");
            assert_eq!(name, "bogus");
        }
        other => panic!("Expected UnknownFunction, got {:?}", other.map(|g| g.name)),
    }
    match reduction::resolve("bogus") {
        Err(GridAggError::UnknownFunction { registry, .. }) => {
            assert_eq!(registry, "reduction");
        }
        other => panic!("Expected UnknownFunction, got {:?}", other.map(|r| r.name)),
    }
    match reduction::resolve_post("bogus") {
        Err(GridAggError::UnknownFunction { registry, .. }) => {
            assert_eq!(registry, "post-processing");
        }
        other => panic!("Expected UnknownFunction, got {:?}", other.map(|p| p.name)),
    }

    // Known names resolve, including the historical alias
    assert_eq!(grouping::resolve("yearmonth").unwrap().name, "yearmonth");
    assert_eq!(reduction::resolve("total").unwrap().name, "sum");
    assert_eq!(reduction::resolve_post("round").unwrap().name, "round");
}

#[test]
fn test_partition_is_total_and_disjoint() -> Result<()> {
    let field = daily_field(60);
    let grouping_fn = grouping::resolve("yearmonth")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;

    assert_eq!(index.source_len(), 60);
    assert_eq!(index.total_positions(), 60);

    let mut seen = vec![false; 60];
    for (_, positions) in index.groups() {
        for &p in positions {
            assert!(!seen[p], "position {} assigned to two groups", p);
            seen[p] = true;
        }
    }
    assert!(seen.iter().all(|&s| s));
    Ok(())
}

#[test]
fn test_group_order_is_deterministic() -> Result<()> {
    let field = daily_field(60);
    let grouping_fn = grouping::resolve("yearmonth")?;
    let first = GroupIndex::build(&field, "time", grouping_fn, &[])?;
    let second = GroupIndex::build(&field, "time", grouping_fn, &[])?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_two_month_scenario() -> Result<()> {
    // 60 daily values starting 2000-01-01 span exactly January (31 days)
    // and February (29 days, leap year).
    let field = daily_field(60);
    let grouping_fn = grouping::resolve("yearmonth")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;

    assert_eq!(index.len(), 2);
    let lengths: Vec<usize> = index.groups().iter().map(|(_, p)| p.len()).collect();
    assert_eq!(lengths, vec![31, 29]);
    let keys: Vec<String> = index.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["2000-01", "2000-02"]);

    let reduction_fn = reduction::resolve("mean")?;
    let monthly = engine::apply(&field, &index, reduction_fn)?;

    assert_eq!(monthly.shape(), &[2, 3, 2]);
    assert_eq!(monthly.dims, field.dims);
    match monthly.coordinate("time") {
        Some(CoordinateValues::Numeric(values)) => {
            assert_eq!(values, &vec![200001.0, 200002.0]);
        }
        other => panic!("Expected numeric group-key coordinate, got {:?}", other),
    }

    // Data value equals the time index, so January averages 0..=30 and
    // February averages 31..=59.
    assert_eq!(monthly.data[[0, 0, 0]], 15.0);
    assert_eq!(monthly.data[[1, 2, 1]], 45.0);
    Ok(())
}

#[test]
fn test_constant_field_invariance_under_mean() -> Result<()> {
    let mut field = daily_field(60);
    field.data.fill(2.5);
    let grouping_fn = grouping::resolve("yearmonth")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;
    let monthly = engine::apply(&field, &index, reduction::resolve("mean")?)?;
    assert!(monthly.data.iter().all(|&v| v == 2.5));
    Ok(())
}

#[test]
fn test_shape_preservation_and_rank() -> Result<()> {
    let field = daily_field(10);
    let grouping_fn = grouping::resolve("dayofyear")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;
    assert_eq!(index.len(), 10);

    let out = engine::apply(&field, &index, reduction::resolve("sum")?)?;
    assert_eq!(out.rank(), field.rank());
    assert_eq!(out.shape(), &[10, 3, 2]);
    assert_eq!(out.len_of("lat"), Some(3));
    assert_eq!(out.len_of("lon"), Some(2));
    Ok(())
}

#[test]
fn test_mean_skips_non_finite_values() -> Result<()> {
    let mut field = daily_field(4);
    field.data[[1, 0, 0]] = f64::NAN;
    field.data[[2, 0, 0]] = f64::INFINITY;
    let grouping_fn = grouping::resolve("yearmonth")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;
    let out = engine::apply(&field, &index, reduction::resolve("mean")?)?;

    // Cell (0,0): finite values 0 and 3 remain
    assert_eq!(out.data[[0, 0, 0]], 1.5);
    // Other cells average all four indices
    assert_eq!(out.data[[0, 1, 0]], 1.5);
    Ok(())
}

#[test]
fn test_std_and_count_reductions() -> Result<()> {
    let field = daily_field(4);
    let grouping_fn = grouping::resolve("yearmonth")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;

    let std = engine::apply(&field, &index, reduction::resolve("std")?)?;
    // Population std of [0, 1, 2, 3]
    let expected = 1.25f64.sqrt();
    assert!((std.data[[0, 0, 0]] - expected).abs() < 1e-12);

    let count = engine::apply(&field, &index, reduction::resolve("count")?)?;
    assert!(count.data.iter().all(|&v| v == 4.0));
    Ok(())
}

#[test]
fn test_min_max_reductions() -> Result<()> {
    let field = daily_field(5);
    let grouping_fn = grouping::resolve("yearmonth")?;
    let index = GroupIndex::build(&field, "time", grouping_fn, &[])?;

    let min = engine::apply(&field, &index, reduction::resolve("min")?)?;
    let max = engine::apply(&field, &index, reduction::resolve("max")?)?;
    assert_eq!(min.data[[0, 0, 0]], 0.0);
    assert_eq!(max.data[[0, 0, 0]], 4.0);
    Ok(())
}

#[test]
fn test_season_groups_keep_first_occurrence_order() -> Result<()> {
    let times = vec![
        NaiveDate::from_ymd_opt(2000, 6, 15).unwrap().and_time(NaiveTime::MIN),
        NaiveDate::from_ymd_opt(2000, 1, 15).unwrap().and_time(NaiveTime::MIN),
        NaiveDate::from_ymd_opt(2000, 7, 15).unwrap().and_time(NaiveTime::MIN),
        NaiveDate::from_ymd_opt(2000, 10, 15).unwrap().and_time(NaiveTime::MIN),
    ];
    let field = Field::new(
        "pr",
        vec!["time".to_string()],
        ArrayD::from_shape_vec(vec![4], vec![1.0, 2.0, 3.0, 4.0])?,
    )?
    .with_coordinate("time", CoordinateValues::Time(times))?;

    let index = GroupIndex::build(&field, "time", grouping::resolve("season")?, &[])?;
    let keys: Vec<String> = index.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["JJA", "DJF", "SON"]);

    // Label keys fall back to ordinal coordinate values with the labels
    // preserved as an attribute.
    let out = engine::apply(&field, &index, reduction::resolve("sum")?)?;
    match out.coordinate("time") {
        Some(CoordinateValues::Numeric(values)) => assert_eq!(values, &vec![0.0, 1.0, 2.0]),
        other => panic!("Expected ordinal coordinate, got {:?}", other),
    }
    assert_eq!(out.data.as_slice().unwrap(), &[4.0, 2.0, 4.0]);
    Ok(())
}

#[test]
fn test_bin_grouping_on_numeric_coordinate() -> Result<()> {
    let field = Field::new(
        "elevation",
        vec!["lat".to_string()],
        ArrayD::from_shape_vec(vec![5], vec![10.0, 20.0, 30.0, 40.0, 50.0])?,
    )?
    .with_coordinate(
        "lat",
        CoordinateValues::Numeric(vec![0.0, 0.5, 1.0, 1.5, 2.0]),
    )?;

    let bin = grouping::resolve("bin")?;
    let index = GroupIndex::build(&field, "lat", bin, &["1".to_string()])?;
    assert_eq!(index.len(), 3);
    let lengths: Vec<usize> = index.groups().iter().map(|(_, p)| p.len()).collect();
    assert_eq!(lengths, vec![2, 2, 1]);

    // Missing or malformed width fails the whole build
    assert!(GroupIndex::build(&field, "lat", bin, &[]).is_err());
    match GroupIndex::build(&field, "lat", bin, &["wide".to_string()]) {
        Err(GridAggError::Evaluation { function, .. }) => assert_eq!(function, "bin"),
        other => panic!("Expected Evaluation error, got {:?}", other.map(|i| i.len())),
    }
    Ok(())
}

#[test]
fn test_time_grouping_rejects_numeric_coordinate() {
    let field = Field::new(
        "elevation",
        vec!["lat".to_string()],
        ArrayD::from_shape_vec(vec![3], vec![1.0, 2.0, 3.0]).unwrap(),
    )
    .unwrap()
    .with_coordinate("lat", CoordinateValues::Numeric(vec![0.0, 1.0, 2.0]))
    .unwrap();

    let result = GroupIndex::build(&field, "lat", grouping::resolve("year").unwrap(), &[]);
    match result {
        Err(GridAggError::Evaluation { function, detail }) => {
            assert_eq!(function, "year");
            assert!(detail.contains("position 0"));
        }
        other => panic!("Expected Evaluation error, got {:?}", other.map(|i| i.len())),
    }
}

#[test]
fn test_missing_coordinate_is_configuration_error() {
    let field = daily_field(6);
    let result = GroupIndex::build(
        &field,
        "altitude",
        grouping::resolve("yearmonth").unwrap(),
        &[],
    );
    match result {
        Err(e @ GridAggError::CoordinateNotFound { .. }) => assert!(e.is_configuration()),
        other => panic!("Expected CoordinateNotFound, got {:?}", other.map(|i| i.len())),
    }

    // Dimension exists but carries no coordinate values
    let bare = Field::new(
        "pr",
        vec!["time".to_string()],
        ArrayD::from_shape_vec(vec![3], vec![1.0, 2.0, 3.0]).unwrap(),
    )
    .unwrap();
    let result = GroupIndex::build(&bare, "time", grouping::resolve("yearmonth").unwrap(), &[]);
    assert!(matches!(
        result,
        Err(GridAggError::CoordinateNotFound { .. })
    ));
}

#[test]
fn test_apply_rejects_mismatched_group_index() -> Result<()> {
    let sixty = daily_field(60);
    let thirty = daily_field(30);
    let index = GroupIndex::build(&sixty, "time", grouping::resolve("yearmonth")?, &[])?;

    match engine::apply(&thirty, &index, reduction::resolve("mean")?) {
        Err(GridAggError::GroupIndexMismatch { .. }) => {}
        other => panic!(
            "Expected GroupIndexMismatch, got {:?}",
            other.map(|f| f.name)
        ),
    }

    // Index naming a dimension the field does not have
    let spatial = Field::new(
        "elevation",
        vec!["lat".to_string()],
        ArrayD::from_shape_vec(vec![3], vec![1.0, 2.0, 3.0])?,
    )?;
    match engine::apply(&spatial, &index, reduction::resolve("mean")?) {
        Err(GridAggError::GroupIndexMismatch { .. }) => {}
        other => panic!(
            "Expected GroupIndexMismatch, got {:?}",
            other.map(|f| f.name)
        ),
    }
    Ok(())
}

#[test]
fn test_post_processing_functions() -> Result<()> {
    let field = Field::new(
        "anomaly",
        vec!["x".to_string()],
        ArrayD::from_shape_vec(vec![3], vec![-1.5, 2.25, -4.0])?,
    )?;

    let abs = reduction::resolve_post("abs")?.apply(&field);
    assert_eq!(abs.data.as_slice().unwrap(), &[1.5, 2.25, 4.0]);

    let rounded = reduction::resolve_post("round")?.apply(&field);
    assert_eq!(rounded.data.as_slice().unwrap(), &[-2.0, 2.0, -4.0]);
    Ok(())
}

#[test]
fn test_field_invariants() {
    // Rank must match the number of dimension names
    let result = Field::new(
        "pr",
        vec!["time".to_string()],
        ArrayD::from_shape_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
    );
    assert!(result.is_err());

    // Coordinate length must match the dimension extent
    let field = Field::new(
        "pr",
        vec!["time".to_string()],
        ArrayD::from_shape_vec(vec![3], vec![1.0, 2.0, 3.0]).unwrap(),
    )
    .unwrap();
    let result = field.with_coordinate("time", CoordinateValues::Numeric(vec![0.0, 1.0]));
    assert!(result.is_err());
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.unwrap() > 0);

    assert!(default_config.current_threads() > 0);

    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
}
