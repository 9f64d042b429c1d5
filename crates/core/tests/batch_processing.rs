//! Batch processing integration tests
//!
//! Exercises the file-discovery → evaluate → write pipeline end to end over
//! temporary directories, the way the cluster job wrapper drives it.

use labour_loss_core::{
    run_batch, BatchError, GridCoords, GridError, IntensityClass, LossDataset, WbgtDataset,
    WbgtGrid, NODATAVAL,
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn hourly_times(n: usize) -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|h| start + Duration::hours(i64::try_from(h).unwrap()))
        .collect()
}

fn write_input(dir: &Path, name: &str, values: Vec<f64>) -> WbgtDataset {
    let coords = GridCoords::new(hourly_times(2), vec![-35.0, -34.9], vec![149.0, 149.1]).unwrap();
    let grid = WbgtGrid::new(coords, values).unwrap();
    let dataset = WbgtDataset::new("wbgtAdjust", grid);
    dataset.save(dir.join(name)).unwrap();
    dataset
}

#[test]
fn test_batch_produces_loss_outputs_for_every_input() {
    init_logging();
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let d2020 = write_input(
        input_dir.path(),
        "wbgtAdjust_2020.json",
        vec![22.0, 26.0, 30.0, 34.0, 24.0, 28.0, 32.0, 36.0],
    );
    write_input(
        input_dir.path(),
        "wbgtAdjust_2021.json",
        vec![20.0, 25.0, 30.0, 35.0, 21.0, 26.0, 31.0, 36.0],
    );

    let reports = run_batch(input_dir.path(), output_dir.path(), "wbgtAdjust").unwrap();
    assert_eq!(reports.len(), 2);

    for year in ["2020", "2021"] {
        let path = output_dir.path().join(format!("productivityLoss_{year}.json"));
        assert!(path.exists(), "missing output for {year}");

        let loss = LossDataset::load(&path).unwrap();
        assert_eq!(loss.variables.len(), 3);
        for class in IntensityClass::ALL {
            let variable = loss.variable(class.output_variable()).unwrap();
            for &v in &variable.values {
                assert!(
                    v == NODATAVAL || (0.0..=1.0).contains(&v),
                    "{}: value {v} outside [0, 1]",
                    variable.name
                );
            }
        }
    }

    // Coordinates ride through untouched
    let loss = LossDataset::load(output_dir.path().join("productivityLoss_2020.json")).unwrap();
    assert_eq!(&loss.coords, d2020.grid.coords());
}

#[test]
fn test_batch_propagates_nodata_cells() {
    init_logging();
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    write_input(
        input_dir.path(),
        "wbgtAdjust_2020.json",
        vec![22.0, NODATAVAL, 30.0, 34.0, NODATAVAL, 28.0, 32.0, 36.0],
    );

    run_batch(input_dir.path(), output_dir.path(), "wbgtAdjust").unwrap();

    let loss = LossDataset::load(output_dir.path().join("productivityLoss_2020.json")).unwrap();
    for class in IntensityClass::ALL {
        let variable = loss.variable(class.output_variable()).unwrap();
        assert_eq!(variable.values[1], NODATAVAL);
        assert_eq!(variable.values[4], NODATAVAL);
        let nodata = variable.values.iter().filter(|&&v| v == NODATAVAL).count();
        assert_eq!(nodata, 2, "{}: unexpected no-data count", variable.name);
    }
}

#[test]
fn test_batch_rejects_wrong_variable() {
    init_logging();
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let coords = GridCoords::new(hourly_times(1), vec![-35.0], vec![149.0]).unwrap();
    let grid = WbgtGrid::new(coords, vec![25.0]).unwrap();
    WbgtDataset::new("tasmax", grid)
        .save(input_dir.path().join("wbgtAdjust_2020.json"))
        .unwrap();

    let err = run_batch(input_dir.path(), output_dir.path(), "wbgtAdjust").unwrap_err();
    match err {
        BatchError::VariableMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, "wbgtAdjust");
            assert_eq!(found, "tasmax");
        }
        other => panic!("expected VariableMismatch, got {other}"),
    }
}

#[test]
fn test_batch_aborts_on_invalid_cell_with_location() {
    init_logging();
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    // 75°C is finite but physically implausible: the job must abort rather
    // than write a saturated loss for it
    write_input(
        input_dir.path(),
        "wbgtAdjust_2022.json",
        vec![22.0, 26.0, 30.0, 34.0, 24.0, 75.0, 32.0, 36.0],
    );

    let err = run_batch(input_dir.path(), output_dir.path(), "wbgtAdjust").unwrap_err();
    match &err {
        BatchError::Grid {
            path,
            source: GridError::Cell {
                time_index,
                lat_index,
                lon_index,
                ..
            },
        } => {
            assert!(path.ends_with("wbgtAdjust_2022.json"));
            assert_eq!((*time_index, *lat_index, *lon_index), (1, 0, 1));
        }
        other => panic!("expected Grid cell error, got {other}"),
    }
    assert!(
        err.to_string().contains("75"),
        "error should name the offending value: {err}"
    );
}

#[test]
fn test_batch_with_empty_input_dir_writes_nothing() {
    init_logging();
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let reports = run_batch(
        input_dir.path(),
        output_dir.path().join("nested").as_path(),
        "wbgtAdjust",
    )
    .unwrap();

    assert!(reports.is_empty());
    // Output directory is still created for the (empty) run
    assert!(output_dir.path().join("nested").is_dir());
}
