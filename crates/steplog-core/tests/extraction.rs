use std::path::Path;
use std::time::Duration;

use pretty_assertions::assert_eq;
use steplog_core::prelude::*;
use steplog_core::signal::{index_seconds, signal};

const INDEX: &str = "sample_time";

/// Log through a rerun recording stream into an `.rrd` file and open it
fn logged(log: impl FnOnce(&rerun::RecordingStream)) -> Recording {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.rrd");
    write_rrd(&path, log);
    Recording::open(&path).unwrap()
}

fn write_rrd(path: &Path, log: impl FnOnce(&rerun::RecordingStream)) {
    let stream = rerun::RecordingStreamBuilder::new("steplog_test")
        .save(path)
        .unwrap();
    log(&stream);
    stream.flush_blocking();
}

fn at(stream: &rerun::RecordingStream, nanos: u64) {
    stream.set_time(INDEX, Duration::from_nanos(nanos));
}

fn scalar(stream: &rerun::RecordingStream, path: &str, value: f64) {
    stream.log(path, &rerun::Scalars::single(value)).unwrap();
}

fn step_recording(times: &[u64], control: &[f64], velocity: &[f64]) -> Recording {
    logged(|stream| {
        for ((t, c), v) in times.iter().zip(control).zip(velocity) {
            at(stream, *t);
            scalar(stream, "/control", *c);
            scalar(stream, "/velocity", *v);
        }
    })
}

#[test]
fn test_step_scenario() {
    let recording = step_recording(
        &[0, 10_000_000, 20_000_000],
        &[0.0, 1.0, 1.0],
        &[0.0, 0.0, 0.5],
    );
    let table = recording.view(INDEX, "/**").unwrap().select().unwrap();
    let signals = Signals::extract(&table, &["/control:Scalar", "/velocity:Scalar"]).unwrap();

    assert_eq!(signals.time(), &[0.0, 0.01, 0.02]);
    assert_eq!(
        signals.get("/control:Scalar").unwrap().values(),
        &[Some(0.0), Some(1.0), Some(1.0)]
    );
    assert_eq!(
        signals.get("/velocity:Scalar").unwrap().to_nan_filled(),
        vec![0.0, 0.0, 0.5]
    );
}

#[test]
fn test_timestamps_are_ticks_over_1e9() {
    let times: Vec<u64> = (0..50).map(|i| i * 7_919_113 + 3).collect();
    let zeros = vec![0.0; times.len()];
    let recording = step_recording(&times, &zeros, &zeros);
    let table = recording.view(INDEX, "/**").unwrap().select().unwrap();

    let expected: Vec<f64> = times.iter().map(|t| *t as f64 / 1e9).collect();
    assert_eq!(index_seconds(&table).unwrap(), expected);
}

#[test]
fn test_lengths_match_distinct_instants() {
    // velocity is logged at half the rate of control
    let recording = logged(|stream| {
        for i in 0..10 {
            at(stream, i * 1_000_000);
            scalar(stream, "/control", i as f64);
            if i % 2 == 0 {
                scalar(stream, "/velocity", i as f64 * 0.1);
            }
        }
    });

    let table = recording.view(INDEX, "/**").unwrap().select().unwrap();
    let signals = Signals::extract(&table, &["/control:Scalar", "/velocity:Scalar"]).unwrap();

    assert_eq!(table.num_rows(), 10);
    assert_eq!(signals.len(), 10);
    for s in signals.signals() {
        assert_eq!(s.len(), 10, "{}", s.name());
    }
    let velocity = signals.get("/velocity:Scalar").unwrap();
    assert_eq!(velocity.null_count(), 5);
    assert_eq!(velocity.values()[1], None);
    assert_eq!(velocity.values()[2], Some(0.2));
}

#[test]
fn test_each_path_is_its_own_column() {
    let recording = logged(|stream| {
        at(stream, 0);
        scalar(stream, "/control", 0.0);
        scalar(stream, "/velocity", 0.0);
        scalar(stream, "/motor/current", 0.3);
    });

    let table = recording.view(INDEX, "/**").unwrap().select().unwrap();
    assert_eq!(
        table.column_names(),
        vec![
            "sample_time",
            "/control:Scalar",
            "/motor/current:Scalar",
            "/velocity:Scalar"
        ]
    );
    assert_eq!(signal(&table, "/motor/current:Scalar").unwrap().values(), &[Some(0.3)]);
}

#[test]
fn test_missing_column_is_schema_error() {
    let recording = step_recording(&[0], &[1.0], &[2.0]);
    let table = recording.view(INDEX, "/**").unwrap().select().unwrap();

    let err = Signals::extract(&table, &["/control:Scalar", "/torque:Scalar"]).unwrap_err();
    match err {
        Error::Schema { column, available } => {
            assert_eq!(column, "/torque:Scalar");
            assert!(available.contains(&"/control:Scalar".to_string()));
        }
        other => panic!("expected schema error, got {other}"),
    }
}

#[test]
fn test_empty_recording_gives_empty_sequences() {
    let recording = logged(|_| {});
    assert!(recording.columns().is_empty());

    let table = recording.view(INDEX, "/**").unwrap().select().unwrap();
    assert!(table.is_empty());
    assert_eq!(table.column_names(), vec![INDEX]);
    assert!(index_seconds(&table).unwrap().is_empty());
}

#[test]
fn test_unknown_index_keeps_columns() {
    let recording = step_recording(&[0, 10], &[1.0, 1.0], &[2.0, 2.0]);

    let table = recording
        .view("frame_that_does_not_exist", "/**")
        .unwrap()
        .select()
        .unwrap();
    let signals = Signals::extract(&table, &["/control:Scalar", "/velocity:Scalar"]).unwrap();
    assert_eq!(table.num_rows(), 0);
    assert!(signals.is_empty());
    assert!(signals.signals().iter().all(Signal::is_empty));
}

#[test]
fn test_sequence_index_cannot_become_seconds() {
    let recording = logged(|stream| {
        for frame in 0..3 {
            stream.set_time_sequence("frame", frame);
            scalar(stream, "/control", 1.0);
        }
    });

    let table = recording.view("frame", "/**").unwrap().select().unwrap();
    assert_eq!(table.num_rows(), 3);
    assert!(matches!(
        Signals::extract(&table, &["/control:Scalar"]),
        Err(Error::Conversion { expected: "seconds", .. })
    ));
}

#[test]
fn test_content_filter_limits_columns() {
    let recording = logged(|stream| {
        at(stream, 0);
        scalar(stream, "/control", 0.0);
        scalar(stream, "/debug/loop_time", 1.0);
        at(stream, 5);
        scalar(stream, "/debug/loop_time", 1.1);
    });

    let table = recording
        .view(INDEX, "+ /** - /debug/**")
        .unwrap()
        .select()
        .unwrap();
    assert_eq!(table.column_names(), vec![INDEX, "/control:Scalar"]);
    // rows only come from selected entities
    assert_eq!(table.num_rows(), 1);
}

#[test]
fn test_latest_at_fill_and_range() {
    let recording = logged(|stream| {
        at(stream, 0);
        scalar(stream, "/control", 1.0);
        for i in 1..=4 {
            at(stream, i * 10);
            scalar(stream, "/velocity", i as f64);
        }
    });

    let table = recording
        .view(INDEX, "/**")
        .unwrap()
        .with_range(20..=40)
        .with_sparse_fill(SparseFillStrategy::LatestAtGlobal)
        .select()
        .unwrap();
    let signals = Signals::extract(&table, &["/control:Scalar", "/velocity:Scalar"]).unwrap();

    assert_eq!(signals.len(), 3);
    // control was only logged before the range, latest-at still finds it
    assert_eq!(
        signals.get("/control:Scalar").unwrap().values(),
        &[Some(1.0), Some(1.0), Some(1.0)]
    );
    assert_eq!(
        signals.get("/velocity:Scalar").unwrap().values(),
        &[Some(2.0), Some(3.0), Some(4.0)]
    );
}

#[test]
fn test_text_column_is_conversion_error() {
    let recording = logged(|stream| {
        at(stream, 0);
        stream.log("/status", &rerun::TextLog::new("armed")).unwrap();
    });

    let table = recording.view(INDEX, "/status").unwrap().select().unwrap();
    let names = table.column_names();
    let text = names
        .iter()
        .find(|name| name.starts_with("/status:"))
        .unwrap();
    assert!(matches!(
        signal(&table, text),
        Err(Error::Conversion { expected: "numbers", .. })
    ));
}

#[test]
fn test_invalid_filter_is_rejected() {
    let recording = step_recording(&[0], &[1.0], &[2.0]);
    assert!(matches!(
        recording.view(INDEX, "/con*"),
        Err(Error::InvalidFilter(_))
    ));
}
