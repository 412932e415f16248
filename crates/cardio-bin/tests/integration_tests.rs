//! End-to-end pipeline tests driven through the coordinator.
//!
//! Each test replays a synthetic binary record file through the full
//! Sampler → Analyzer → Persister chain in real time and inspects the
//! produced artifacts.

use std::fs;
use std::io::Read;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cardio_bin::Application;
use cardio_core::{AcquisitionConfig, SampleRate, VoltageRange, WaveType};
use cardio_server::TcpFileServer;
use cardio_storage::{FileSource, SampleRecord};

const RANGE: VoltageRange = VoltageRange::Fsr4V096;
const RATE: SampleRate = SampleRate::Sps250;

/// Write a replay file of `total` records with 4.0 V impulses on a flat
/// baseline, one impulse every `spacing` samples starting at `offset`.
fn write_impulse_replay(path: &Path, total: usize, spacing: usize, offset: usize) {
    let impulse_raw = (4.0_f64 * 32768.0 / RANGE.volts()) as i16;
    let mut bytes = Vec::with_capacity(total * 10);
    for i in 0..total {
        let raw_value = if i >= offset && (i - offset) % spacing == 0 {
            impulse_raw
        } else {
            0
        };
        let record = SampleRecord {
            raw_value,
            timestamp_us: i as i64 * 4_000,
        };
        bytes.extend_from_slice(&record.encode());
    }
    fs::write(path, bytes).unwrap();
}

fn test_config(output_dir: &Path, duration: Duration) -> AcquisitionConfig {
    AcquisitionConfig::builder()
        .sample_rate(RATE)
        .voltage_range(RANGE)
        .duration(duration)
        .output_dir(output_dir)
        .base_name("ecg_run")
        .build()
        .unwrap()
}

/// The `.bin`/`.csv` pair produced by a run, found by extension.
fn produced_files(dir: &Path) -> (PathBuf, PathBuf) {
    let mut bin = None;
    let mut csv = None;
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => bin = Some(path),
            Some("csv") => csv = Some(path),
            _ => {}
        }
    }
    (bin.expect("no .bin produced"), csv.expect("no .csv produced"))
}

struct CsvRow {
    timestamp_us: u64,
    voltage: f64,
    wave: WaveType,
}

fn parse_csv(path: &Path) -> Vec<CsvRow> {
    let content = fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("timestamp_us,voltage,classification"));
    lines
        .map(|line| {
            let mut fields = line.split(',');
            let timestamp_us = fields.next().unwrap().parse().unwrap();
            let voltage = fields.next().unwrap().parse().unwrap();
            let tag = fields.next().unwrap().chars().next().unwrap();
            assert!(fields.next().is_none());
            CsvRow {
                timestamp_us,
                voltage,
                wave: WaveType::from_tag(tag).unwrap(),
            }
        })
        .collect()
}

fn r_positions(rows: &[CsvRow]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.wave == WaveType::R)
        .map(|(i, _)| i)
        .collect()
}

fn run_replay(
    replay: &Path,
    output_dir: &Path,
    duration: Duration,
    shutdown: Arc<AtomicBool>,
) -> (PathBuf, PathBuf) {
    let config = test_config(output_dir, duration);
    let source = FileSource::load(replay, RANGE, true).unwrap();
    Application::new(config, Box::new(source), None, shutdown)
        .run()
        .unwrap();
    produced_files(output_dir)
}

#[test]
fn full_pipeline_produces_consistent_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let replay = dir.path().join("replay.bin");
    // one 4.0 V impulse every 500 ms at 250 S/s
    write_impulse_replay(&replay, 500, 125, 62);

    let output_dir = dir.path().join("processed");
    let (bin_path, csv_path) = run_replay(
        &replay,
        &output_dir,
        Duration::from_secs(2),
        Arc::new(AtomicBool::new(false)),
    );

    let rows = parse_csv(&csv_path);
    let bin_len = fs::metadata(&bin_path).unwrap().len();

    // same record count in both files, 10 bytes per binary record
    assert_eq!(bin_len, rows.len() as u64 * 10);

    // sample count within [0.95, 1.00] of rate x duration
    let nominal = 250 * 2;
    assert!(rows.len() <= nominal);
    assert!(rows.len() as f64 >= 0.95 * nominal as f64, "{}", rows.len());

    // timestamps start at zero and never decrease
    assert_eq!(rows[0].timestamp_us, 0);
    assert!(rows.windows(2).all(|w| w[1].timestamp_us >= w[0].timestamp_us));

    // all voltages inside the configured range
    assert!(rows.iter().all(|r| r.voltage.abs() <= RANGE.volts()));

    // the four impulses of the replay file are all labeled R
    assert_eq!(r_positions(&rows), vec![62, 187, 312, 437]);

    // refractory distance holds between consecutive R labels
    let positions = r_positions(&rows);
    assert!(positions.windows(2).all(|w| w[1] - w[0] >= 75));
}

#[test]
fn rerunning_a_recording_reproduces_r_positions() {
    let dir = tempfile::tempdir().unwrap();
    let replay = dir.path().join("replay.bin");
    write_impulse_replay(&replay, 500, 125, 62);

    let first_out = dir.path().join("first");
    let (first_bin, first_csv) = run_replay(
        &replay,
        &first_out,
        Duration::from_secs(2),
        Arc::new(AtomicBool::new(false)),
    );

    let second_out = dir.path().join("second");
    let (_, second_csv) = run_replay(
        &first_bin,
        &second_out,
        Duration::from_secs(2),
        Arc::new(AtomicBool::new(false)),
    );

    let first_rows = parse_csv(&first_csv);
    let second_rows = parse_csv(&second_csv);

    // compare up to the shared prefix, minus the trailing T-window where
    // the shorter run may not have settled
    let t_window = 100;
    let horizon = first_rows.len().min(second_rows.len()).saturating_sub(t_window);
    let first_r: Vec<usize> = r_positions(&first_rows)
        .into_iter()
        .filter(|&p| p < horizon)
        .collect();
    let second_r: Vec<usize> = r_positions(&second_rows)
        .into_iter()
        .filter(|&p| p < horizon)
        .collect();
    assert_eq!(first_r, second_r);
    assert!(!first_r.is_empty());
}

#[test]
fn shutdown_mid_run_still_produces_complete_files() {
    let dir = tempfile::tempdir().unwrap();
    let replay = dir.path().join("replay.bin");
    write_impulse_replay(&replay, 500, 125, 62);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(1200));
            shutdown.store(true, Ordering::SeqCst);
        });
    }

    let output_dir = dir.path().join("processed");
    let (bin_path, csv_path) = run_replay(
        &replay,
        &output_dir,
        Duration::from_secs(60),
        shutdown,
    );

    // the run stopped early: far fewer samples than the full 60 s
    let rows = parse_csv(&csv_path);
    assert!(rows.len() < 1000, "{}", rows.len());
    assert!(!rows.is_empty());

    // syntactically complete artifacts: equal counts, no partial lines
    let bin_len = fs::metadata(&bin_path).unwrap().len();
    assert_eq!(bin_len, rows.len() as u64 * 10);
    assert_eq!(bin_len % 10, 0);
    assert!(fs::read_to_string(&csv_path).unwrap().ends_with('\n'));

    // beats detected before the shutdown kept their R labels
    assert!(!r_positions(&rows).is_empty());
}

#[test]
fn end_of_run_handoff_streams_the_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let replay = dir.path().join("replay.bin");
    write_impulse_replay(&replay, 500, 125, 62);

    let output_dir = dir.path().join("processed");
    fs::create_dir_all(&output_dir).unwrap();

    let server = TcpFileServer::bind(0, &output_dir).unwrap();
    let port = server.local_addr().port();

    let config = test_config(&output_dir, Duration::from_secs(2));
    let source = FileSource::load(&replay, RANGE, true).unwrap();
    let app = Application::new(
        config,
        Box::new(source),
        Some(server),
        Arc::new(AtomicBool::new(false)),
    );
    let run = thread::spawn(move || app.run().unwrap());

    thread::sleep(Duration::from_millis(300));
    let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut received = Vec::new();
    client.read_to_end(&mut received).unwrap();
    run.join().unwrap();

    // preamble names both produced files with their exact sizes
    assert!(received.starts_with(b"FILES 2\n"));
    let (bin_path, csv_path) = produced_files(&output_dir);
    let bin_len = fs::metadata(&bin_path).unwrap().len();
    let csv_len = fs::metadata(&csv_path).unwrap().len();
    let text = String::from_utf8_lossy(&received);
    assert!(text.contains(&format!(
        "FILE {} {}\n",
        bin_path.file_name().unwrap().to_str().unwrap(),
        bin_len
    )));
    assert!(text.contains(&format!(
        "FILE {} {}\n",
        csv_path.file_name().unwrap().to_str().unwrap(),
        csv_len
    )));

    // total payload: preamble + two headers + both file bodies
    let expected_len = "FILES 2\n".len()
        + format!(
            "FILE {} {}\n",
            bin_path.file_name().unwrap().to_str().unwrap(),
            bin_len
        )
        .len()
        + format!(
            "FILE {} {}\n",
            csv_path.file_name().unwrap().to_str().unwrap(),
            csv_len
        )
        .len()
        + (bin_len + csv_len) as usize;
    assert_eq!(received.len(), expected_len);
}
