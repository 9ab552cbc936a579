//! Rotation behaviour of the data logger against a real file system

use std::fs;
use std::path::{Path, PathBuf};

use drainguard_core::datalog::{row::header_line, DataLogger, READING_COLUMNS};
use drainguard_core::{Detection, EnrichedReading, InferenceMode, Reading, RiskLevel, RiskType};

const CEILING: usize = 25;

fn normal_record(water: f64) -> EnrichedReading {
    let detection = Detection {
        is_anomaly: false,
        risk_score: 0.0,
        risk_level: RiskLevel::Normal,
        risk_type: RiskType::Normal,
        confidence: 60.0,
        raw_score: None,
        details: "System operating normally.".into(),
        alert_suppressed: false,
        mode: InferenceMode::Rules,
    };
    EnrichedReading::new(Reading::now(water, 400), &detection)
}

fn archives(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with("live_data_archive_"))
        })
        .collect();
    found.sort();
    found
}

fn water_column(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(1).unwrap().to_string())
        .collect()
}

#[test]
fn test_rotation_at_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("live_data.csv");
    let logger = DataLogger::new(&live, dir.path().join("alert_log.csv"), CEILING).unwrap();

    for i in 0..CEILING {
        logger.log_reading(&normal_record(i as f64)).unwrap();
    }
    assert!(archives(dir.path()).is_empty(), "no rotation before the ceiling is exceeded");

    for i in 0..3 {
        logger.log_reading(&normal_record(100.0 + i as f64)).unwrap();
    }

    let archived = archives(dir.path());
    assert_eq!(archived.len(), 1);

    let archive_text = fs::read_to_string(&archived[0]).unwrap();
    assert!(archive_text.starts_with(&header_line(&READING_COLUMNS)));
    let expected: Vec<String> = (0..CEILING).map(|i| format!("{:.1}", i as f64)).collect();
    assert_eq!(water_column(&archived[0]), expected);

    assert_eq!(water_column(&live), vec!["100.0", "101.0", "102.0"]);
    assert_eq!(logger.stats().snapshot().rotations, 1);
    assert_eq!(logger.stats().snapshot().live_rows, 3);
}

#[test]
fn test_rotation_recovered_count_triggers() {
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("live_data.csv");
    let alerts = dir.path().join("alert_log.csv");

    {
        let logger = DataLogger::new(&live, &alerts, CEILING).unwrap();
        for i in 0..CEILING {
            logger.log_reading(&normal_record(i as f64)).unwrap();
        }
    }

    // A restarted process picks up the row count and rotates on the next row.
    let logger = DataLogger::new(&live, &alerts, CEILING).unwrap();
    logger.log_reading(&normal_record(1.5)).unwrap();

    assert_eq!(archives(dir.path()).len(), 1);
    assert_eq!(water_column(&live), vec!["1.5"]);
}

#[test]
fn test_repeated_rotations_keep_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("live_data.csv");
    let logger = DataLogger::new(&live, dir.path().join("alert_log.csv"), 10).unwrap();

    for i in 0..35 {
        logger.log_reading(&normal_record(i as f64)).unwrap();
    }

    let archived = archives(dir.path());
    assert_eq!(archived.len(), 3);

    let archived_rows: usize = archived.iter().map(|p| water_column(p).len()).sum();
    assert_eq!(archived_rows + water_column(&live).len(), 35);
    assert_eq!(water_column(&live).len(), 5);
}
