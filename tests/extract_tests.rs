use kwl_fanplot::plot::{run, PlotConfig};
use kwl_fanplot::{extract, FanLogError, FanSample, MalformedPolicy, TimestampLabels, CSV_HEADER};
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const DEBUG_LOG: &str = "\
d15/debugstate/kwl/fan1 Fan1 - M: 1000, gap: 5, tsf: 120, ssf: 800, rpm: 805
d15/debugstate/kwl/fan2 Fan2 - M: 1010, gap: -3, tsf: 110, ssf: 700, rpm: 697
d15/debugstate/kwl/fan1 Fan1 - M: 2000, gap: -1, tsf: 121, ssf: 800, rpm: 799
d15/debugstate/kwl/scheduler/ tasks 12 busy
d15/debugstate/kwl/fan2 Fan2 - M: 2010, gap: 0, tsf: 111, ssf: 700, rpm: 700
d15/debugstate/kwl/fan1 Fan1 - M: 3000, gap: 2, tsf: 122, ssf: 1,000, rpm: 1,002
";

fn log_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_extract_interleaved_fans() {
    let file = log_file(DEBUG_LOG);
    let fan1 = extract(file.path(), 1, MalformedPolicy::Abort).unwrap();
    let fan2 = extract(file.path(), 2, MalformedPolicy::Abort).unwrap();

    assert_eq!(fan1.timestamp, vec![1000, 2000, 3000]);
    assert_eq!(fan1.setpoint, vec![800, 800, 1000]);
    assert_eq!(fan1.rpm, vec![805, 799, 1002]);
    assert_eq!(fan2.timestamp, vec![1010, 2010]);
    assert_eq!(fan2.gap, vec![-3, 0]);

    for series in [&fan1, &fan2] {
        let n = series.len();
        assert_eq!(series.gap.len(), n);
        assert_eq!(series.pwm.len(), n);
        assert_eq!(series.setpoint.len(), n);
        assert_eq!(series.rpm.len(), n);
    }
}

#[test]
fn test_extract_capture_example() {
    let file = log_file("mosquitto/sub Fan1 x y 1000, GAP=5, tfs=120, ssf=800, rpm=805,\n");
    let fs = extract(file.path(), 1, MalformedPolicy::Abort).unwrap();
    let samples: Vec<FanSample> = fs.samples().collect();
    assert_eq!(
        samples,
        vec![FanSample {
            timestamp: 1000,
            gap: 5,
            pwm: 120,
            setpoint: 800,
            rpm: 805
        }]
    );
}

#[test]
fn test_extract_does_not_sort() {
    let file = log_file(
        "t Fan1 - M: 50, gap: 0, tsf: 1, ssf: 1, rpm: 1\n\
         t Fan1 - M: 10, gap: 0, tsf: 1, ssf: 1, rpm: 1\n",
    );
    let fs = extract(file.path(), 1, MalformedPolicy::Abort).unwrap();
    assert_eq!(fs.timestamp, vec![50, 10]);
}

#[test]
fn test_malformed_line_number() {
    let file = log_file(
        "t Fan1 - M: 1, gap: 0, tsf: 1, ssf: 1, rpm: 1\n\
         t Fan2 - M: 1, gap: 0, tsf: 1, ssf: 1, rpm: 1\n\
         t Fan1 - M: 2, gap:\n",
    );
    let err = extract(file.path(), 1, MalformedPolicy::Abort).unwrap_err();
    assert!(matches!(err, FanLogError::MalformedLine { line: 3, .. }));
    assert!(err.to_string().contains("line 3"));

    let fs = extract(file.path(), 1, MalformedPolicy::Skip).unwrap();
    assert_eq!(fs.timestamp, vec![1]);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = extract(&dir.path().join("debug.log"), 1, MalformedPolicy::Abort).unwrap_err();
    assert!(matches!(err, FanLogError::Open { .. }));
}

#[test]
fn test_csv_export() {
    let file = log_file(DEBUG_LOG);
    let dir = TempDir::new().unwrap();
    let fan2 = extract(file.path(), 2, MalformedPolicy::Abort).unwrap();
    let csvout = dir.path().join("Fan2.csv");
    fan2.to_csv(&csvout).unwrap();
    let content = fs::read_to_string(&csvout).unwrap();
    assert_eq!(
        content,
        format!("{}1010,-3,110,700,697\n2010,0,111,700,700\n", CSV_HEADER)
    );
}

#[test]
fn test_run_rejects_missing_outdir() {
    let file = log_file(DEBUG_LOG);
    let dir = TempDir::new().unwrap();
    let config = PlotConfig {
        infile: file.path().to_path_buf(),
        outdir: dir.path().join("missing"),
        ..PlotConfig::default()
    };
    assert!(matches!(run(&config), Err(FanLogError::OutDir { .. })));
}

#[test]
fn test_run_skips_fan_without_samples() {
    let file = log_file("t Fan2 - M: 1, gap: 0, tsf: 1, ssf: 1, rpm: 1\n");
    let dir = TempDir::new().unwrap();
    let config = PlotConfig {
        infile: file.path().to_path_buf(),
        outdir: dir.path().to_path_buf(),
        fans: vec![1],
        csv: true,
        ..PlotConfig::default()
    };
    let written = run(&config).unwrap();
    assert!(written.is_empty());
    assert!(!config.csv_path(1).exists());
}

#[test]
fn test_run_missing_infile() {
    let dir = TempDir::new().unwrap();
    let config = PlotConfig {
        infile: dir.path().join("nope.log"),
        outdir: dir.path().to_path_buf(),
        ..PlotConfig::default()
    };
    assert!(matches!(run(&config), Err(FanLogError::Open { .. })));
}

#[test]
fn test_run_writes_png_and_csv_for_both_fans() {
    let file = log_file(DEBUG_LOG);
    let dir = TempDir::new().unwrap();
    let config = PlotConfig {
        infile: file.path().to_path_buf(),
        outdir: dir.path().to_path_buf(),
        csv: true,
        ..PlotConfig::default()
    };
    let written = run(&config).unwrap();
    assert_eq!(
        written,
        vec![
            dir.path().join("Plot_Fan1.png"),
            dir.path().join("Plot_Fan2.png")
        ]
    );
    for png in &written {
        assert!(fs::metadata(png).unwrap().len() > 0);
    }
    let csv1 = fs::read_to_string(dir.path().join("Fan1.csv")).unwrap();
    assert_eq!(csv1.lines().count(), 4);
    assert!(dir.path().join("Fan2.csv").exists());
}

#[test]
fn test_run_single_fan_raw_labels() {
    let file = log_file(DEBUG_LOG);
    let dir = TempDir::new().unwrap();
    let config = PlotConfig {
        infile: file.path().to_path_buf(),
        outdir: dir.path().to_path_buf(),
        fans: vec![2],
        labels: TimestampLabels::Raw,
        ..PlotConfig::default()
    };
    let written = run(&config).unwrap();
    assert_eq!(written, vec![dir.path().join("Plot_Fan2.png")]);
    assert!(!dir.path().join("Plot_Fan1.png").exists());
    assert!(!dir.path().join("Fan2.csv").exists());
}

#[test]
fn test_run_with_extreme_values() {
    let file = log_file(
        "t Fan1 - M: 1, gap: 9223372036854775807, tsf: 0, ssf: -9223372036854775808, rpm: 9223372036854775807\n\
         t Fan1 - M: 9223372036854775807, gap: 9223372036854775807, tsf: 1, ssf: 0, rpm: 9223372036854775807\n",
    );
    let dir = TempDir::new().unwrap();
    let config = PlotConfig {
        infile: file.path().to_path_buf(),
        outdir: dir.path().to_path_buf(),
        fans: vec![1],
        ..PlotConfig::default()
    };
    let written = run(&config).unwrap();
    assert_eq!(written, vec![dir.path().join("Plot_Fan1.png")]);
    assert!(written[0].exists());
}
