use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
pub mod error;
pub mod extract;
pub mod plot;
pub mod render;

pub use error::FanLogError;
pub use extract::{extract, extract_from_reader, MalformedPolicy};

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

pub const DEFAULT_INFILE: &str = "debug.log";
pub const DEFAULT_OUTDIR: &str = ".";
pub const FAN_IDS: [u8; 2] = [1, 2];

pub const CSV_HEADER: &str = "timestamp,gap,pwm,setpoint,rpm\n";

/// One telemetry record of a fan, as published by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanSample {
    pub timestamp: i64,
    /// rpm - setpoint
    pub gap: i64,
    pub pwm: i64,
    pub setpoint: i64,
    pub rpm: i64,
}

/// The main struct for the telemetry time series of one fan.
/// Samples are kept in file order, every channel has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct FanSeries {
    pub fan_id: u8,
    pub timestamp: Vec<i64>,
    pub gap: Vec<i64>,
    pub pwm: Vec<i64>,
    pub setpoint: Vec<i64>,
    pub rpm: Vec<i64>,
}

impl FanSeries {
    pub fn new(fan_id: u8, capacity: usize) -> FanSeries {
        FanSeries {
            fan_id,
            timestamp: Vec::with_capacity(capacity),
            gap: Vec::with_capacity(capacity),
            pwm: Vec::with_capacity(capacity),
            setpoint: Vec::with_capacity(capacity),
            rpm: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: FanSample) {
        self.timestamp.push(sample.timestamp);
        self.gap.push(sample.gap);
        self.pwm.push(sample.pwm);
        self.setpoint.push(sample.setpoint);
        self.rpm.push(sample.rpm);
    }

    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    /// iterates the series back as samples, in file order
    pub fn samples(&self) -> impl Iterator<Item = FanSample> + '_ {
        (0..self.len()).map(move |i| FanSample {
            timestamp: self.timestamp[i],
            gap: self.gap[i],
            pwm: self.pwm[i],
            setpoint: self.setpoint[i],
            rpm: self.rpm[i],
        })
    }

    /// None for an empty series
    pub fn summary(&self) -> Option<SeriesSummary> {
        let (ts_first, ts_last) = (*self.timestamp.first()?, *self.timestamp.last()?);
        let (rpm_min, rpm_max) = min_and_max(&self.rpm[..])?;
        let gap_sum: i128 = self.gap.iter().map(|&g| g as i128).sum();
        Some(SeriesSummary {
            samples: self.len(),
            ts_first,
            ts_last,
            rpm_min,
            rpm_max,
            gap_mean: gap_sum as f64 / self.len() as f64,
        })
    }

    /// writes all channels as a csv at the given path
    pub fn to_csv(&self, fout: &Path) -> Result<(), FanLogError> {
        let write_err = |source| FanLogError::Write {
            path: fout.to_path_buf(),
            source,
        };
        let file = File::create(fout).map_err(write_err)?;
        let mut buf = BufWriter::new(file);
        buf.write_all(CSV_HEADER.as_bytes()).map_err(write_err)?;
        for s in self.samples() {
            writeln!(
                buf,
                "{},{},{},{},{}",
                s.timestamp, s.gap, s.pwm, s.setpoint, s.rpm
            )
            .map_err(write_err)?;
        }
        buf.flush().map_err(write_err)
    }
}

impl std::fmt::Display for FanSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", CSV_HEADER)?;
        for s in self.samples() {
            writeln!(
                f,
                "{},{},{},{},{}",
                s.timestamp, s.gap, s.pwm, s.setpoint, s.rpm
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub samples: usize,
    pub ts_first: i64,
    pub ts_last: i64,
    pub rpm_min: i64,
    pub rpm_max: i64,
    pub gap_mean: f64,
}

impl std::fmt::Display for SeriesSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples, timestamps {}..{}, rpm {}..{}, mean gap {:.1}",
            self.samples, self.ts_first, self.ts_last, self.rpm_min, self.rpm_max, self.gap_mean
        )
    }
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut s_iter = s.iter();
    let first = *s_iter.next()?;
    let (mut min, mut max) = (first, first);
    for es in s_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// How the timestamp axis is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLabels {
    /// the integer as found in the log
    Raw,
    /// the timestamp read as controller uptime in milliseconds
    Uptime,
}

/// Precision for uptime labels, chosen from the span of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UptimeFormat {
    DaysHours,
    HoursMinutesSeconds,
    SecondsMillis,
}

impl UptimeFormat {
    pub fn format(&self, ms: i64) -> String {
        // i64::MIN ms is outside the chrono::Duration range
        let ms = ms.max(-i64::MAX);
        let d = chrono::Duration::milliseconds(ms);
        let sign = if ms < 0 { "-" } else { "" };
        match self {
            UptimeFormat::DaysHours => {
                format!("{}{}d {:02}h", sign, d.num_days().abs(), d.num_hours().abs() % 24)
            }
            UptimeFormat::HoursMinutesSeconds => format!(
                "{}{}:{:02}:{:02}",
                sign,
                d.num_hours().abs(),
                d.num_minutes().abs() % 60,
                d.num_seconds().abs() % 60
            ),
            UptimeFormat::SecondsMillis => format!(
                "{}{}.{:03}",
                sign,
                d.num_seconds().abs(),
                d.num_milliseconds().abs() % 1000
            ),
        }
    }

    pub fn desc(&self) -> &'static str {
        match self {
            UptimeFormat::DaysHours => "d h",
            UptimeFormat::HoursMinutesSeconds => "h:mm:ss",
            UptimeFormat::SecondsMillis => "s.ms",
        }
    }
}

pub fn suitable_uptime_fmt(span: chrono::Duration) -> UptimeFormat {
    if span > chrono::Duration::days(2) {
        UptimeFormat::DaysHours
    } else if span > chrono::Duration::minutes(2) {
        UptimeFormat::HoursMinutesSeconds
    } else {
        UptimeFormat::SecondsMillis
    }
}
