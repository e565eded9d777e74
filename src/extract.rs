//! Extraction of fan telemetry from the controller debug log.
//!
//! The controller publishes one line per fan and sample, e.g.
//! `d15/debugstate/kwl/fan1 Fan1 - M: 12345, gap: -5, tsf: 120, ssf: 800, rpm: 795`.
//! Fields are found by their key, so older captures written as
//! `Fan1 x y 1000, GAP=5, tfs=120, ssf=800, rpm=805,` are read as well.

use crate::{FanLogError, FanSample, FanSeries};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// What to do with a line of the requested fan that cannot be turned into a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPolicy {
    Abort,
    Skip,
}

impl Default for MalformedPolicy {
    fn default() -> Self {
        MalformedPolicy::Abort
    }
}

/// token index of the timestamp in captures without an `M:` key
pub const TIMESTAMP_COLUMN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Timestamp,
    Gap,
    Pwm,
    Setpoint,
    Rpm,
}

impl Field {
    fn from_key(key: &str) -> Option<Field> {
        match key.to_ascii_lowercase().as_str() {
            "m" | "ts" | "timestamp" => Some(Field::Timestamp),
            "gap" => Some(Field::Gap),
            "tfs" | "tsf" | "pwm" => Some(Field::Pwm),
            "ssf" | "setpoint" => Some(Field::Setpoint),
            "rpm" => Some(Field::Rpm),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Gap => "gap",
            Field::Pwm => "pwm",
            Field::Setpoint => "setpoint",
            Field::Rpm => "rpm",
        }
    }
}

#[derive(Debug, Default)]
struct Fields {
    timestamp: Option<i64>,
    gap: Option<i64>,
    pwm: Option<i64>,
    setpoint: Option<i64>,
    rpm: Option<i64>,
}

impl Fields {
    fn set(&mut self, field: Field, raw: &str, line: usize) -> Result<(), FanLogError> {
        let value = parse_int(raw).ok_or_else(|| FanLogError::Parse {
            line,
            field: field.name(),
            value: raw.to_string(),
        })?;
        let slot = match field {
            Field::Timestamp => &mut self.timestamp,
            Field::Gap => &mut self.gap,
            Field::Pwm => &mut self.pwm,
            Field::Setpoint => &mut self.setpoint,
            Field::Rpm => &mut self.rpm,
        };
        *slot = Some(value);
        Ok(())
    }

    fn into_sample(self, line: usize) -> Result<FanSample, FanLogError> {
        let missing = |field: Field| FanLogError::MalformedLine {
            line,
            missing: field.name(),
        };
        Ok(FanSample {
            timestamp: self.timestamp.ok_or_else(|| missing(Field::Timestamp))?,
            gap: self.gap.ok_or_else(|| missing(Field::Gap))?,
            pwm: self.pwm.ok_or_else(|| missing(Field::Pwm))?,
            setpoint: self.setpoint.ok_or_else(|| missing(Field::Setpoint))?,
            rpm: self.rpm.ok_or_else(|| missing(Field::Rpm))?,
        })
    }
}

/// removes the thousands separators (and trailing field separators) from a number
pub fn strip_thousands(s: &str) -> String {
    s.replace(',', "")
}

fn parse_int(raw: &str) -> Option<i64> {
    strip_thousands(raw).parse::<i64>().ok()
}

/// Parses one log line for the given fan.
/// Returns `Ok(None)` when the line belongs to another fan or to no fan at all.
pub fn parse_line(line: &str, fan_id: u8, line_no: usize) -> Result<Option<FanSample>, FanLogError> {
    let mut tokens = line.split_whitespace().enumerate();
    let fan_token = match (tokens.next(), tokens.next()) {
        (Some(_), Some((_, t))) => t,
        _ => return Ok(None),
    };
    if fan_token != format!("Fan{}", fan_id) {
        return Ok(None);
    }

    let mut fields = Fields::default();
    let mut positional_ts = None;
    while let Some((idx, token)) = tokens.next() {
        if let Some((key, value)) = token.split_once('=') {
            if let Some(field) = Field::from_key(key) {
                fields.set(field, value, line_no)?;
            }
        } else if let Some(key) = token.strip_suffix(':') {
            let field = match Field::from_key(key) {
                Some(f) => f,
                None => continue,
            };
            match tokens.next() {
                Some((_, value)) => fields.set(field, value, line_no)?,
                None => {
                    return Err(FanLogError::MalformedLine {
                        line: line_no,
                        missing: field.name(),
                    })
                }
            }
        } else if idx == TIMESTAMP_COLUMN {
            positional_ts = Some(token);
        }
    }
    // captures without an `M:` key carry the timestamp in a fixed column
    if fields.timestamp.is_none() {
        if let Some(raw) = positional_ts {
            fields.set(Field::Timestamp, raw, line_no)?;
        }
    }
    fields.into_sample(line_no).map(Some)
}

/// Reads the series of one fan from any buffered source, see [`extract`].
pub fn extract_from_reader<R: BufRead>(
    reader: R,
    fan_id: u8,
    policy: MalformedPolicy,
) -> Result<FanSeries, FanLogError> {
    if fan_id == 0 {
        return Err(FanLogError::InvalidFanId(fan_id));
    }
    let mut series = FanSeries::new(fan_id, 10000);
    let mut skipped = 0usize;
    for (i, l) in reader.lines().enumerate() {
        let line_no = i + 1;
        let l = l.map_err(|source| FanLogError::Read {
            line: line_no,
            source,
        })?;
        match parse_line(&l, fan_id, line_no) {
            Ok(Some(sample)) => series.push(sample),
            Ok(None) => {}
            Err(e) if e.is_line_error() && policy == MalformedPolicy::Skip => {
                warn!("skipping line: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    debug!(
        "Fan{}: extracted {} samples, skipped {} lines",
        fan_id,
        series.len(),
        skipped
    );
    Ok(series)
}

/// Reads the log file at `path` and collects the samples of fan `fan_id`, in file order.
/// The file is not sorted or checked for continuity.
pub fn extract(path: &Path, fan_id: u8, policy: MalformedPolicy) -> Result<FanSeries, FanLogError> {
    let file = File::open(path).map_err(|source| FanLogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    extract_from_reader(BufReader::new(file), fan_id, policy)
}
