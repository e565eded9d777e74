use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FanLogError {
    #[error("could not open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("invalid fan id {0}, expected a positive integer")]
    InvalidFanId(u8),
    #[error("malformed line {line}: missing field '{missing}'")]
    MalformedLine { line: usize, missing: &'static str },
    #[error("line {line}: field '{field}' has non-integer value '{value}'")]
    Parse {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("no samples found for Fan{fan_id}")]
    EmptySeries { fan_id: u8 },
    #[error("output directory {path} does not exist")]
    OutDir { path: PathBuf },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not plot to {path}: {message}")]
    Render { path: PathBuf, message: String },
    #[error("could not open {path} in the image viewer: {message}")]
    Viewer { path: PathBuf, message: String },
}

impl FanLogError {
    /// Errors tied to the content of a single log line, subject to the malformed-line policy.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            FanLogError::MalformedLine { .. } | FanLogError::Parse { .. }
        )
    }
}
