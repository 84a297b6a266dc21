//! Streaming parser for recorded capture logs.
//!
//! Capture files are line oriented, one sample per line:
//!
//! ```text
//! GYRO;<timestamp_ns>;<x>,<y>,<z>
//! ROTVEC;<x>,<y>,<z>[,<w>]
//! ```
//!
//! Blank lines and `#` comments are skipped. Feed raw bytes via `push_data`,
//! then drain parsed samples via `next_sample`; a trailing line without its
//! newline is held until the rest of it arrives.

use glam::Vec3;
use motion_fusion::{GyroSample, MotionSample, RotationVectorSample, SampleError};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("unknown record tag `{0}`")]
    UnknownRecord(String),
    #[error("record is missing a field")]
    MissingField,
    #[error("gyroscope record needs exactly 3 components, got {0}")]
    WrongGyroComponents(usize),
    #[error("invalid timestamp: {0}")]
    BadTimestamp(#[from] std::num::ParseIntError),
    #[error("invalid number: {0}")]
    BadNumber(#[from] std::num::ParseFloatError),
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Incremental capture-log parser.
pub struct LogParser {
    buffer: VecDeque<u8>,
}

impl LogParser {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(8192),
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next sample from the buffered input.
    /// Returns `None` once no complete line is left.
    pub fn next_sample(&mut self) -> Option<Result<MotionSample, ReplayError>> {
        while let Some(line) = self.take_line() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(parse_line(line));
        }
        None
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one complete record line into a sample.
pub fn parse_line(line: &str) -> Result<MotionSample, ReplayError> {
    let mut fields = line.split(';');
    let tag = fields.next().unwrap_or_default();
    match tag {
        "GYRO" => {
            let timestamp_ns: i64 = fields
                .next()
                .ok_or(ReplayError::MissingField)?
                .trim()
                .parse()?;
            let values = parse_components(fields.next().ok_or(ReplayError::MissingField)?)?;
            if values.len() != 3 {
                return Err(ReplayError::WrongGyroComponents(values.len()));
            }
            let velocity = Vec3::new(values[0], values[1], values[2]);
            Ok(MotionSample::Gyroscope(GyroSample::new(
                velocity,
                timestamp_ns,
            )?))
        }
        "ROTVEC" => {
            let values = parse_components(fields.next().ok_or(ReplayError::MissingField)?)?;
            Ok(MotionSample::RotationVector(RotationVectorSample::new(
                &values,
            )?))
        }
        other => Err(ReplayError::UnknownRecord(other.to_string())),
    }
}

fn parse_components(field: &str) -> Result<Vec<f32>, ReplayError> {
    field
        .split(',')
        .map(|part| part.trim().parse::<f32>().map_err(ReplayError::from))
        .collect()
}
