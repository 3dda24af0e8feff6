mod archive;
mod staging;

use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

use crate::env::Observation;
use crate::session::ActionIndex;

pub use archive::{read_trace_archive, write_trace_archive, TraceArchive, TRACE_FORMAT_VERSION};

pub const TRACE_FILE_EXTENSION: &str = "trace";
const TIME_SUFFIX_MODULUS: u64 = 100_000;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read/write trace file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("trace row {row} has width {width}, expected {expected}")]
    RaggedRow {
        row: usize,
        width: usize,
        expected: usize,
    },
    #[error("trace at {path} has invalid format: {message}")]
    InvalidFormat { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub observation: Observation,
    pub action: ActionIndex,
    pub reward: f64,
}

/// Ordered rows for one episode, flattened into a fixed-width 2D array as
/// they arrive.
#[derive(Debug, Clone, Default)]
pub struct TraceBuffer {
    values: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: &TraceRow) -> Result<(), TraceError> {
        let width = row.observation.len() + 2;
        if self.rows == 0 {
            self.cols = width;
        } else if width != self.cols {
            return Err(TraceError::RaggedRow {
                row: self.rows,
                width,
                expected: self.cols,
            });
        }

        self.values.extend_from_slice(&row.observation);
        self.values.push(row.action as f32);
        self.values.push(row.reward as f32);
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

}

/// Destination for completed episode traces.
pub trait TraceSink {
    /// Persists one episode as a single unit, returning where it landed.
    fn flush(&mut self, trace: &TraceBuffer, episode_reward: f64) -> Result<PathBuf, TraceError>;
}

#[derive(Debug, Clone)]
pub struct TraceWriter {
    output_dir: PathBuf,
}

impl TraceWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl TraceSink for TraceWriter {
    fn flush(&mut self, trace: &TraceBuffer, episode_reward: f64) -> Result<PathBuf, TraceError> {
        let file_name = trace_file_name(unix_time_secs(), episode_reward);
        let path = self.output_dir.join(file_name);
        write_trace_archive(
            &path,
            trace.rows(),
            trace.cols(),
            episode_reward,
            trace.values(),
        )?;
        info!(
            path = %path.display(),
            rows = trace.rows(),
            cols = trace.cols(),
            "trace_written"
        );
        Ok(path)
    }
}

/// `<last five digits of unix seconds>_<episode reward>.trace`
pub fn trace_file_name(unix_secs: u64, episode_reward: f64) -> String {
    format!(
        "{:05}_{}.{TRACE_FILE_EXTENSION}",
        unix_secs % TIME_SUFFIX_MODULUS,
        format_reward(episode_reward)
    )
}

/// Integral rewards keep one decimal place (`15.0`); others print in
/// shortest round-trip form.
pub fn format_reward(reward: f64) -> String {
    if reward.is_finite() && reward.fract() == 0.0 {
        format!("{reward:.1}")
    } else {
        format!("{reward}")
    }
}

fn unix_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(observation: &[f32], action: ActionIndex, reward: f64) -> TraceRow {
        TraceRow {
            observation: observation.to_vec(),
            action,
            reward,
        }
    }

    #[test]
    fn rows_concatenate_observation_action_reward() {
        let mut buffer = TraceBuffer::new();
        buffer.push(&row(&[0.1, 0.2], 3, 1.0)).expect("push");
        buffer.push(&row(&[0.3, 0.4], 0, 0.0)).expect("push");

        assert_eq!(buffer.rows(), 2);
        assert_eq!(buffer.cols(), 4);
        assert_eq!(buffer.values(), &[0.1, 0.2, 3.0, 1.0, 0.3, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut buffer = TraceBuffer::new();
        buffer.push(&row(&[0.0, 0.0], 1, 0.0)).expect("push");
        let error = buffer.push(&row(&[0.0], 1, 0.0)).expect_err("ragged");
        assert!(matches!(
            error,
            TraceError::RaggedRow {
                row: 1,
                width: 3,
                expected: 4
            }
        ));
        assert_eq!(buffer.rows(), 1);
    }

    #[test]
    fn file_name_uses_last_five_time_digits_and_reward() {
        assert_eq!(trace_file_name(1_700_012_345, 15.0), "12345_15.0.trace");
        assert_eq!(trace_file_name(1_700_000_042, -2.5), "00042_-2.5.trace");
    }

    #[test]
    fn reward_formatting() {
        assert_eq!(format_reward(0.0), "0.0");
        assert_eq!(format_reward(210.0), "210.0");
        assert_eq!(format_reward(0.25), "0.25");
    }

    #[test]
    fn writer_flushes_one_archive_into_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output_dir = dir.path().join("traces");
        let mut writer = TraceWriter::new(output_dir.clone());
        let mut buffer = TraceBuffer::new();
        buffer.push(&row(&[0.5, 0.5, 0.5], 2, 1.0)).expect("push");
        buffer.push(&row(&[0.0, 0.5, 1.0], 1, 0.0)).expect("push");

        let path = writer.flush(&buffer, 1.0).expect("flush");
        assert_eq!(path.parent(), Some(output_dir.as_path()));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.ends_with("_1.0.trace"));

        let archive = read_trace_archive(&path).expect("read");
        assert_eq!((archive.rows, archive.cols), (2, 5));
        assert_eq!(archive.row(0), Some(&[0.5, 0.5, 0.5, 2.0, 1.0][..]));
        assert_eq!(archive.episode_reward, 1.0);
    }
}
