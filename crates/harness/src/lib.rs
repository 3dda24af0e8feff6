use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod binding;
pub mod env;
pub mod host;
pub mod keys;
mod pacing;
pub mod rollout;
pub mod session;
pub mod trace;

pub use app::{WindowConfig, WindowHost};
pub use binding::{binding_for_env, Binding, DefaultBinding, SpaceInvadersBinding};
pub use env::{
    ActionSpace, EnvError, Environment, Info, InfoValue, Observation, RenderFrame, StepOutcome,
};
pub use host::{HeadlessHost, Host, HostError, InputRouter};
pub use keys::{key_code_from_physical, KeyCode, KeyEvent, KeyState};
pub use rollout::{EpisodeEnd, EpisodeReport, Rollout, RolloutError};
pub use session::{
    ActionIndex, SessionConfig, SessionError, SessionState, DEFAULT_ENV_ID, IDLE_ACTION,
};
pub use trace::{
    format_reward, read_trace_archive, trace_file_name, write_trace_archive, TraceArchive,
    TraceBuffer, TraceError, TraceRow, TraceSink, TraceWriter, TRACE_FORMAT_VERSION,
};

pub const TRACE_DIR_ENV_VAR: &str = "KEYPLAY_TRACE_DIR";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create trace directory at {path}: {source}")]
    CreateTraceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("trace path {path} exists but is not a directory")]
    TraceDirNotADirectory { path: PathBuf },
}

/// Creates the trace output directory if absent and returns its
/// normalized form.
pub fn prepare_trace_dir(path: &Path) -> Result<PathBuf, StartupError> {
    if path.exists() && !path.is_dir() {
        return Err(StartupError::TraceDirNotADirectory {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| StartupError::CreateTraceDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_path(path))
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_trace_dir_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a").join("b");

        let prepared = prepare_trace_dir(&target).expect("prepare");

        assert!(target.is_dir());
        assert!(prepared.is_absolute());
    }

    #[test]
    fn prepare_trace_dir_rejects_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not_a_dir");
        fs::write(&file, b"x").expect("write");

        let error = prepare_trace_dir(&file).expect_err("file");
        assert!(matches!(error, StartupError::TraceDirNotADirectory { .. }));
    }
}
