use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use harness::{SessionConfig, TRACE_DIR_ENV_VAR};
use thiserror::Error;
use tracing::warn;

use super::cli::CliOverrides;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is invalid at '{field}': {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Layers defaults, the optional JSON file, the trace directory env var and
/// CLI flags, in that order.
pub(crate) fn resolve_session_config(
    overrides: &CliOverrides,
    trace_dir_from_env: Option<PathBuf>,
) -> Result<SessionConfig, ConfigError> {
    let mut config = match overrides.config_path.as_deref() {
        Some(path) => load_config_file(path)?,
        None => SessionConfig::default(),
    };

    if let Some(dir) = trace_dir_from_env {
        config.trace_output_directory = Some(dir);
    }
    apply_overrides(&mut config, overrides);
    validate(&config)?;
    Ok(config)
}

pub(crate) fn load_config_file(path: &Path) -> Result<SessionConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let deserializer = &mut serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(deserializer).map_err(|error| {
        let field = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field,
            source: error.into_inner(),
        }
    })
}

pub(crate) fn trace_dir_from_env() -> Option<PathBuf> {
    match env::var(TRACE_DIR_ENV_VAR) {
        Ok(raw) if raw.trim().is_empty() => None,
        Ok(raw) => Some(PathBuf::from(raw.trim())),
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            warn!(
                var = TRACE_DIR_ENV_VAR,
                "trace_dir_env_ignored_not_unicode"
            );
            None
        }
    }
}

fn apply_overrides(config: &mut SessionConfig, overrides: &CliOverrides) {
    if let Some(env_id) = &overrides.env_id {
        config.env_id = env_id.clone();
    }
    if let Some(count) = overrides.action_repeat_count {
        config.action_repeat_count = count;
    }
    if let Some(steps) = overrides.max_steps_per_episode {
        config.max_steps_per_episode = steps;
    }
    if let Some(dir) = &overrides.trace_dir {
        config.trace_output_directory = Some(dir.clone());
    }
    if overrides.random_agent {
        config.use_random_agent = true;
    }
    if overrides.headless {
        config.render_frames = false;
    }
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if let Some(tps) = overrides.target_tps {
        config.target_tps = Some(tps);
    }
    if let Some(limit) = overrides.max_episodes {
        config.max_episodes = Some(limit);
    }
    if let Some(scale) = overrides.window_scale {
        config.window_scale = scale;
    }
}

fn validate(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.env_id.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "env_id",
            message: "must not be empty".to_string(),
        });
    }
    if config.max_steps_per_episode == 0 {
        return Err(ConfigError::InvalidValue {
            field: "max_steps_per_episode",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.window_scale == 0 {
        return Err(ConfigError::InvalidValue {
            field: "window_scale",
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("session.json");
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config =
            resolve_session_config(&CliOverrides::default(), None).expect("resolve");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            dir.path(),
            r#"{ "env_id": "Catch-v0", "action_repeat_count": 2, "max_steps_per_episode": 50 }"#,
        );
        let overrides = CliOverrides {
            config_path: Some(path),
            max_steps_per_episode: Some(80),
            headless: true,
            ..CliOverrides::default()
        };

        let config = resolve_session_config(&overrides, None).expect("resolve");

        assert_eq!(config.env_id, "Catch-v0");
        assert_eq!(config.action_repeat_count, 2);
        assert_eq!(config.max_steps_per_episode, 80);
        assert!(!config.render_frames);
    }

    #[test]
    fn env_trace_dir_loses_to_flag() {
        let from_env = Some(PathBuf::from("from_env"));

        let config = resolve_session_config(&CliOverrides::default(), from_env.clone())
            .expect("resolve");
        assert_eq!(config.trace_output_directory, from_env);

        let overrides = CliOverrides {
            trace_dir: Some(PathBuf::from("from_flag")),
            ..CliOverrides::default()
        };
        let config = resolve_session_config(&overrides, from_env).expect("resolve");
        assert_eq!(
            config.trace_output_directory,
            Some(PathBuf::from("from_flag"))
        );
    }

    #[test]
    fn parse_errors_name_the_offending_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(dir.path(), r#"{ "action_repeat_count": "many" }"#);

        let error = load_config_file(&path).expect_err("bad type");
        match error {
            ConfigError::Parse { field, .. } => assert_eq!(field, "action_repeat_count"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(dir.path(), r#"{ "frame_skip": 3 }"#);

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_rollout_time_is_rejected() {
        let overrides = CliOverrides {
            max_steps_per_episode: Some(0),
            ..CliOverrides::default()
        };
        let error = resolve_session_config(&overrides, None).expect_err("zero steps");
        assert!(matches!(
            error,
            ConfigError::InvalidValue {
                field: "max_steps_per_episode",
                ..
            }
        ));
    }

    #[test]
    fn missing_config_file_is_a_read_error() {
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..CliOverrides::default()
        };
        assert!(matches!(
            resolve_session_config(&overrides, None),
            Err(ConfigError::ReadFile { .. })
        ));
    }
}
