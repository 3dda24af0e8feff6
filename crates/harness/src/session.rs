use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::ActionSpace;

pub type ActionIndex = usize;

/// Action index 0 is always the idle / no-input action.
pub const IDLE_ACTION: ActionIndex = 0;

pub const DEFAULT_ENV_ID: &str = "SpaceInvaders-v4";
pub const DEFAULT_MAX_STEPS_PER_EPISODE: u32 = 1000;
pub const DEFAULT_PAUSE_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_TARGET_TPS: u32 = 60;
pub const DEFAULT_WINDOW_SCALE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub env_id: String,
    pub action_repeat_count: u32,
    pub max_steps_per_episode: u32,
    pub use_random_agent: bool,
    /// Tracing is enabled iff a directory is configured.
    pub trace_output_directory: Option<PathBuf>,
    pub render_frames: bool,
    pub target_tps: Option<u32>,
    pub pause_poll_interval_ms: u64,
    pub window_scale: u32,
    pub seed: Option<u64>,
    pub max_episodes: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            env_id: DEFAULT_ENV_ID.to_string(),
            action_repeat_count: 0,
            max_steps_per_episode: DEFAULT_MAX_STEPS_PER_EPISODE,
            use_random_agent: false,
            trace_output_directory: None,
            render_frames: true,
            target_tps: Some(DEFAULT_TARGET_TPS),
            pause_poll_interval_ms: DEFAULT_PAUSE_POLL_INTERVAL_MS,
            window_scale: DEFAULT_WINDOW_SCALE,
            seed: None,
            max_episodes: None,
        }
    }
}

impl SessionConfig {
    pub fn tracing_enabled(&self) -> bool {
        self.trace_output_directory.is_some()
    }

    pub fn pause_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pause_poll_interval_ms)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("keyboard agent only supports discrete action spaces (got {space})")]
    NonDiscreteActionSpace { space: ActionSpace },
    #[error("action space of environment {env_id} has no actions")]
    EmptyActionSpace { env_id: String },
}

/// The one mutable record shared by input handling and the rollout loop.
#[derive(Debug, Clone)]
pub struct SessionState {
    current_action: ActionIndex,
    num_actions: usize,
    pub restart_requested: bool,
    pub paused: bool,
    pub config: SessionConfig,
}

impl SessionState {
    pub fn new(action_space: ActionSpace, config: SessionConfig) -> Result<Self, SessionError> {
        let num_actions = match action_space {
            ActionSpace::Discrete(n) => n,
            space @ ActionSpace::Continuous { .. } => {
                return Err(SessionError::NonDiscreteActionSpace { space })
            }
        };
        if num_actions == 0 {
            return Err(SessionError::EmptyActionSpace {
                env_id: config.env_id.clone(),
            });
        }

        Ok(Self {
            current_action: IDLE_ACTION,
            num_actions,
            restart_requested: false,
            paused: false,
            config,
        })
    }

    pub fn current_action(&self) -> ActionIndex {
        self.current_action
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn is_valid_action(&self, action: ActionIndex) -> bool {
        action < self.num_actions
    }

    /// Out-of-range actions are ignored so the held action always stays valid.
    pub fn set_current_action(&mut self, action: ActionIndex) {
        if self.is_valid_action(action) {
            self.current_action = action;
        }
    }

    pub fn release_to_idle(&mut self) {
        self.current_action = IDLE_ACTION;
    }

    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}
