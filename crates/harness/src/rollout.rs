use std::path::PathBuf;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::env::{EnvError, Environment};
use crate::host::{Host, HostError};
use crate::pacing::TickPacer;
use crate::session::{ActionIndex, SessionState, IDLE_ACTION};
use crate::trace::{TraceBuffer, TraceError, TraceRow, TraceSink, TraceWriter};

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Trace(#[from] TraceError),
}

impl RolloutError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, RolloutError::Host(error) if error.is_shutdown())
    }
}

/// Why an episode ended. Exactly one applies per episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    Done,
    StepBudgetExhausted,
    Restarted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub episode: u64,
    pub steps: u32,
    pub reward: f64,
    pub end: EpisodeEnd,
    /// Set only when the episode ended with `done` and tracing is enabled.
    pub trace_path: Option<PathBuf>,
}

/// Holds a selected action for `repeat_count` further ticks before
/// sampling again.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActionRepeat {
    remaining: u32,
    action: ActionIndex,
}

impl ActionRepeat {
    pub(crate) fn new() -> Self {
        Self {
            remaining: 0,
            action: IDLE_ACTION,
        }
    }

    pub(crate) fn next(
        &mut self,
        repeat_count: u32,
        sample: impl FnOnce() -> ActionIndex,
    ) -> ActionIndex {
        if self.remaining == 0 {
            self.action = sample();
            self.remaining = repeat_count;
        } else {
            self.remaining -= 1;
        }
        self.action
    }
}

/// Drives episodes of one environment against one host.
pub struct Rollout<E, H> {
    env: E,
    host: H,
    rng: StdRng,
    trace_sink: Option<Box<dyn TraceSink>>,
    pacer: TickPacer,
    episodes_started: u64,
}

impl<E: Environment, H: Host> Rollout<E, H> {
    pub fn new(env: E, host: H, state: &SessionState) -> Self {
        let config = &state.config;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let trace_sink = config
            .trace_output_directory
            .as_ref()
            .map(|dir| Box::new(TraceWriter::new(dir.clone())) as Box<dyn TraceSink>);
        let pacer = TickPacer::new(config.target_tps);
        info!(
            env_id = %config.env_id,
            num_actions = state.num_actions(),
            action_repeat_count = config.action_repeat_count,
            max_steps_per_episode = config.max_steps_per_episode,
            use_random_agent = config.use_random_agent,
            render_frames = config.render_frames,
            tracing = trace_sink.is_some(),
            tps_cap = %pacer,
            "session_config"
        );

        Self {
            env,
            host,
            rng,
            trace_sink,
            pacer,
            episodes_started: 0,
        }
    }

    /// Replaces the trace destination; `None` disables tracing.
    pub fn with_trace_sink(mut self, trace_sink: Option<Box<dyn TraceSink>>) -> Self {
        self.trace_sink = trace_sink;
        self
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Runs episodes back to back. With no limit this only returns on error.
    pub fn run_episodes(
        &mut self,
        state: &mut SessionState,
        limit: Option<u64>,
    ) -> Result<u64, RolloutError> {
        let mut completed = 0u64;
        while limit.map_or(true, |limit| completed < limit) {
            self.run_episode(state)?;
            completed += 1;
        }
        Ok(completed)
    }

    pub fn run_episode(&mut self, state: &mut SessionState) -> Result<EpisodeReport, RolloutError> {
        self.episodes_started += 1;
        let episode = self.episodes_started;
        state.restart_requested = false;
        let initial_observation = self.env.reset()?;
        info!(
            episode,
            observation_width = initial_observation.len(),
            "episode_started"
        );

        let mut repeat = ActionRepeat::new();
        let mut trace = self.trace_sink.as_ref().map(|_| TraceBuffer::new());
        let mut episode_reward = 0.0f64;
        let max_steps = state.config.max_steps_per_episode;

        for tick in 0..max_steps {
            let action = {
                let rng = &mut self.rng;
                let current_action = state.current_action();
                let num_actions = state.num_actions();
                let use_random_agent = state.config.use_random_agent;
                repeat.next(state.config.action_repeat_count, || {
                    if use_random_agent {
                        rng.gen_range(0..num_actions)
                    } else {
                        current_action
                    }
                })
            };

            let outcome = self.env.step(action)?;
            episode_reward += outcome.reward;
            if let Some(trace) = trace.as_mut() {
                trace.push(&TraceRow {
                    observation: outcome.observation,
                    action,
                    reward: outcome.reward,
                })?;
            }

            self.refresh_host(state)?;
            let steps = tick + 1;

            if outcome.done {
                info!(episode, steps, reward = episode_reward, "episode_done");
                let trace_path = match (self.trace_sink.as_mut(), trace.as_ref()) {
                    (Some(sink), Some(trace)) => Some(sink.flush(trace, episode_reward)?),
                    _ => None,
                };
                return Ok(EpisodeReport {
                    episode,
                    steps,
                    reward: episode_reward,
                    end: EpisodeEnd::Done,
                    trace_path,
                });
            }

            if state.restart_requested {
                info!(episode, steps, reward = episode_reward, "episode_restarted");
                return Ok(EpisodeReport {
                    episode,
                    steps,
                    reward: episode_reward,
                    end: EpisodeEnd::Restarted,
                    trace_path: None,
                });
            }

            if state.paused {
                self.wait_while_paused(state)?;
            }
            self.pacer.wait();
        }

        info!(
            episode,
            steps = max_steps,
            reward = episode_reward,
            "episode_budget_exhausted"
        );
        Ok(EpisodeReport {
            episode,
            steps: max_steps,
            reward: episode_reward,
            end: EpisodeEnd::StepBudgetExhausted,
            trace_path: None,
        })
    }

    fn refresh_host(&mut self, state: &mut SessionState) -> Result<(), HostError> {
        if state.config.render_frames {
            let frame = self.env.render();
            self.host.present(frame.as_ref(), state)
        } else {
            self.host.poll_input(state)
        }
    }

    /// Pause is only honoured between ticks, never mid-step.
    fn wait_while_paused(&mut self, state: &mut SessionState) -> Result<(), HostError> {
        info!("paused");
        let poll_interval = state.config.pause_poll_interval();
        let mut polls = 0u64;
        while state.paused {
            self.refresh_host(state)?;
            thread::sleep(poll_interval);
            polls += 1;
        }
        debug!(polls, "pause_polls");
        info!("resumed");
        Ok(())
    }
}
