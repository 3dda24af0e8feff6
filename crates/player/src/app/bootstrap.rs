use harness::{
    binding_for_env, prepare_trace_dir, EnvError, Environment, HeadlessHost, Host, HostError,
    InputRouter, Rollout, SessionConfig, SessionError, SessionState, StartupError, WindowConfig,
    WindowHost,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::envs::make_env;

const FALLBACK_FRAME_WIDTH: u32 = 160;
const FALLBACK_FRAME_HEIGHT: u32 = 210;
const HOST_CONTROLS_HELP: &str = "Return restarts the episode, Space pauses, Escape quits.";

pub(crate) type PlayRollout = Rollout<Box<dyn Environment>, Box<dyn Host>>;

pub(crate) struct PlayWiring {
    pub(crate) state: SessionState,
    pub(crate) rollout: PlayRollout,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Host(#[from] HostError),
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn build_play(mut config: SessionConfig) -> Result<PlayWiring, BootstrapError> {
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    if let Some(dir) = config.trace_output_directory.take() {
        let prepared = prepare_trace_dir(&dir)?;
        info!(trace_dir = %prepared.display(), "trace_dir_ready");
        config.trace_output_directory = Some(prepared);
    }

    let env = make_env(&config.env_id, config.seed)?;
    let state = SessionState::new(env.action_space(), config)?;

    let binding = binding_for_env(&state.config.env_id);
    let help = binding.describe(&state);
    info!(
        binding = binding.name(),
        env_id = %state.config.env_id,
        instructions = %help,
        "binding_selected"
    );
    println!("{help}");
    println!("{HOST_CONTROLS_HELP}");

    let host = build_host(env.as_ref(), &state, InputRouter::new(binding))?;
    let rollout = Rollout::new(env, host, &state);
    Ok(PlayWiring { state, rollout })
}

fn build_host(
    env: &dyn Environment,
    state: &SessionState,
    router: InputRouter,
) -> Result<Box<dyn Host>, HostError> {
    let config = &state.config;
    if !config.render_frames {
        if !config.use_random_agent {
            warn!("headless_keyboard_session_has_no_input");
        }
        info!("host_headless");
        return Ok(Box::new(HeadlessHost));
    }

    let (frame_width, frame_height) = env
        .render()
        .map(|frame| (frame.width, frame.height))
        .unwrap_or((FALLBACK_FRAME_WIDTH, FALLBACK_FRAME_HEIGHT));
    let host = WindowHost::new(
        WindowConfig {
            title: config.env_id.clone(),
            frame_width,
            frame_height,
            scale: config.window_scale,
        },
        router,
    )?;
    Ok(Box::new(host))
}
