use std::process::ExitCode;

use tracing::{error, info};

use super::bootstrap::PlayWiring;

pub(crate) fn run(wiring: PlayWiring) -> ExitCode {
    let PlayWiring {
        mut state,
        mut rollout,
    } = wiring;
    let limit = state.config.max_episodes;

    match rollout.run_episodes(&mut state, limit) {
        Ok(episodes) => {
            info!(episodes, reason = "episode_limit", "shutdown");
            ExitCode::SUCCESS
        }
        Err(err) if err.is_shutdown() => {
            info!(reason = %err, "shutdown");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "rollout_failed");
            ExitCode::FAILURE
        }
    }
}
