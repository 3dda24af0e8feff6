mod bootstrap;
mod cli;
mod config;
mod inspect;
mod loop_runner;

use std::env;
use std::io;
use std::process::ExitCode;

use tracing::error;

use cli::CliCommand;

const USAGE_EXIT_CODE: u8 = 2;

pub(crate) fn run_cli() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err}\n\n{}", cli::usage_text());
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };

    match command {
        CliCommand::Help => {
            println!("{}", cli::usage_text());
            ExitCode::SUCCESS
        }
        CliCommand::Inspect { path } => match inspect::run(&path, &mut io::stdout()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
        CliCommand::Play(overrides) => {
            bootstrap::init_tracing();
            let config =
                match config::resolve_session_config(&overrides, config::trace_dir_from_env()) {
                    Ok(config) => config,
                    Err(err) => {
                        error!(error = %err, "config_invalid");
                        return ExitCode::FAILURE;
                    }
                };
            match bootstrap::build_play(config) {
                Ok(wiring) => loop_runner::run(wiring),
                Err(err) => {
                    error!(error = %err, "startup_failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
