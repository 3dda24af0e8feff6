mod app;
mod envs;

use std::process::ExitCode;

fn main() -> ExitCode {
    app::run_cli()
}
