use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CliOverrides {
    pub env_id: Option<String>,
    pub action_repeat_count: Option<u32>,
    pub max_steps_per_episode: Option<u32>,
    pub trace_dir: Option<PathBuf>,
    pub random_agent: bool,
    pub headless: bool,
    pub seed: Option<u64>,
    pub target_tps: Option<u32>,
    pub max_episodes: Option<u64>,
    pub window_scale: Option<u32>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CliCommand {
    Play(CliOverrides),
    Inspect { path: PathBuf },
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CliError {
    #[error("missing value for {flag}")]
    MissingValue { flag: String },
    #[error("invalid {flag} value '{value}' (expected {expected})")]
    InvalidValue {
        flag: String,
        value: String,
        expected: &'static str,
    },
    #[error("{flag} does not take a value")]
    UnexpectedValue { flag: String },
    #[error("unknown argument '{arg}'")]
    UnknownArgument { arg: String },
    #[error("inspect requires exactly one trace file path")]
    InspectArity,
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliCommand, CliError> {
    if args.first().map(String::as_str) == Some("inspect") {
        return match &args[1..] {
            [path] => Ok(CliCommand::Inspect {
                path: PathBuf::from(path),
            }),
            _ => Err(CliError::InspectArity),
        };
    }

    let mut overrides = CliOverrides::default();
    let mut index = 0usize;
    while index < args.len() {
        let (flag, inline_value) = match args[index].split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (args[index].as_str(), None),
        };
        let mut take_value = || -> Result<String, CliError> {
            if let Some(value) = inline_value.clone() {
                return Ok(value);
            }
            index += 1;
            args.get(index).cloned().ok_or_else(|| CliError::MissingValue {
                flag: flag.to_string(),
            })
        };

        match flag {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--env-id" | "--env_id" => overrides.env_id = Some(take_value()?),
            "--skip-control" => {
                overrides.action_repeat_count =
                    Some(parse_number(flag, &take_value()?, "u32 >= 0")?)
            }
            "--rollout-time" => {
                overrides.max_steps_per_episode =
                    Some(parse_number(flag, &take_value()?, "u32 > 0")?)
            }
            "--trace-dir" => overrides.trace_dir = Some(PathBuf::from(take_value()?)),
            "--seed" => overrides.seed = Some(parse_number(flag, &take_value()?, "u64")?),
            "--tps" => overrides.target_tps = Some(parse_number(flag, &take_value()?, "u32")?),
            "--episodes" => {
                overrides.max_episodes = Some(parse_number(flag, &take_value()?, "u64")?)
            }
            "--scale" => {
                overrides.window_scale = Some(parse_number(flag, &take_value()?, "u32 > 0")?)
            }
            "--config" => overrides.config_path = Some(PathBuf::from(take_value()?)),
            "--random-agent" | "--headless" => {
                if inline_value.is_some() {
                    return Err(CliError::UnexpectedValue {
                        flag: flag.to_string(),
                    });
                }
                if flag == "--random-agent" {
                    overrides.random_agent = true;
                } else {
                    overrides.headless = true;
                }
            }
            _ => {
                return Err(CliError::UnknownArgument {
                    arg: args[index].clone(),
                })
            }
        }
        index += 1;
    }

    Ok(CliCommand::Play(overrides))
}

fn parse_number<T: std::str::FromStr>(
    flag: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, CliError> {
    value.parse::<T>().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
        expected,
    })
}

pub(crate) fn usage_text() -> String {
    [
        "player - keyboard play harness for discrete-action environments",
        "",
        "Usage:",
        "  player [options]",
        "  player inspect <trace-file>",
        "",
        "Options:",
        "  --env-id <id>          Environment id [default: SpaceInvaders-v4]",
        "  --skip-control <n>     Reuse the previous action n more ticks [default: 0]",
        "  --rollout-time <t>     Maximum steps per episode [default: 1000]",
        "  --trace-dir <path>     Record completed episodes into this directory",
        "  --random-agent         Sample actions uniformly instead of reading keys",
        "  --headless             Do not open a window or draw frames",
        "  --seed <u64>           Seed for the random agent and environment",
        "  --tps <u32>            Tick rate cap, 0 for uncapped [default: 60]",
        "  --episodes <u64>       Stop after this many episodes [default: forever]",
        "  --scale <u32>          Window pixels per frame pixel [default: 4]",
        "  --config <path>        JSON session config, overridden by flags",
        "",
        "Controls:",
        "  Return restarts the episode, Space pauses, Escape quits.",
        "",
        "Environment:",
        "  KEYPLAY_TRACE_DIR      Trace directory when --trace-dir is absent",
        "  RUST_LOG               Log filter [default: info]",
    ]
    .join("\n")
}
