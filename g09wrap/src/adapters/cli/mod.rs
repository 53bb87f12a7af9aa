// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "g09wrap",
    version,
    about = "Run a Gaussian input on a remote PBS cluster and fetch the results",
    long_about = None,
    after_help = "Configuration precedence: defaults < config file < command-line flags.\n\
Config path precedence: default location < G09WRAP_CONFIG_PATH < --config.\n\
Logging: G09WRAP_LOG sets the filter, G09WRAP_LOG_FORMAT selects compact, pretty or json.\n\
Paths in the config file are resolved relative to the config file directory; paths passed as flags are resolved relative to the current working directory."
)]
pub struct Opts {
    #[arg(value_name = "FILENAME", help = "Gaussian input file, e.g. job.inp")]
    pub filename: PathBuf,
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to a TOML config file. When omitted, g09wrap uses G09WRAP_CONFIG_PATH if set, otherwise the default config file location if available."
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "HOST",
        help = "Remote host as given to ssh (host or user@host). Overrides `remote_host` from the config file."
    )]
    pub host: Option<String>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Seconds between scheduler status queries. Overrides `check_status_period_secs`."
    )]
    pub check_status_period_secs: Option<u64>,
    #[arg(
        long,
        value_name = "PROGRAM",
        help = "Gaussian executable on the remote host. Overrides `executable`."
    )]
    pub executable: Option<String>,
    #[arg(
        long = "attach",
        value_name = "PATH",
        help = "Extra file to upload next to the input (repeatable), e.g. a checkpoint."
    )]
    pub attachments: Vec<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Write the run log here instead of <job name>.log. Overrides `log_file`."
    )]
    pub log_file: Option<PathBuf>,
    #[arg(
        long,
        value_name = "N",
        help = "Give up after N consecutive empty status replies. Overrides `max_unknown_polls`."
    )]
    pub max_unknown_polls: Option<u32>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Stop waiting for the job after SECS seconds. Overrides `poll_timeout_secs`."
    )]
    pub poll_timeout_secs: Option<u64>,
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Enable debug logging. Overrides `verbose` from the config file."
    )]
    pub verbose: bool,
}

pub struct ParsedOpts {
    pub opts: Opts,
    pub verbose_override: Option<bool>,
}

pub fn cli_command() -> clap::Command {
    Opts::command()
}

pub fn parse_opts() -> ParsedOpts {
    parse_from(std::env::args_os())
}

// `--verbose` only overrides the config file when it is actually passed.
fn parse_from<I, T>(args: I) -> ParsedOpts
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = cli_command().get_matches_from(args);
    let verbose_override = if matches.get_flag("verbose") {
        Some(true)
    } else {
        None
    };
    let opts = Opts::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    ParsedOpts {
        opts,
        verbose_override,
    }
}
