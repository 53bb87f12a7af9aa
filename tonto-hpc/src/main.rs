// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Drop-in `tonto` replacement that caches interaction-energy runs.
//!
//! Runs in a tonto job directory: the input is read from `stdin` (a file) and the
//! result is written to `stdout` (a file). Inputs that are not interaction-energy
//! calculations are handed to the real `tonto` untouched.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cache;
mod placeholder;

use cache::{Cache, DEFAULT_STORAGE_DIR, is_interaction_energy_input};
use placeholder::PLACEHOLDER_STDOUT;

const LOG_ENV: &str = "TONTO_HPC_LOG";
const MISSING_TONTO_MESSAGE: &str = "Could not find tonto executable";
/// File tonto writes its results to, relative to the directory it runs in.
const TONTO_OUTPUT: &str = "stdout";

#[derive(Parser, Debug)]
#[command(name = "tonto_hpc", version, about, long_about = None)]
struct Opts {
    #[arg(long, value_name = "DIR", default_value = DEFAULT_STORAGE_DIR)]
    storage_dir: PathBuf,
    #[arg(
        long,
        help = "Run tonto on a cache miss and store its output instead of writing a placeholder."
    )]
    compute_on_miss: bool,
    #[arg(long, value_name = "PATH", default_value = "stdin")]
    input: PathBuf,
    #[arg(long, value_name = "PATH", default_value = "stdout")]
    output: PathBuf,
    #[arg(long, value_name = "PROGRAM", default_value = "tonto")]
    tonto: String,
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = match env::var(LOG_ENV) {
        Ok(value) => EnvFilter::new(value),
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Resolves `program` the way a shell would: paths are taken as given, bare names
/// are searched on `PATH`.
fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let search = env::var_os("PATH")?;
    env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
}

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        tracing::warn!("{} not found, treating input as empty", path.display());
        return Ok(String::new());
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn status_code(status: std::process::ExitStatus) -> ExitCode {
    match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

/// Runs tonto in the job directory, where it expects its `stdin` and wavefunction files.
fn run_tonto(tonto: &Path, work_dir: &Path) -> Result<std::process::ExitStatus> {
    tracing::info!("running {} in {}", tonto.display(), work_dir.display());
    Command::new(tonto)
        .current_dir(work_dir)
        .status()
        .with_context(|| format!("failed to launch {}", tonto.display()))
}

fn run(opts: &Opts) -> Result<ExitCode> {
    let input = read_input(&opts.input)?;
    let Some(tonto) = which(&opts.tonto) else {
        tracing::error!("{} is not on PATH", opts.tonto);
        fs::write(&opts.output, MISSING_TONTO_MESSAGE)
            .with_context(|| format!("failed to write {}", opts.output.display()))?;
        return Ok(ExitCode::FAILURE);
    };
    // A relative program path would otherwise resolve against the job directory.
    let tonto = fs::canonicalize(&tonto)
        .with_context(|| format!("failed to resolve {}", tonto.display()))?;
    let work_dir = opts
        .input
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if !is_interaction_energy_input(&input) {
        return Ok(status_code(run_tonto(&tonto, work_dir)?));
    }

    let cache = Cache::new(&opts.storage_dir);
    if let Some(stored) = cache.lookup(&input)? {
        tracing::info!("cache hit in {}", cache.entry_dir(&input)?.display());
        fs::write(&opts.output, stored)
            .with_context(|| format!("failed to write {}", opts.output.display()))?;
        return Ok(ExitCode::SUCCESS);
    }

    let entry = cache.store_input(&input, work_dir)?;
    tracing::info!("cache miss, stored input in {}", entry.display());

    if !opts.compute_on_miss {
        fs::write(&opts.output, PLACEHOLDER_STDOUT)
            .with_context(|| format!("failed to write {}", opts.output.display()))?;
        return Ok(ExitCode::SUCCESS);
    }

    let status = run_tonto(&tonto, work_dir)?;
    if !status.success() {
        tracing::error!("tonto failed ({status}); nothing cached");
        return Ok(status_code(status));
    }
    let produced_path = work_dir.join(TONTO_OUTPUT);
    let produced = fs::read_to_string(&produced_path)
        .with_context(|| format!("tonto did not produce {}", produced_path.display()))?;
    cache.store_output(&input, &produced)?;
    fs::write(&opts.output, &produced)
        .with_context(|| format!("failed to write {}", opts.output.display()))?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    init_logging(opts.verbose);
    match run(&opts) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    const INPUT: &str = "{\n   name= Group1_Group2\n   put_group_12_energies\n}\n";

    fn opts_in(dir: &TempDir, tonto: &str) -> Opts {
        Opts {
            storage_dir: dir.path().join(DEFAULT_STORAGE_DIR),
            compute_on_miss: false,
            input: dir.path().join("stdin"),
            output: dir.path().join("stdout"),
            tonto: tonto.to_string(),
            verbose: false,
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Opts::command().debug_assert();
    }

    #[test]
    fn missing_tonto_writes_message_and_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stdin"), INPUT).unwrap();
        let opts = opts_in(&dir, "tonto-hpc-no-such-program");
        assert_eq!(run(&opts).unwrap(), ExitCode::FAILURE);
        assert_eq!(
            fs::read_to_string(dir.path().join("stdout")).unwrap(),
            MISSING_TONTO_MESSAGE
        );
    }

    #[cfg(unix)]
    #[test]
    fn miss_writes_placeholder_then_hit_serves_stored_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stdin"), INPUT).unwrap();
        let opts = opts_in(&dir, "true");

        assert_eq!(run(&opts).unwrap(), ExitCode::SUCCESS);
        let written = fs::read_to_string(dir.path().join("stdout")).unwrap();
        assert_eq!(written, PLACEHOLDER_STDOUT);
        assert!(written.contains("FOR LATTICE ENERGIES WHEN USING tonto_hpc.py\n"));
        let cache = Cache::new(&opts.storage_dir);
        assert_eq!(
            fs::read_to_string(cache.entry_dir(INPUT).unwrap().join("stdin")).unwrap(),
            INPUT
        );

        cache.store_output(INPUT, "real energies").unwrap();
        assert_eq!(run(&opts).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            fs::read_to_string(dir.path().join("stdout")).unwrap(),
            "real energies"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failed_computation_is_not_cached() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stdin"), INPUT).unwrap();
        let mut opts = opts_in(&dir, "false");
        opts.compute_on_miss = true;

        assert_eq!(run(&opts).unwrap(), ExitCode::from(1));
        assert_eq!(Cache::new(&opts.storage_dir).lookup(INPUT).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn computation_runs_in_the_input_directory() {
        use std::os::unix::fs::PermissionsExt;

        let job = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let fake_tonto = elsewhere.path().join("tonto");
        fs::write(&fake_tonto, "#!/bin/sh\ncat stdin > /dev/null && echo computed > stdout\n")
            .unwrap();
        fs::set_permissions(&fake_tonto, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(job.path().join("stdin"), INPUT).unwrap();

        let mut opts = opts_in(&job, fake_tonto.to_str().unwrap());
        opts.output = elsewhere.path().join("result");
        opts.compute_on_miss = true;

        assert_eq!(run(&opts).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            fs::read_to_string(job.path().join("stdout")).unwrap(),
            "computed\n"
        );
        assert_eq!(fs::read_to_string(&opts.output).unwrap(), "computed\n");
        assert_eq!(
            Cache::new(&opts.storage_dir).lookup(INPUT).unwrap().as_deref(),
            Some("computed\n")
        );
    }

    #[cfg(unix)]
    #[test]
    fn which_finds_programs_on_path() {
        assert!(which("sh").is_some());
        assert!(which("/definitely/not/here/tonto").is_none());
    }
}
