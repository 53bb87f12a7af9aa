// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};

use crate::app::errors::{AppError, AppErrorKind, AppResult, GENERIC_FAILURE_EXIT_CODE, codes};
use crate::app::lifecycle::{JobLifecycle, JobOutcome, job_name_from_input};

mod adapters;
mod app;
mod config;
mod logging;

fn log_config_report(report: &config::ConfigReport) {
    match (&report.config_path, report.config_path_source) {
        (Some(path), Some(source)) => {
            tracing::info!(
                "config path: {} (source={}, present={})",
                path.display(),
                source.as_str(),
                report.config_file_present
            );
        }
        (Some(path), None) => {
            tracing::info!(
                "config path: {} (present={})",
                path.display(),
                report.config_file_present
            );
        }
        (None, _) => {
            tracing::info!("config path: (none)");
        }
    }
    tracing::info!(
        "config remote_host: {} (source={})",
        report.remote_host.value,
        report.remote_host.source.as_str()
    );
    tracing::info!(
        "config check_status_period_secs: {} (source={})",
        report.check_status_period_secs.value,
        report.check_status_period_secs.source.as_str()
    );
    tracing::info!(
        "config executable: {} (source={})",
        report.executable.value,
        report.executable.source.as_str()
    );
    match &report.job_template.value {
        Some(path) => tracing::info!(
            "config job_template: {} (source={})",
            path.display(),
            report.job_template.source.as_str()
        ),
        None => tracing::info!("config job_template: built-in PBS script"),
    }
    tracing::info!(
        "config verbose: {} (source={})",
        report.verbose.value,
        report.verbose.source.as_str()
    );
}

fn exit_code(err: &AppError) -> ExitCode {
    let code = u8::try_from(err.exit_code())
        .ok()
        .filter(|code| *code != 0)
        .unwrap_or(GENERIC_FAILURE_EXIT_CODE as u8);
    ExitCode::from(code)
}

fn log_outcome(outcome: &JobOutcome) {
    tracing::info!(
        "Gaussian job {} complete (job_id={}, status={}, elapsed={}s)",
        outcome.name,
        outcome.id,
        outcome.status,
        outcome.elapsed.whole_seconds()
    );
}

/// First interrupt asks the poller to stop; a second one fires `abort`.
async fn forward_interrupts<S, F>(
    mut next_interrupt: S,
    cancel: watch::Sender<bool>,
    abort: oneshot::Sender<()>,
) where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return;
    }
    tracing::warn!("interrupt received, stopping; press Ctrl-C again to exit immediately");
    let _ = cancel.send(true);
    if next_interrupt().await.is_ok() {
        let _ = abort.send(());
    }
}

// Returning instead of exiting lets main drop the log guard, which flushes the file log.
async fn unless_aborted<T>(
    work: impl Future<Output = AppResult<T>>,
    abort: oneshot::Receiver<()>,
) -> AppResult<T> {
    tokio::select! {
        result = work => result,
        Ok(()) = abort => Err(
            AppError::new(AppErrorKind::Cancelled, codes::CANCELED)
                .with_context("interrupted twice"),
        ),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let parsed = adapters::cli::parse_opts();
    let opts = parsed.opts;
    let loaded = config::load_with_report(
        opts.config.clone(),
        config::Overrides {
            remote_host: opts.host.clone(),
            check_status_period_secs: opts.check_status_period_secs,
            executable: opts.executable.clone(),
            max_unknown_polls: opts.max_unknown_polls,
            poll_timeout_secs: opts.poll_timeout_secs,
            log_file: opts.log_file.clone(),
            verbose: parsed.verbose_override,
        },
    );
    let config::LoadResult { config, report } = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            let err = AppError::with_message(
                AppErrorKind::Config,
                codes::INVALID_CONFIG,
                format!("{err:#}"),
            );
            eprintln!("g09wrap: {err}");
            return exit_code(&err);
        }
    };
    let job_name = match job_name_from_input(&opts.filename) {
        Ok(name) => name,
        Err(err) => {
            eprintln!("g09wrap: {err}");
            return exit_code(&err);
        }
    };

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{job_name}.log")));
    let _log_guard = logging::init(config.verbose, Some(&log_file));
    log_config_report(&report);
    tracing::info!("Running Gaussian job {job_name} on {}", config.settings.host);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (abort_tx, abort_rx) = oneshot::channel();
    tokio::spawn(forward_interrupts(tokio::signal::ctrl_c, cancel_tx, abort_tx));

    let ssh = Arc::new(adapters::ssh::SshAdapter::with_defaults());
    let mut lifecycle = JobLifecycle::new(
        config.settings,
        ssh.clone(),
        ssh,
        Arc::new(adapters::fs::LocalFilesystem::new()),
        Arc::new(adapters::time::SystemClock::new()),
        cancel_rx,
    );

    let run = lifecycle.execute(&opts.filename, &opts.attachments);
    match unless_aborted(run, abort_rx).await {
        Ok(outcome) => {
            log_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(
                kind = ?err.kind(),
                code = err.code(),
                context = err.context(),
                "{}",
                err.message()
            );
            exit_code(&err)
        }
    }
}
