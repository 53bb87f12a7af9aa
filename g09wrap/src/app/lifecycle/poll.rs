// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes, invalid_argument};
use crate::app::lifecycle::{ConnectionValidator, LifecycleSettings, RemoteExecutor};
use crate::app::ports::ClockPort;
use crate::app::services::templates;
use crate::app::types::{Job, JobStatus};

const UNKNOWN_STREAK_STATE: &str = "Unknown";

/// Queries the scheduler until the job reaches a terminal state or the host drops out.
///
/// This is the only component that writes `Job::status`.
pub struct StatusPoller {
    executor: RemoteExecutor,
    validator: ConnectionValidator,
    clock: Arc<dyn ClockPort>,
    settings: Arc<LifecycleSettings>,
    cancel: watch::Receiver<bool>,
}

impl StatusPoller {
    pub fn new(
        executor: RemoteExecutor,
        validator: ConnectionValidator,
        clock: Arc<dyn ClockPort>,
        settings: Arc<LifecycleSettings>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            executor,
            validator,
            clock,
            settings,
            cancel,
        }
    }

    /// Polls while `job.is_running()`. Returns `Ok` when the loop ends on its own (terminal
    /// status or lost connection); cancellation and the optional deadline are errors.
    #[tracing::instrument(name = "poll", level = "debug", skip_all, fields(job = %job.name))]
    pub async fn run(&mut self, job: &mut Job) -> AppResult<()> {
        let job_id = job
            .id
            .clone()
            .ok_or_else(|| invalid_argument("cannot poll a job that has no scheduler id"))?;
        let status_command = templates::render(
            &self.settings.status_command,
            &BTreeMap::from([("job_id", job_id.as_str())]),
        )?;
        let deadline = self
            .settings
            .poll_timeout
            .map(|timeout| self.clock.now_utc() + timeout);
        let mut unknown_streak: u32 = 0;

        while job.is_running() {
            if *self.cancel.borrow() {
                return Err(cancelled(&job_id));
            }
            if let Some(deadline) = deadline {
                check_deadline(self.clock.now_utc(), deadline, &job_id)?;
            }

            let capture = self.executor.execute_checked(&status_command).await?;
            let status = self.settings.states.classify(&capture.stdout_text());
            if status == JobStatus::Unknown {
                unknown_streak += 1;
                let next = self.on_unknown(job, unknown_streak).await;
                job.status = next;
            } else {
                unknown_streak = 0;
                if let JobStatus::Unrecognized(token) = &status {
                    tracing::warn!("scheduler reported unrecognized state '{token}' for {job_id}");
                }
                job.status = status;
            }
            tracing::info!("Status for job_id={job_id}: {}", job.status);

            if !job.is_running() {
                break;
            }
            self.pause(&job_id).await?;
        }
        Ok(())
    }

    async fn on_unknown(&self, job: &mut Job, streak: u32) -> JobStatus {
        tracing::warn!("scheduler returned no state for job {} ({streak} in a row)", job.name);
        if self.settings.recheck_connection_on_unknown && !self.validator.validate().await {
            job.mark_connection_lost();
            return JobStatus::ConnectionLost;
        }
        match self.settings.max_unknown_polls {
            Some(limit) if streak >= limit => {
                tracing::error!("giving up after {streak} empty status replies");
                JobStatus::Errored(UNKNOWN_STREAK_STATE.to_string())
            }
            _ => JobStatus::Unknown,
        }
    }

    // Sleeps for one poll period; a cancel request cuts the sleep short.
    async fn pause(&mut self, job_id: &str) -> AppResult<()> {
        let mut sleep = self.clock.sleep(self.settings.check_status_period);
        loop {
            tokio::select! {
                _ = &mut sleep => return Ok(()),
                changed = self.cancel.changed() => {
                    if changed.is_err() {
                        // Sender dropped: nobody can cancel any more.
                        sleep.await;
                        return Ok(());
                    }
                    if *self.cancel.borrow() {
                        return Err(cancelled(job_id));
                    }
                }
            }
        }
    }
}

fn check_deadline(now: OffsetDateTime, deadline: OffsetDateTime, job_id: &str) -> AppResult<()> {
    if now >= deadline {
        return Err(AppError::with_message(
            AppErrorKind::Timeout,
            codes::TIMEOUT,
            format!("job {job_id} did not finish before the polling deadline"),
        ));
    }
    Ok(())
}

fn cancelled(job_id: &str) -> AppError {
    AppError::with_message(
        AppErrorKind::Cancelled,
        codes::CANCELED,
        format!("stopped polling job {job_id}; it keeps running on the cluster"),
    )
}
