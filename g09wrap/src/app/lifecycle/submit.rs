// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::lifecycle::{FileTransferAgent, LifecycleSettings, RemoteExecutor};
use crate::app::services::templates;
use crate::app::types::Job;

/// Creates the remote working directory, stages the inputs and hands the script to qsub.
#[derive(Clone)]
pub struct JobSubmitter {
    executor: RemoteExecutor,
    transfer: FileTransferAgent,
    settings: Arc<LifecycleSettings>,
}

impl JobSubmitter {
    pub fn new(
        executor: RemoteExecutor,
        transfer: FileTransferAgent,
        settings: Arc<LifecycleSettings>,
    ) -> Self {
        Self {
            executor,
            transfer,
            settings,
        }
    }

    /// Returns the scheduler-assigned job id. Does not touch `job`; the caller records the id.
    #[tracing::instrument(name = "submit", level = "debug", skip_all, fields(job = %job.name))]
    pub async fn submit(&self, job: &Job) -> AppResult<String> {
        self.make_working_directory(job).await?;
        self.transfer
            .upload(&job.input_files, &job.working_directory)
            .await?;

        let script = job.script_file_name();
        tracing::info!("Submitting remote job from {script}");
        let submit_command = templates::render(
            &self.settings.submit_command,
            &BTreeMap::from([("job_name", job.name.as_str()), ("job_file", script.as_str())]),
        )?;
        tracing::info!("Submit command = `{submit_command}`");
        let job_submit = templates::render(
            &self.settings.remote_job_submit,
            &BTreeMap::from([
                ("remote_wd", job.working_directory.as_str()),
                ("submit_command", submit_command.as_str()),
            ]),
        )?;

        let capture = self.executor.execute_checked(&job_submit).await?;
        let job_id = capture.stdout_text().trim().to_string();
        tracing::info!("Submitted job ID: {job_id}");
        if job_id.is_empty() {
            let stderr = capture.stderr_text();
            tracing::error!("Error submitting job (job_id = {job_id}): {}", stderr.trim());
            return Err(AppError::with_message(
                AppErrorKind::Submission,
                codes::SUBMISSION_ERROR,
                "scheduler accepted the submit command but printed no job id",
            )
            .with_context(stderr.trim().to_string()));
        }
        Ok(job_id)
    }

    async fn make_working_directory(&self, job: &Job) -> AppResult<()> {
        let command = templates::render(
            &self.settings.remote_wd_setup,
            &BTreeMap::from([("remote_wd", job.working_directory.as_str())]),
        )?;
        self.executor.execute_checked(&command).await?;
        Ok(())
    }
}
