// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes, invalid_argument};
use crate::app::lifecycle::{
    ConnectionValidator, FileTransferAgent, JobSubmitter, LifecycleSettings, RemoteExecutor,
    ResultRetriever, StatusPoller, job_name_from_input, job_script_name, join_remote,
};
use crate::app::ports::{ClockPort, FileTransferPort, LocalFilesystemPort, RemoteExecPort};
use crate::app::services::templates::{self, JobScriptParams};
use crate::app::types::{Job, JobStatus, OutputFile};

/// What a successful run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub name: String,
    pub id: String,
    pub status: JobStatus,
    pub elapsed: time::Duration,
}

/// Drives one job through connectivity check, submit, poll and retrieve.
pub struct JobLifecycle {
    settings: Arc<LifecycleSettings>,
    validator: ConnectionValidator,
    submitter: JobSubmitter,
    poller: StatusPoller,
    retriever: ResultRetriever,
    local_fs: Arc<dyn LocalFilesystemPort>,
    clock: Arc<dyn ClockPort>,
}

impl JobLifecycle {
    pub fn new(
        settings: LifecycleSettings,
        remote_exec: Arc<dyn RemoteExecPort>,
        file_transfer: Arc<dyn FileTransferPort>,
        local_fs: Arc<dyn LocalFilesystemPort>,
        clock: Arc<dyn ClockPort>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let settings = Arc::new(settings);
        let executor = RemoteExecutor::new(remote_exec, settings.host.clone());
        let transfer = FileTransferAgent::new(file_transfer, settings.host.clone());
        let validator =
            ConnectionValidator::new(executor.clone(), settings.remote_test_command.clone());
        let submitter = JobSubmitter::new(executor.clone(), transfer.clone(), settings.clone());
        let poller = StatusPoller::new(
            executor,
            validator.clone(),
            clock.clone(),
            settings.clone(),
            cancel,
        );
        let retriever = ResultRetriever::new(transfer, local_fs.clone());
        Self {
            settings,
            validator,
            submitter,
            poller,
            retriever,
            local_fs,
            clock,
        }
    }

    /// Builds the job from its input file: writes the rendered script next to the input's
    /// working copy and performs the run's connectivity check.
    pub async fn prepare(&self, input: &Path, attachments: &[PathBuf]) -> AppResult<Job> {
        let name = job_name_from_input(input)?;
        let filename = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| invalid_argument(format!("'{}' is not a file", input.display())))?;
        let cwd = self.local_fs.current_dir().await?;

        let working_directory = templates::render(
            &self.settings.remote_wd,
            &BTreeMap::from([("job_name", name.as_str())]),
        )?;
        let script = templates::render_job_script(
            &self.settings.job_script_template,
            &JobScriptParams {
                job_name: &name,
                remote_wd: &working_directory,
                executable: &self.settings.executable,
                filename: &filename,
                resources: &self.settings.resources,
            },
        )?;
        let output_files = self.resolve_outputs(&name, &working_directory, &cwd)?;

        let script_path = cwd.join(job_script_name(&name));
        self.local_fs.write_string(&script_path, &script).await?;
        tracing::debug!("wrote job script {}", script_path.display());

        let mut input_files = vec![cwd.join(input), script_path.clone()];
        input_files.extend(attachments.iter().map(|path| cwd.join(path)));

        let connection_valid = self.validator.validate().await;
        Ok(Job {
            name,
            id: None,
            status: JobStatus::Unset,
            working_directory,
            script_path,
            input_files,
            output_files,
            connection_valid,
        })
    }

    /// Submits, polls and retrieves. Any failure ends the run; nothing is retried.
    /// `job` keeps whatever id and status were reached when the run stops.
    pub async fn run(&mut self, job: &mut Job) -> AppResult<JobOutcome> {
        if !job.connection_valid {
            return Err(AppError::with_message(
                AppErrorKind::Connectivity,
                codes::CONNECTION_FAILURE,
                format!("remote host {} is not reachable", self.settings.host),
            ));
        }
        let started_at = self.clock.now_utc();

        let job_id = self.submitter.submit(&job).await?;
        job.id = Some(job_id.clone());

        self.poller.run(job).await?;
        if !job.connection_valid {
            return Err(AppError::with_message(
                AppErrorKind::Connectivity,
                codes::CONNECTION_FAILURE,
                format!(
                    "lost connection to {} while waiting for job {job_id}",
                    self.settings.host
                ),
            ));
        }
        if let JobStatus::Errored(state) = &job.status {
            tracing::warn!(
                "job {job_id} finished in error state '{state}'; outputs may be incomplete"
            );
        }

        self.retriever.retrieve(job).await?;
        Ok(JobOutcome {
            name: job.name.clone(),
            id: job_id,
            status: job.status.clone(),
            elapsed: self.clock.now_utc() - started_at,
        })
    }

    pub async fn execute(&mut self, input: &Path, attachments: &[PathBuf]) -> AppResult<JobOutcome> {
        let mut job = self.prepare(input, attachments).await?;
        self.run(&mut job).await
    }

    fn resolve_outputs(
        &self,
        job_name: &str,
        working_directory: &str,
        cwd: &Path,
    ) -> AppResult<Vec<OutputFile>> {
        self.settings
            .outputs
            .iter()
            .map(|output| {
                let remote = templates::render(
                    &output.remote,
                    &BTreeMap::from([("job_name", job_name)]),
                )?;
                let local = match &output.local {
                    Some(local) => cwd.join(local),
                    None => {
                        let file_name = Path::new(&remote).file_name().ok_or_else(|| {
                            invalid_argument(format!("output '{remote}' has no file name"))
                        })?;
                        cwd.join(file_name)
                    }
                };
                Ok(OutputFile {
                    remote_path: join_remote(working_directory, &remote),
                    local_path: local,
                    echo: output.echo,
                })
            })
            .collect()
    }
}
