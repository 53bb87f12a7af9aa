// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Remote job lifecycle: connectivity check, staging, submission, polling, retrieval.
//!
//! Every component receives the immutable [`LifecycleSettings`] and talks to the outside
//! world only through the ports in [`crate::app::ports`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::errors::{AppResult, invalid_argument};
use crate::app::services::templates::{DEFAULT_JOB_SCRIPT, ResourceRequest};
use crate::app::types::{RemoteHost, SchedulerStates};

mod connection;
mod controller;
mod executor;
mod poll;
mod retrieve;
mod submit;
mod transfer;

#[cfg(test)]
mod testing;

pub use connection::ConnectionValidator;
pub use controller::{JobLifecycle, JobOutcome};
pub use executor::RemoteExecutor;
pub use poll::StatusPoller;
pub use retrieve::ResultRetriever;
pub use submit::JobSubmitter;
pub use transfer::FileTransferAgent;

pub const DEFAULT_TEST_COMMAND: &str = "hostname";
pub const DEFAULT_REMOTE_WD: &str = "/scratch/$USER/{{ job_name }}";
pub const DEFAULT_REMOTE_WD_SETUP: &str = "mkdir -p {{ remote_wd }}";
pub const DEFAULT_REMOTE_JOB_SUBMIT: &str = "cd {{ remote_wd }} && {{ submit_command }}";
pub const DEFAULT_SUBMIT_COMMAND: &str = "qsub -N {{ job_name }} {{ job_file }}";
pub const DEFAULT_STATUS_COMMAND: &str =
    "qstat -f {{ job_id }} | awk '/job_state/ {print $NF}' ";
pub const DEFAULT_CHECK_STATUS_PERIOD: Duration = Duration::from_secs(30);
pub const DEFAULT_EXECUTABLE: &str = "g09";
/// ssh/scp options used when the config file sets none; a password prompt would hang the run.
pub const DEFAULT_SSH_OPTIONS: &[&str] = &["BatchMode=yes"];
const JOB_SCRIPT_SUFFIX: &str = "jobfile";

/// Declared job artifact before the job name is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    /// Path relative to the remote working directory (or absolute); may use `{{ job_name }}`.
    pub remote: String,
    /// Local file name; defaults to the remote file name in the current directory.
    pub local: Option<PathBuf>,
    pub echo: bool,
}

pub fn default_outputs() -> Vec<OutputTemplate> {
    vec![
        OutputTemplate {
            remote: "{{ job_name }}.log".to_string(),
            local: Some(PathBuf::from("remote.log")),
            echo: true,
        },
        OutputTemplate {
            remote: "Test.FChk".to_string(),
            local: None,
            echo: false,
        },
    ]
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub host: RemoteHost,
    pub remote_test_command: String,
    pub remote_wd: String,
    pub remote_wd_setup: String,
    pub remote_job_submit: String,
    pub submit_command: String,
    pub status_command: String,
    pub check_status_period: Duration,
    pub states: SchedulerStates,
    /// Consecutive empty status replies tolerated before the job is declared errored.
    pub max_unknown_polls: Option<u32>,
    pub poll_timeout: Option<Duration>,
    pub recheck_connection_on_unknown: bool,
    pub executable: String,
    pub job_script_template: String,
    pub resources: ResourceRequest,
    pub outputs: Vec<OutputTemplate>,
}

impl LifecycleSettings {
    pub fn new(host: RemoteHost) -> Self {
        Self {
            host,
            remote_test_command: DEFAULT_TEST_COMMAND.to_string(),
            remote_wd: DEFAULT_REMOTE_WD.to_string(),
            remote_wd_setup: DEFAULT_REMOTE_WD_SETUP.to_string(),
            remote_job_submit: DEFAULT_REMOTE_JOB_SUBMIT.to_string(),
            submit_command: DEFAULT_SUBMIT_COMMAND.to_string(),
            status_command: DEFAULT_STATUS_COMMAND.to_string(),
            check_status_period: DEFAULT_CHECK_STATUS_PERIOD,
            states: SchedulerStates::default(),
            max_unknown_polls: None,
            poll_timeout: None,
            recheck_connection_on_unknown: false,
            executable: DEFAULT_EXECUTABLE.to_string(),
            job_script_template: DEFAULT_JOB_SCRIPT.to_string(),
            resources: ResourceRequest::default(),
            outputs: default_outputs(),
        }
    }
}

/// Job name for an input file: the file name without its final extension.
pub fn job_name_from_input(input: &Path) -> AppResult<String> {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
        .ok_or_else(|| {
            invalid_argument(format!(
                "cannot derive a job name from '{}'",
                input.display()
            ))
        })
}

fn job_script_name(job_name: &str) -> String {
    format!("{job_name}.{JOB_SCRIPT_SUFFIX}")
}

fn join_remote(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}
