// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Connection parameters for the remote compute host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost {
    /// `host` or `user@host`, exactly as handed to ssh/scp.
    pub address: String,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    /// Extra `-o` options passed to both ssh and scp.
    pub options: Vec<String>,
}

impl RemoteHost {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: None,
            identity_file: None,
            options: Vec::new(),
        }
    }

    /// `host:path` form understood by scp.
    pub fn remote_path(&self, path: &str) -> String {
        format!("{}:{}", self.address, path)
    }
}

impl fmt::Display for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.address, port),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Scheduler state tokens grouped by how the poller treats them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStates {
    pub waiting: BTreeSet<String>,
    pub complete: BTreeSet<String>,
    /// Subset of `complete` that signals a failed job.
    pub error: BTreeSet<String>,
}

impl SchedulerStates {
    pub fn classify(&self, token: &str) -> JobStatus {
        let token = token.trim();
        if token.is_empty() {
            return JobStatus::Unknown;
        }
        if self.complete.contains(token) {
            if self.error.contains(token) {
                JobStatus::Errored(token.to_string())
            } else {
                JobStatus::Complete(token.to_string())
            }
        } else if self.waiting.contains(token) {
            JobStatus::Waiting(token.to_string())
        } else {
            JobStatus::Unrecognized(token.to_string())
        }
    }
}

impl Default for SchedulerStates {
    fn default() -> Self {
        Self {
            waiting: ["Q", "R"].into_iter().map(str::to_string).collect(),
            complete: ["C", "E"].into_iter().map(str::to_string).collect(),
            error: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Unset,
    Waiting(String),
    Complete(String),
    Errored(String),
    /// Non-empty token that is neither waiting nor complete; polling continues.
    Unrecognized(String),
    /// The status query printed nothing.
    Unknown,
    ConnectionLost,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Complete(_) | JobStatus::Errored(_) | JobStatus::ConnectionLost
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Unset => write!(f, "unset"),
            JobStatus::Waiting(token)
            | JobStatus::Complete(token)
            | JobStatus::Errored(token)
            | JobStatus::Unrecognized(token) => write!(f, "{token}"),
            JobStatus::Unknown => write!(f, "Unknown"),
            JobStatus::ConnectionLost => write!(f, "ConnectionLost"),
        }
    }
}

/// A file the job promises to leave in its remote working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub remote_path: String,
    pub local_path: PathBuf,
    /// Copy the downloaded contents into the lifecycle log.
    pub echo: bool,
}

/// One remote job, from input file to retrieved outputs.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub id: Option<String>,
    pub status: JobStatus,
    pub working_directory: String,
    /// Local path of the rendered batch script; also listed in `input_files`.
    pub script_path: PathBuf,
    pub input_files: Vec<PathBuf>,
    pub output_files: Vec<OutputFile>,
    pub connection_valid: bool,
}

impl Job {
    /// Still worth polling: no terminal state seen and the host has not dropped out.
    pub fn is_running(&self) -> bool {
        self.connection_valid && !self.status.is_terminal()
    }

    /// Clears the connection flag. There is no way back to `true`.
    pub fn mark_connection_lost(&mut self) {
        self.connection_valid = false;
    }

    pub fn script_file_name(&self) -> String {
        self.script_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            name: "job".to_string(),
            id: None,
            status: JobStatus::Unset,
            working_directory: "/scratch/alice/job".to_string(),
            script_path: PathBuf::from("job.jobfile"),
            input_files: vec![PathBuf::from("job.inp"), PathBuf::from("job.jobfile")],
            output_files: Vec::new(),
            connection_valid: true,
        }
    }

    #[test]
    fn classify_uses_configured_sets() {
        let states = SchedulerStates::default();
        assert_eq!(states.classify("Q\n"), JobStatus::Waiting("Q".to_string()));
        assert_eq!(states.classify("C"), JobStatus::Complete("C".to_string()));
        assert_eq!(states.classify("  "), JobStatus::Unknown);
        assert_eq!(
            states.classify("H"),
            JobStatus::Unrecognized("H".to_string())
        );
    }

    #[test]
    fn classify_marks_error_tokens_as_errored() {
        let mut states = SchedulerStates::default();
        states.error.insert("E".to_string());
        assert_eq!(states.classify("E"), JobStatus::Errored("E".to_string()));
        assert!(states.classify("E").is_terminal());
    }

    #[test]
    fn job_stops_running_once_connection_is_lost() {
        let mut job = sample_job();
        assert!(job.is_running());
        job.status = JobStatus::Unknown;
        assert!(job.is_running());
        job.mark_connection_lost();
        assert!(!job.is_running());
    }

    #[test]
    fn job_stops_running_on_terminal_status() {
        let mut job = sample_job();
        job.status = JobStatus::Complete("C".to_string());
        assert!(!job.is_running());
    }

    #[test]
    fn remote_host_formats_scp_paths() {
        let host = RemoteHost::new("alice@cluster");
        assert_eq!(host.remote_path("/scratch/job"), "alice@cluster:/scratch/job");
        assert_eq!(host.to_string(), "alice@cluster");

        let mut host = host;
        host.port = Some(2222);
        assert_eq!(host.to_string(), "alice@cluster:2222");
    }
}
