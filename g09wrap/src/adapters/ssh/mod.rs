// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Remote shell and copy through the system `ssh` and `scp` clients.
//!
//! Authentication, known hosts and multiplexing are left to the user's OpenSSH setup.

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::app::errors::AppResult;
use crate::app::ports::{ExecCapture, FileTransferPort, RemoteExecPort};
use crate::app::types::RemoteHost;

mod error;

use error::ProcessError;

pub const DEFAULT_SSH_PROGRAM: &str = "ssh";
pub const DEFAULT_SCP_PROGRAM: &str = "scp";

#[derive(Clone, Debug)]
pub struct SshAdapter {
    ssh_program: String,
    scp_program: String,
}

impl SshAdapter {
    pub fn with_defaults() -> Self {
        Self::with_programs(DEFAULT_SSH_PROGRAM, DEFAULT_SCP_PROGRAM)
    }

    pub fn with_programs(ssh_program: impl Into<String>, scp_program: impl Into<String>) -> Self {
        Self {
            ssh_program: ssh_program.into(),
            scp_program: scp_program.into(),
        }
    }
}

fn ssh_args(host: &RemoteHost, command: &str) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(port) = host.port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    push_common_args(&mut args, host);
    args.push(host.address.clone());
    args.push(command.to_string());
    args
}

fn scp_args(host: &RemoteHost, sources: &[String], destination: &str) -> Vec<String> {
    let mut args = Vec::new();
    // scp spells the port flag in upper case
    if let Some(port) = host.port {
        args.push("-P".to_string());
        args.push(port.to_string());
    }
    push_common_args(&mut args, host);
    args.extend(sources.iter().cloned());
    args.push(destination.to_string());
    args
}

fn push_common_args(args: &mut Vec<String>, host: &RemoteHost) {
    if let Some(identity) = &host.identity_file {
        args.push("-i".to_string());
        args.push(identity.to_string_lossy().into_owned());
    }
    for option in &host.options {
        args.push("-o".to_string());
        args.push(option.clone());
    }
}

async fn run_captured(program: &str, args: &[String]) -> Result<ExecCapture, ProcessError> {
    tracing::debug!("running {program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ProcessError::Launch {
            program: program.to_string(),
            source,
        })?;
    let exit_code = exit_code(&output.status).ok_or_else(|| ProcessError::NoStatus {
        program: program.to_string(),
    })?;
    Ok(ExecCapture {
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code,
    })
}

fn exit_code(status: &ExitStatus) -> Option<i32> {
    status.code().or_else(|| signal_exit_code(status))
}

// Shell convention: a child killed by signal N reports 128 + N.
#[cfg(unix)]
fn signal_exit_code(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: &ExitStatus) -> Option<i32> {
    None
}

#[async_trait]
impl RemoteExecPort for SshAdapter {
    #[tracing::instrument(
        name = "ssh",
        level = "debug",
        skip(self, host, command),
        fields(op = "exec_capture", host = %host)
    )]
    async fn exec_capture(&self, host: &RemoteHost, command: &str) -> AppResult<ExecCapture> {
        Ok(run_captured(&self.ssh_program, &ssh_args(host, command)).await?)
    }
}

#[async_trait]
impl FileTransferPort for SshAdapter {
    #[tracing::instrument(
        name = "scp",
        level = "debug",
        skip(self, host, sources, destination),
        fields(op = "copy", host = %host, files = sources.len())
    )]
    async fn copy(
        &self,
        host: &RemoteHost,
        sources: &[String],
        destination: &str,
    ) -> AppResult<ExecCapture> {
        Ok(run_captured(&self.scp_program, &scp_args(host, sources, destination)).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::app::errors::AppErrorKind;

    fn configured_host() -> RemoteHost {
        RemoteHost {
            address: "alice@cluster".to_string(),
            port: Some(2222),
            identity_file: Some(PathBuf::from("/home/alice/.ssh/id_ed25519")),
            options: vec!["BatchMode=yes".to_string()],
        }
    }

    #[test]
    fn plain_host_passes_only_address_and_command() {
        assert_eq!(
            ssh_args(&RemoteHost::new("localhost"), "hostname"),
            vec!["localhost".to_string(), "hostname".to_string()]
        );
    }

    #[test]
    fn ssh_args_carry_port_identity_and_options() {
        assert_eq!(
            ssh_args(&configured_host(), "qstat -f 1"),
            vec![
                "-p",
                "2222",
                "-i",
                "/home/alice/.ssh/id_ed25519",
                "-o",
                "BatchMode=yes",
                "alice@cluster",
                "qstat -f 1",
            ]
        );
    }

    #[test]
    fn scp_args_use_upper_case_port_and_keep_source_order() {
        let sources = vec!["/work/job.inp".to_string(), "/work/job.jobfile".to_string()];
        assert_eq!(
            scp_args(&configured_host(), &sources, "alice@cluster:/scratch/job"),
            vec![
                "-P",
                "2222",
                "-i",
                "/home/alice/.ssh/id_ed25519",
                "-o",
                "BatchMode=yes",
                "/work/job.inp",
                "/work/job.jobfile",
                "alice@cluster:/scratch/job",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_exit_status() {
        let adapter = SshAdapter::with_programs("echo", "false");
        let capture = adapter
            .exec_capture(&RemoteHost::new("localhost"), "hostname")
            .await
            .unwrap();
        assert_eq!(capture.exit_code, 0);
        assert_eq!(capture.stdout_text(), "localhost hostname\n");

        let capture = adapter
            .copy(&RemoteHost::new("localhost"), &["a".to_string()], "localhost:/tmp")
            .await
            .unwrap();
        assert_eq!(capture.exit_code, 1);
    }

    #[tokio::test]
    async fn missing_program_is_local_error() {
        let adapter = SshAdapter::with_programs("g09wrap-no-such-ssh", "g09wrap-no-such-scp");
        let err = adapter
            .exec_capture(&RemoteHost::new("localhost"), "hostname")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AppErrorKind::Local);
        assert!(err.message().contains("failed to launch g09wrap-no-such-ssh"));
    }
}
