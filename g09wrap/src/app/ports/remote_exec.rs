// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::RemoteHost;

/// Everything a finished child process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ExecCapture {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[async_trait]
/// Remote shell boundary.
/// Runs one command to completion and reports its exit code and both output streams.
/// An `Err` means the transport could not be launched at all; a remote failure is an
/// `Ok` capture with a nonzero exit code.
pub trait RemoteExecPort: Send + Sync {
    async fn exec_capture(&self, host: &RemoteHost, command: &str) -> AppResult<ExecCapture>;
}
