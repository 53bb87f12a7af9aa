// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::{ExecCapture, RemoteExecPort};
use crate::app::types::RemoteHost;

/// Runs commands on the configured host. Never retries.
#[derive(Clone)]
pub struct RemoteExecutor {
    transport: Arc<dyn RemoteExecPort>,
    host: RemoteHost,
}

impl RemoteExecutor {
    pub fn new(transport: Arc<dyn RemoteExecPort>, host: RemoteHost) -> Self {
        Self { transport, host }
    }

    pub fn host(&self) -> &RemoteHost {
        &self.host
    }

    /// Returns the full capture, whatever the exit code.
    pub async fn execute(&self, command: &str) -> AppResult<ExecCapture> {
        tracing::debug!(host = %self.host, "remote command `{command}`");
        self.transport.exec_capture(&self.host, command).await
    }

    /// Like [`execute`](Self::execute) but a nonzero exit becomes a `RemoteCommand` error
    /// carrying the remote exit code.
    pub async fn execute_checked(&self, command: &str) -> AppResult<ExecCapture> {
        let capture = self.execute(command).await?;
        if capture.success() {
            return Ok(capture);
        }
        let stderr = capture.stderr_text();
        tracing::error!(
            "Remote command '{command}' exit status = {}",
            capture.exit_code
        );
        tracing::error!("stderr:\n{stderr}");
        Err(AppError::with_message(
            AppErrorKind::RemoteCommand,
            codes::REMOTE_ERROR,
            format!(
                "remote command '{command}' failed with exit code {}: {}",
                capture.exit_code,
                stderr.trim()
            ),
        )
        .with_exit_code(capture.exit_code))
    }
}
