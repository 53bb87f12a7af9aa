// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::lifecycle::RemoteExecutor;

/// Checks the host with a trivial command. Never fails; callers decide what `false` means.
#[derive(Clone)]
pub struct ConnectionValidator {
    executor: RemoteExecutor,
    test_command: String,
}

impl ConnectionValidator {
    pub fn new(executor: RemoteExecutor, test_command: impl Into<String>) -> Self {
        Self {
            executor,
            test_command: test_command.into(),
        }
    }

    /// True only when the test command exits zero and prints something. Some transports report
    /// success with no output on a broken connection, so empty stdout counts as unreachable.
    pub async fn validate(&self) -> bool {
        let host = self.executor.host().clone();
        tracing::debug!("Testing connection to remote host '{host}'");
        let capture = match self.executor.execute(&self.test_command).await {
            Ok(capture) => capture,
            Err(err) => {
                tracing::error!("Error connecting to host {host}: {err}");
                return false;
            }
        };
        let stdout = capture.stdout_text();
        let result = stdout.trim();
        if !capture.success() || result.is_empty() {
            tracing::error!(
                "Error connecting to host {host} (exit status {}): {}",
                capture.exit_code,
                capture.stderr_text().trim()
            );
            return false;
        }
        tracing::debug!(
            "Command '{}' on {host} yielded '{result}'",
            self.test_command
        );
        tracing::debug!("Connection successful");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::errors::{AppResult, local_error};
    use crate::app::lifecycle::testing::{SequencedRemoteExec, capture, test_host};
    use crate::app::ports::ExecCapture;

    fn validator(script: Vec<(String, AppResult<ExecCapture>)>) -> ConnectionValidator {
        let transport = Arc::new(SequencedRemoteExec::new(script));
        ConnectionValidator::new(RemoteExecutor::new(transport, test_host()), "hostname")
    }

    #[tokio::test]
    async fn reachable_host_validates() {
        let validator = validator(vec![("hostname".to_string(), capture(0, "login01\n", ""))]);
        assert!(validator.validate().await);
    }

    #[tokio::test]
    async fn empty_stdout_with_zero_exit_is_unreachable() {
        let validator = validator(vec![("hostname".to_string(), capture(0, "  \n", ""))]);
        assert!(!validator.validate().await);
    }

    #[tokio::test]
    async fn nonzero_exit_is_unreachable() {
        let validator = validator(vec![(
            "hostname".to_string(),
            capture(255, "", "ssh: connect to host localhost port 22: Connection refused"),
        )]);
        assert!(!validator.validate().await);
    }

    #[tokio::test]
    async fn transport_launch_failure_is_unreachable() {
        let validator = validator(vec![(
            "hostname".to_string(),
            Err(local_error("failed to launch ssh: No such file or directory")),
        )]);
        assert!(!validator.validate().await);
    }
}
