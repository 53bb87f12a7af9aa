// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::{ExecCapture, FileTransferPort};
use crate::app::types::RemoteHost;

/// Moves files between this machine and the remote host. Never retries.
#[derive(Clone)]
pub struct FileTransferAgent {
    transport: Arc<dyn FileTransferPort>,
    host: RemoteHost,
}

impl FileTransferAgent {
    pub fn new(transport: Arc<dyn FileTransferPort>, host: RemoteHost) -> Self {
        Self { transport, host }
    }

    /// Copies all `local_paths` into `remote_dir` as one batch.
    pub async fn upload(&self, local_paths: &[PathBuf], remote_dir: &str) -> AppResult<()> {
        let sources: Vec<String> = local_paths
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        let destination = self.host.remote_path(remote_dir);
        tracing::debug!("uploading {sources:?} to {destination}");
        let capture = self
            .transport
            .copy(&self.host, &sources, &destination)
            .await?;
        check_copy(
            &capture,
            &format!("Copying files {sources:?} to remote host"),
        )
    }

    /// Copies remote paths (without the `host:` prefix) to `local_destination`,
    /// which may be a file or a directory.
    pub async fn download(&self, remote_paths: &[String], local_destination: &Path) -> AppResult<()> {
        let sources: Vec<String> = remote_paths
            .iter()
            .map(|path| self.host.remote_path(path))
            .collect();
        let destination = local_destination.to_string_lossy().into_owned();
        tracing::debug!("downloading {sources:?} to {destination}");
        let capture = self
            .transport
            .copy(&self.host, &sources, &destination)
            .await?;
        check_copy(
            &capture,
            &format!("Copying files {sources:?} from remote host"),
        )
    }
}

fn check_copy(capture: &ExecCapture, what: &str) -> AppResult<()> {
    if capture.success() {
        return Ok(());
    }
    let stderr = capture.stderr_text();
    tracing::error!("{what} exit status = {}", capture.exit_code);
    tracing::error!("stderr:\n{stderr}");
    Err(AppError::with_message(
        AppErrorKind::Transfer,
        codes::TRANSFER_ERROR,
        format!(
            "{what} failed with exit code {}: {}",
            capture.exit_code,
            stderr.trim()
        ),
    )
    .with_exit_code(capture.exit_code))
}
