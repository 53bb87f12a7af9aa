// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::ports::ExecCapture;
use crate::app::types::RemoteHost;

#[async_trait]
/// Remote copy boundary.
/// A single bidirectional primitive: remote endpoints are written as `host:path`, so
/// uploads and downloads only differ in which side carries the host prefix.
pub trait FileTransferPort: Send + Sync {
    async fn copy(
        &self,
        host: &RemoteHost,
        sources: &[String],
        destination: &str,
    ) -> AppResult<ExecCapture>;
}
