// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::app::errors::{AppResult, local_error};
use crate::app::ports::LocalFilesystemPort;

#[derive(Clone, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalFilesystemPort for LocalFilesystem {
    #[tracing::instrument(name = "fs", level = "debug", skip(self), fields(op = "current_dir"))]
    async fn current_dir(&self) -> AppResult<PathBuf> {
        std::env::current_dir()
            .map_err(|err| local_error(format!("failed to resolve current directory: {err}")))
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path), fields(op = "read_to_string", path = %path.display()))]
    async fn read_to_string(&self, path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| local_error(format!("failed to read {}: {err}", path.display())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path, contents), fields(op = "write_string", path = %path.display()))]
    async fn write_string(&self, path: &Path, contents: &str) -> AppResult<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|err| local_error(format!("failed to write {}: {err}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::AppErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_then_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.jobfile");
        let fs = LocalFilesystem::new();
        fs.write_string(&path, "#!/bin/bash\ng09 job.inp\n")
            .await
            .unwrap();
        assert_eq!(
            fs.read_to_string(&path).await.unwrap(),
            "#!/bin/bash\ng09 job.inp\n"
        );
    }

    #[tokio::test]
    async fn missing_file_is_local_error() {
        let dir = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .read_to_string(&dir.path().join("remote.log"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AppErrorKind::Local);
        assert!(err.message().contains("remote.log"));
    }
}
