// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

use crate::app::errors::AppResult;
use crate::app::lifecycle::FileTransferAgent;
use crate::app::ports::LocalFilesystemPort;
use crate::app::types::Job;

/// Downloads the job's declared outputs, in order. A missing output is fatal.
#[derive(Clone)]
pub struct ResultRetriever {
    transfer: FileTransferAgent,
    local_fs: Arc<dyn LocalFilesystemPort>,
}

impl ResultRetriever {
    pub fn new(transfer: FileTransferAgent, local_fs: Arc<dyn LocalFilesystemPort>) -> Self {
        Self { transfer, local_fs }
    }

    #[tracing::instrument(name = "retrieve", level = "debug", skip_all, fields(job = %job.name))]
    pub async fn retrieve(&self, job: &Job) -> AppResult<()> {
        for output in &job.output_files {
            tracing::info!(
                "Downloading {} to {}",
                output.remote_path,
                output.local_path.display()
            );
            self.transfer
                .download(std::slice::from_ref(&output.remote_path), &output.local_path)
                .await?;
            if output.echo {
                let contents = self.local_fs.read_to_string(&output.local_path).await?;
                tracing::info!("Log contents:\n{contents}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::app::errors::AppErrorKind;
    use crate::app::lifecycle::testing::{MemoryFs, ScriptedTransfer, capture, test_host};
    use crate::app::types::{JobStatus, OutputFile};

    fn finished_job() -> Job {
        Job {
            name: "job".to_string(),
            id: Some("77.pbs".to_string()),
            status: JobStatus::Complete("C".to_string()),
            working_directory: "/scratch/alice/job".to_string(),
            script_path: PathBuf::from("/work/job.jobfile"),
            input_files: Vec::new(),
            output_files: vec![
                OutputFile {
                    remote_path: "/scratch/alice/job/job.log".to_string(),
                    local_path: PathBuf::from("/work/remote.log"),
                    echo: true,
                },
                OutputFile {
                    remote_path: "/scratch/alice/job/Test.FChk".to_string(),
                    local_path: PathBuf::from("/work/Test.FChk"),
                    echo: false,
                },
            ],
            connection_valid: true,
        }
    }

    #[tokio::test]
    async fn downloads_outputs_in_declared_order() {
        let transfer = Arc::new(ScriptedTransfer::succeeding());
        let fs = Arc::new(MemoryFs::new("/work"));
        fs.insert("/work/remote.log", " Normal termination of Gaussian 09\n");
        let retriever = ResultRetriever::new(
            FileTransferAgent::new(transfer.clone(), test_host()),
            fs,
        );
        retriever.retrieve(&finished_job()).await.expect("retrieve");

        let calls = transfer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].sources,
            vec!["localhost:/scratch/alice/job/job.log".to_string()]
        );
        assert_eq!(calls[0].destination, "/work/remote.log");
        assert_eq!(
            calls[1].sources,
            vec!["localhost:/scratch/alice/job/Test.FChk".to_string()]
        );
        assert_eq!(calls[1].destination, "/work/Test.FChk");
    }

    #[tokio::test]
    async fn missing_output_is_fatal_and_stops_retrieval() {
        let transfer = Arc::new(ScriptedTransfer::with_results(vec![capture(
            1,
            "",
            "scp: /scratch/alice/job/job.log: No such file or directory",
        )]));
        let retriever = ResultRetriever::new(
            FileTransferAgent::new(transfer.clone(), test_host()),
            Arc::new(MemoryFs::new("/work")),
        );
        let err = retriever
            .retrieve(&finished_job())
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), AppErrorKind::Transfer);
        assert_eq!(transfer.calls().len(), 1);
    }
}
