// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

// Scripted ports shared by the lifecycle tests.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::app::errors::{AppResult, local_error};
use crate::app::ports::{
    ClockPort, ExecCapture, FileTransferPort, LocalFilesystemPort, RemoteExecPort,
};
use crate::app::types::RemoteHost;

pub fn test_host() -> RemoteHost {
    RemoteHost::new("localhost")
}

pub fn capture(exit_code: i32, stdout: &str, stderr: &str) -> AppResult<ExecCapture> {
    Ok(ExecCapture {
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
        exit_code,
    })
}

/// Replays canned captures and checks each command against the expected text.
pub struct SequencedRemoteExec {
    captures: Mutex<VecDeque<(String, AppResult<ExecCapture>)>>,
    seen: Mutex<Vec<String>>,
}

impl SequencedRemoteExec {
    pub fn new(captures: Vec<(String, AppResult<ExecCapture>)>) -> Self {
        Self {
            captures: Mutex::new(VecDeque::from(captures)),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.seen.lock().expect("seen lock").clone()
    }

    pub fn assert_drained(&self) {
        let remaining = self.captures.lock().expect("captures lock");
        assert!(
            remaining.is_empty(),
            "unused scripted commands: {:?}",
            remaining.iter().map(|(cmd, _)| cmd).collect::<Vec<_>>()
        );
    }
}

#[async_trait]
impl RemoteExecPort for SequencedRemoteExec {
    async fn exec_capture(&self, _host: &RemoteHost, command: &str) -> AppResult<ExecCapture> {
        self.seen.lock().expect("seen lock").push(command.to_string());
        let mut captures = self.captures.lock().expect("captures lock");
        let Some((expected, result)) = captures.pop_front() else {
            panic!("unexpected command: {command}");
        };
        assert_eq!(command, expected);
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCall {
    pub sources: Vec<String>,
    pub destination: String,
}

/// Records copy calls; answers from the script, then with success once it runs out.
#[derive(Default)]
pub struct ScriptedTransfer {
    results: Mutex<VecDeque<AppResult<ExecCapture>>>,
    calls: Mutex<Vec<CopyCall>>,
}

impl ScriptedTransfer {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<AppResult<ExecCapture>>) -> Self {
        Self {
            results: Mutex::new(VecDeque::from(results)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CopyCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl FileTransferPort for ScriptedTransfer {
    async fn copy(
        &self,
        _host: &RemoteHost,
        sources: &[String],
        destination: &str,
    ) -> AppResult<ExecCapture> {
        self.calls.lock().expect("calls lock").push(CopyCall {
            sources: sources.to_vec(),
            destination: destination.to_string(),
        });
        self.results
            .lock()
            .expect("results lock")
            .pop_front()
            .unwrap_or_else(|| capture(0, "", ""))
    }
}

/// Clock whose sleeps return immediately and advance `now`.
pub struct FakeClock {
    now: Mutex<OffsetDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(datetime!(2026-03-01 12:00 UTC)),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps lock").clone()
    }
}

#[async_trait]
impl ClockPort for FakeClock {
    fn now_utc(&self) -> OffsetDateTime {
        *self.now.lock().expect("now lock")
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeps lock").push(duration);
        let mut now = self.now.lock().expect("now lock");
        *now += duration;
    }
}

/// In-memory files rooted at a fixed working directory.
pub struct MemoryFs {
    cwd: PathBuf,
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFs {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files
            .lock()
            .expect("files lock")
            .insert(path.into(), contents.to_string());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().expect("files lock").get(path).cloned()
    }
}

#[async_trait]
impl LocalFilesystemPort for MemoryFs {
    async fn current_dir(&self) -> AppResult<PathBuf> {
        Ok(self.cwd.clone())
    }

    async fn read_to_string(&self, path: &Path) -> AppResult<String> {
        self.get(path)
            .ok_or_else(|| local_error(format!("failed to read {}", path.display())))
    }

    async fn write_string(&self, path: &Path, contents: &str) -> AppResult<()> {
        self.insert(path, contents);
        Ok(())
    }
}
