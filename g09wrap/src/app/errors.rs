// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;

pub mod codes {
    pub const CONNECTION_FAILURE: &str = "connection_failure";
    pub const REMOTE_ERROR: &str = "remote_error";
    pub const TRANSFER_ERROR: &str = "transfer_error";
    pub const SUBMISSION_ERROR: &str = "submission_error";
    pub const INVALID_ARGUMENT: &str = "invalid_argument";
    pub const INVALID_CONFIG: &str = "invalid_config";
    pub const TEMPLATE_ERROR: &str = "template_error";
    pub const CANCELED: &str = "canceled";
    pub const TIMEOUT: &str = "timeout";
    pub const LOCAL_ERROR: &str = "local_error";
}

/// Exit code used when the failure has no process exit status of its own.
pub const GENERIC_FAILURE_EXIT_CODE: i32 = 1;
const USAGE_EXIT_CODE: i32 = 2;
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorKind {
    Connectivity,
    RemoteCommand,
    Transfer,
    Submission,
    Cancelled,
    Timeout,
    Config,
    InvalidArgument,
    Local,
}

#[derive(Debug, Clone)]
pub struct AppError {
    kind: AppErrorKind,
    code: &'static str,
    message: String,
    context: Option<String>,
    exit_code: Option<i32>,
}

impl AppError {
    pub fn new(kind: AppErrorKind, code: &'static str) -> Self {
        Self {
            kind,
            code,
            message: code.to_string(),
            context: None,
            exit_code: None,
        }
    }

    pub fn with_message(
        kind: AppErrorKind,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            ..Self::new(kind, code)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attaches the exit status of the remote command or copy tool that failed.
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Process exit code for this failure. Remote and transfer failures reuse the
    /// originating tool's status; a zero status is never returned.
    pub fn exit_code(&self) -> i32 {
        if let Some(code) = self.exit_code.filter(|code| *code != 0) {
            return code;
        }
        match self.kind {
            AppErrorKind::Config | AppErrorKind::InvalidArgument => USAGE_EXIT_CODE,
            AppErrorKind::Cancelled => INTERRUPTED_EXIT_CODE,
            _ => GENERIC_FAILURE_EXIT_CODE,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{} ({})", self.message, ctx)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

pub fn invalid_argument(message: impl Into<String>) -> AppError {
    AppError::with_message(
        AppErrorKind::InvalidArgument,
        codes::INVALID_ARGUMENT,
        message,
    )
}

pub fn local_error(message: impl Into<String>) -> AppError {
    AppError::with_message(AppErrorKind::Local, codes::LOCAL_ERROR, message)
}

pub fn template_error(message: impl Into<String>) -> AppError {
    AppError::with_message(AppErrorKind::Config, codes::TEMPLATE_ERROR, message)
}
