// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use thiserror::Error as ThisError;

use crate::app::errors::{AppError, local_error};

#[derive(Debug, ThisError)]
pub enum ProcessError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} terminated without an exit status")]
    NoStatus { program: String },
}

impl From<ProcessError> for AppError {
    fn from(err: ProcessError) -> Self {
        local_error(err.to_string())
    }
}
