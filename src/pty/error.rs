//! Errors surfaced by the PTY runner.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code for a target that cannot be found.
pub const NOT_FOUND_EXIT_CODE: i32 = 127;
/// Exit code for a runner-level failure (PTY allocation, spawn, I/O).
pub const RUNNER_FAILURE_EXIT_CODE: i32 = 125;

/// Failures that prevent an invocation from producing a [`RunResult`](crate::pty::RunResult).
///
/// None of these are retried. A child that runs and exits non-zero, or one
/// that times out, is not an error: see [`ExitOutcome`](crate::pty::ExitOutcome).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Executable '{name}' not found: {source}")]
    ExecutableNotFound {
        name: String,
        #[source]
        source: which::Error,
    },

    #[error("Working directory '{path}' is not a directory")]
    InvalidWorkingDirectory { path: PathBuf },

    #[error("Failed to allocate pseudo-terminal: {source}")]
    PtyAllocation {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| RunnerError::Io { context, source }
    }

    /// Exit code a wrapper process should report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::ExecutableNotFound { .. } => NOT_FOUND_EXIT_CODE,
            _ => RUNNER_FAILURE_EXIT_CODE,
        }
    }
}
