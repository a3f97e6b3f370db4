//! PTY-attached process runner.
//!
//! Interactive CLIs probe `isatty` and change behavior when they are not on a
//! terminal: colors, spinners, or blocking on terminal-only input. Running
//! them on the slave side of a pseudo-terminal keeps them on their normal
//! path; [`PtyRunner`] adds a deadline and optional control-sequence stripping.

mod command;
mod error;
mod input;
mod invocation;
mod kill;
mod resize;
mod runner;
mod session;
mod strip;

pub use command::{command_name, command_name_from, locate, COMMAND_ENV, DEFAULT_COMMAND};
pub use error::{RunnerError, NOT_FOUND_EXIT_CODE, RUNNER_FAILURE_EXIT_CODE};
pub use invocation::{
    ExitOutcome, InvocationSpec, RunResult, DEFAULT_KILL_GRACE, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_TIMEOUT_SECS, TIMED_OUT_EXIT_CODE,
};
pub use kill::{KillEscalation, KillOutcome};
pub use resize::ResizeWatcher;
pub use runner::PtyRunner;
pub use session::PtySession;
pub use strip::{strip_ansi, AnsiStripper};
