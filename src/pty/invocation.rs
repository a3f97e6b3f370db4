//! Inputs and outputs of a single PTY invocation.

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout when neither the CLI nor the config file sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
/// Default cap on captured output.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;
/// Time between SIGTERM and SIGKILL when a child outlives its deadline.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);
/// Process exit code reported for [`ExitOutcome::TimedOut`].
pub const TIMED_OUT_EXIT_CODE: i32 = 124;

const SIGNALED_EXIT_BASE: i32 = 128;
#[cfg(unix)]
const SIGNAL_SCAN_LIMIT: i32 = 65;

/// Everything needed to run one command under a pseudo-terminal.
///
/// Built once, then only read. The executable is kept apart from
/// `arguments` so an argument can never be mistaken for the program.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    executable: PathBuf,
    arguments: Vec<String>,
    working_directory: Option<PathBuf>,
    timeout: Duration,
    strip_ansi: bool,
    env: Vec<(String, String)>,
    max_output_bytes: usize,
    kill_grace: Duration,
    size: Option<(u16, u16)>,
    follow_resize: bool,
    forward_stdin: bool,
}

impl InvocationSpec {
    pub fn new(executable: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            arguments,
            working_directory: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            strip_ansi: true,
            env: Vec::new(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            kill_grace: DEFAULT_KILL_GRACE,
            size: None,
            follow_resize: false,
            forward_stdin: false,
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: NonZeroU64) -> Self {
        self.timeout = Duration::from_secs(secs.get());
        self
    }

    pub fn with_strip_ansi(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Extra environment for the child, applied on top of the inherited one.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Fixed terminal size as `(cols, rows)`.
    pub fn with_size(mut self, cols: u16, rows: u16) -> Self {
        self.size = Some((cols, rows));
        self
    }

    /// Propagate SIGWINCH from the controlling terminal to the PTY.
    pub fn with_follow_resize(mut self, follow: bool) -> Self {
        self.follow_resize = follow;
        self
    }

    /// Put the caller's terminal in raw mode and copy its stdin to the child.
    ///
    /// Only meaningful when stdin is a terminal. The forwarding thread stays
    /// blocked on stdin until the next keystroke after the run ends.
    pub fn with_forward_stdin(mut self, forward: bool) -> Self {
        self.forward_stdin = forward;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn strip_ansi(&self) -> bool {
        self.strip_ansi
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    pub fn kill_grace(&self) -> Duration {
        self.kill_grace
    }

    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    pub fn follow_resize(&self) -> bool {
        self.follow_resize
    }

    pub fn forward_stdin(&self) -> bool {
        self.forward_stdin
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The child exited on its own with this code.
    Exited(i32),
    /// The child was ended by this signal number.
    Signaled(i32),
    /// The deadline passed and the child was killed.
    TimedOut,
}

impl ExitOutcome {
    /// The child's own exit code, if it finished before the deadline.
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(*code),
            ExitOutcome::Signaled(_) | ExitOutcome::TimedOut => None,
        }
    }

    pub fn signal(&self) -> Option<i32> {
        match self {
            ExitOutcome::Signaled(signo) => Some(*signo),
            _ => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, ExitOutcome::TimedOut)
    }

    /// Exit code to propagate from a wrapper process. Signals follow the
    /// shell convention of `128 + signo`.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => *code,
            ExitOutcome::Signaled(signo) => SIGNALED_EXIT_BASE + signo,
            ExitOutcome::TimedOut => TIMED_OUT_EXIT_CODE,
        }
    }
}

impl From<portable_pty::ExitStatus> for ExitOutcome {
    fn from(status: portable_pty::ExitStatus) -> Self {
        // portable-pty reports signals by name with a placeholder code of 1.
        match status.signal().and_then(signal_number) {
            Some(signo) => ExitOutcome::Signaled(signo),
            None => ExitOutcome::Exited(status.exit_code() as i32),
        }
    }
}

/// Map a name produced by `strsignal` (or portable-pty's `Signal N`
/// fallback) back to its number.
#[cfg(unix)]
fn signal_number(name: &str) -> Option<i32> {
    if let Some(number) = name.strip_prefix("Signal ") {
        return number.trim().parse().ok();
    }
    (1..SIGNAL_SCAN_LIMIT).find(|&signo| {
        // SAFETY: strsignal returns a NUL-terminated string that stays valid
        // until the next strsignal call on this thread; it is read at once.
        let description = unsafe { libc::strsignal(signo) };
        !description.is_null()
            && unsafe { std::ffi::CStr::from_ptr(description) }.to_bytes() == name.as_bytes()
    })
}

#[cfg(not(unix))]
fn signal_number(_name: &str) -> Option<i32> {
    None
}

/// Captured result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    exit: ExitOutcome,
    output: Vec<u8>,
    duration_ms: u64,
    truncated: bool,
    pid: Option<u32>,
}

impl RunResult {
    pub(crate) fn new(
        exit: ExitOutcome,
        output: Vec<u8>,
        duration_ms: u64,
        truncated: bool,
        pid: Option<u32>,
    ) -> Self {
        Self {
            exit,
            output,
            duration_ms,
            truncated,
            pid,
        }
    }

    pub fn exit(&self) -> ExitOutcome {
        self.exit
    }

    /// Combined terminal output; filtered when stripping was requested.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// True when output past `max_output_bytes` was dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Process id the child ran under.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}
