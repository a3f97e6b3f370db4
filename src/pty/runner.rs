//! Run one command under a PTY to completion or timeout.
//!
//! ```text
//! Idle → Allocating → Spawning → Streaming ─┬→ Completed
//!                                           └→ TimedOut
//! ```
//!
//! Allocation and spawn failures return [`RunnerError`] with the PTY already
//! released. Both terminal states produce exactly one [`RunResult`].

use std::io::{self, Write};
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::pty::command::{check_launchable, locate};
use crate::pty::strip::AnsiStripper;
use crate::pty::{ExitOutcome, InvocationSpec, PtySession, RunResult, RunnerError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const REAP_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_DRAIN_IDLE: Duration = Duration::from_millis(250);
const EXEC_ABORT_MARKER: &str = "fatal runtime error";

/// Stateless PTY runner; every call owns its own [`PtySession`].
#[derive(Debug, Clone)]
pub struct PtyRunner {
    drain_idle: Duration,
}

impl PtyRunner {
    pub fn new() -> Self {
        Self {
            drain_idle: DEFAULT_DRAIN_IDLE,
        }
    }

    /// How long to keep reading after the child exits with no new output.
    ///
    /// Bounds the wait when a grandchild keeps the slave side open.
    pub fn with_drain_idle(mut self, idle: Duration) -> Self {
        self.drain_idle = idle;
        self
    }

    /// Run `spec` and collect its output.
    pub fn run(&self, spec: &InvocationSpec) -> Result<RunResult, RunnerError> {
        self.run_streaming(spec, &mut io::sink())
    }

    /// Run `spec`, copying each (filtered) chunk to `sink` as it arrives.
    ///
    /// A failing sink is logged and then ignored; the captured result is
    /// unaffected.
    pub fn run_streaming<W: Write + ?Sized>(
        &self,
        spec: &InvocationSpec,
        sink: &mut W,
    ) -> Result<RunResult, RunnerError> {
        let started = Instant::now();
        // A timeout too large to represent never fires.
        let deadline = started.checked_add(spec.timeout());

        let program = locate(spec.executable())?;
        check_launchable(&program)?;
        let mut session = PtySession::open(spec, &program)?;
        let pid = session.process_id();
        let mut capture = Capture::new(spec, sink);

        let exit = loop {
            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                match session.terminate(spec.kill_grace()) {
                    Ok(outcome) => warn!(
                        ?pid,
                        timeout_secs = spec.timeout().as_secs(),
                        ?outcome,
                        "Child exceeded its deadline"
                    ),
                    Err(err) => warn!(
                        ?pid,
                        timeout_secs = spec.timeout().as_secs(),
                        error = %err,
                        "Child exceeded its deadline and could not be killed"
                    ),
                }
                capture.absorb_pending(&session);
                break ExitOutcome::TimedOut;
            }

            let wait = remaining(deadline, now).min(POLL_INTERVAL);
            match session.output().recv_timeout(wait) {
                Ok(chunk) => capture.push(&chunk),
                Err(RecvTimeoutError::Timeout) => {}
                // Reader hit EOF; the child is on its way out.
                Err(RecvTimeoutError::Disconnected) => thread::sleep(wait.min(REAP_INTERVAL)),
            }

            if let Some(status) = session.try_wait()? {
                self.drain(&session, &mut capture, deadline);
                break ExitOutcome::from(status);
            }
        };

        drop(session);
        let (output, truncated) = capture.finish();
        let duration_ms = started.elapsed().as_millis() as u64;

        if let Some(message) = exec_failure(exit, &output) {
            debug!(?pid, %message, "Child failed before exec");
            return Err(RunnerError::Spawn {
                program,
                source: anyhow::anyhow!(message),
            });
        }

        debug!(
            ?pid,
            ?exit,
            duration_ms,
            bytes = output.len(),
            truncated,
            "PTY run finished"
        );

        Ok(RunResult::new(exit, output, duration_ms, truncated, pid))
    }

    /// Read what the child left behind until EOF or `drain_idle` of silence.
    fn drain<W: Write + ?Sized>(
        &self,
        session: &PtySession,
        capture: &mut Capture<'_, W>,
        deadline: Option<Instant>,
    ) {
        loop {
            let wait = remaining(deadline, Instant::now()).min(self.drain_idle);
            match session.output().recv_timeout(wait) {
                Ok(chunk) => capture.push(&chunk),
                Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Output still open after child exit; stopping drain");
                    return;
                }
            }
        }
    }
}

fn remaining(deadline: Option<Instant>, now: Instant) -> Duration {
    deadline.map_or(Duration::MAX, |deadline| {
        deadline.saturating_duration_since(now)
    })
}

/// Recognize a child that died between fork and exec.
///
/// portable-pty closes the pipe std uses to report `execve` errors, so the
/// forked child aborts with a one-line runtime message instead.
fn exec_failure(exit: ExitOutcome, output: &[u8]) -> Option<String> {
    if !matches!(exit, ExitOutcome::Signaled(_) | ExitOutcome::Exited(1)) {
        return None;
    }
    let text = String::from_utf8_lossy(output);
    let text = text.trim();
    (text.starts_with(EXEC_ABORT_MARKER) && !text.contains('\n')).then(|| text.to_string())
}

impl Default for PtyRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates filtered output up to a cap and tees it to the sink.
struct Capture<'a, W: Write + ?Sized> {
    buffer: Vec<u8>,
    limit: usize,
    truncated: bool,
    stripper: Option<AnsiStripper>,
    scratch: Vec<u8>,
    sink: &'a mut W,
    sink_open: bool,
}

impl<'a, W: Write + ?Sized> Capture<'a, W> {
    fn new(spec: &InvocationSpec, sink: &'a mut W) -> Self {
        Self {
            buffer: Vec::new(),
            limit: spec.max_output_bytes(),
            truncated: false,
            stripper: spec.strip_ansi().then(AnsiStripper::new),
            scratch: Vec::new(),
            sink,
            sink_open: true,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        let filtered: &[u8] = match self.stripper.as_mut() {
            Some(stripper) => {
                self.scratch.clear();
                stripper.feed(chunk, &mut self.scratch);
                &self.scratch
            }
            None => chunk,
        };
        if filtered.is_empty() {
            return;
        }

        if self.sink_open {
            if let Err(err) = self.sink.write_all(filtered).and_then(|_| self.sink.flush()) {
                warn!(error = %err, "Output sink failed; continuing without it");
                self.sink_open = false;
            }
        }

        let room = self.limit.saturating_sub(self.buffer.len());
        if filtered.len() > room {
            if !self.truncated {
                warn!(limit = self.limit, "Captured output truncated");
            }
            self.truncated = true;
        }
        self.buffer
            .extend_from_slice(&filtered[..filtered.len().min(room)]);
    }

    /// Take whatever the reader already queued, without blocking.
    fn absorb_pending(&mut self, session: &PtySession) {
        loop {
            match session.output().try_recv() {
                Ok(chunk) => self.push(&chunk),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return,
            }
        }
    }

    fn finish(self) -> (Vec<u8>, bool) {
        (self.buffer, self.truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABORT: &[u8] =
        b"fatal runtime error: assertion failed: output.write(&bytes).is_ok(), aborting\r\n";

    #[test]
    fn abort_before_exec_is_recognized() {
        let message = exec_failure(ExitOutcome::Signaled(6), ABORT).unwrap();
        assert!(message.starts_with("fatal runtime error"));
        assert!(exec_failure(ExitOutcome::Exited(1), ABORT).is_some());
    }

    #[test]
    fn ordinary_failures_are_left_alone() {
        assert!(exec_failure(ExitOutcome::Exited(0), ABORT).is_none());
        assert!(exec_failure(ExitOutcome::TimedOut, ABORT).is_none());
        assert!(exec_failure(ExitOutcome::Exited(1), b"error: bad flag\r\n").is_none());

        let mut chatty = b"starting up\r\n".to_vec();
        chatty.extend_from_slice(ABORT);
        assert!(exec_failure(ExitOutcome::Signaled(6), &chatty).is_none());
    }

    #[test]
    fn unbounded_deadline_never_runs_out() {
        assert_eq!(remaining(None, Instant::now()), Duration::MAX);
        let now = Instant::now();
        assert_eq!(remaining(Some(now), now + Duration::from_secs(1)), Duration::ZERO);
    }
}
