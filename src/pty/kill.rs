//! Forced termination of a child that outlived its deadline.
//!
//! SIGTERM goes to the child's process group first. If the group is still
//! alive after the grace period, SIGKILL follows. The child is always reaped
//! before [`KillEscalation::run`] returns.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::Child;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy)]
enum Stage {
    Running,
    Terminating { since: Instant },
    Killing,
    Reaped(KillOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Terminate,
    Kill,
}

/// How the child ended once escalation began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// Already exited before any signal was sent.
    AlreadyExited,
    /// Exited within the grace period after SIGTERM.
    Terminated,
    /// Needed SIGKILL.
    Killed,
}

/// SIGTERM, grace period, SIGKILL.
#[derive(Debug, Clone, Copy)]
pub struct KillEscalation {
    grace: Duration,
}

impl KillEscalation {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Drive the child to a reaped state.
    pub fn run<C: Child + ?Sized>(&self, child: &mut C) -> io::Result<KillOutcome> {
        let pid = child.process_id();
        let mut stage = Stage::Running;

        loop {
            stage = match stage {
                Stage::Running => {
                    if child.try_wait()?.is_some() {
                        Stage::Reaped(KillOutcome::AlreadyExited)
                    } else {
                        debug!(?pid, "Sending SIGTERM to process group");
                        send_signal(child, Signal::Terminate)?;
                        Stage::Terminating {
                            since: Instant::now(),
                        }
                    }
                }
                Stage::Terminating { since } => {
                    if child.try_wait()?.is_some() {
                        Stage::Reaped(KillOutcome::Terminated)
                    } else if since.elapsed() >= self.grace {
                        Stage::Killing
                    } else {
                        thread::sleep(POLL_INTERVAL.min(self.grace));
                        stage
                    }
                }
                Stage::Killing => {
                    debug!(
                        ?pid,
                        grace_ms = self.grace.as_millis() as u64,
                        "Grace period expired, sending SIGKILL"
                    );
                    send_signal(child, Signal::Kill)?;
                    child.wait()?;
                    Stage::Reaped(KillOutcome::Killed)
                }
                Stage::Reaped(outcome) => return Ok(outcome),
            };
        }
    }
}

#[cfg(unix)]
fn send_signal<C: Child + ?Sized>(child: &mut C, signal: Signal) -> io::Result<()> {
    let Some(pid) = child.process_id() else {
        return Ok(());
    };
    let signo = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    let pid = pid as libc::pid_t;

    // The child is a session leader, so its pid doubles as the group id.
    // SAFETY: killpg/kill take plain integers and have no memory effects.
    if unsafe { libc::killpg(pid, signo) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() != Some(libc::ESRCH) {
        return Err(err);
    }
    if unsafe { libc::kill(pid, signo) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Ok(());
    }
    Err(err)
}

#[cfg(not(unix))]
fn send_signal<C: Child + ?Sized>(child: &mut C, _signal: Signal) -> io::Result<()> {
    use portable_pty::ChildKiller;
    child.kill()
}
