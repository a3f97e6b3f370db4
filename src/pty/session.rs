use crate::pty::input::InputForwarder;
use crate::pty::kill::{KillEscalation, KillOutcome};
use crate::pty::resize::{pty_size, ResizeWatcher};
use crate::pty::{InvocationSpec, RunnerError};
use portable_pty::{native_pty_system, Child, CommandBuilder, ExitStatus, MasterPty};
use std::io::{self, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::debug;

const READ_BUFFER_SIZE: usize = 8192;
const DEFAULT_TERM: &str = "xterm-256color";
const DEFAULT_SIZE: (u16, u16) = (80, 24);

/// One pseudo-terminal bound to one child process.
///
/// Dropping the session kills the child if it is still running, stops the
/// resize watcher, restores the caller's terminal and closes the master side. Nothing outlives the session
/// except a reader thread blocked on a slave still held by a grandchild; it
/// exits as soon as that slave closes.
pub struct PtySession {
    master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
    child: Box<dyn Child + Send + Sync>,
    output: Receiver<Vec<u8>>,
    reader_handle: Option<thread::JoinHandle<()>>,
    resize_watcher: Option<ResizeWatcher>,
    input: Option<InputForwarder>,
    reaped: bool,
}

impl PtySession {
    /// Allocate a PTY and start `program` on its slave side.
    ///
    /// `program` must already be resolved; `spec` supplies everything else.
    pub fn open(spec: &InvocationSpec, program: &Path) -> Result<Self, RunnerError> {
        if let Some(dir) = spec.working_directory() {
            if !dir.is_dir() {
                return Err(RunnerError::InvalidWorkingDirectory {
                    path: dir.to_path_buf(),
                });
            }
        }

        let (cols, rows) = spec
            .size()
            .unwrap_or_else(|| crossterm::terminal::size().unwrap_or(DEFAULT_SIZE));
        let pair = native_pty_system()
            .openpty(pty_size(cols, rows))
            .map_err(|source| RunnerError::PtyAllocation { source })?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(spec.arguments());
        match spec.working_directory() {
            Some(dir) => cmd.cwd(dir),
            None => cmd.cwd(
                std::env::current_dir().map_err(RunnerError::io("reading current directory"))?,
            ),
        }
        if std::env::var_os("TERM").map_or(true, |term| term.is_empty()) {
            cmd.env("TERM", DEFAULT_TERM);
        }
        for (key, value) in spec.env() {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|source| RunnerError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;
        drop(pair.slave);

        // Until the session owns it, a running child must not leak.
        let child = scopeguard::guard(child, |mut child| {
            let _ = KillEscalation::new(Duration::ZERO).run(&mut *child);
        });

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| RunnerError::Io {
                context: "cloning the PTY reader",
                source: io::Error::other(e),
            })?;
        let (sender, output) = mpsc::channel();
        let reader_handle = thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || {
                let mut reader = reader;
                let mut buffer = [0u8; READ_BUFFER_SIZE];

                loop {
                    let count = match reader.read(&mut buffer) {
                        Ok(0) => break,
                        Ok(count) => count,
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        // EIO once the slave side is closed on Linux.
                        Err(_) => break,
                    };
                    if sender.send(buffer[..count].to_vec()).is_err() {
                        break;
                    }
                }
                drop(reader);
            })
            .map_err(RunnerError::io("starting the PTY reader thread"))?;

        let input = if spec.forward_stdin() {
            Some(
                InputForwarder::from_stdin(&*pair.master)
                    .map_err(RunnerError::io("forwarding stdin to the PTY"))?,
            )
        } else {
            None
        };

        let master = Arc::new(Mutex::new(pair.master));
        let resize_watcher = if spec.follow_resize() {
            ResizeWatcher::start(Arc::clone(&master))
                .map_err(RunnerError::io("installing the SIGWINCH handler"))?
        } else {
            None
        };

        let child = scopeguard::ScopeGuard::into_inner(child);
        debug!(
            pid = ?child.process_id(),
            program = %program.display(),
            cols,
            rows,
            "PTY session opened"
        );

        Ok(Self {
            master,
            child,
            output,
            reader_handle: Some(reader_handle),
            resize_watcher,
            input,
            reaped: false,
        })
    }

    pub fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Chunks read from the master side, in order. Disconnects at EOF.
    pub fn output(&self) -> &Receiver<Vec<u8>> {
        &self.output
    }

    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, RunnerError> {
        let status = self
            .child
            .try_wait()
            .map_err(RunnerError::io("polling the child process"))?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    /// Forcibly end the child, escalating to SIGKILL after `grace`.
    pub fn terminate(&mut self, grace: Duration) -> Result<KillOutcome, RunnerError> {
        let outcome = KillEscalation::new(grace)
            .run(&mut *self.child)
            .map_err(RunnerError::io("terminating the child process"))?;
        self.reaped = true;
        Ok(outcome)
    }

    /// Apply a new terminal size to the PTY.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), RunnerError> {
        if let Ok(master) = self.master.lock() {
            master.resize(pty_size(cols, rows)).map_err(|e| RunnerError::Io {
                context: "resizing the PTY",
                source: io::Error::other(e),
            })?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.reaped {
            let _ = KillEscalation::new(Duration::ZERO).run(&mut *self.child);
            self.reaped = true;
        }
        if let Some(watcher) = self.resize_watcher.take() {
            watcher.stop();
        }
        drop(self.input.take());
        if let Some(reader_handle) = self.reader_handle.take() {
            if reader_handle.is_finished() {
                let _ = reader_handle.join();
            } else {
                debug!("PTY reader still blocked; detaching");
            }
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
