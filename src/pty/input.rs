//! Keyboard input from the caller's terminal to the child.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use portable_pty::MasterPty;
use scopeguard::ScopeGuard;
use tracing::{debug, warn};

const INPUT_BUFFER_SIZE: usize = 1024;

type SharedWriter = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// Copies bytes from a source into the PTY master on a background thread.
///
/// Dropping the forwarder closes the master writer and, when it was the one
/// to enable it, takes the caller's terminal back out of raw mode. The thread
/// itself may stay parked in `read` until the source yields once more; it
/// exits on that read without writing anything.
pub(crate) struct InputForwarder {
    writer: SharedWriter,
    raw_mode: Option<ScopeGuard<(), fn(())>>,
}

impl InputForwarder {
    /// Forward the process's stdin with the terminal in raw mode, so keys
    /// such as Ctrl-C reach the child instead of this process.
    pub(crate) fn from_stdin(master: &dyn MasterPty) -> io::Result<Self> {
        let writer = master.take_writer().map_err(io::Error::other)?;
        enable_raw_mode()?;
        let raw_mode = scopeguard::guard((), restore_terminal as fn(()));

        let mut forwarder = Self::spawn(writer, io::stdin())?;
        forwarder.raw_mode = Some(raw_mode);
        debug!("Forwarding stdin to the PTY in raw mode");
        Ok(forwarder)
    }

    pub(crate) fn spawn<R>(writer: Box<dyn Write + Send>, source: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let writer: SharedWriter = Arc::new(Mutex::new(Some(writer)));
        let shared = Arc::clone(&writer);

        thread::Builder::new()
            .name("pty-stdin".to_string())
            .spawn(move || {
                let mut source = source;
                let mut buffer = [0u8; INPUT_BUFFER_SIZE];

                loop {
                    let count = match source.read(&mut buffer) {
                        Ok(0) => break,
                        Ok(count) => count,
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    };
                    let Ok(mut slot) = shared.lock() else {
                        break;
                    };
                    let Some(writer) = slot.as_mut() else {
                        break;
                    };
                    if writer.write_all(&buffer[..count]).is_err() || writer.flush().is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            writer,
            raw_mode: None,
        })
    }
}

impl Drop for InputForwarder {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.writer.lock() {
            slot.take();
        }
        // Restores the terminal when present.
        drop(self.raw_mode.take());
    }
}

fn restore_terminal(_: ()) {
    if let Err(err) = disable_raw_mode() {
        warn!(error = %err, "Failed to restore terminal mode");
    }
}
