use portable_pty::{MasterPty, PtySize};
use std::io;
use std::sync::{Arc, Mutex};

#[cfg(unix)]
use crossterm::terminal::size as terminal_size;
#[cfg(unix)]
use signal_hook::consts::signal::SIGWINCH;
#[cfg(unix)]
use signal_hook::iterator::Signals;
#[cfg(unix)]
use std::thread;

/// Copies the controlling terminal's size onto the PTY on every SIGWINCH.
pub struct ResizeWatcher {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: thread::JoinHandle<()>,
}

impl ResizeWatcher {
    pub fn start(master: Arc<Mutex<Box<dyn MasterPty + Send>>>) -> io::Result<Option<Self>> {
        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGWINCH])?;
            let handle = signals.handle();
            let thread = thread::Builder::new()
                .name("pty-resize".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        let (cols, rows) = match terminal_size() {
                            Ok(size) => size,
                            Err(_) => continue,
                        };
                        if let Ok(master) = master.lock() {
                            let _ = master.resize(pty_size(cols, rows));
                        }
                    }
                })?;
            Ok(Some(Self { handle, thread }))
        }

        #[cfg(not(unix))]
        {
            let _ = master;
            Ok(None)
        }
    }

    pub fn stop(self) {
        #[cfg(unix)]
        {
            self.handle.close();
            let _ = self.thread.join();
        }
    }
}

pub(crate) fn pty_size(cols: u16, rows: u16) -> PtySize {
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}
