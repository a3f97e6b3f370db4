//! Shared test utilities.

#![allow(dead_code)]

use claude_pty_run::pty::InvocationSpec;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

/// `sh -c <script>` with a 30 second deadline.
pub fn sh(script: &str) -> InvocationSpec {
    InvocationSpec::new("sh", vec!["-c".to_string(), script.to_string()])
        .with_timeout_secs(secs(30))
        .with_size(80, 24)
}

pub fn secs(value: u64) -> NonZeroU64 {
    NonZeroU64::new(value).expect("non-zero seconds")
}

/// Write an executable shell script into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    write_executable(dir, name, &format!("#!/bin/sh\n{body}\n"))
}

/// Write `contents` verbatim into `dir` and mark it executable.
pub fn write_executable(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)
            .expect("Failed to stat script")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("Failed to chmod script");
    }

    path
}

/// True once no process with `pid` exists (reaped, not merely a zombie).
#[cfg(unix)]
pub fn process_gone(pid: u32) -> bool {
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    rc == -1 && std::io::Error::last_os_error().raw_os_error() == Some(libc::ESRCH)
}
