use serde::{Deserialize, Serialize};

use crate::pty::{DEFAULT_KILL_GRACE, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_SECS};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Defaults applied when the command line does not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Kill the wrapped tool after this many seconds (default: 600).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Remove terminal control sequences from output (default: true).
    #[serde(default = "default_strip_ansi")]
    pub strip_ansi: bool,
    /// Cap on captured output in bytes (default: 16 MiB).
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Delay between SIGTERM and SIGKILL in milliseconds (default: 2000).
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
    /// Executable to run instead of `claude`.
    #[serde(default)]
    pub claude_bin: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_strip_ansi() -> bool {
    true
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

fn default_kill_grace_ms() -> u64 {
    DEFAULT_KILL_GRACE.as_millis() as u64
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            strip_ansi: default_strip_ansi(),
            max_output_bytes: default_max_output_bytes(),
            kill_grace_ms: default_kill_grace_ms(),
            claude_bin: None,
        }
    }
}
