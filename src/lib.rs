//! Run an interactive coding-agent CLI under a pseudo-terminal so it never
//! blocks on a missing TTY, with a hard deadline and clean output.

pub mod args;
pub mod config;
pub mod logging;
pub mod pty;
