//! Command builder for the wrapped CLI.
//!
//! ```text
//! RunOptions → validate → ArgAssembler → argv
//! ```
//!
//! Every stage is pure: no environment lookups, no filesystem access.
//! Flag values are forwarded opaquely; the wrapped tool rejects malformed ones.

mod assembler;
mod options;
mod split;

pub use assembler::ArgAssembler;
pub use options::{build_argv, ArgsError, RunOptions};
pub use split::split_extra_args;
