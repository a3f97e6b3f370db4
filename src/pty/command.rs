use std::path::{Path, PathBuf};

use crate::pty::RunnerError;

#[cfg(unix)]
const SNIFF_LEN: u64 = 256;
#[cfg(unix)]
const NATIVE_MAGICS: [&[u8]; 6] = [
    b"\x7fELF",
    b"\xfe\xed\xfa\xce",
    b"\xfe\xed\xfa\xcf",
    b"\xce\xfa\xed\xfe",
    b"\xcf\xfa\xed\xfe",
    b"\xca\xfe\xba\xbe",
];

/// Name of the wrapped tool when nothing overrides it.
pub const DEFAULT_COMMAND: &str = "claude";
/// Environment variable naming the wrapped tool's executable.
pub const COMMAND_ENV: &str = "CLAUDE_BIN";

/// Pick the executable name: explicit flag, then `CLAUDE_BIN`, then the
/// config file, then [`DEFAULT_COMMAND`].
pub fn command_name(flag: Option<&str>, configured: Option<&str>) -> String {
    let from_env = std::env::var(COMMAND_ENV).ok();
    command_name_from(flag, from_env.as_deref(), configured)
}

pub fn command_name_from(
    flag: Option<&str>,
    from_env: Option<&str>,
    configured: Option<&str>,
) -> String {
    [flag, from_env, configured]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_COMMAND)
        .to_string()
}

/// Resolve `program` to an executable path.
///
/// Bare names are searched on `PATH`; anything with a separator is checked
/// in place.
pub fn locate(program: &Path) -> Result<PathBuf, RunnerError> {
    which::which(program).map_err(|source| RunnerError::ExecutableNotFound {
        name: program.display().to_string(),
        source,
    })
}

/// Reject targets the kernel would refuse to exec.
///
/// A failed `execve` inside portable-pty's child cannot be reported back to
/// the parent, so the usual causes are caught here: a `#!` interpreter that
/// does not exist (not found, 127) and a text file with no interpreter line
/// (spawn failure, 125). Files that cannot be read are left to `execve`.
#[cfg(unix)]
pub(crate) fn check_launchable(program: &Path) -> Result<(), RunnerError> {
    use std::io::Read;

    let mut head = Vec::new();
    let Ok(file) = std::fs::File::open(program) else {
        return Ok(());
    };
    if file.take(SNIFF_LEN).read_to_end(&mut head).is_err() {
        return Ok(());
    }

    if let Some(line) = head.strip_prefix(b"#!") {
        let line = line.split(|&b| b == b'\n').next().unwrap_or_default();
        let line = String::from_utf8_lossy(line);
        let mut words = line.split_whitespace();
        let Some(interpreter) = words.next() else {
            return Err(RunnerError::Spawn {
                program: program.to_path_buf(),
                source: anyhow::anyhow!("empty '#!' interpreter line"),
            });
        };
        let interpreter = Path::new(interpreter);
        // Relative interpreters resolve against the child's cwd.
        if !interpreter.is_absolute() {
            return Ok(());
        }
        locate(interpreter)?;

        if interpreter.file_name().is_some_and(|name| name == "env") {
            if let Some(target) = words.find(|word| !word.starts_with('-') && !word.contains('=')) {
                locate(Path::new(target))?;
            }
        }
        return Ok(());
    }

    if NATIVE_MAGICS.iter().any(|magic| head.starts_with(magic)) || head.contains(&0) {
        return Ok(());
    }
    Err(RunnerError::Spawn {
        program: program.to_path_buf(),
        source: anyhow::anyhow!("not a native executable and has no '#!' interpreter line"),
    })
}

#[cfg(not(unix))]
pub(crate) fn check_launchable(_program: &Path) -> Result<(), RunnerError> {
    Ok(())
}
