use std::io::{self, IsTerminal, Write};
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, warn};

use claude_pty_run::args::{build_argv, split_extra_args, ArgsError, RunOptions};
use claude_pty_run::config::{Config, ConfigError};
use claude_pty_run::logging::init_tracing;
use claude_pty_run::pty::{
    command_name, ExitOutcome, InvocationSpec, PtyRunner, RunResult, RunnerError,
};

const USAGE_EXIT_CODE: i32 = 2;
const CONFIG_EXIT_CODE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "claude-pty-run",
    version,
    about = "Run Claude Code in print mode under a pseudo-terminal, with a timeout"
)]
struct Cli {
    /// Prompt text for claude
    #[arg(long)]
    prompt: String,

    /// Working directory for claude
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Ask claude for JSON output
    #[arg(long)]
    json: bool,

    /// Continue the most recent conversation in the working directory
    #[arg(long = "continue")]
    continue_session: bool,

    /// Model override
    #[arg(long)]
    model: Option<String>,

    /// Maximum agentic turns (forwarded as-is)
    #[arg(long)]
    max_turns: Option<String>,

    /// Maximum spend in USD (forwarded as-is)
    #[arg(long)]
    budget_usd: Option<String>,

    /// Extra arguments for claude, split like a shell would
    #[arg(long, allow_hyphen_values = true)]
    extra_args: Option<String>,

    /// Timeout in seconds (exit 124 on timeout)
    #[arg(long)]
    timeout: Option<NonZeroU64>,

    /// Keep ANSI escape sequences in the output
    #[arg(long)]
    keep_ansi: bool,

    /// Executable to run instead of claude (default: $CLAUDE_BIN, then claude)
    #[arg(long)]
    claude_bin: Option<String>,

    /// Cap on captured output in bytes
    #[arg(long)]
    max_output_bytes: Option<usize>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Args(_) => USAGE_EXIT_CODE,
            CliError::Config(_) => CONFIG_EXIT_CODE,
            CliError::Runner(err) => err.exit_code(),
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => exit_code(code),
        Err(err) => {
            eprintln!("Error: {err}");
            exit_code(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let config = Config::load()?;

    let extra_args = match cli.extra_args.as_deref() {
        Some(raw) => split_extra_args(raw)?,
        None => Vec::new(),
    };
    let options = RunOptions {
        prompt: Some(cli.prompt),
        continue_session: cli.continue_session,
        json_output: cli.json,
        model: cli.model,
        max_turns: cli.max_turns,
        max_budget_usd: cli.budget_usd,
        extra_args,
    };
    let argv = build_argv(&options)?;

    let program = command_name(
        cli.claude_bin.as_deref(),
        config.defaults.claude_bin.as_deref(),
    );
    let timeout = match cli.timeout {
        Some(timeout) => timeout,
        None => config.timeout()?,
    };
    let strip_ansi = !cli.keep_ansi && config.defaults.strip_ansi;
    let interactive = io::stdin().is_terminal();

    let mut spec = InvocationSpec::new(&program, argv)
        .with_timeout_secs(timeout)
        .with_strip_ansi(strip_ansi)
        .with_max_output_bytes(cli.max_output_bytes.unwrap_or(config.defaults.max_output_bytes))
        .with_kill_grace(Duration::from_millis(config.defaults.kill_grace_ms))
        .with_follow_resize(interactive)
        .with_forward_stdin(interactive);
    if let Some(cwd) = cli.cwd {
        spec = spec.with_working_directory(cwd);
    }
    debug!(program = %program, args = ?spec.arguments(), "Invoking");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = PtyRunner::new().run_streaming(&spec, &mut out)?;
    if let Err(err) = out.flush() {
        warn!(error = %err, "Failed to flush stdout");
    }

    if cli.json && strip_ansi {
        check_json(&result);
    }

    let exit = result.exit();
    if let ExitOutcome::TimedOut = exit {
        eprintln!("Error: {program} timed out after {timeout}s");
    }
    Ok(exit.process_exit_code())
}

fn check_json(result: &RunResult) {
    if result.truncated() {
        warn!("Output truncated; skipping JSON validation");
        return;
    }
    if let Err(err) = serde_json::from_slice::<serde_json::Value>(result.output()) {
        warn!(error = %err, "Output is not valid JSON");
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from((code & 0xff) as u8)
}
