//! Named options recognized by the command builder.

use thiserror::Error;

use crate::args::assembler::ArgAssembler;

/// Errors produced while turning options into an argument vector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Missing required option '{option}'")]
    MissingRequiredOption { option: &'static str },

    #[error("Unbalanced quote in extra arguments: {input}")]
    UnbalancedQuote { input: String },
}

/// Options for a single print-mode invocation of the wrapped tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Prompt text, emitted as the final positional argument.
    pub prompt: Option<String>,
    /// Re-attach to the most recent conversation in the working directory.
    pub continue_session: bool,
    /// Request `--output-format json`.
    pub json_output: bool,
    pub model: Option<String>,
    /// Forwarded verbatim; not parsed.
    pub max_turns: Option<String>,
    /// Forwarded verbatim; not parsed.
    pub max_budget_usd: Option<String>,
    /// Raw tokens inserted just before the prompt.
    pub extra_args: Vec<String>,
}

impl RunOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Returns the prompt if it is present and non-empty.
    pub fn require_prompt(&self) -> Result<&str, ArgsError> {
        match self.prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => Ok(prompt),
            _ => Err(ArgsError::MissingRequiredOption { option: "prompt" }),
        }
    }
}

/// Build the argument vector for the wrapped tool.
///
/// Order is fixed: continuation + print mode, output format, model,
/// max turns, budget, extra arguments, prompt.
pub fn build_argv(options: &RunOptions) -> Result<Vec<String>, ArgsError> {
    let prompt = options.require_prompt()?;

    let argv = ArgAssembler::new()
        .with_print_mode(options.continue_session)
        .with_json_output(options.json_output)
        .with_model(options.model.as_deref())
        .with_max_turns(options.max_turns.as_deref())
        .with_max_budget_usd(options.max_budget_usd.as_deref())
        .with_extra(options.extra_args.iter().cloned())
        .with_prompt(prompt)
        .build();

    Ok(argv)
}
