//! Argument assembler: every CLI arg in one place.

const CONTINUE_FLAG: &str = "--continue";
const PRINT_FLAG: &str = "-p";
const OUTPUT_FORMAT_FLAG: &str = "--output-format";
const MODEL_FLAG: &str = "--model";
const MAX_TURNS_FLAG: &str = "--max-turns";
const MAX_BUDGET_FLAG: &str = "--max-budget-usd";

/// Builder for CLI arguments passed to the spawned process.
///
/// Methods append in call order; [`build_argv`](crate::args::build_argv)
/// calls them in the order the wrapped tool expects.
#[derive(Debug, Clone, Default)]
pub struct ArgAssembler {
    args: Vec<String>,
}

impl ArgAssembler {
    /// Start with an empty arg list.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Continuation flag (if requested) followed by print mode.
    pub fn with_print_mode(mut self, continue_session: bool) -> Self {
        if continue_session {
            self.args.push(CONTINUE_FLAG.into());
        }
        self.args.push(PRINT_FLAG.into());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        if enabled {
            self.args.push(OUTPUT_FORMAT_FLAG.into());
            self.args.push("json".into());
        }
        self
    }

    pub fn with_model(self, model: Option<&str>) -> Self {
        self.with_valued(MODEL_FLAG, model)
    }

    pub fn with_max_turns(self, max_turns: Option<&str>) -> Self {
        self.with_valued(MAX_TURNS_FLAG, max_turns)
    }

    pub fn with_max_budget_usd(self, budget: Option<&str>) -> Self {
        self.with_valued(MAX_BUDGET_FLAG, budget)
    }

    /// Add arbitrary extra arguments verbatim.
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(extra);
        self
    }

    /// Prompt goes last as a positional argument.
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.args.push(prompt.to_string());
        self
    }

    /// Build the final argument list.
    pub fn build(self) -> Vec<String> {
        self.args
    }

    fn with_valued(mut self, flag: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.args.push(flag.to_string());
            self.args.push(value.to_string());
        }
        self
    }
}
