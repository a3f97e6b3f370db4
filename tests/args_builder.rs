use claude_pty_run::args::{build_argv, split_extra_args, ArgsError, RunOptions};

/// Every combination of the optional options, with the given prompt.
fn all_combinations(prompt: Option<&str>) -> Vec<RunOptions> {
    (0u8..64)
        .map(|mask| RunOptions {
            prompt: prompt.map(String::from),
            continue_session: mask & 1 != 0,
            json_output: mask & 2 != 0,
            model: (mask & 4 != 0).then(|| "sonnet".to_string()),
            max_turns: (mask & 8 != 0).then(|| "5".to_string()),
            max_budget_usd: (mask & 16 != 0).then(|| "0.25".to_string()),
            extra_args: if mask & 32 != 0 {
                vec!["--verbose".to_string(), "-p".to_string()]
            } else {
                Vec::new()
            },
        })
        .collect()
}

// -- prompt -------------------------------------------------------------------

#[test]
fn prompt_is_always_last() {
    for options in all_combinations(Some("fix the bug")) {
        let argv = build_argv(&options).unwrap();
        assert_eq!(argv.last().map(String::as_str), Some("fix the bug"), "{options:?}");
    }
}

#[test]
fn missing_prompt_always_fails() {
    for prompt in [None, Some("")] {
        for options in all_combinations(prompt) {
            assert_eq!(
                build_argv(&options),
                Err(ArgsError::MissingRequiredOption { option: "prompt" })
            );
        }
    }
}

#[test]
fn prompt_that_looks_like_a_flag_is_still_positional() {
    let argv = build_argv(&RunOptions::new("--help")).unwrap();
    assert_eq!(argv, vec!["-p", "--help"]);
}

// -- ordering -----------------------------------------------------------------

#[test]
fn full_option_set_order() {
    let options = RunOptions {
        prompt: Some("continue".into()),
        continue_session: true,
        json_output: true,
        model: Some("opus".into()),
        max_turns: Some("10".into()),
        max_budget_usd: Some("2.50".into()),
        extra_args: vec!["--add-dir".into(), "/tmp/x".into()],
    };
    assert_eq!(
        build_argv(&options).unwrap(),
        vec![
            "--continue",
            "-p",
            "--output-format",
            "json",
            "--model",
            "opus",
            "--max-turns",
            "10",
            "--max-budget-usd",
            "2.50",
            "--add-dir",
            "/tmp/x",
            "continue",
        ]
    );
}

#[test]
fn continue_comes_before_print_mode() {
    let mut options = RunOptions::new("hi");
    options.continue_session = true;
    assert_eq!(build_argv(&options).unwrap(), vec!["--continue", "-p", "hi"]);
}

#[test]
fn values_are_forwarded_opaquely() {
    let mut options = RunOptions::new("hi");
    options.max_turns = Some("not-a-number".into());
    options.max_budget_usd = Some("-1".into());
    let argv = build_argv(&options).unwrap();
    assert_eq!(
        argv,
        vec!["-p", "--max-turns", "not-a-number", "--max-budget-usd", "-1", "hi"]
    );
}

#[test]
fn split_extra_args_feed_the_builder() {
    let mut options = RunOptions::new("go");
    options.extra_args = split_extra_args(r#"--allowedTools "Bash(git:*) Edit""#).unwrap();
    assert_eq!(
        build_argv(&options).unwrap(),
        vec!["-p", "--allowedTools", "Bash(git:*) Edit", "go"]
    );
}

#[test]
fn building_is_deterministic() {
    let options = all_combinations(Some("same")).pop().unwrap();
    assert_eq!(build_argv(&options), build_argv(&options));
}
