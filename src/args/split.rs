//! Shell-style splitting of the `--extra-args` string.

use crate::args::options::ArgsError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split a raw argument string into tokens.
///
/// Whitespace separates tokens outside quotes. Single quotes are literal;
/// inside double quotes a backslash escapes `"` and `\`. Outside quotes a
/// backslash escapes the next character. No expansion of any kind happens.
pub fn split_extra_args(input: &str) -> Result<Vec<String>, ArgsError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote = Quote::None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Quote::None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (Quote::None, '\'') => {
                quote = Quote::Single;
                in_token = true;
            }
            (Quote::None, '"') => {
                quote = Quote::Double;
                in_token = true;
            }
            (Quote::None, '\\') => {
                in_token = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            (Quote::Double, '\\') => match chars.peek() {
                Some(&next @ ('"' | '\\')) => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push('\\'),
            },
            (_, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote != Quote::None {
        return Err(ArgsError::UnbalancedQuote {
            input: input.to_string(),
        });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
