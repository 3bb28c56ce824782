//! Line handling for the local command shell.

use bytes::Bytes;
use strata_protocol::Frame;

/// Splits a command line into arguments.
///
/// Whitespace separates arguments. Double quotes group an argument and
/// allow backslash escapes; single quotes group without escapes.
///
/// # Errors
///
/// Returns an error on unmatched quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            ' ' | '\t' => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        None => return Err("unmatched double quote".into()),
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err("trailing backslash".into()),
                        },
                        Some(c) => current.push(c),
                    }
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        None => return Err("unmatched single quote".into()),
                        Some('\'') => break,
                        Some(c) => current.push(c),
                    }
                }
            }
            _ => {
                in_token = true;
                current.push(ch);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Wraps shell arguments in the array frame the command parser expects.
pub fn to_frame(tokens: Vec<String>) -> Frame {
    Frame::Array(
        tokens
            .into_iter()
            .map(|t| Frame::Bulk(Bytes::from(t)))
            .collect(),
    )
}
