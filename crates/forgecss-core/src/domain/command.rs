//! Command-line splitting for `@exec`.
//!
//! Commands are never handed to a shell. They are split into a program and
//! its arguments here, and the program token is what the allow-list checks.

use crate::domain::error::DomainError;

/// Split a command line into words.
///
/// Whitespace separates words. Single quotes group literally, double quotes
/// group with `\"` and `\\` escapes, and a backslash outside quotes escapes
/// the next character.
pub fn split_command(command: &str) -> Result<Vec<String>, DomainError> {
    let invalid = |reason: &str| DomainError::InvalidCommand {
        command: command.to_owned(),
        reason: reason.to_owned(),
    };

    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(invalid("unterminated single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(invalid("unterminated double quote")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(invalid("unterminated double quote")),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(invalid("trailing backslash")),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }

    if words.is_empty() {
        return Err(invalid("command is empty"));
    }
    Ok(words)
}

/// The leading token of a command: the program the allow-list checks.
pub fn program_token(command: &str) -> Result<String, DomainError> {
    let mut words = split_command(command)?;
    Ok(words.swap_remove(0))
}
