use std::fmt;

use flip_core::model::Answer;
use ui::vm::ValidationIntent;

/// One line typed at the validation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Intent(ValidationIntent),
    Show,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingValue { command: &'static str },
    InvalidPosition { raw: String },
    InvalidAnswer { raw: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw} (try `h`)"),
            CommandError::MissingValue { command } => write!(f, "{command} requires a value"),
            CommandError::InvalidPosition { raw } => write!(f, "invalid flip position: {raw}"),
            CommandError::InvalidAnswer { raw } => {
                write!(f, "invalid answer: {raw} (expected left or right)")
            }
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
commands:
  n | next          next flip
  p | prev          previous flip
  g <n>             go to flip n (1-based)
  a left|right      answer the current flip
  r | report        report the current flip and move on
  s | submit        submit all answers
  l | list          show the session
  q | quit          leave without submitting";

/// Parse a prompt line. Positions are 1-based at the prompt.
///
/// # Errors
///
/// Returns `CommandError` for unknown commands or malformed values.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::Show);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Intent(ValidationIntent::Next),
        "p" | "prev" => Command::Intent(ValidationIntent::Prev),
        "g" | "go" => {
            let raw = words.next().ok_or(CommandError::MissingValue { command: "g" })?;
            let position = raw
                .parse::<usize>()
                .ok()
                .and_then(|position| position.checked_sub(1))
                .ok_or_else(|| CommandError::InvalidPosition {
                    raw: raw.to_string(),
                })?;
            Command::Intent(ValidationIntent::Pick(position))
        }
        "a" | "answer" => {
            let raw = words.next().ok_or(CommandError::MissingValue { command: "a" })?;
            let answer = match raw.to_ascii_lowercase().as_str() {
                "l" | "left" => Answer::Left,
                "r" | "right" => Answer::Right,
                _ => {
                    return Err(CommandError::InvalidAnswer {
                        raw: raw.to_string(),
                    });
                }
            };
            Command::Intent(ValidationIntent::Answer(answer))
        }
        "r" | "report" => Command::Intent(ValidationIntent::ReportAbuse),
        "s" | "submit" => Command::Intent(ValidationIntent::Submit),
        "l" | "list" => Command::Show,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_and_answers_parse() {
        assert_eq!(
            parse_command("n"),
            Ok(Command::Intent(ValidationIntent::Next))
        );
        assert_eq!(
            parse_command("  g 3 "),
            Ok(Command::Intent(ValidationIntent::Pick(2)))
        );
        assert_eq!(
            parse_command("a Right"),
            Ok(Command::Intent(ValidationIntent::Answer(Answer::Right)))
        );
        assert_eq!(
            parse_command("report"),
            Ok(Command::Intent(ValidationIntent::ReportAbuse))
        );
        assert_eq!(parse_command(""), Ok(Command::Show));
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(
            parse_command("g 0"),
            Err(CommandError::InvalidPosition { raw: "0".into() })
        );
        assert_eq!(
            parse_command("g"),
            Err(CommandError::MissingValue { command: "g" })
        );
    }

    #[test]
    fn bad_input_is_rejected() {
        assert_eq!(
            parse_command("a up"),
            Err(CommandError::InvalidAnswer { raw: "up".into() })
        );
        assert_eq!(
            parse_command("dance"),
            Err(CommandError::Unknown("dance".into()))
        );
    }
}
