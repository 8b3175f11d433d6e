use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;

pub const COMMAND_PREFIX: &str = "!ff";

const SET_USAGE: &str = "Invalid command. Use: !ff set <monster name> <kill count>";
const ADD_USAGE: &str = "Invalid command. Use: !ff add <monster name> <kills to add>";
const HELP_TEXT: &str = "Fifty-Fifty commands: !ff set <monster> <kills> | !ff add <monster> <kills>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandVerb {
    Set,
    Add,
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandVerb::Set => f.write_str("set"),
            CommandVerb::Add => f.write_str("add"),
        }
    }
}

/// Administrative operations typed into chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCommand {
    SetKills { name: String, kills: u32 },
    AddKills { name: String, kills: u32 },
    Help,
}

impl TrackerCommand {
    pub fn help_text() -> &'static str {
        HELP_TEXT
    }
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument for {verb}: {argument}")]
    MissingArgument {
        verb: CommandVerb,
        argument: &'static str,
    },
    #[error("invalid integer '{value}' for {verb} kill count: {source}")]
    InvalidInteger {
        verb: CommandVerb,
        value: String,
        source: ParseIntError,
    },
    #[error("invalid drop rate denominator '{0}'")]
    InvalidDenominator(String),
}

impl CommandParseError {
    /// Chat reply shown to the player when a command is rejected.
    pub fn usage(&self) -> &'static str {
        match self {
            CommandParseError::MissingArgument {
                verb: CommandVerb::Set,
                ..
            }
            | CommandParseError::InvalidInteger {
                verb: CommandVerb::Set,
                ..
            } => SET_USAGE,
            CommandParseError::MissingArgument {
                verb: CommandVerb::Add,
                ..
            }
            | CommandParseError::InvalidInteger {
                verb: CommandVerb::Add,
                ..
            } => ADD_USAGE,
            CommandParseError::UnknownCommand(_) => HELP_TEXT,
            CommandParseError::InvalidDenominator(_) => {
                "Please enter a valid drop rate denominator (e.g., 128 for 1/128)."
            }
        }
    }
}

/// Parse a chat line into a tracker command.
///
/// Returns `Ok(None)` for ordinary chat that does not start with `!ff`.
pub fn parse_chat_command(input: &str) -> Result<Option<TrackerCommand>, CommandParseError> {
    let trimmed = input.trim();
    let mut parts = trimmed.split_whitespace();
    match parts.next() {
        Some(prefix) if prefix.eq_ignore_ascii_case(COMMAND_PREFIX) => {}
        _ => return Ok(None),
    }

    let verb = match parts.next() {
        Some(verb) => verb.to_ascii_lowercase(),
        None => return Ok(Some(TrackerCommand::Help)),
    };
    let rest: Vec<&str> = parts.collect();

    let command = match verb.as_str() {
        "help" => TrackerCommand::Help,
        "set" => {
            let (name, kills) = parse_name_and_count(&rest, CommandVerb::Set)?;
            TrackerCommand::SetKills { name, kills }
        }
        "add" => {
            let (name, kills) = parse_name_and_count(&rest, CommandVerb::Add)?;
            TrackerCommand::AddKills { name, kills }
        }
        other => return Err(CommandParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// Parse the "1/x" denominator typed into the add-monster form.
///
/// Accepts either `x` or `1/x`; `x` must be a positive integer.
pub fn parse_drop_denominator(input: &str) -> Result<u32, CommandParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("1/")
        .map(str::trim)
        .unwrap_or(trimmed);
    match digits.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(CommandParseError::InvalidDenominator(trimmed.to_string())),
    }
}

fn parse_name_and_count(
    tokens: &[&str],
    verb: CommandVerb,
) -> Result<(String, u32), CommandParseError> {
    let (count, name_tokens) = tokens
        .split_last()
        .ok_or(CommandParseError::MissingArgument {
            verb,
            argument: "monster name",
        })?;
    if name_tokens.is_empty() {
        return Err(CommandParseError::MissingArgument {
            verb,
            argument: "kill count",
        });
    }
    let kills = count
        .parse::<u32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            verb,
            value: count.to_string(),
            source,
        })?;
    Ok((name_tokens.join(" "), kills))
}
