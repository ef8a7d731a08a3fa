use std::borrow::Cow;
use std::io::Write;

use tracing::debug;

use crate::parser::{Mode, tokenize};
use crate::registry::Registry;
use crate::validate::{Rejection, validate};

/// Result of executing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The line was empty or blank.
    Empty,
    /// The line could not be split into words.
    ParseError,
    /// The first word names no registered command.
    UnknownCommand,
    /// An argument failed validation; the command was not run.
    InvalidArgument {
        slot: usize,
        diagnostic: Option<String>,
    },
    /// The command ran and returned this status.
    Executed(i32),
}

impl Outcome {
    /// Text to show the user, if any.
    pub fn message(&self) -> Option<Cow<'_, str>> {
        match self {
            Outcome::Empty | Outcome::Executed(_) => None,
            Outcome::ParseError => Some("Error while parsing command.".into()),
            Outcome::UnknownCommand => Some("Unrecognized command.".into()),
            Outcome::InvalidArgument {
                diagnostic: Some(text),
                ..
            } => Some(text.as_str().into()),
            Outcome::InvalidArgument {
                diagnostic: None, ..
            } => Some("Invalid argument(s).".into()),
        }
    }
}

/// Parses, binds, validates and runs one input line.
///
/// Words past the command's arity are ignored. Validation stops at the first
/// refused argument. The command's output goes to `out`.
pub fn execute(registry: &Registry, line: &str, out: &mut dyn Write) -> Outcome {
    let words = match tokenize(line, Mode::Strict) {
        Ok(words) => words,
        Err(err) => {
            debug!(%err, "parse failed");
            return Outcome::ParseError;
        }
    };
    let Some(first) = words.first() else {
        return Outcome::Empty;
    };

    let Some(command) = registry.lookup(&first.text) else {
        debug!(name = %first.text, "unknown command");
        return Outcome::UnknownCommand;
    };

    // the command receives exactly the values the validator checked
    let bound = command.bind(&words);
    let mut args = Vec::with_capacity(bound.len());
    for (slot, (value, spec)) in bound.iter().zip(command.specs()).enumerate() {
        match validate(value.as_deref(), *spec) {
            Ok(checked) => args.push(checked.map(str::to_string)),
            Err(rejection) => {
                debug!(command = command.name(), slot, ?rejection, "argument refused");
                let diagnostic = match rejection {
                    Rejection::Diagnosed(text) => Some(text),
                    Rejection::Missing | Rejection::Malformed => None,
                };
                return Outcome::InvalidArgument { slot, diagnostic };
            }
        }
    }

    let status = command.invoke(&args, out);
    debug!(command = command.name(), status, "command finished");
    Outcome::Executed(status)
}
