use thiserror::Error;

/// Failure to split an input line into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A quoted word has no matching closing quote followed by a blank or
    /// the end of the line.
    #[error("unterminated quote at byte {offset}")]
    UnterminatedQuote { offset: usize },
}

/// Reasons a command definition is refused by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("command \"{0}\" is already registered")]
    DuplicateName(String),
    /// A required argument follows an optional one.
    #[error("bad arguments for command \"{0}\": required argument after optional one")]
    BadArgumentOrder(String),
    #[error("command \"{name}\" declares {count} arguments, at most {max} are supported", max = crate::registry::MAX_ARGS)]
    TooManyArguments { name: String, count: usize },
}
