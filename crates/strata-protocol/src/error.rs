//! Protocol error types for command parsing.

use thiserror::Error;

/// Errors detected while turning an argument frame into a [`Command`].
///
/// The `Display` text is the reply a client sees.
///
/// [`Command`]: crate::command::Command
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Too few or too many arguments for the named command.
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    /// An option keyword was unknown, repeated where it can't be, or
    /// combined with something it doesn't support.
    #[error("ERR syntax error")]
    Syntax,

    /// An argument that must be an integer wasn't one.
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    /// An argument that must be a float wasn't one.
    #[error("ERR value is not a valid float")]
    NotAFloat,

    /// The frame itself isn't shaped like a command.
    #[error("ERR {0}")]
    InvalidCommandFrame(String),
}
