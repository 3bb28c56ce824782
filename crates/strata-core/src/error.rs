//! Error types for the sorted-set engine.

use thiserror::Error;

/// Errors returned by sorted-set and keyspace operations.
///
/// Every variant is detected before any state changes, so a failed
/// command leaves the keyspace exactly as it found it. The `Display`
/// text is what the command layer sends back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZSetError {
    /// The key holds a value that is not a sorted set.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// A score argument is not a number, or is NaN.
    #[error("ERR value is not a valid float")]
    InvalidScore,

    /// A score range endpoint could not be parsed.
    #[error("ERR min or max is not a double")]
    InvalidRangeScore,

    /// An increment would have produced NaN (e.g. `+inf` plus `-inf`).
    #[error("ERR resulting score is not a number (NaN)")]
    NaNResult,

    /// A lex range endpoint is not `-`, `+`, `[value` or `(value`.
    #[error("ERR min or max is an illegal string range item")]
    InvalidLexRange,

    /// ZADD flags that cannot be combined.
    #[error("ERR {0}")]
    IncompatibleOptions(&'static str),

    /// ZADD INCR was given more than one score/member pair.
    #[error("ERR INCR option supports a single increment-element pair")]
    IncrMultiplicity,

    /// A WEIGHTS entry was NaN.
    #[error("ERR weight value is not a double")]
    InvalidWeight,
}
