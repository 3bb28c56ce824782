//! Data type representations for stored values.
//!
//! The sorted set is the engine's real subject; plain strings exist so
//! the keyspace can hold something else and type checks mean something.

pub mod algebra;
pub mod glob;
pub mod range;
pub mod score;
pub mod sorted_set;

use bytes::Bytes;

use sorted_set::SortedSet;

/// A stored value in the keyspace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Binary-safe string data.
    String(Bytes),

    /// Sorted set of unique members, each with a float score.
    /// Boxed to keep the enum small for string-heavy keyspaces.
    SortedSet(Box<SortedSet>),
}

/// Returns the type name for a value, matching Redis TYPE command output.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::SortedSet(_) => "zset",
    }
}

/// Resolves Redis-style inclusive indices against a collection of `len`
/// items. Negative indices count from the end. The start is clamped at
/// zero and the stop at `len - 1`; the caller treats `start > stop` or
/// `start >= len` as an empty range.
pub(crate) fn normalize_range(start: i64, stop: i64, len: i64) -> (i64, i64) {
    let s = if start < 0 { (len + start).max(0) } else { start };
    let e = if stop < 0 { len + stop } else { stop.min(len - 1) };
    (s, e)
}
