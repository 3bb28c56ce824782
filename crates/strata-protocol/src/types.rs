//! Reply and argument frame types.
//!
//! The [`Frame`] enum represents a single value in the Redis data model.
//! Bulk strings use `Bytes` so members and scores move from the engine
//! to the reply without extra copies. There is no wire encoding here;
//! frames are rendered by whoever owns the output.

use bytes::Bytes;

/// A single protocol value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Simple status string, e.g. `OK`.
    Simple(String),

    /// Error reply. The text carries its own `ERR`/`WRONGTYPE` prefix.
    Error(String),

    /// 64-bit signed integer.
    Integer(i64),

    /// Bulk (binary-safe) string.
    Bulk(Bytes),

    /// Ordered array of frames.
    Array(Vec<Frame>),

    /// Null value: a missing key or member.
    Null,

    /// Ordered map of key-value frame pairs.
    Map(Vec<(Frame, Frame)>),
}

impl Frame {
    /// Returns `true` if this frame is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Frame::Null)
    }

    /// Builds a bulk frame from anything byte-like.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Frame::Bulk(data.into())
    }

    /// Builds an array of bulk frames, the usual shape of a range reply.
    pub fn bulk_array(items: impl IntoIterator<Item = Bytes>) -> Self {
        Frame::Array(items.into_iter().map(Frame::Bulk).collect())
    }

    pub fn ok() -> Self {
        Frame::Simple("OK".into())
    }
}
