//! Member to score lookup.

use ahash::AHashMap;
use bytes::Bytes;

/// O(1) member lookup for a sorted set.
///
/// The `Bytes` key is shared with the ordered index (a refcount bump,
/// not a copy), so each member's bytes are stored once.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemberIndex {
    scores: AHashMap<Bytes, f64>,
}

impl MemberIndex {
    pub(crate) fn get(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Returns the stored key alongside the score, so callers can reuse
    /// the existing allocation instead of the caller's copy.
    pub(crate) fn get_key_value(&self, member: &[u8]) -> Option<(&Bytes, f64)> {
        self.scores.get_key_value(member).map(|(k, &s)| (k, s))
    }

    /// Inserts or overwrites. Returns the previous score.
    pub(crate) fn put(&mut self, member: Bytes, score: f64) -> Option<f64> {
        self.scores.insert(member, score)
    }

    pub(crate) fn remove(&mut self, member: &[u8]) -> Option<(Bytes, f64)> {
        self.scores.remove_entry(member)
    }

    pub(crate) fn len(&self) -> usize {
        self.scores.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
