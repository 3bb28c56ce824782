//! Sorted set data structure: dual-indexed by score and member.
//!
//! Each member is a unique byte string with an associated `f64` score.
//! Members are ordered by (score, member): ties in score are broken by
//! raw byte comparison, matching Redis semantics.
//!
//! Two indexes are kept in lockstep:
//! - a [`MemberIndex`] hash map for O(1) member to score lookups
//! - an [`OrderedIndex`] for rank queries, range scans, and iteration
//!
//! Every mutating method updates both before returning, so no caller
//! ever observes them disagreeing. Member bytes are shared between the
//! two through `Bytes`, so each member is stored once on the heap.

mod index;
mod members;
pub(crate) mod skiplist;

use bytes::Bytes;
use tracing::debug;

use crate::error::ZSetError;
use crate::types::glob::GlobPattern;

pub use index::CompactLimits;
use index::OrderedIndex;
use members::MemberIndex;

/// A member with its score, as returned by range queries and pops.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub member: Bytes,
    pub score: f64,
}

impl Entry {
    pub fn new(member: impl Into<Bytes>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// Flags that control ZADD behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZAddFlags {
    /// Only add new members, don't update existing scores.
    pub nx: bool,
    /// Only update existing members, don't add new ones.
    pub xx: bool,
    /// Only update when new score > current score.
    pub gt: bool,
    /// Only update when new score < current score.
    pub lt: bool,
    /// Return count of changed members (added + updated) instead of just added.
    pub ch: bool,
}

impl ZAddFlags {
    /// Rejects flag combinations that can never apply.
    pub fn validate(&self) -> Result<(), ZSetError> {
        if self.nx && self.xx {
            return Err(ZSetError::IncompatibleOptions(
                "XX and NX options at the same time are not compatible",
            ));
        }
        if (self.gt && self.lt) || (self.nx && (self.gt || self.lt)) {
            return Err(ZSetError::IncompatibleOptions(
                "GT, LT, and/or NX options at the same time are not compatible",
            ));
        }
        Ok(())
    }

    /// Whether a write of `new` over `current` (`None` if absent) passes
    /// the NX/XX/GT/LT conditions.
    fn permits(&self, current: Option<f64>, new: f64) -> bool {
        match current {
            None => !self.xx,
            Some(old) => !self.nx && !(self.gt && new <= old) && !(self.lt && new >= old),
        }
    }
}

/// Result of a single ZADD member operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddResult {
    /// Whether a new member was added.
    pub added: bool,
    /// Whether an existing member's score was changed.
    pub updated: bool,
}

impl AddResult {
    /// No change: member was neither added nor updated.
    pub const UNCHANGED: Self = Self {
        added: false,
        updated: false,
    };

    /// How much this result contributes to the ZADD reply count.
    pub fn count_for(&self, flags: &ZAddFlags) -> usize {
        let counted = if flags.ch {
            self.added || self.updated
        } else {
            self.added
        };
        usize::from(counted)
    }
}

/// A sorted set of unique byte-string members, each with a float score.
///
/// Members are ordered by `(score, member)`. Rank is the position in
/// this ordering (0-based, lowest score first).
#[derive(Debug, Clone)]
pub struct SortedSet {
    members: MemberIndex,
    index: OrderedIndex,
    limits: CompactLimits,
}

impl SortedSet {
    /// Creates an empty sorted set with default compact limits.
    pub fn new() -> Self {
        Self::with_limits(CompactLimits::default())
    }

    /// Creates an empty sorted set that leaves the compact layout once
    /// `limits` are exceeded.
    pub fn with_limits(limits: CompactLimits) -> Self {
        Self {
            members: MemberIndex::default(),
            index: OrderedIndex::new(),
            limits,
        }
    }

    /// Adds or updates a member with the given score.
    pub fn add(&mut self, member: impl Into<Bytes>, score: f64) -> Result<AddResult, ZSetError> {
        self.add_with_flags(member, score, &ZAddFlags::default())
    }

    /// Adds or updates a member with ZADD flag semantics.
    ///
    /// Re-adding a member with its current score is neither an add nor
    /// an update. A NaN score is rejected and the set is left untouched.
    pub fn add_with_flags(
        &mut self,
        member: impl Into<Bytes>,
        score: f64,
        flags: &ZAddFlags,
    ) -> Result<AddResult, ZSetError> {
        if score.is_nan() {
            return Err(ZSetError::InvalidScore);
        }
        let member = member.into();
        let current = self.members.get(&member);
        if !flags.permits(current, score) {
            return Ok(AddResult::UNCHANGED);
        }
        match current {
            Some(old) if old == score => Ok(AddResult::UNCHANGED),
            Some(old) => {
                self.rescore(&member, old, score);
                Ok(AddResult {
                    added: false,
                    updated: true,
                })
            }
            None => {
                self.insert_new(member, score);
                Ok(AddResult {
                    added: true,
                    updated: false,
                })
            }
        }
    }

    /// Adds `delta` to a member's score (0 if absent) and returns the new
    /// score.
    ///
    /// Returns `Ok(None)` when the flags veto the write: NX on an existing
    /// member, XX on a missing one, or a GT/LT comparison that fails.
    /// A NaN delta or a NaN result is an error and changes nothing.
    pub fn incr(
        &mut self,
        member: impl Into<Bytes>,
        delta: f64,
        flags: &ZAddFlags,
    ) -> Result<Option<f64>, ZSetError> {
        if delta.is_nan() {
            return Err(ZSetError::InvalidScore);
        }
        let member = member.into();
        let current = self.members.get(&member);
        let score = current.unwrap_or(0.0) + delta;
        if score.is_nan() {
            return Err(ZSetError::NaNResult);
        }
        if !flags.permits(current, score) {
            return Ok(None);
        }
        match current {
            Some(old) if old == score => {}
            Some(old) => self.rescore(&member, old, score),
            None => self.insert_new(member, score),
        }
        Ok(Some(score))
    }

    fn insert_new(&mut self, member: Bytes, score: f64) {
        let member_len = member.len();
        self.members.put(member.clone(), score);
        self.index.insert(score, member);
        if self.index.is_compact() && self.limits.exceeded(self.index.len(), member_len) {
            debug!(
                len = self.index.len(),
                member_len, "sorted set outgrew compact layout, converting to skip list"
            );
            self.index.convert_to_skiplist();
        }
    }

    fn rescore(&mut self, member: &[u8], old: f64, new: f64) {
        // reuse the stored key so the index keeps sharing one allocation
        let Some((stored, _)) = self.members.get_key_value(member) else {
            return;
        };
        let stored = stored.clone();
        self.index.remove(old, &stored);
        self.members.put(stored.clone(), new);
        self.index.insert(new, stored);
    }

    /// Removes a member. Returns `true` if it existed.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.members.remove(member) {
            Some((stored, score)) => {
                self.index.remove(score, &stored);
                true
            }
            None => false,
        }
    }

    /// Removes every listed member that exists. Returns how many were removed.
    pub fn remove_many<M: AsRef<[u8]>>(&mut self, members: &[M]) -> usize {
        members.iter().filter(|m| self.remove(m.as_ref())).count()
    }

    /// Returns the score for a member, or `None` if not present.
    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.members.get(member)
    }

    /// Looks up several members at once, `None` for each one missing.
    pub fn mscore<M: AsRef<[u8]>>(&self, members: &[M]) -> Vec<Option<f64>> {
        members.iter().map(|m| self.score(m.as_ref())).collect()
    }

    /// Returns the 0-based rank of a member. Rank 0 is the lowest entry,
    /// or the highest when `reverse` is set.
    pub fn rank(&self, member: &[u8], reverse: bool) -> Option<usize> {
        let (stored, score) = self.members.get_key_value(member)?;
        let rank = self.index.rank(score, stored)?;
        Some(if reverse { self.len() - 1 - rank } else { rank })
    }

    /// Returns members in the given rank range, inclusive on both ends.
    /// Negative indices count from the end: -1 is the last entry. With
    /// `reverse`, indices address the descending order.
    pub fn range_by_rank(&self, start: i64, stop: i64, reverse: bool) -> Vec<Entry> {
        let (lo, hi) = self.rank_window(start, stop, reverse);
        self.collect(lo, hi, reverse)
    }

    /// Translates an inclusive (possibly negative) rank range into an
    /// ascending half-open window `lo..hi`. Empty windows have `lo >= hi`.
    pub(crate) fn rank_window(&self, start: i64, stop: i64, reverse: bool) -> (usize, usize) {
        let len = self.len() as i64;
        let (s, e) = super::normalize_range(start, stop, len);
        if s > e || s >= len {
            return (0, 0);
        }
        let (s, e) = (s as usize, e as usize);
        if reverse {
            let len = len as usize;
            (len - 1 - e, len - s)
        } else {
            (s, e + 1)
        }
    }

    /// Clones entries with ranks in `lo..hi` in the requested direction.
    pub(crate) fn collect(&self, lo: usize, hi: usize, reverse: bool) -> Vec<Entry> {
        self.index
            .range(lo, hi, reverse)
            .map(|(score, member)| Entry {
                member: member.clone(),
                score,
            })
            .collect()
    }

    /// Removes every entry with rank in `lo..hi`. Returns the count.
    pub(crate) fn remove_window(&mut self, lo: usize, hi: usize) -> usize {
        let doomed = self.collect(lo, hi, false);
        for entry in &doomed {
            self.members.remove(&entry.member);
            self.index.remove(entry.score, &entry.member);
        }
        doomed.len()
    }

    /// Number of leading entries satisfying a monotone predicate.
    pub(crate) fn partition_point(&self, pred: impl FnMut(f64, &[u8]) -> bool) -> usize {
        self.index.partition_point(pred)
    }

    /// Removes and returns up to `count` entries from the low end, or
    /// from the high end when `max` is set. Highest-first for `max`.
    pub fn pop(&mut self, count: usize, max: bool) -> Vec<Entry> {
        let len = self.len();
        let take = count.min(len);
        let popped = if max {
            self.collect(len - take, len, true)
        } else {
            self.collect(0, take, false)
        };
        for entry in &popped {
            self.members.remove(&entry.member);
            self.index.remove(entry.score, &entry.member);
        }
        popped
    }

    /// One ZSCAN step: visits up to `count` entries starting at rank
    /// `cursor` and keeps those whose member matches `pattern`.
    ///
    /// Returns the next cursor, or 0 once the walk reaches the end. A
    /// cursor past the end finishes immediately. Members removed behind
    /// the cursor mid-scan shift later ranks down, so a scan may skip
    /// entries that move across it.
    pub fn scan(
        &self,
        cursor: usize,
        count: usize,
        pattern: Option<&GlobPattern>,
    ) -> (usize, Vec<Entry>) {
        let end = cursor.saturating_add(count.max(1)).min(self.len());
        let mut batch = self.collect(cursor, end, false);
        if let Some(pattern) = pattern.filter(|p| !p.matches_all()) {
            batch.retain(|entry| pattern.matches(&entry.member));
        }
        let next = if end >= self.len() { 0 } else { end };
        (next, batch)
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the sorted set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns an iterator over (member, score) pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.index.iter().map(|(score, member)| (member, score))
    }

    /// Name of the internal layout, as OBJECT ENCODING would report it.
    pub fn encoding(&self) -> &'static str {
        if self.index.is_compact() {
            "listpack"
        } else {
            "skiplist"
        }
    }

    /// Checks that both indexes hold the same entries in sorted order.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.members.len(), self.index.len(), "index sizes differ");
        let mut prev: Option<(f64, Bytes)> = None;
        for (score, member) in self.index.iter() {
            assert_eq!(self.members.get(member), Some(score), "score mismatch");
            if let Some((ps, pm)) = &prev {
                assert_eq!(
                    super::score::compare(*ps, pm, score, member),
                    std::cmp::Ordering::Less,
                    "order violated"
                );
            }
            prev = Some((score, member.clone()));
        }
        if let OrderedIndex::SkipList(list) = &self.index {
            list.check_invariants();
        }
    }
}

impl Default for SortedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SortedSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
