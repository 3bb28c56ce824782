//! The rank-addressable ordered index behind a sorted set.
//!
//! Small sets keep a sorted `Vec` searched by binary search: contiguous,
//! cheap to clone, and fast to shift at these sizes. Once a set outgrows
//! its [`CompactLimits`] it moves to a [`SkipList`] and stays there.
//! Callers only see rank and order, never which layout is in use.

use bytes::Bytes;
use ordered_float::OrderedFloat;

use super::skiplist::{self, SkipList};

/// Size thresholds for the compact layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactLimits {
    /// A set with more entries than this uses the skip list.
    pub max_entries: usize,
    /// A member longer than this (in bytes) forces the skip list.
    pub max_member_len: usize,
}

impl CompactLimits {
    /// Returns `true` if a set of `len` entries, whose newest member is
    /// `member_len` bytes long, no longer fits the compact layout.
    pub fn exceeded(&self, len: usize, member_len: usize) -> bool {
        len > self.max_entries || member_len > self.max_member_len
    }
}

impl Default for CompactLimits {
    fn default() -> Self {
        Self {
            max_entries: 128,
            max_member_len: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum OrderedIndex {
    Compact(Vec<(OrderedFloat<f64>, Bytes)>),
    SkipList(SkipList),
}

impl OrderedIndex {
    pub(crate) fn new() -> Self {
        OrderedIndex::Compact(Vec::new())
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            OrderedIndex::Compact(items) => items.len(),
            OrderedIndex::SkipList(list) => list.len(),
        }
    }

    pub(crate) fn is_compact(&self) -> bool {
        matches!(self, OrderedIndex::Compact(_))
    }

    /// Position of `(score, member)` in the compact vec: `Ok` if present,
    /// `Err(insertion_point)` otherwise.
    fn search(items: &[(OrderedFloat<f64>, Bytes)], score: f64, member: &[u8]) -> Result<usize, usize> {
        let score = OrderedFloat(score);
        items.binary_search_by(|(s, m)| s.cmp(&score).then_with(|| (**m).cmp(member)))
    }

    /// Inserts a pair. The caller guarantees the member is not present.
    pub(crate) fn insert(&mut self, score: f64, member: Bytes) {
        match self {
            OrderedIndex::Compact(items) => {
                let idx = Self::search(items, score, &member).unwrap_or_else(|idx| idx);
                items.insert(idx, (OrderedFloat(score), member));
            }
            OrderedIndex::SkipList(list) => list.insert(score, member),
        }
    }

    /// Removes the exact pair. `score` must be the stored score.
    pub(crate) fn remove(&mut self, score: f64, member: &[u8]) -> bool {
        match self {
            OrderedIndex::Compact(items) => match Self::search(items, score, member) {
                Ok(idx) => {
                    items.remove(idx);
                    true
                }
                Err(_) => false,
            },
            OrderedIndex::SkipList(list) => list.remove(score, member),
        }
    }

    /// Zero-based ascending rank of the exact pair.
    pub(crate) fn rank(&self, score: f64, member: &[u8]) -> Option<usize> {
        match self {
            OrderedIndex::Compact(items) => Self::search(items, score, member).ok(),
            OrderedIndex::SkipList(list) => list.rank(score, member),
        }
    }

    /// Number of leading entries satisfying a monotone predicate.
    pub(crate) fn partition_point(&self, mut pred: impl FnMut(f64, &[u8]) -> bool) -> usize {
        match self {
            OrderedIndex::Compact(items) => items.partition_point(|(s, m)| pred(s.0, m)),
            OrderedIndex::SkipList(list) => list.partition_point(pred),
        }
    }

    /// Entries with ranks in `start..end`, ascending or descending.
    pub(crate) fn range(&self, start: usize, end: usize, reverse: bool) -> Iter<'_> {
        match self {
            OrderedIndex::Compact(items) => {
                let end = end.min(items.len());
                let slice = if start < end { &items[start..end] } else { &[][..] };
                if reverse {
                    Iter::CompactRev(slice.iter().rev())
                } else {
                    Iter::Compact(slice.iter())
                }
            }
            OrderedIndex::SkipList(list) => Iter::SkipList(list.range(start, end, reverse)),
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_> {
        match self {
            OrderedIndex::Compact(items) => Iter::Compact(items.iter()),
            OrderedIndex::SkipList(list) => Iter::SkipList(list.iter()),
        }
    }

    /// Moves a compact index onto a skip list. No-op if already converted.
    pub(crate) fn convert_to_skiplist(&mut self) {
        if let OrderedIndex::Compact(items) = self {
            let mut list = SkipList::new();
            for (score, member) in items.drain(..) {
                list.insert(score.0, member);
            }
            *self = OrderedIndex::SkipList(list);
        }
    }
}

/// Iterator over `(score, member)` pairs of an [`OrderedIndex`].
pub(crate) enum Iter<'a> {
    Compact(std::slice::Iter<'a, (OrderedFloat<f64>, Bytes)>),
    CompactRev(std::iter::Rev<std::slice::Iter<'a, (OrderedFloat<f64>, Bytes)>>),
    SkipList(skiplist::Iter<'a>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = (f64, &'a Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Compact(it) => it.next().map(|(s, m)| (s.0, m)),
            Iter::CompactRev(it) => it.next().map(|(s, m)| (s.0, m)),
            Iter::SkipList(it) => it.next(),
        }
    }
}
