//! Span-augmented skip list for large sorted sets.
//!
//! Nodes live in an arena (`Vec<Node>`) and link to each other by index,
//! so there is no unsafe code and no per-node allocation beyond the
//! level vector. Slot 0 is the header; freed slots are recycled.
//!
//! Each forward link records its *span*: how many level-0 steps it
//! skips. Summing spans along a search path gives the rank of the node
//! reached, which makes rank lookup and rank selection O(log n).
//!
//! Level distribution: every node has level 1; each further level is
//! granted with probability 1/4, capped at [`MAX_LEVEL`].

use std::cmp::Ordering;

use bytes::Bytes;
use rand::Rng;

use crate::types::score;

/// Upper bound on node height. Enough for 4^32 entries.
pub(crate) const MAX_LEVEL: usize = 32;

/// Arena slot of the header node.
const HEAD: usize = 0;

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    forward: Option<usize>,
    /// Number of level-0 nodes between this node and `forward`,
    /// counting `forward` itself. For a `None` link it counts the
    /// nodes remaining after this one.
    span: usize,
}

#[derive(Debug, Clone)]
struct Node {
    score: f64,
    member: Bytes,
    backward: Option<usize>,
    levels: Vec<Link>,
}

/// An ordered list of `(score, member)` pairs with O(log n) rank access.
#[derive(Debug, Clone)]
pub(crate) struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    tail: Option<usize>,
    level: usize,
    len: usize,
}

impl SkipList {
    pub(crate) fn new() -> Self {
        let head = Node {
            score: f64::NEG_INFINITY,
            member: Bytes::new(),
            backward: None,
            levels: vec![Link::default(); MAX_LEVEL],
        };
        Self {
            nodes: vec![head],
            free: Vec::new(),
            tail: None,
            level: 1,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn forward(&self, node: usize, level: usize) -> Option<usize> {
        self.nodes[node].levels[level].forward
    }

    fn span(&self, node: usize, level: usize) -> usize {
        self.nodes[node].levels[level].span
    }

    /// Orders the node at `idx` against the target pair.
    fn cmp_node(&self, idx: usize, score: f64, member: &[u8]) -> Ordering {
        let node = &self.nodes[idx];
        score::compare(node.score, &node.member, score, member)
    }

    fn random_level() -> usize {
        let mut rng = rand::rng();
        let mut level = 1;
        while level < MAX_LEVEL && rng.random_range(0..4) == 0 {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, score: f64, member: Bytes, level: usize) -> usize {
        let node = Node {
            score,
            member,
            backward: None,
            levels: vec![Link::default(); level],
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        let node = &mut self.nodes[idx];
        node.member = Bytes::new();
        node.levels = Vec::new();
        node.backward = None;
        self.free.push(idx);
    }

    /// Inserts a pair. The caller guarantees the member is not present.
    pub(crate) fn insert(&mut self, score: f64, member: Bytes) {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.forward(x, i) {
                if self.cmp_node(next, score, &member) != Ordering::Less {
                    break;
                }
                rank[i] += self.span(x, i);
                x = next;
            }
            update[i] = x;
        }

        let level = Self::random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEAD;
                self.nodes[HEAD].levels[i] = Link {
                    forward: None,
                    span: self.len,
                };
            }
            self.level = level;
        }

        let new = self.alloc(score, member, level);
        for i in 0..level {
            let prev = update[i];
            let prev_link = self.nodes[prev].levels[i];
            let behind = rank[0] - rank[i];
            self.nodes[new].levels[i] = Link {
                forward: prev_link.forward,
                span: prev_link.span - behind,
            };
            self.nodes[prev].levels[i] = Link {
                forward: Some(new),
                span: behind + 1,
            };
        }
        // taller links now jump over one more node
        for i in level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.nodes[new].backward = if update[0] == HEAD {
            None
        } else {
            Some(update[0])
        };
        match self.forward(new, 0) {
            Some(next) => self.nodes[next].backward = Some(new),
            None => self.tail = Some(new),
        }
        self.len += 1;
    }

    /// Removes the pair with exactly this score and member. Returns
    /// `false` if no such node exists.
    pub(crate) fn remove(&mut self, score: f64, member: &[u8]) -> bool {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if self.cmp_node(next, score, member) != Ordering::Less {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }

        let Some(target) = self.forward(x, 0) else {
            return false;
        };
        if self.cmp_node(target, score, member) != Ordering::Equal {
            return false;
        }

        for (i, &prev) in update.iter().enumerate().take(self.level) {
            if self.forward(prev, i) == Some(target) {
                let target_link = self.nodes[target].levels[i];
                let link = &mut self.nodes[prev].levels[i];
                link.span = link.span + target_link.span - 1;
                link.forward = target_link.forward;
            } else {
                self.nodes[prev].levels[i].span -= 1;
            }
        }

        let backward = self.nodes[target].backward;
        match self.forward(target, 0) {
            Some(next) => self.nodes[next].backward = backward,
            None => self.tail = backward,
        }
        while self.level > 1 && self.forward(HEAD, self.level - 1).is_none() {
            self.level -= 1;
        }
        self.len -= 1;
        self.release(target);
        true
    }

    /// Zero-based rank of the exact pair, if present.
    pub(crate) fn rank(&self, score: f64, member: &[u8]) -> Option<usize> {
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if self.cmp_node(next, score, member) == Ordering::Greater {
                    break;
                }
                traversed += self.span(x, i);
                x = next;
            }
            if x != HEAD && self.cmp_node(x, score, member) == Ordering::Equal {
                return Some(traversed - 1);
            }
        }
        None
    }

    /// Number of leading entries for which `pred` holds. `pred` must be
    /// monotone over the list order: true for a prefix, false after.
    pub(crate) fn partition_point(&self, mut pred: impl FnMut(f64, &[u8]) -> bool) -> usize {
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                let node = &self.nodes[next];
                if !pred(node.score, &node.member) {
                    break;
                }
                traversed += self.span(x, i);
                x = next;
            }
        }
        traversed
    }

    /// Arena slot of the node at zero-based `rank`.
    fn node_at(&self, rank: usize) -> Option<usize> {
        if rank >= self.len {
            return None;
        }
        let target = rank + 1;
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if traversed + self.span(x, i) > target {
                    break;
                }
                traversed += self.span(x, i);
                x = next;
            }
            if traversed == target {
                return Some(x);
            }
        }
        None
    }

    /// Iterates ranks `start..end` ascending, or descending when `reverse`.
    pub(crate) fn range(&self, start: usize, end: usize, reverse: bool) -> Iter<'_> {
        let end = end.min(self.len);
        if start >= end {
            return Iter {
                list: self,
                cursor: None,
                remaining: 0,
                reverse,
            };
        }
        let first = if reverse { end - 1 } else { start };
        Iter {
            list: self,
            cursor: self.node_at(first),
            remaining: end - start,
            reverse,
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.forward(HEAD, 0),
            remaining: self.len,
            reverse: false,
        }
    }

    /// Walks every level and checks links, spans, and ordering. Panics on
    /// the first broken invariant.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut ranks = std::collections::HashMap::new();
        let mut prev: Option<usize> = None;
        let mut cursor = self.forward(HEAD, 0);
        let mut count = 0;
        while let Some(idx) = cursor {
            count += 1;
            ranks.insert(idx, count);
            assert_eq!(self.nodes[idx].backward, prev, "backward link");
            if let Some(p) = prev {
                let (a, b) = (&self.nodes[p], &self.nodes[idx]);
                assert_eq!(
                    score::compare(a.score, &a.member, b.score, &b.member),
                    Ordering::Less,
                    "order"
                );
            }
            prev = Some(idx);
            cursor = self.forward(idx, 0);
        }
        assert_eq!(count, self.len, "length");
        assert_eq!(self.tail, prev, "tail");

        for level in 0..self.level {
            let mut x = HEAD;
            let mut pos = 0;
            loop {
                let span = self.span(x, level);
                match self.forward(x, level) {
                    Some(next) => {
                        assert_eq!(pos + span, ranks[&next], "span at level {level}");
                        pos = ranks[&next];
                        x = next;
                    }
                    None => {
                        assert_eq!(pos + span, self.len, "tail span at level {level}");
                        break;
                    }
                }
            }
        }
    }
}

/// Iterator over a contiguous rank window of a [`SkipList`].
pub(crate) struct Iter<'a> {
    list: &'a SkipList,
    cursor: Option<usize>,
    remaining: usize,
    reverse: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (f64, &'a Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.cursor?;
        let node = &self.list.nodes[idx];
        self.cursor = if self.reverse {
            node.backward
        } else {
            node.levels[0].forward
        };
        self.remaining -= 1;
        Some((node.score, &node.member))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
