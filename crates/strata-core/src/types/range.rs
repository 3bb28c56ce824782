//! Range queries over a sorted set: by rank, by score, and by lex.
//!
//! Every query reduces to an ascending rank window `lo..hi`. Score and
//! lex bounds become two `partition_point` searches on the ordered
//! index; rank bounds are resolved arithmetically. LIMIT then trims the
//! window from whichever end the query reads from, and the surviving
//! ranks are fetched forward or backward. The same windows drive counts
//! and range removals, so all three always agree.

use bytes::Bytes;

use crate::error::ZSetError;
use crate::types::score::{format_score, parse_float};
use crate::types::sorted_set::{Entry, SortedSet};

/// One end of a score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBound {
    pub value: f64,
    pub exclusive: bool,
}

impl ScoreBound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: true,
        }
    }

    /// Parses `1.5`, `(1.5`, `-inf`, `+inf`, `(+inf` and friends.
    pub fn parse(raw: &[u8]) -> Result<Self, ZSetError> {
        let (exclusive, body) = match raw.split_first() {
            Some((b'(', rest)) => (true, rest),
            _ => (false, raw),
        };
        let value = std::str::from_utf8(body)
            .ok()
            .and_then(parse_float)
            .ok_or(ZSetError::InvalidRangeScore)?;
        Ok(Self { value, exclusive })
    }
}

/// A score interval with independently inclusive or exclusive ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl ScoreRange {
    pub fn new(min: ScoreBound, max: ScoreBound) -> Self {
        Self { min, max }
    }

    /// Every score, `-inf` through `+inf` inclusive.
    pub fn all() -> Self {
        Self::new(
            ScoreBound::inclusive(f64::NEG_INFINITY),
            ScoreBound::inclusive(f64::INFINITY),
        )
    }

    /// Parses a `min max` token pair.
    pub fn parse(min: &[u8], max: &[u8]) -> Result<Self, ZSetError> {
        Ok(Self::new(ScoreBound::parse(min)?, ScoreBound::parse(max)?))
    }

    fn below_min(&self, score: f64) -> bool {
        if self.min.exclusive {
            score <= self.min.value
        } else {
            score < self.min.value
        }
    }

    fn within_max(&self, score: f64) -> bool {
        if self.max.exclusive {
            score < self.max.value
        } else {
            score <= self.max.value
        }
    }

    fn window(&self, set: &SortedSet) -> (usize, usize) {
        let lo = set.partition_point(|score, _| self.below_min(score));
        let hi = set.partition_point(|score, _| self.within_max(score));
        (lo, hi.max(lo))
    }
}

/// One end of a lexicographic range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexBound {
    /// `-`: below every member.
    NegInf,
    /// `+`: above every member.
    PosInf,
    /// `[value`
    Inclusive(Bytes),
    /// `(value`
    Exclusive(Bytes),
}

impl LexBound {
    /// Parses `-`, `+`, `[value` or `(value`. Anything else is an error,
    /// including `+x` and `-x`.
    pub fn parse(raw: &Bytes) -> Result<Self, ZSetError> {
        match raw.first() {
            Some(b'-') if raw.len() == 1 => Ok(LexBound::NegInf),
            Some(b'+') if raw.len() == 1 => Ok(LexBound::PosInf),
            Some(b'[') => Ok(LexBound::Inclusive(raw.slice(1..))),
            Some(b'(') => Ok(LexBound::Exclusive(raw.slice(1..))),
            _ => Err(ZSetError::InvalidLexRange),
        }
    }
}

/// A member interval, meaningful when all scores in the set are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexRange {
    pub min: LexBound,
    pub max: LexBound,
}

impl LexRange {
    pub fn new(min: LexBound, max: LexBound) -> Self {
        Self { min, max }
    }

    /// Parses a `min max` token pair.
    pub fn parse(min: &Bytes, max: &Bytes) -> Result<Self, ZSetError> {
        Ok(Self::new(LexBound::parse(min)?, LexBound::parse(max)?))
    }

    fn below_min(&self, member: &[u8]) -> bool {
        match &self.min {
            LexBound::NegInf => false,
            LexBound::PosInf => true,
            LexBound::Inclusive(v) => member < &v[..],
            LexBound::Exclusive(v) => member <= &v[..],
        }
    }

    fn within_max(&self, member: &[u8]) -> bool {
        match &self.max {
            LexBound::NegInf => false,
            LexBound::PosInf => true,
            LexBound::Inclusive(v) => member <= &v[..],
            LexBound::Exclusive(v) => member < &v[..],
        }
    }

    fn window(&self, set: &SortedSet) -> (usize, usize) {
        let lo = set.partition_point(|_, member| self.below_min(member));
        let hi = set.partition_point(|_, member| self.within_max(member));
        (lo, hi.max(lo))
    }
}

/// `LIMIT offset count`. A negative count means "no limit"; a negative
/// offset selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

impl Limit {
    pub const NONE: Limit = Limit {
        offset: 0,
        count: -1,
    };

    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset, count }
    }

    /// Trims the ascending window `lo..hi`, counting the offset from the
    /// end the query reads from.
    fn clip(&self, lo: usize, hi: usize, reverse: bool) -> (usize, usize) {
        if self.offset < 0 {
            return (lo, lo);
        }
        let available = hi - lo;
        let skip = usize::try_from(self.offset).map_or(available, |o| o.min(available));
        let rest = available - skip;
        let take = match usize::try_from(self.count) {
            Ok(count) => count.min(rest),
            Err(_) => rest,
        };
        if reverse {
            (hi - skip - take, hi - skip)
        } else {
            (lo + skip, lo + skip + take)
        }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::NONE
    }
}

/// What a range query selects on.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeKind {
    /// Inclusive rank indices; negative values count from the end.
    Rank { start: i64, stop: i64 },
    Score(ScoreRange),
    Lex(LexRange),
}

/// A fully-resolved range request: selection, direction, and LIMIT.
///
/// The legacy commands (ZREVRANGE, ZRANGEBYSCORE, ...) and the unified
/// ZRANGE form all build one of these, so they cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub kind: RangeKind,
    pub reverse: bool,
    pub limit: Limit,
}

impl RangeQuery {
    pub fn by_rank(start: i64, stop: i64) -> Self {
        Self::new(RangeKind::Rank { start, stop })
    }

    pub fn by_score(range: ScoreRange) -> Self {
        Self::new(RangeKind::Score(range))
    }

    pub fn by_lex(range: LexRange) -> Self {
        Self::new(RangeKind::Lex(range))
    }

    fn new(kind: RangeKind) -> Self {
        Self {
            kind,
            reverse: false,
            limit: Limit::NONE,
        }
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn limited(mut self, limit: Limit) -> Self {
        self.limit = limit;
        self
    }

    /// Lex queries never carry scores in their replies.
    pub fn allows_scores(&self) -> bool {
        !matches!(self.kind, RangeKind::Lex(_))
    }

    fn window(&self, set: &SortedSet) -> (usize, usize) {
        let (lo, hi) = match &self.kind {
            RangeKind::Rank { start, stop } => set.rank_window(*start, *stop, self.reverse),
            RangeKind::Score(range) => range.window(set),
            RangeKind::Lex(range) => range.window(set),
        };
        self.limit.clip(lo, hi, self.reverse)
    }

    /// Returns the selected entries in reply order.
    pub fn execute(&self, set: &SortedSet) -> Vec<Entry> {
        let (lo, hi) = self.window(set);
        set.collect(lo, hi, self.reverse)
    }

    /// Number of entries the query would return.
    pub fn count(&self, set: &SortedSet) -> usize {
        let (lo, hi) = self.window(set);
        hi - lo
    }

    /// Removes the selected entries. Returns how many were removed.
    pub fn remove(&self, set: &mut SortedSet) -> usize {
        let (lo, hi) = self.window(set);
        set.remove_window(lo, hi)
    }
}

impl SortedSet {
    /// Entries whose score lies in `range`, ascending or descending.
    pub fn range_by_score(&self, range: &ScoreRange, reverse: bool, limit: Limit) -> Vec<Entry> {
        RangeQuery::by_score(*range)
            .reversed(reverse)
            .limited(limit)
            .execute(self)
    }

    /// Entries whose member lies in `range`, ascending or descending.
    pub fn range_by_lex(&self, range: &LexRange, reverse: bool, limit: Limit) -> Vec<Entry> {
        RangeQuery::by_lex(range.clone())
            .reversed(reverse)
            .limited(limit)
            .execute(self)
    }

    pub fn count_by_score(&self, range: &ScoreRange) -> usize {
        RangeQuery::by_score(*range).count(self)
    }

    pub fn count_by_lex(&self, range: &LexRange) -> usize {
        RangeQuery::by_lex(range.clone()).count(self)
    }

    pub fn remove_range_by_rank(&mut self, start: i64, stop: i64) -> usize {
        RangeQuery::by_rank(start, stop).remove(self)
    }

    pub fn remove_range_by_score(&mut self, range: &ScoreRange) -> usize {
        RangeQuery::by_score(*range).remove(self)
    }

    pub fn remove_range_by_lex(&mut self, range: &LexRange) -> usize {
        RangeQuery::by_lex(range.clone()).remove(self)
    }
}

/// Flattens entries into reply elements: members only, or alternating
/// member and formatted score.
pub fn flatten(entries: Vec<Entry>, with_scores: bool) -> Vec<Bytes> {
    let mut out = Vec::with_capacity(if with_scores {
        entries.len() * 2
    } else {
        entries.len()
    });
    for entry in entries {
        out.push(entry.member);
        if with_scores {
            out.push(Bytes::from(format_score(entry.score)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, f64)]) -> SortedSet {
        let mut ss = SortedSet::new();
        for (m, s) in pairs {
            ss.add(m.to_string(), *s).unwrap();
        }
        ss
    }

    fn names(entries: Vec<Entry>) -> Vec<String> {
        entries
            .into_iter()
            .map(|e| String::from_utf8_lossy(&e.member).into_owned())
            .collect()
    }

    fn lex(min: &'static str, max: &'static str) -> LexRange {
        LexRange::parse(&Bytes::from_static(min.as_bytes()), &Bytes::from_static(max.as_bytes()))
            .unwrap()
    }

    fn score_range(min: &str, max: &str) -> ScoreRange {
        ScoreRange::parse(min.as_bytes(), max.as_bytes()).unwrap()
    }

    fn alphabet() -> SortedSet {
        set(&[
            ("a", 0.0),
            ("b", 0.0),
            ("c", 0.0),
            ("d", 0.0),
            ("e", 0.0),
            ("f", 0.0),
            ("g", 0.0),
        ])
    }

    #[test]
    fn score_bound_parsing() {
        assert_eq!(ScoreBound::parse(b"1.5").unwrap(), ScoreBound::inclusive(1.5));
        assert_eq!(ScoreBound::parse(b"(1.5").unwrap(), ScoreBound::exclusive(1.5));
        assert_eq!(
            ScoreBound::parse(b"-inf").unwrap(),
            ScoreBound::inclusive(f64::NEG_INFINITY)
        );
        assert_eq!(
            ScoreBound::parse(b"(+inf").unwrap(),
            ScoreBound::exclusive(f64::INFINITY)
        );
        assert_eq!(ScoreBound::parse(b"str"), Err(ZSetError::InvalidRangeScore));
        assert_eq!(ScoreBound::parse(b"("), Err(ZSetError::InvalidRangeScore));
        assert_eq!(ScoreBound::parse(b"nan"), Err(ZSetError::InvalidRangeScore));
        assert_eq!(ScoreBound::parse(b""), Err(ZSetError::InvalidRangeScore));
    }

    #[test]
    fn score_range_inclusive_and_exclusive() {
        let ss = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let all = |r: ScoreRange| names(ss.range_by_score(&r, false, Limit::NONE));

        assert_eq!(all(score_range("2", "3")), vec!["b", "c"]);
        assert_eq!(all(score_range("(2", "3")), vec!["c"]);
        assert_eq!(all(score_range("2", "(3")), vec!["b"]);
        assert_eq!(all(score_range("(2", "(3")), Vec::<String>::new());
        assert_eq!(all(score_range("-inf", "+inf")).len(), 4);
        // min > max is empty, not an error
        assert!(all(score_range("3", "2")).is_empty());
    }

    #[test]
    fn exclusive_infinities_exclude_infinite_scores() {
        let ss = set(&[
            ("lo", f64::NEG_INFINITY),
            ("mid", 0.0),
            ("hi", f64::INFINITY),
        ]);
        assert_eq!(ss.count_by_score(&score_range("-inf", "+inf")), 3);
        assert_eq!(
            names(ss.range_by_score(&score_range("(-inf", "(+inf"), false, Limit::NONE)),
            vec!["mid"]
        );
        assert_eq!(
            names(ss.range_by_score(&score_range("(-inf", "+inf"), true, Limit::NONE)),
            vec!["hi", "mid"]
        );
    }

    #[test]
    fn score_range_reverse_with_limit() {
        let ss = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)]);
        let range = score_range("-inf", "+inf");
        assert_eq!(
            names(ss.range_by_score(&range, false, Limit::new(1, 2))),
            vec!["b", "c"]
        );
        assert_eq!(
            names(ss.range_by_score(&range, true, Limit::new(1, 2))),
            vec!["d", "c"]
        );
        assert_eq!(
            names(ss.range_by_score(&range, true, Limit::new(3, -1))),
            vec!["b", "a"]
        );
        assert!(ss.range_by_score(&range, false, Limit::new(10, 5)).is_empty());
        assert!(ss.range_by_score(&range, false, Limit::new(-1, 5)).is_empty());
        assert!(ss.range_by_score(&range, false, Limit::new(0, 0)).is_empty());
    }

    #[test]
    fn lex_bound_parsing() {
        assert_eq!(LexBound::parse(&Bytes::from("-")).unwrap(), LexBound::NegInf);
        assert_eq!(LexBound::parse(&Bytes::from("+")).unwrap(), LexBound::PosInf);
        assert_eq!(
            LexBound::parse(&Bytes::from("[abc")).unwrap(),
            LexBound::Inclusive(Bytes::from("abc"))
        );
        assert_eq!(
            LexBound::parse(&Bytes::from("(")).unwrap(),
            LexBound::Exclusive(Bytes::new())
        );
        for bad in ["", "abc", "+x", "-x", "{a"] {
            assert_eq!(
                LexBound::parse(&Bytes::from(bad)),
                Err(ZSetError::InvalidLexRange),
                "{bad}"
            );
        }
    }

    #[test]
    fn lex_ranges() {
        let ss = alphabet();
        let fwd = |r: LexRange| names(ss.range_by_lex(&r, false, Limit::NONE));

        assert_eq!(fwd(lex("-", "[c")), vec!["a", "b", "c"]);
        assert_eq!(fwd(lex("-", "(c")), vec!["a", "b"]);
        assert_eq!(fwd(lex("[aaa", "(g")), vec!["b", "c", "d", "e", "f"]);
        assert_eq!(fwd(lex("(e", "+")), vec!["f", "g"]);
        assert_eq!(fwd(lex("-", "+")).len(), 7);
        assert!(fwd(lex("+", "-")).is_empty());
        assert!(fwd(lex("[d", "[b")).is_empty());
    }

    #[test]
    fn lex_reverse_and_limit() {
        let ss = alphabet();
        assert_eq!(
            names(ss.range_by_lex(&lex("[b", "[e"), true, Limit::NONE)),
            vec!["e", "d", "c", "b"]
        );
        assert_eq!(
            names(ss.range_by_lex(&lex("-", "+"), false, Limit::new(2, 3))),
            vec!["c", "d", "e"]
        );
        assert_eq!(ss.count_by_lex(&lex("(a", "[f")), 5);
    }

    #[test]
    fn rank_queries_accept_limit() {
        let ss = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let q = |start, stop, limit| {
            names(RangeQuery::by_rank(start, stop).limited(limit).execute(&ss))
        };
        assert_eq!(q(0, -1, Limit::new(1, 2)), vec!["b", "c"]);
        assert!(q(0, -1, Limit::new(5, 5)).is_empty());
        assert_eq!(q(1, 2, Limit::new(1, 1)), vec!["c"]);

        let rev = RangeQuery::by_rank(0, -1)
            .reversed(true)
            .limited(Limit::new(1, 2))
            .execute(&ss);
        assert_eq!(names(rev), vec!["c", "b"]);
    }

    #[test]
    fn removals_match_counts() {
        let mut ss = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let range = score_range("(1", "3");
        let expected = ss.count_by_score(&range);
        assert_eq!(ss.remove_range_by_score(&range), expected);
        assert_eq!(names(ss.range_by_rank(0, -1, false)), vec!["a", "d"]);

        assert_eq!(ss.remove_range_by_rank(-1, -1), 1);
        assert_eq!(names(ss.range_by_rank(0, -1, false)), vec!["a"]);

        let mut letters = alphabet();
        assert_eq!(letters.remove_range_by_lex(&lex("[b", "(e")), 3);
        assert_eq!(letters.len(), 4);
        letters.check_invariants();
    }

    #[test]
    fn counts_match_executed_queries() {
        let letters = alphabet();
        let middle = lex("(b", "[f");
        assert_eq!(letters.count_by_lex(&middle), 4);
        let query = RangeQuery::by_lex(middle).limited(Limit::new(1, 2));
        assert_eq!(query.count(&letters), query.execute(&letters).len());
        assert_eq!(query.count(&letters), 2);

        let scored = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let range = score_range("(1", "+inf");
        assert_eq!(scored.count_by_score(&range), 3);
        let empty = score_range("5", "1");
        assert_eq!(scored.count_by_score(&empty), 0);
        assert!(scored.range_by_score(&empty, false, Limit::NONE).is_empty());
    }

    #[test]
    fn queries_agree_across_layouts() {
        let mut big = SortedSet::new();
        for i in 0..500 {
            big.add(format!("m{i:04}"), f64::from(i % 25)).unwrap();
        }
        assert_eq!(big.encoding(), "skiplist");
        let range = score_range("(3", "7");
        let entries = big.range_by_score(&range, false, Limit::NONE);
        assert_eq!(entries.len(), big.count_by_score(&range));
        assert!(entries.iter().all(|e| e.score > 3.0 && e.score <= 7.0));
        assert!(entries.windows(2).all(|w| w[0].score <= w[1].score));

        let rev = big.range_by_score(&range, true, Limit::NONE);
        let mut fwd = entries.clone();
        fwd.reverse();
        assert_eq!(rev, fwd);
    }

    #[test]
    fn flatten_formats_scores() {
        let entries = vec![Entry::new("a", 1.0), Entry::new("b", f64::INFINITY)];
        assert_eq!(
            flatten(entries.clone(), true),
            vec![
                Bytes::from("a"),
                Bytes::from("1"),
                Bytes::from("b"),
                Bytes::from("inf"),
            ]
        );
        assert_eq!(flatten(entries, false), vec![Bytes::from("a"), Bytes::from("b")]);
    }

    #[test]
    fn lex_queries_drop_scores() {
        assert!(!RangeQuery::by_lex(lex("-", "+")).allows_scores());
        assert!(RangeQuery::by_rank(0, -1).allows_scores());
    }
}
