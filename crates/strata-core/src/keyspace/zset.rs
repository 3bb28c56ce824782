use super::*;

use crate::types::algebra::{self, Aggregate, WeightedSet};
use crate::types::glob::GlobPattern;
use crate::types::range::{LexRange, RangeQuery, ScoreRange};
use crate::types::sorted_set::{Entry, ZAddFlags};

impl Keyspace {
    /// Adds members with scores to a sorted set, with optional ZADD flags.
    ///
    /// Creates the sorted set if the key doesn't exist. Returns the reply
    /// count: members added, or added plus updated under CH. Flags and
    /// scores are validated up front, so an error changes nothing.
    pub fn zadd(
        &mut self,
        key: &str,
        members: &[(f64, Bytes)],
        flags: &ZAddFlags,
    ) -> Result<usize, ZSetError> {
        flags.validate()?;
        if members.iter().any(|(score, _)| score.is_nan()) {
            return Err(ZSetError::InvalidScore);
        }
        self.with_zset_or_create(key, |ss| {
            let mut count = 0;
            for (score, member) in members {
                count += ss.add_with_flags(member.clone(), *score, flags)?.count_for(flags);
            }
            Ok(count)
        })
    }

    /// ZADD with the INCR option: exactly one pair, treated as an
    /// increment. Returns `None` when the flags veto the update.
    pub fn zadd_incr(
        &mut self,
        key: &str,
        members: &[(f64, Bytes)],
        flags: &ZAddFlags,
    ) -> Result<Option<f64>, ZSetError> {
        flags.validate()?;
        let [(delta, member)] = members else {
            return Err(ZSetError::IncrMultiplicity);
        };
        self.with_zset_or_create(key, |ss| ss.incr(member.clone(), *delta, flags))
    }

    /// Increments a member's score, creating key and member as needed.
    /// Returns the new score.
    pub fn zincrby(&mut self, key: &str, delta: f64, member: Bytes) -> Result<f64, ZSetError> {
        let flags = ZAddFlags::default();
        self.with_zset_or_create(key, |ss| {
            // no flags set, so the increment always applies
            Ok(ss.incr(member, delta, &flags)?.unwrap_or(delta))
        })
    }

    /// Removes members from a sorted set. Returns how many were removed.
    /// Deletes the key if the set becomes empty.
    pub fn zrem(&mut self, key: &str, members: &[Bytes]) -> Result<usize, ZSetError> {
        let removed = self.with_zset(key, |ss| Ok(ss.remove_many(members)))?;
        Ok(removed.unwrap_or(0))
    }

    /// Returns the number of members, or 0 if the key doesn't exist.
    pub fn zcard(&self, key: &str) -> Result<usize, ZSetError> {
        Ok(self.zset(key)?.map_or(0, SortedSet::len))
    }

    /// Returns the score for a member, or `None` if key or member is missing.
    pub fn zscore(&self, key: &str, member: &[u8]) -> Result<Option<f64>, ZSetError> {
        Ok(self.zset(key)?.and_then(|ss| ss.score(member)))
    }

    /// Returns scores for several members; missing ones are `None`.
    pub fn zmscore(&self, key: &str, members: &[Bytes]) -> Result<Vec<Option<f64>>, ZSetError> {
        Ok(match self.zset(key)? {
            Some(ss) => ss.mscore(members),
            None => vec![None; members.len()],
        })
    }

    /// Returns the 0-based rank of a member, counting from the top when
    /// `reverse` is set.
    pub fn zrank(&self, key: &str, member: &[u8], reverse: bool) -> Result<Option<usize>, ZSetError> {
        Ok(self.zset(key)?.and_then(|ss| ss.rank(member, reverse)))
    }

    /// Runs a range query. A missing key yields an empty result.
    pub fn zrange(&self, key: &str, query: &RangeQuery) -> Result<Vec<Entry>, ZSetError> {
        Ok(self
            .zset(key)?
            .map(|ss| query.execute(ss))
            .unwrap_or_default())
    }

    /// Counts members with scores in `range`.
    pub fn zcount(&self, key: &str, range: &ScoreRange) -> Result<usize, ZSetError> {
        Ok(self.zset(key)?.map_or(0, |ss| ss.count_by_score(range)))
    }

    /// Counts members in a lex range.
    pub fn zlexcount(&self, key: &str, range: &LexRange) -> Result<usize, ZSetError> {
        Ok(self.zset(key)?.map_or(0, |ss| ss.count_by_lex(range)))
    }

    /// Removes members by rank. Deletes the key if the set becomes empty.
    pub fn zremrangebyrank(&mut self, key: &str, start: i64, stop: i64) -> Result<usize, ZSetError> {
        let removed = self.with_zset(key, |ss| Ok(ss.remove_range_by_rank(start, stop)))?;
        Ok(removed.unwrap_or(0))
    }

    /// Removes members by score. Deletes the key if the set becomes empty.
    pub fn zremrangebyscore(&mut self, key: &str, range: &ScoreRange) -> Result<usize, ZSetError> {
        let removed = self.with_zset(key, |ss| Ok(ss.remove_range_by_score(range)))?;
        Ok(removed.unwrap_or(0))
    }

    /// Removes members by lex range. Deletes the key if the set becomes empty.
    pub fn zremrangebylex(&mut self, key: &str, range: &LexRange) -> Result<usize, ZSetError> {
        let removed = self.with_zset(key, |ss| Ok(ss.remove_range_by_lex(range)))?;
        Ok(removed.unwrap_or(0))
    }

    /// Pops up to `count` lowest (or highest, with `max`) members.
    pub fn zpop(&mut self, key: &str, count: usize, max: bool) -> Result<Vec<Entry>, ZSetError> {
        let popped = self.with_zset(key, |ss| Ok(ss.pop(count, max)))?;
        Ok(popped.unwrap_or_default())
    }

    /// One ZSCAN step over a sorted set. A missing key is an empty,
    /// finished scan.
    pub fn zscan(
        &self,
        key: &str,
        cursor: usize,
        count: usize,
        pattern: Option<&GlobPattern>,
    ) -> Result<(usize, Vec<Entry>), ZSetError> {
        Ok(self
            .zset(key)?
            .map_or((0, Vec::new()), |ss| ss.scan(cursor, count, pattern)))
    }

    /// Stores the weighted union of `sources` at `dest`, replacing it.
    /// Returns the cardinality of the result.
    pub fn zunionstore(
        &mut self,
        dest: &str,
        sources: &[(&str, f64)],
        aggregate: Aggregate,
    ) -> Result<usize, ZSetError> {
        self.store_combined(dest, sources, aggregate, algebra::union)
    }

    /// Stores the weighted intersection of `sources` at `dest`, replacing
    /// it. Returns the cardinality of the result.
    pub fn zinterstore(
        &mut self,
        dest: &str,
        sources: &[(&str, f64)],
        aggregate: Aggregate,
    ) -> Result<usize, ZSetError> {
        self.store_combined(dest, sources, aggregate, algebra::inter)
    }

    fn store_combined(
        &mut self,
        dest: &str,
        sources: &[(&str, f64)],
        aggregate: Aggregate,
        combine: fn(&[WeightedSet<'_>], Aggregate, CompactLimits) -> Result<SortedSet, ZSetError>,
    ) -> Result<usize, ZSetError> {
        let limits = self.config.compact_limits();
        let result = {
            let inputs = sources
                .iter()
                .map(|(key, weight)| Ok(WeightedSet::new(self.zset(key)?, *weight)))
                .collect::<Result<Vec<_>, ZSetError>>()?;
            combine(&inputs, aggregate, limits)?
        };
        let len = result.len();
        tracing::debug!(dest, sources = sources.len(), len, "stored combined sorted set");
        self.store_zset(dest, result);
        Ok(len)
    }
}
