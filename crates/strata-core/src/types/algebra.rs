//! Weighted union and intersection of sorted sets.
//!
//! Each source contributes `score * weight` for its members. Members
//! found in several sources combine their weighted scores with the
//! chosen [`Aggregate`]. Aggregation always walks the sources in the
//! order given, so the same inputs give bit-identical scores every run.
//!
//! Two IEEE corner cases are pinned to 0 instead of NaN: `inf * 0`
//! (a zero weight against an infinite score) and `inf + -inf` (SUM of
//! opposite infinities).

use ahash::AHashMap;
use bytes::Bytes;

use crate::error::ZSetError;
use crate::types::sorted_set::{CompactLimits, SortedSet};

/// How scores of a member present in several sources are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    fn combine(self, acc: f64, value: f64) -> f64 {
        match self {
            Aggregate::Sum => zero_if_nan(acc + value),
            Aggregate::Min => acc.min(value),
            Aggregate::Max => acc.max(value),
        }
    }
}

/// One input to a union or intersection. `None` stands for a missing
/// key, which behaves as an empty set.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSet<'a> {
    pub set: Option<&'a SortedSet>,
    pub weight: f64,
}

impl<'a> WeightedSet<'a> {
    pub fn new(set: Option<&'a SortedSet>, weight: f64) -> Self {
        Self { set, weight }
    }

    fn len(&self) -> usize {
        self.set.map_or(0, SortedSet::len)
    }

    fn weighted(&self, member: &[u8]) -> Option<f64> {
        let score = self.set?.score(member)?;
        Some(apply_weight(score, self.weight))
    }
}

fn zero_if_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn apply_weight(score: f64, weight: f64) -> f64 {
    zero_if_nan(score * weight)
}

fn check_weights(sources: &[WeightedSet<'_>]) -> Result<(), ZSetError> {
    if sources.iter().any(|s| s.weight.is_nan()) {
        return Err(ZSetError::InvalidWeight);
    }
    Ok(())
}

fn build(scores: impl IntoIterator<Item = (Bytes, f64)>, limits: CompactLimits) -> Result<SortedSet, ZSetError> {
    let mut out = SortedSet::with_limits(limits);
    for (member, score) in scores {
        out.add(member, score)?;
    }
    Ok(out)
}

/// Every member of any source, with aggregated weighted scores.
pub fn union(
    sources: &[WeightedSet<'_>],
    aggregate: Aggregate,
    limits: CompactLimits,
) -> Result<SortedSet, ZSetError> {
    check_weights(sources)?;

    let capacity = sources.iter().map(WeightedSet::len).max().unwrap_or(0);
    let mut acc: AHashMap<Bytes, f64> = AHashMap::with_capacity(capacity);
    for source in sources {
        let Some(set) = source.set else { continue };
        for (member, score) in set.iter() {
            let value = apply_weight(score, source.weight);
            acc.entry(member.clone())
                .and_modify(|current| *current = aggregate.combine(*current, value))
                .or_insert(value);
        }
    }
    build(acc, limits)
}

/// Members present in every source, with aggregated weighted scores.
/// Any missing or empty source makes the result empty.
pub fn inter(
    sources: &[WeightedSet<'_>],
    aggregate: Aggregate,
    limits: CompactLimits,
) -> Result<SortedSet, ZSetError> {
    check_weights(sources)?;

    // drive from the smallest source, but fold scores in source order
    let Some(driver) = sources
        .iter()
        .filter_map(|s| s.set)
        .min_by_key(|set| set.len())
    else {
        return Ok(SortedSet::with_limits(limits));
    };
    if sources.iter().any(|s| s.len() == 0) {
        return Ok(SortedSet::with_limits(limits));
    }

    let mut hits = Vec::new();
    'members: for (member, _) in driver.iter() {
        let mut folded: Option<f64> = None;
        for source in sources {
            let Some(value) = source.weighted(member) else {
                continue 'members;
            };
            folded = Some(match folded {
                Some(current) => aggregate.combine(current, value),
                None => value,
            });
        }
        if let Some(score) = folded {
            hits.push((member.clone(), score));
        }
    }
    build(hits, limits)
}
