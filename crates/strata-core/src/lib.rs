//! strata-core: the sorted-set storage engine.
//!
//! Owns the keyspace, the sorted-set type with its dual-layout ordered
//! index, range queries, and weighted set algebra. Has no knowledge of
//! the wire protocol; the server crate maps commands onto this API.

pub mod concurrent;
pub mod error;
pub mod keyspace;
pub mod types;

pub use concurrent::SharedKeyspace;
pub use error::ZSetError;
pub use keyspace::{Keyspace, KeyspaceConfig};
pub use types::algebra::{Aggregate, WeightedSet};
pub use types::glob::GlobPattern;
pub use types::range::{LexBound, LexRange, Limit, RangeKind, RangeQuery, ScoreBound, ScoreRange};
pub use types::score::format_score;
pub use types::sorted_set::{AddResult, CompactLimits, Entry, SortedSet, ZAddFlags};
pub use types::Value;
