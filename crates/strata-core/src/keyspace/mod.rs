//! The keyspace: the engine's key-value store.
//!
//! A `Keyspace` owns a flat `AHashMap<Box<str>, Value>` and handles get,
//! set, delete, existence and type checks. Sorted-set commands live in
//! [`zset`]; they create their set lazily on first write and delete the
//! key the moment the set becomes empty, so an empty sorted set is
//! never observable.

use ahash::AHashMap;
use bytes::Bytes;

use crate::error::ZSetError;
use crate::types::sorted_set::{CompactLimits, SortedSet};
use crate::types::{self, Value};

mod zset;

/// Configuration for a keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyspaceConfig {
    /// Sorted sets with more entries than this use the skip list layout.
    pub zset_max_listpack_entries: usize,
    /// A member longer than this many bytes forces the skip list layout.
    pub zset_max_listpack_value: usize,
}

impl KeyspaceConfig {
    /// Compact limits handed to newly created sorted sets.
    pub fn compact_limits(&self) -> CompactLimits {
        CompactLimits {
            max_entries: self.zset_max_listpack_entries,
            max_member_len: self.zset_max_listpack_value,
        }
    }
}

impl Default for KeyspaceConfig {
    fn default() -> Self {
        let limits = CompactLimits::default();
        Self {
            zset_max_listpack_entries: limits.max_entries,
            zset_max_listpack_value: limits.max_member_len,
        }
    }
}

/// The core key-value store.
///
/// All operations take `&mut self` and run to completion; there is no
/// internal locking. See [`crate::concurrent`] for sharing across threads.
#[derive(Debug, Default)]
pub struct Keyspace {
    entries: AHashMap<Box<str>, Value>,
    config: KeyspaceConfig,
}

impl Keyspace {
    /// Creates a new, empty keyspace with default config.
    pub fn new() -> Self {
        Self::with_config(KeyspaceConfig::default())
    }

    /// Creates a new, empty keyspace with the given config.
    pub fn with_config(config: KeyspaceConfig) -> Self {
        Self {
            entries: AHashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &KeyspaceConfig {
        &self.config
    }

    /// Replaces the config. Existing sorted sets keep the limits they
    /// were created with; new ones pick up the change.
    pub fn set_config(&mut self, config: KeyspaceConfig) {
        self.config = config;
    }

    /// Stores a string, replacing whatever the key held before.
    pub fn set(&mut self, key: &str, value: Bytes) {
        self.entries.insert(Box::from(key), Value::String(value));
    }

    /// Returns the string at `key`, or `WrongType` for a sorted set.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, ZSetError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::String(data)) => Ok(Some(data.clone())),
            Some(_) => Err(ZSetError::WrongType),
        }
    }

    /// Removes a key. Returns `true` if the key existed.
    pub fn del(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns `true` if the key exists.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the TYPE name of the key's value, or `"none"`.
    pub fn value_type(&self, key: &str) -> &'static str {
        self.entries.get(key).map_or("none", types::type_name)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrows the sorted set at `key`. Missing keys are `Ok(None)`.
    pub(crate) fn zset(&self, key: &str) -> Result<Option<&SortedSet>, ZSetError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::SortedSet(ss)) => Ok(Some(&**ss)),
            Some(_) => Err(ZSetError::WrongType),
        }
    }

    /// Runs `f` against an existing sorted set and deletes the key if the
    /// set ends up empty. A missing key returns `Ok(None)` without
    /// running `f`.
    pub(crate) fn with_zset<T>(
        &mut self,
        key: &str,
        f: impl FnOnce(&mut SortedSet) -> Result<T, ZSetError>,
    ) -> Result<Option<T>, ZSetError> {
        let result = match self.entries.get_mut(key) {
            None => return Ok(None),
            Some(Value::SortedSet(ss)) => f(&mut **ss),
            Some(_) => return Err(ZSetError::WrongType),
        };
        self.cleanup_if_empty(key);
        result.map(Some)
    }

    /// Like [`with_zset`](Self::with_zset), but a missing key gets a
    /// fresh set first. If `f` fails or leaves the new set empty, the key
    /// is removed again, so nothing is created without a member.
    pub(crate) fn with_zset_or_create<T>(
        &mut self,
        key: &str,
        f: impl FnOnce(&mut SortedSet) -> Result<T, ZSetError>,
    ) -> Result<T, ZSetError> {
        let limits = self.config.compact_limits();
        let value = self
            .entries
            .entry(Box::from(key))
            .or_insert_with(|| Value::SortedSet(Box::new(SortedSet::with_limits(limits))));
        let result = match value {
            Value::SortedSet(ss) => f(&mut **ss),
            Value::String(_) => return Err(ZSetError::WrongType),
        };
        self.cleanup_if_empty(key);
        result
    }

    /// Stores `set` at `key`, or deletes the key when `set` is empty.
    pub(crate) fn store_zset(&mut self, key: &str, set: SortedSet) {
        if set.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries
                .insert(Box::from(key), Value::SortedSet(Box::new(set)));
        }
    }

    fn cleanup_if_empty(&mut self, key: &str) {
        if matches!(self.entries.get(key), Some(Value::SortedSet(ss)) if ss.is_empty()) {
            self.entries.remove(key);
        }
    }
}
