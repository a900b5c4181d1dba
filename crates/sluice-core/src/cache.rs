// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The shared value cache: latest reading per tag.
//!
//! This is the single piece of mutable state the bridge shares between
//! execution contexts. Exactly one poller writes it; any number of HTTP
//! handlers read it. Records are replaced wholesale under a write lock, so a
//! reader can never observe a half-written record, and no lock is ever held
//! across an await point or any I/O.
//!
//! # Features
//!
//! - **O(1) counters**: `len()`/`is_empty()` are atomic loads
//! - **Thread-safe**: `parking_lot::RwLock` for minimal contention
//! - **Point-in-time snapshots**: `snapshot()` returns an independent copy
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use sluice_core::cache::ValueCache;
//! use sluice_core::types::{TagName, ValueRecord};
//!
//! let cache = ValueCache::new();
//! cache.publish(TagName::new("Flow"), ValueRecord::new(12.5, "L/min", Utc::now()));
//!
//! let snapshot = cache.snapshot();
//! assert_eq!(snapshot.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::types::{TagName, ValueRecord};

// =============================================================================
// CacheStats
// =============================================================================

/// Counters describing cache activity since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of tags currently holding a record.
    pub tags: u64,

    /// Total number of publish operations.
    pub publishes: u64,

    /// Total number of snapshot operations.
    pub snapshots: u64,
}

// =============================================================================
// ValueCache
// =============================================================================

/// Concurrently readable store of the latest [`ValueRecord`] per tag.
///
/// # Thread Safety
///
/// This struct is `Send + Sync`. The map is protected by a
/// `parking_lot::RwLock`; counters use atomic operations. All operations
/// complete in time bounded by the size of the map, never by the network.
#[derive(Debug, Default)]
pub struct ValueCache {
    /// Latest record per tag. BTreeMap keeps snapshots (and therefore the
    /// JSON output) in stable name order.
    records: RwLock<BTreeMap<TagName, ValueRecord>>,

    /// O(1) tag count.
    tag_count: AtomicU64,

    /// Total publishes.
    publish_count: AtomicU64,

    /// Total snapshots.
    snapshot_count: AtomicU64,
}

impl ValueCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new record for `name`, replacing any prior one.
    ///
    /// The replacement is a single atomic operation with respect to
    /// [`snapshot`](Self::snapshot) and [`get`](Self::get): readers observe
    /// either the old record or the new one in full, never a mix.
    pub fn publish(&self, name: TagName, record: ValueRecord) {
        let previous = {
            let mut records = self.records.write();
            records.insert(name.clone(), record)
        };

        if previous.is_none() {
            self.tag_count.fetch_add(1, Ordering::Relaxed);
        }
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        trace!(tag = %name, first = previous.is_none(), "Published value record");
    }

    /// Returns the latest record for `name`, or `None` if the tag has never
    /// had a successful read.
    pub fn get(&self, name: &TagName) -> Option<ValueRecord> {
        self.records.read().get(name).cloned()
    }

    /// Returns a point-in-time copy of every record.
    ///
    /// The copy is independent: publishes after the call do not show up in
    /// it. The writer is only blocked for the duration of the copy itself.
    pub fn snapshot(&self) -> BTreeMap<TagName, ValueRecord> {
        let copy = self.records.read().clone();
        self.snapshot_count.fetch_add(1, Ordering::Relaxed);
        copy
    }

    /// Returns the number of tags with a record, in O(1) time.
    #[inline]
    pub fn len(&self) -> usize {
        self.tag_count.load(Ordering::Relaxed) as usize
    }

    /// Returns `true` if no tag has been published yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns activity counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            tags: self.tag_count.load(Ordering::Relaxed),
            publishes: self.publish_count.load(Ordering::Relaxed),
            snapshots: self.snapshot_count.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(value: f64, unit: &str) -> ValueRecord {
        ValueRecord::new(value, unit, Utc::now())
    }

    #[test]
    fn test_publish_and_get() {
        let cache = ValueCache::new();
        let name = TagName::new("Flow");

        assert!(cache.get(&name).is_none());

        cache.publish(name.clone(), record(12.5, "L/min"));

        let fetched = cache.get(&name).unwrap();
        assert_eq!(fetched.value, 12.5);
        assert_eq!(fetched.unit, "L/min");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_publish_replaces_wholesale() {
        let cache = ValueCache::new();
        let name = TagName::new("Flow");

        let t1 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 1).unwrap();

        cache.publish(name.clone(), ValueRecord::new(1.0, "L/min", t1));
        cache.publish(name.clone(), ValueRecord::new(2.0, "L/min", t2));

        let fetched = cache.get(&name).unwrap();
        assert_eq!(fetched.value, 2.0);
        assert_eq!(fetched.timestamp, t2);
        // Replacement, not insertion
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().publishes, 2);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let cache = ValueCache::new();
        cache.publish(TagName::new("A"), record(1.0, "u"));

        let snapshot = cache.snapshot();
        cache.publish(TagName::new("B"), record(2.0, "u"));
        cache.publish(TagName::new("A"), record(9.0, "u"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&TagName::new("A")].value, 1.0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_snapshot_of_empty_cache() {
        let cache = ValueCache::new();
        assert!(cache.snapshot().is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_snapshot_ordering_is_stable() {
        let cache = ValueCache::new();
        cache.publish(TagName::new("Zeta"), record(1.0, ""));
        cache.publish(TagName::new("Alpha"), record(2.0, ""));

        let names: Vec<String> = cache
            .snapshot()
            .keys()
            .map(|n| n.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_records_are_never_torn() {
        use std::sync::Arc;

        // The writer publishes records whose unit encodes the value; any
        // reader that sees a mismatched pair has observed a torn record.
        let cache = Arc::new(ValueCache::new());
        let name = TagName::new("Flow");

        let writer = {
            let cache = cache.clone();
            let name = name.clone();
            std::thread::spawn(move || {
                for i in 0..2_000u32 {
                    let rec = ValueRecord::new(i as f64, i.to_string(), Utc::now());
                    cache.publish(name.clone(), rec);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let name = name.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        if let Some(rec) = cache.get(&name) {
                            assert_eq!(rec.unit, (rec.value as u32).to_string());
                        }
                        for rec in cache.snapshot().values() {
                            assert_eq!(rec.unit, (rec.value as u32).to_string());
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_stats() {
        let cache = ValueCache::new();
        cache.publish(TagName::new("A"), record(1.0, ""));
        cache.publish(TagName::new("A"), record(2.0, ""));
        let _ = cache.snapshot();

        let stats = cache.stats();
        assert_eq!(stats.tags, 1);
        assert_eq!(stats.publishes, 2);
        assert_eq!(stats.snapshots, 1);
    }
}
