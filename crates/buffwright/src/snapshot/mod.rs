//! Snapshot Cache: capture-once, read-many attribute freezing.
//!
//! A [`BuffSnapshot`] freezes named attributes of an owner at the moment a
//! buff is cast, so effect math can keep using cast-time values after the
//! live attributes change. Snapshots are keyed by [`BuffId`].
//!
//! # Bounds
//!
//! - The cache never holds more than `max_cache_size` snapshots. Inserting
//!   into a full cache first evicts the oldest entry (smallest timestamp,
//!   ties broken by insertion order). The scan is linear in the cache size.
//! - With `auto_cleanup`, every [`tick`](SnapshotCache::tick) evicts
//!   snapshots older than `expire_time`.
//!
//! Timestamps come from the cache's own clock, advanced by `tick`.

mod capturer;

pub use capturer::{AttributeMap, NamedAttributeCapturer, SnapshotCapturer};

use std::collections::{btree_map, BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::SnapshotConfig;
use crate::container::AttributeSource;
use crate::model::{Buff, BuffDataId, BuffId};

/// Snapshot errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// No capturer is registered for the buff's data id.
    #[error("no capturer registered for buff data {0}")]
    CapturerNotRegistered(BuffDataId),
}

/// Attributes frozen for one buff instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffSnapshot {
    timestamp: f64,
    attributes: AttributeMap,
    buff_id: BuffId,
    data_id: BuffDataId,
}

impl BuffSnapshot {
    /// Creates a snapshot of `attributes` for `buff` taken at `timestamp`.
    #[must_use]
    pub fn new(buff: &Buff, timestamp: f64, attributes: AttributeMap) -> Self {
        Self {
            timestamp,
            attributes,
            buff_id: buff.id(),
            data_id: buff.data_id(),
        }
    }

    /// Returns the capture time.
    #[must_use]
    pub const fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Returns every frozen attribute.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Returns one frozen attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<f32> {
        self.attributes.get(name).copied()
    }

    /// Returns the buff instance this snapshot belongs to.
    #[must_use]
    pub const fn buff_id(&self) -> BuffId {
        self.buff_id
    }

    /// Returns the data id of that buff.
    #[must_use]
    pub const fn data_id(&self) -> BuffDataId {
        self.data_id
    }
}

#[derive(Debug, Clone)]
struct Cached {
    snapshot: BuffSnapshot,
    seq: u64,
}

/// Bounded store of snapshots plus the capturer registry.
///
/// # Example
///
/// ```
/// use buffwright::config::SnapshotConfig;
/// use buffwright::model::{Buff, BuffData, BuffDataId, BuffId, OwnerId};
/// use buffwright::snapshot::{AttributeMap, SnapshotCache};
///
/// let data = BuffData::new(BuffDataId::new(1), "ignite");
/// let buff = Buff::new(BuffId::new(OwnerId::new(1), 0), &data, None);
///
/// let mut cache = SnapshotCache::new(&SnapshotConfig::default());
/// let attrs: AttributeMap = [("attack".to_string(), 50.0)].into_iter().collect();
/// cache.create_snapshot(&buff, attrs);
///
/// assert_eq!(cache.snapshot_for(&buff).unwrap().attribute("attack"), Some(50.0));
/// ```
pub struct SnapshotCache {
    clock: f64,
    next_seq: u64,
    max_cache_size: usize,
    auto_cleanup: bool,
    expire_time: f64,
    debug_logging: bool,
    entries: BTreeMap<BuffId, Cached>,
    capturers: HashMap<BuffDataId, Arc<dyn SnapshotCapturer>>,
}

impl SnapshotCache {
    /// Creates an empty cache at time zero.
    #[must_use]
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            clock: 0.0,
            next_seq: 0,
            max_cache_size: config.max_cache_size.max(1),
            auto_cleanup: config.auto_cleanup,
            expire_time: config.expire_time.max(0.0),
            debug_logging: false,
            entries: BTreeMap::new(),
            capturers: HashMap::new(),
        }
    }

    /// Enables `debug!` traces for evictions.
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Returns the cache clock in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.clock
    }

    /// Returns the cache bound.
    #[must_use]
    pub const fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Caches `attributes` for `buff`, replacing any earlier snapshot of it.
    pub fn create_snapshot(&mut self, buff: &Buff, attributes: AttributeMap) -> &BuffSnapshot {
        let snapshot = BuffSnapshot::new(buff, self.clock, attributes);
        self.insert(snapshot)
    }

    /// Captures `owner`'s attributes with `capturer` and caches them for `buff`.
    pub fn create_snapshot_with(
        &mut self,
        owner: &dyn AttributeSource,
        buff: &Buff,
        capturer: &dyn SnapshotCapturer,
    ) -> &BuffSnapshot {
        let attributes = capturer.capture(owner);
        self.create_snapshot(buff, attributes)
    }

    /// Captures with the capturer registered for the buff's data id.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::CapturerNotRegistered`] if there is none.
    pub fn create_snapshot_with_registered_capturer(
        &mut self,
        owner: &dyn AttributeSource,
        buff: &Buff,
    ) -> Result<&BuffSnapshot, SnapshotError> {
        let capturer = self
            .capturers
            .get(&buff.data_id())
            .cloned()
            .ok_or(SnapshotError::CapturerNotRegistered(buff.data_id()))?;
        Ok(self.create_snapshot_with(owner, buff, capturer.as_ref()))
    }

    fn insert(&mut self, snapshot: BuffSnapshot) -> &BuffSnapshot {
        let id = snapshot.buff_id;
        if !self.entries.contains_key(&id) && self.entries.len() >= self.max_cache_size {
            self.evict_oldest();
        }

        let cached = Cached {
            snapshot,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let slot = match self.entries.entry(id) {
            btree_map::Entry::Occupied(mut occupied) => {
                occupied.insert(cached);
                occupied.into_mut()
            }
            btree_map::Entry::Vacant(vacant) => vacant.insert(cached),
        };
        &slot.snapshot
    }

    fn evict_oldest(&mut self) -> Option<BuffSnapshot> {
        let oldest = self
            .entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.snapshot
                    .timestamp
                    .total_cmp(&b.snapshot.timestamp)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(id, _)| *id)?;

        if self.debug_logging {
            debug!(buff = %oldest, "snapshot evicted, cache full");
        }
        self.entries.remove(&oldest).map(|e| e.snapshot)
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Returns the snapshot of a buff instance.
    #[must_use]
    pub fn snapshot(&self, id: BuffId) -> Option<&BuffSnapshot> {
        self.entries.get(&id).map(|e| &e.snapshot)
    }

    /// Returns the snapshot of `buff`.
    #[must_use]
    pub fn snapshot_for(&self, buff: &Buff) -> Option<&BuffSnapshot> {
        self.snapshot(buff.id())
    }

    /// Returns true if a snapshot of `id` is cached.
    #[must_use]
    pub fn has_snapshot(&self, id: BuffId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Removes and returns a snapshot.
    pub fn remove_snapshot(&mut self, id: BuffId) -> Option<BuffSnapshot> {
        self.entries.remove(&id).map(|e| e.snapshot)
    }

    /// Empties the cache. Capturers stay registered.
    pub fn clear_all_snapshots(&mut self) {
        self.entries.clear();
    }

    /// Iterates over cached snapshots in buff id order.
    pub fn all_snapshots(&self) -> impl Iterator<Item = &BuffSnapshot> {
        self.entries.values().map(|e| &e.snapshot)
    }

    /// Returns the number of cached snapshots.
    #[must_use]
    pub fn cache_count(&self) -> usize {
        self.entries.len()
    }

    // -------------------------------------------------------------------------
    // Capturers
    // -------------------------------------------------------------------------

    /// Associates a capturer with a buff data id, returning the previous one.
    pub fn register_capturer<C>(
        &mut self,
        data_id: BuffDataId,
        capturer: C,
    ) -> Option<Arc<dyn SnapshotCapturer>>
    where
        C: SnapshotCapturer + 'static,
    {
        self.capturers.insert(data_id, Arc::new(capturer))
    }

    /// Removes a capturer. Returns false if none was registered.
    pub fn unregister_capturer(&mut self, data_id: BuffDataId) -> bool {
        self.capturers.remove(&data_id).is_some()
    }

    /// Returns the capturer registered for `data_id`.
    #[must_use]
    pub fn capturer(&self, data_id: BuffDataId) -> Option<Arc<dyn SnapshotCapturer>> {
        self.capturers.get(&data_id).cloned()
    }

    // -------------------------------------------------------------------------
    // Expiry
    // -------------------------------------------------------------------------

    /// Advances the clock and, with `auto_cleanup`, evicts expired snapshots.
    ///
    /// Returns the number of snapshots evicted.
    pub fn tick(&mut self, dt: f64) -> usize {
        self.clock += dt;
        if self.auto_cleanup {
            self.cleanup_expired()
        } else {
            0
        }
    }

    /// Evicts every snapshot older than `expire_time`.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock;
        let ttl = self.expire_time;
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.snapshot.timestamp <= ttl);

        let evicted = before - self.entries.len();
        if evicted > 0 && self.debug_logging {
            debug!(evicted, "expired snapshots evicted");
        }
        evicted
    }
}

impl fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("clock", &self.clock)
            .field("max_cache_size", &self.max_cache_size)
            .field("auto_cleanup", &self.auto_cleanup)
            .field("expire_time", &self.expire_time)
            .field("entries", &self.entries.len())
            .field("capturers", &self.capturers.len())
            .finish()
    }
}
