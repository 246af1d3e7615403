//! Reference world: owners, positions and the buff data catalog.
//!
//! The Arena is an in-memory [`BuffWorld`]. It provides:
//! - Owner storage with deterministic iteration order (`BTreeMap`)
//! - Spatial indexing for the radius queries transmission depends on
//! - A catalog resolving [`BuffDataId`] to shared [`BuffData`]
//! - Team-based hostility and a successor table for inheritance
//!
//! # Spatial Index Synchronization
//!
//! Positions live in the [`SpatialIndex`] only. Move owners with
//! [`Arena::set_position`]; spawning and despawning keep the index in sync.
//!
//! # Example
//!
//! ```
//! use buffwright::arena::Arena;
//! use buffwright::container::BuffWorld;
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let a = arena.spawn("a", 0, Vec2::new(0.0, 0.0));
//! let b = arena.spawn("b", 1, Vec2::new(3.0, 0.0));
//! let c = arena.spawn("c", 1, Vec2::new(1.0, 0.0));
//!
//! assert_eq!(arena.owners_within(a, 5.0), vec![a, c, b]);
//! assert!(arena.is_enemy(a, b));
//! assert!(!arena.is_enemy(b, c));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::container::{AttributeSource, BuffContainer, BuffOwner, BuffWorld};
use crate::model::{Buff, BuffData, BuffDataId, OwnerId};
use crate::store::BuffStore;

// =============================================================================
// Spatial Index
// =============================================================================

/// Position store with radius queries.
///
/// Radius queries are a full scan. Results are sorted, never returned in
/// `HashMap` order, so simulation outcomes do not depend on hashing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    positions: HashMap<OwnerId, Vec2>,
}

impl SpatialIndex {
    /// Creates a new empty spatial index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Inserts or updates an owner's position.
    pub fn insert(&mut self, id: OwnerId, pos: Vec2) {
        self.positions.insert(id, pos);
    }

    /// Removes an owner from the index.
    pub fn remove(&mut self, id: OwnerId) {
        self.positions.remove(&id);
    }

    /// Returns the position of an owner, if known.
    #[must_use]
    pub fn get(&self, id: OwnerId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Returns owners within `radius` of `center`, nearest first.
    ///
    /// Equal distances are ordered by id.
    #[must_use]
    pub fn query_nearest(&self, center: Vec2, radius: f32) -> Vec<OwnerId> {
        let radius_sq = radius * radius;
        let mut hits: Vec<(f32, OwnerId)> = self
            .positions
            .iter()
            .map(|(id, pos)| (center.distance_squared(*pos), *id))
            .filter(|(dist_sq, _)| *dist_sq <= radius_sq)
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Returns the number of indexed owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// =============================================================================
// Owner
// =============================================================================

/// An entity living in the [`Arena`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    id: OwnerId,
    name: String,
    team: u32,
    immunities: BTreeSet<BuffDataId>,
    attributes: BTreeMap<String, f32>,
    buffs: BuffStore,
}

impl Owner {
    /// Creates an owner with no attributes or immunities.
    #[must_use]
    pub fn new(id: OwnerId, name: &str, team: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            team,
            immunities: BTreeSet::new(),
            attributes: BTreeMap::new(),
            buffs: BuffStore::new(id),
        }
    }

    /// Returns the owner's team.
    #[must_use]
    pub const fn team(&self) -> u32 {
        self.team
    }

    /// Sets a named attribute.
    pub fn set_attribute(&mut self, name: &str, value: f32) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Makes the owner immune to `data_id`.
    pub fn add_immunity(&mut self, data_id: BuffDataId) {
        self.immunities.insert(data_id);
    }

    /// Lifts an immunity.
    pub fn remove_immunity(&mut self, data_id: BuffDataId) {
        self.immunities.remove(&data_id);
    }
}

impl AttributeSource for Owner {
    fn attribute(&self, name: &str) -> Option<f32> {
        self.attributes.get(name).copied()
    }
}

impl BuffOwner for Owner {
    type Container = BuffStore;

    fn id(&self) -> OwnerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_immune_to(&self, data_id: BuffDataId) -> bool {
        self.immunities.contains(&data_id)
    }

    fn container(&self) -> &BuffStore {
        &self.buffs
    }

    fn container_mut(&mut self) -> &mut BuffStore {
        &mut self.buffs
    }
}

// =============================================================================
// Arena
// =============================================================================

/// In-memory world of owners.
///
/// # Determinism
///
/// Owner ids are assigned monotonically and stored in a `BTreeMap`; every
/// iteration and every spatial query returns a stable order.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    next_id: u64,
    owners: BTreeMap<OwnerId, Owner>,
    spatial: SpatialIndex,
    catalog: HashMap<BuffDataId, Arc<BuffData>>,
    successors: BTreeMap<OwnerId, OwnerId>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an owner at `position` and returns its id.
    pub fn spawn(&mut self, name: &str, team: u32, position: Vec2) -> OwnerId {
        let id = OwnerId::new(self.next_id);
        self.next_id += 1;

        self.owners.insert(id, Owner::new(id, name, team));
        self.spatial.insert(id, position);
        id
    }

    /// Removes an owner. Its successor link is kept.
    pub fn despawn(&mut self, id: OwnerId) -> Option<Owner> {
        self.spatial.remove(id);
        self.owners.remove(&id)
    }

    /// Returns an owner by id.
    #[must_use]
    pub fn get(&self, id: OwnerId) -> Option<&Owner> {
        self.owners.get(&id)
    }

    /// Returns a mutable owner by id.
    #[must_use]
    pub fn get_mut(&mut self, id: OwnerId) -> Option<&mut Owner> {
        self.owners.get_mut(&id)
    }

    /// Moves an owner. Returns false for unknown owners.
    pub fn set_position(&mut self, id: OwnerId, position: Vec2) -> bool {
        if !self.owners.contains_key(&id) {
            return false;
        }
        self.spatial.insert(id, position);
        true
    }

    /// Returns an owner's position.
    #[must_use]
    pub fn position(&self, id: OwnerId) -> Option<Vec2> {
        self.spatial.get(id)
    }

    /// Adds or replaces a catalog entry.
    pub fn register_data(&mut self, data: BuffData) {
        self.catalog.insert(data.id, Arc::new(data));
    }

    /// Declares `successor` as the heir of `owner`.
    pub fn set_successor(&mut self, owner: OwnerId, successor: OwnerId) {
        self.successors.insert(owner, successor);
    }

    /// Iterates over owner ids in order.
    pub fn owner_ids(&self) -> impl Iterator<Item = OwnerId> + '_ {
        self.owners.keys().copied()
    }

    /// Returns the number of owners.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Returns the spatial index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Advances every owner's buffs and returns the ones removed.
    pub fn tick(&mut self, dt: f64) -> Vec<Buff> {
        self.owners
            .values_mut()
            .flat_map(|owner| owner.buffs.tick(dt))
            .collect()
    }

    /// Returns the number of `data_id` instances carried by `owner`.
    #[must_use]
    pub fn count_of(&self, owner: OwnerId, data_id: BuffDataId) -> usize {
        self.owners
            .get(&owner)
            .map_or(0, |o| o.buffs.count_of(data_id))
    }
}

impl BuffWorld for Arena {
    type Owner = Owner;

    fn owner(&self, id: OwnerId) -> Option<&Owner> {
        self.owners.get(&id)
    }

    fn owner_mut(&mut self, id: OwnerId) -> Option<&mut Owner> {
        self.owners.get_mut(&id)
    }

    fn buff_data(&self, id: BuffDataId) -> Option<Arc<BuffData>> {
        self.catalog.get(&id).cloned()
    }

    fn owners_within(&self, origin: OwnerId, radius: f32) -> Vec<OwnerId> {
        self.spatial
            .get(origin)
            .map(|center| self.spatial.query_nearest(center, radius))
            .unwrap_or_default()
    }

    fn is_enemy(&self, owner: OwnerId, other: OwnerId) -> bool {
        match (self.owners.get(&owner), self.owners.get(&other)) {
            (Some(a), Some(b)) => a.team != b.team,
            _ => false,
        }
    }

    fn successor_of(&self, owner: OwnerId) -> Option<OwnerId> {
        self.successors.get(&owner).copied()
    }
}

// =============================================================================
// Tests
// =============================================================================
