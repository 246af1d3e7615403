//! The context object that owns every stateful engine.
//!
//! A [`BuffSystem`] is constructed explicitly from a [`BuffSystemConfig`],
//! advanced with [`tick`](BuffSystem::tick) by the host loop, and torn down
//! with [`shutdown`](BuffSystem::shutdown). Several systems can coexist;
//! they share no state.
//!
//! # Tick Order
//!
//! 1. **FUSION**: timed fusions advance and complete
//! 2. **TRANSMISSION**: the engine clock advances and one budgeted drain runs
//! 3. **SNAPSHOT**: the cache clock advances and expired snapshots are swept
//!
//! Buff expiry belongs to the host's containers and is not driven here.
//! Feed the buffs they remove to [`forget`](BuffSystem::forget) so stale
//! snapshots and queued requests go with them.

use tracing::{debug, info};

use crate::config::{BuffSystemConfig, ConfigError};
use crate::container::{BuffContainer, BuffOwner, BuffWorld};
use crate::error::Result;
use crate::fusion::{FusionEngine, FusionRecipe};
use crate::model::{Buff, BuffId, OwnerId};
use crate::snapshot::SnapshotCache;
use crate::transmission::{TransmissionEngine, TransmissionKind};

/// What one [`BuffSystem::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Buffs produced by timed fusions.
    pub fused: Vec<BuffId>,
    /// Transmission requests processed.
    pub transmissions: usize,
    /// Snapshots evicted by the TTL sweep.
    pub snapshots_expired: usize,
}

/// Owner of the transmission, fusion and snapshot engines.
///
/// # Example
///
/// ```
/// use buffwright::arena::Arena;
/// use buffwright::config::BuffSystemConfig;
/// use buffwright::system::BuffSystem;
///
/// let mut arena = Arena::new();
/// let mut system = BuffSystem::new(BuffSystemConfig::default());
///
/// let report = system.tick(&mut arena, 0.5);
/// assert_eq!(report.transmissions, 0);
/// assert_eq!(system.tick_count(), 1);
///
/// system.shutdown();
/// assert!(!system.is_running());
/// ```
#[derive(Debug)]
pub struct BuffSystem {
    config: BuffSystemConfig,
    tick: u64,
    elapsed: f64,
    running: bool,
    transmission: TransmissionEngine,
    fusion: FusionEngine,
    snapshots: SnapshotCache,
}

impl BuffSystem {
    /// Creates a running system. Out-of-range knobs are clamped.
    #[must_use]
    pub fn new(config: BuffSystemConfig) -> Self {
        let config = config.validated();
        let debug_logging = config.debug_logging;

        let system = Self {
            transmission: TransmissionEngine::new(&config.transmission)
                .with_debug_logging(debug_logging),
            fusion: FusionEngine::new().with_debug_logging(debug_logging),
            snapshots: SnapshotCache::new(&config.snapshot).with_debug_logging(debug_logging),
            config,
            tick: 0,
            elapsed: 0.0,
            running: true,
        };
        info!(
            max_per_frame = system.config.transmission.max_per_frame,
            max_cache_size = system.config.snapshot.max_cache_size,
            "buff system started"
        );
        system
    }

    /// Creates a system from a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(BuffSystemConfig::from_json(json)?))
    }

    /// Registers every recipe in a JSON array, returning how many were loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for malformed JSON and
    /// [`Error::Fusion`](crate::Error::Fusion) for the first invalid recipe;
    /// recipes before it stay registered.
    pub fn load_recipes(&mut self, json: &str) -> Result<usize> {
        let recipes: Vec<FusionRecipe> = serde_json::from_str(json).map_err(ConfigError::from)?;
        let count = recipes.len();
        for recipe in recipes {
            self.fusion.register_recipe(recipe)?;
        }
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns the effective configuration.
    #[must_use]
    pub const fn config(&self) -> &BuffSystemConfig {
        &self.config
    }

    /// Returns the number of ticks run.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Returns the simulated seconds elapsed.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Returns false once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the Transmission Engine.
    #[must_use]
    pub const fn transmission(&self) -> &TransmissionEngine {
        &self.transmission
    }

    /// Returns the Transmission Engine mutably.
    pub fn transmission_mut(&mut self) -> &mut TransmissionEngine {
        &mut self.transmission
    }

    /// Returns the Fusion Engine.
    #[must_use]
    pub const fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    /// Returns the Fusion Engine mutably.
    pub fn fusion_mut(&mut self) -> &mut FusionEngine {
        &mut self.fusion
    }

    /// Returns the Snapshot Cache.
    #[must_use]
    pub const fn snapshots(&self) -> &SnapshotCache {
        &self.snapshots
    }

    /// Returns the Snapshot Cache mutably.
    pub fn snapshots_mut(&mut self) -> &mut SnapshotCache {
        &mut self.snapshots
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Runs one tick of `dt` seconds. A stopped system does nothing.
    pub fn tick<W: BuffWorld>(&mut self, world: &mut W, dt: f64) -> TickReport {
        if !self.running {
            return TickReport::default();
        }

        let fused = self.fusion.update(world, dt);
        let transmissions = self.transmission.tick(world, dt);
        let snapshots_expired = self.snapshots.tick(dt);

        self.tick += 1;
        self.elapsed += dt;
        if self.config.debug_logging {
            debug!(
                tick = self.tick,
                fused = fused.len(),
                transmissions,
                snapshots_expired,
                "tick complete"
            );
        }

        TickReport {
            fused,
            transmissions,
            snapshots_expired,
        }
    }

    /// Drops snapshots and queued transmissions of buffs that left their owner.
    pub fn forget(&mut self, removed: &[Buff]) {
        for buff in removed {
            self.snapshots.remove_snapshot(buff.id());
            self.transmission.cancel_requests(buff.id());
        }
    }

    /// Queues every inheritable buff of `owner` for transmission.
    ///
    /// Call before the owner leaves the world; the requests resolve against
    /// its successor on a later tick. Returns the number queued.
    pub fn request_inheritance<W: BuffWorld>(&mut self, world: &W, owner: OwnerId) -> usize {
        let Some(owner) = world.owner(owner) else {
            return 0;
        };

        let mut queued = 0;
        for buff in owner.container().buffs() {
            let Some(data) = world.buff_data(buff.data_id()) else {
                continue;
            };
            let inheritable = data
                .transmission
                .is_some_and(|p| p.kind() == TransmissionKind::Inheritance);
            if inheritable && self.transmission.request_transmission(buff, &data) {
                queued += 1;
            }
        }
        queued
    }

    /// Stops the system and releases all engine state.
    ///
    /// Queued transmissions, timed fusions, recipes, snapshots and event
    /// subscribers are dropped. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        self.transmission.clear();
        self.transmission.events_mut().reset();
        self.fusion.clear();
        self.fusion.events_mut().reset();
        self.snapshots.clear_all_snapshots();
        info!(ticks = self.tick, "buff system shut down");
    }
}

impl Default for BuffSystem {
    fn default() -> Self {
        Self::new(BuffSystemConfig::default())
    }
}
