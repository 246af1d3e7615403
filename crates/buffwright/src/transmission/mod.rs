//! Transmission Engine: propagation of active buffs to other owners.
//!
//! A buff whose data carries a [`TransmissionProfile`] can be queued for
//! propagation with [`TransmissionEngine::request_transmission`]. Each
//! [`drain`](TransmissionEngine::drain) processes at most `max_per_frame`
//! requests in FIFO order; the budget is fixed from the queue length at the
//! start of the drain, so requests enqueued during a drain (chain hops) wait
//! for the next one.
//!
//! # Modes
//!
//! | Mode        | Targets                                   | Gate                          |
//! |-------------|-------------------------------------------|-------------------------------|
//! | Contact     | owners within radius                      | cooldown, then per-target draw |
//! | Chain       | nearest unvisited owner within jump range | hop bound                     |
//! | Range       | owners within radius                      | cooldown                      |
//! | Inheritance | the carrier's successor                   | generation bound              |
//!
//! Immune owners and the carrier itself are never targets. Ineligible
//! targets are skipped silently; a request with no targets ends without a
//! notification.
//!
//! # Determinism
//!
//! The probability gate draws from a `ChaCha8Rng` seeded from
//! [`TransmissionConfig::seed`]. Spatial queries come back nearest-first with
//! ties broken by id, so a given seed and world always propagate identically.

mod mode;

pub use mode::{TransmissionKind, TransmissionMode, TransmissionProfile};

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TransmissionConfig;
use crate::container::BuffWorld;
use crate::event::EventLog;
use crate::model::{Buff, BuffData, BuffDataId, BuffId, OwnerId};

// =============================================================================
// Requests and Events
// =============================================================================

/// A queued propagation of one buff instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionRequest {
    source: BuffId,
    data_id: BuffDataId,
    chain_length: u32,
    visited: Vec<OwnerId>,
}

impl TransmissionRequest {
    fn for_buff(buff: &Buff) -> Self {
        Self {
            source: buff.id(),
            data_id: buff.data_id(),
            chain_length: buff.chain_length(),
            visited: vec![buff.owner()],
        }
    }

    /// Returns the instance being propagated.
    #[must_use]
    pub const fn source(&self) -> BuffId {
        self.source
    }

    /// Returns the data id being propagated.
    #[must_use]
    pub const fn data_id(&self) -> BuffDataId {
        self.data_id
    }

    /// Returns the hops already performed by the source instance.
    #[must_use]
    pub const fn chain_length(&self) -> u32 {
        self.chain_length
    }

    /// Returns the owners this chain has already passed through.
    #[must_use]
    pub fn visited(&self) -> &[OwnerId] {
        &self.visited
    }
}

/// Notifications emitted by the [`TransmissionEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransmissionEvent {
    /// A buff reached a new owner.
    Transmitted {
        /// Instance now carried by the target.
        buff: BuffId,
        /// Instance it spread from.
        source_buff: BuffId,
        /// Owner it spread from.
        from: OwnerId,
        /// Owner it spread to.
        to: OwnerId,
        /// Mode that carried it.
        mode: TransmissionKind,
    },
    /// A chain performed one more hop.
    ChainAdvanced {
        /// Instance created by the hop.
        buff: BuffId,
        /// Hops performed so far.
        chain_length: u32,
        /// `decay_per_jump^chain_length`, for effect math to consume.
        decay: f32,
    },
}

// =============================================================================
// Engine
// =============================================================================

/// Queue-driven propagation engine.
///
/// # Example
///
/// ```
/// use buffwright::arena::Arena;
/// use buffwright::config::TransmissionConfig;
/// use buffwright::container::BuffWorld;
/// use buffwright::model::{BuffData, BuffDataId};
/// use buffwright::transmission::{TransmissionEngine, TransmissionProfile};
/// use glam::Vec2;
///
/// let mut arena = Arena::new();
/// let a = arena.spawn("a", 0, Vec2::ZERO);
/// let b = arena.spawn("b", 1, Vec2::new(1.0, 0.0));
///
/// let plague = BuffData::new(BuffDataId::new(1), "plague")
///     .with_transmission(TransmissionProfile::range(5.0, 1.0));
/// arena.register_data(plague.clone());
/// let id = arena.apply_buff(a, &plague, None).unwrap();
///
/// let mut engine = TransmissionEngine::new(&TransmissionConfig::default());
/// assert!(engine.request_for(&arena, id));
/// engine.drain(&mut arena);
///
/// assert_eq!(arena.count_of(b, plague.id), 1);
/// ```
#[derive(Debug)]
pub struct TransmissionEngine {
    max_per_frame: usize,
    debug_logging: bool,
    clock: f64,
    queue: VecDeque<TransmissionRequest>,
    rng: ChaCha8Rng,
    events: EventLog<TransmissionEvent>,
}

impl TransmissionEngine {
    /// Creates an engine with an empty queue at time zero.
    #[must_use]
    pub fn new(config: &TransmissionConfig) -> Self {
        Self {
            max_per_frame: config.max_per_frame.max(1),
            debug_logging: false,
            clock: 0.0,
            queue: VecDeque::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: EventLog::new(),
        }
    }

    /// Enables `debug!` traces for propagation decisions.
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Returns the engine clock in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.clock
    }

    /// Returns the per-drain budget.
    #[must_use]
    pub const fn max_per_frame(&self) -> usize {
        self.max_per_frame
    }

    /// Changes the per-drain budget (clamped to at least 1).
    pub fn set_max_per_frame(&mut self, n: usize) {
        self.max_per_frame = n.max(1);
    }

    /// Returns the number of queued requests.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Iterates over queued requests in processing order.
    pub fn queued(&self) -> impl Iterator<Item = &TransmissionRequest> {
        self.queue.iter()
    }

    /// Returns the event log.
    #[must_use]
    pub const fn events(&self) -> &EventLog<TransmissionEvent> {
        &self.events
    }

    /// Returns the event log mutably, for subscribing.
    pub fn events_mut(&mut self) -> &mut EventLog<TransmissionEvent> {
        &mut self.events
    }

    /// Drains recorded notifications.
    pub fn take_events(&mut self) -> Vec<TransmissionEvent> {
        self.events.take_events()
    }

    /// Queues `buff` for propagation.
    ///
    /// Returns false without queueing if `data` is not transmissible or the
    /// instance has already reached the mode's chain bound.
    pub fn request_transmission(&mut self, buff: &Buff, data: &BuffData) -> bool {
        let Some(profile) = data.transmission else {
            return false;
        };
        if buff.chain_length() >= profile.max_chain() {
            if self.debug_logging {
                debug!(
                    buff = %buff.id(),
                    chain = buff.chain_length(),
                    "chain bound reached, request dropped"
                );
            }
            return false;
        }

        self.queue.push_back(TransmissionRequest::for_buff(buff));
        true
    }

    /// Looks a buff and its data up in `world` and queues it.
    ///
    /// Returns false if either is missing or the buff cannot spread.
    pub fn request_for<W: BuffWorld>(&mut self, world: &W, id: BuffId) -> bool {
        let Some(buff) = world.buff(id) else {
            return false;
        };
        let Some(data) = world.buff_data(buff.data_id()) else {
            warn!(
                buff = %id,
                data = %buff.data_id(),
                "transmission requested for unknown buff data"
            );
            return false;
        };
        self.request_transmission(buff, &data)
    }

    /// Drops every queued request for `buff`. Returns how many were dropped.
    pub fn cancel_requests(&mut self, buff: BuffId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|req| req.source != buff);
        before - self.queue.len()
    }

    /// Drops every queued request.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Advances the engine clock by `dt` seconds, then drains.
    pub fn tick<W: BuffWorld>(&mut self, world: &mut W, dt: f64) -> usize {
        self.clock += dt;
        self.drain(world)
    }

    /// Processes up to `max_per_frame` queued requests, oldest first.
    ///
    /// Returns the number of requests processed.
    pub fn drain<W: BuffWorld>(&mut self, world: &mut W) -> usize {
        let budget = self.max_per_frame.min(self.queue.len());
        let mut processed = 0;

        while processed < budget {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            self.process(world, request);
            processed += 1;
        }
        processed
    }

    fn process<W: BuffWorld>(&mut self, world: &mut W, request: TransmissionRequest) {
        let Some(data) = world.buff_data(request.data_id) else {
            warn!(data = %request.data_id, "dropping transmission of unknown buff data");
            return;
        };
        let Some(profile) = data.transmission else {
            return;
        };

        match *profile.mode() {
            TransmissionMode::Contact {
                radius,
                probability,
                cooldown,
                enemies_only,
            } => self.spread_area(
                world,
                &request,
                &data,
                radius,
                cooldown,
                enemies_only,
                Some(probability),
            ),
            TransmissionMode::Range {
                radius,
                cooldown,
                enemies_only,
            } => self.spread_area(world, &request, &data, radius, cooldown, enemies_only, None),
            TransmissionMode::Chain { jump_range, .. } => {
                self.hop(world, request, &data, profile, jump_range);
            }
            TransmissionMode::Inheritance { .. } => self.inherit(world, &request, &data),
        }
    }

    /// Contact and range propagation. `probability` is `None` for range.
    #[allow(clippy::too_many_arguments)]
    fn spread_area<W: BuffWorld>(
        &mut self,
        world: &mut W,
        request: &TransmissionRequest,
        data: &BuffData,
        radius: f32,
        cooldown: f64,
        enemies_only: bool,
        probability: Option<f32>,
    ) {
        let Some(source) = world.buff(request.source) else {
            return;
        };
        if let Some(last) = source.last_transmitted_at() {
            if self.clock - last < cooldown {
                if self.debug_logging {
                    debug!(
                        buff = %request.source,
                        since = self.clock - last,
                        cooldown,
                        "transmission on cooldown"
                    );
                }
                return;
            }
        }

        let origin = request.source.owner();
        let kind = match probability {
            Some(_) => TransmissionKind::Contact,
            None => TransmissionKind::Range,
        };
        let targets: Vec<OwnerId> = world
            .owners_within(origin, radius)
            .into_iter()
            .filter(|&target| is_eligible(&*world, origin, target, data.id, enemies_only))
            .collect();

        let mut reached = false;
        for target in targets {
            if let Some(p) = probability {
                let draw: f32 = self.rng.gen();
                if draw >= p {
                    continue;
                }
            }
            reached |= self.transmit(world, request, data, target, kind).is_some();
        }

        if reached {
            if let Some(source) = world.buff_mut(request.source) {
                source.record_transmission(self.clock);
            }
        }
    }

    fn hop<W: BuffWorld>(
        &mut self,
        world: &mut W,
        mut request: TransmissionRequest,
        data: &BuffData,
        profile: TransmissionProfile,
        jump_range: f32,
    ) {
        if world.buff(request.source).is_none() {
            return;
        }
        let origin = request.source.owner();
        let target = world
            .owners_within(origin, jump_range)
            .into_iter()
            .find(|&target| {
                !request.visited.contains(&target)
                    && is_eligible(&*world, origin, target, data.id, false)
            });
        let Some(target) = target else {
            return;
        };
        let Some(created) = self.transmit(world, &request, data, target, TransmissionKind::Chain)
        else {
            return;
        };

        if let Some(source) = world.buff_mut(request.source) {
            source.record_transmission(self.clock);
        }

        let chain_length = request.chain_length + 1;
        let decay = profile.decay_at(chain_length);
        self.events.emit(TransmissionEvent::ChainAdvanced {
            buff: created,
            chain_length,
            decay,
        });
        if self.debug_logging {
            debug!(buff = %created, chain_length, decay, "chain advanced");
        }

        if chain_length < profile.max_chain() {
            request.visited.push(target);
            self.queue.push_back(TransmissionRequest {
                source: created,
                data_id: request.data_id,
                chain_length,
                visited: request.visited,
            });
        }
    }

    fn inherit<W: BuffWorld>(
        &mut self,
        world: &mut W,
        request: &TransmissionRequest,
        data: &BuffData,
    ) {
        let origin = request.source.owner();
        let Some(heir) = world.successor_of(origin) else {
            return;
        };
        if request.visited.contains(&heir) || world.owner(heir).is_none() {
            return;
        }
        if world.is_immune(heir, data.id) {
            return;
        }
        self.transmit(world, request, data, heir, TransmissionKind::Inheritance);
    }

    /// Applies `data` to `target` and records the hop on the new instance.
    fn transmit<W: BuffWorld>(
        &mut self,
        world: &mut W,
        request: &TransmissionRequest,
        data: &BuffData,
        target: OwnerId,
        mode: TransmissionKind,
    ) -> Option<BuffId> {
        let from = request.source.owner();
        let id = world.apply_buff(target, data, Some(from))?;
        // A merge lands on the target's own instance; never lower its hop count.
        if let Some(created) = world.buff_mut(id) {
            let chain_length = created.chain_length().max(request.chain_length + 1);
            created.set_chain_length(chain_length);
        }

        if self.debug_logging {
            debug!(buff = %id, %from, to = %target, %mode, "buff transmitted");
        }
        self.events.emit(TransmissionEvent::Transmitted {
            buff: id,
            source_buff: request.source,
            from,
            to: target,
            mode,
        });
        Some(id)
    }
}

/// Returns true if `target` may receive `data_id` spread from `origin`.
fn is_eligible<W: BuffWorld>(
    world: &W,
    origin: OwnerId,
    target: OwnerId,
    data_id: BuffDataId,
    enemies_only: bool,
) -> bool {
    if target == origin || world.is_immune(target, data_id) {
        return false;
    }
    !enemies_only || world.is_enemy(origin, target)
}

// =============================================================================
// Tests
// =============================================================================
