//! Live buff instances.

use serde::{Deserialize, Serialize};

use super::{BuffData, BuffDataId, BuffId, OwnerId};

/// A live effect instance attached to an owner.
///
/// # Invariants
///
/// - `0 <= stack <= max_stack`
/// - `0 <= remaining <= duration` for non-permanent buffs
///
/// Mutation goes through the methods below so the stack bound always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    id: BuffId,
    data_id: BuffDataId,
    source: Option<OwnerId>,
    stack: u32,
    max_stack: u32,
    duration: f64,
    remaining: f64,
    elapsed: f64,
    permanent: bool,
    marked_for_removal: bool,
    chain_length: u32,
    last_transmitted_at: Option<f64>,
}

impl Buff {
    /// Creates a fresh instance of `data` with its initial stack and full duration.
    #[must_use]
    pub fn new(id: BuffId, data: &BuffData, source: Option<OwnerId>) -> Self {
        Self {
            id,
            data_id: data.id,
            source,
            stack: data.add_stack_count.min(data.max_stack),
            max_stack: data.max_stack,
            duration: data.duration.max(0.0),
            remaining: data.duration.max(0.0),
            elapsed: 0.0,
            permanent: data.permanent,
            marked_for_removal: false,
            chain_length: 0,
            last_transmitted_at: None,
        }
    }

    /// Returns the instance identity.
    #[must_use]
    pub const fn id(&self) -> BuffId {
        self.id
    }

    /// Returns the configuration this instance was created from.
    #[must_use]
    pub const fn data_id(&self) -> BuffDataId {
        self.data_id
    }

    /// Returns the owner carrying this instance.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.id.owner()
    }

    /// Returns the owner that applied this instance, if known.
    #[must_use]
    pub const fn source(&self) -> Option<OwnerId> {
        self.source
    }

    /// Returns the current stack count.
    #[must_use]
    pub const fn stack(&self) -> u32 {
        self.stack
    }

    /// Returns the stack bound.
    #[must_use]
    pub const fn max_stack(&self) -> u32 {
        self.max_stack
    }

    /// Returns the total duration in seconds.
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns the remaining duration in seconds.
    #[must_use]
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Returns how long this instance has been alive.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Returns true for buffs that never expire.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.permanent
    }

    /// Returns true once the instance has been flagged for removal.
    #[must_use]
    pub const fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Returns true if a non-permanent buff has run out of time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        !self.permanent && self.remaining <= 0.0
    }

    /// Adds `n` stacks, clamped to the stack bound.
    pub fn add_stack(&mut self, n: u32) {
        self.stack = self.stack.saturating_add(n).min(self.max_stack);
    }

    /// Removes `n` stacks, never going below zero.
    pub fn remove_stack(&mut self, n: u32) {
        self.stack = self.stack.saturating_sub(n);
    }

    /// Replaces both total and remaining duration.
    pub fn set_duration(&mut self, seconds: f64) {
        self.duration = seconds.max(0.0);
        self.remaining = self.duration;
    }

    /// Resets remaining duration to the full duration.
    pub fn refresh_duration(&mut self) {
        self.remaining = self.duration;
    }

    /// Flags the instance for removal by its container.
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    /// Advances the instance clock by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
        if !self.permanent {
            self.remaining = (self.remaining - dt).max(0.0);
        }
    }

    /// Returns how many transmission hops produced this instance.
    #[must_use]
    pub const fn chain_length(&self) -> u32 {
        self.chain_length
    }

    /// Sets the transmission hop count.
    pub fn set_chain_length(&mut self, length: u32) {
        self.chain_length = length;
    }

    /// Returns the engine time of this instance's last successful transmission.
    #[must_use]
    pub const fn last_transmitted_at(&self) -> Option<f64> {
        self.last_transmitted_at
    }

    /// Records a successful transmission at engine time `now`.
    pub fn record_transmission(&mut self, now: f64) {
        self.last_transmitted_at = Some(now);
    }
}
