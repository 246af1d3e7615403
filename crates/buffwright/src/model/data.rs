//! Read-only buff configuration.
//!
//! A [`BuffData`] record describes how every instance of one effect behaves:
//! how repeated applications combine, whether they refresh, how they leave the
//! owner, and whether they spread to other owners.

use serde::{Deserialize, Serialize};

use super::BuffDataId;
use crate::transmission::TransmissionProfile;

/// Upper stack bound used when the data does not specify one.
pub const DEFAULT_MAX_STACK: u32 = 99;

/// How a repeated application of the same data combines with a live instance.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackMode {
    /// Add `add_stack_count` stacks to the live instance.
    Stackable,
    /// Keep the live instance as is (only the refresh strategy runs).
    #[default]
    None,
    /// Always create a separate instance.
    Independent,
}

/// What happens once a buff's duration has run out.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoveMode {
    /// Remove the whole buff immediately.
    #[default]
    Remove,
    /// Shed `remove_stack_count` stacks every `remove_interval` seconds.
    Reduce,
}

/// Configuration for one kind of buff.
///
/// Deserializable so recipes and catalogs can be loaded from declarative data.
///
/// # Example
///
/// ```
/// use buffwright::model::{BuffData, BuffDataId, StackMode};
///
/// let poison = BuffData::new(BuffDataId::new(1), "poison")
///     .with_duration(8.0)
///     .with_stack_mode(StackMode::Stackable)
///     .with_max_stack(5);
///
/// assert_eq!(poison.max_stack, 5);
/// assert!(!poison.permanent);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffData {
    /// Identifier referenced by buffs, ingredients and recipes.
    pub id: BuffDataId,
    /// Human readable name, only used for diagnostics.
    pub name: String,
    /// Total duration in seconds.
    pub duration: f64,
    /// Permanent buffs never expire.
    pub permanent: bool,
    /// Upper bound for an instance's stack count.
    pub max_stack: u32,
    /// Stack strategy selector.
    pub stack_mode: StackMode,
    /// Removal strategy selector.
    pub remove_mode: RemoveMode,
    /// Refresh strategy selector.
    pub can_refresh: bool,
    /// Stacks granted by one application (also the initial stack).
    pub add_stack_count: u32,
    /// Stacks shed per interval under [`RemoveMode::Reduce`].
    pub remove_stack_count: u32,
    /// Seconds between stack reductions under [`RemoveMode::Reduce`].
    pub remove_interval: f64,
    /// How this buff spreads to other owners, if at all.
    pub transmission: Option<TransmissionProfile>,
}

impl Default for BuffData {
    fn default() -> Self {
        Self {
            id: BuffDataId::new(0),
            name: String::new(),
            duration: 10.0,
            permanent: false,
            max_stack: DEFAULT_MAX_STACK,
            stack_mode: StackMode::None,
            remove_mode: RemoveMode::Remove,
            can_refresh: true,
            add_stack_count: 1,
            remove_stack_count: 1,
            remove_interval: 1.0,
            transmission: None,
        }
    }
}

impl BuffData {
    /// Creates a configuration with default behavior.
    #[must_use]
    pub fn new(id: BuffDataId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Sets the total duration.
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Marks the buff as permanent.
    #[must_use]
    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }

    /// Sets the stack bound.
    #[must_use]
    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Sets the stack mode.
    #[must_use]
    pub fn with_stack_mode(mut self, mode: StackMode) -> Self {
        self.stack_mode = mode;
        self
    }

    /// Sets the stack delta applied per application.
    #[must_use]
    pub fn with_add_stack_count(mut self, count: u32) -> Self {
        self.add_stack_count = count;
        self
    }

    /// Enables or disables duration refresh on re-application.
    #[must_use]
    pub fn with_refresh(mut self, can_refresh: bool) -> Self {
        self.can_refresh = can_refresh;
        self
    }

    /// Switches to [`RemoveMode::Reduce`] with the given cadence.
    #[must_use]
    pub fn reduce_on_expiry(mut self, stacks: u32, interval: f64) -> Self {
        self.remove_mode = RemoveMode::Reduce;
        self.remove_stack_count = stacks;
        self.remove_interval = interval;
        self
    }

    /// Attaches a transmission profile.
    #[must_use]
    pub fn with_transmission(mut self, profile: TransmissionProfile) -> Self {
        self.transmission = Some(profile);
        self
    }

    /// Returns true if instances of this data can spread.
    #[must_use]
    pub fn is_transmissible(&self) -> bool {
        self.transmission.is_some()
    }
}
