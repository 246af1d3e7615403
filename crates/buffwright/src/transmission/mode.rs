//! Transmission modes and per-data profiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a buff spreads, with the parameters of each mode.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransmissionMode {
    /// Spread to owners within `radius`, gated by a cooldown and a
    /// per-target probability draw.
    Contact {
        /// Search radius around the carrier.
        radius: f32,
        /// Chance in `[0, 1]` that a given target is reached.
        probability: f32,
        /// Seconds between two successful transmissions of one instance.
        cooldown: f64,
        /// Only reach owners hostile to the carrier.
        #[serde(default)]
        enemies_only: bool,
    },
    /// Jump to the nearest unvisited owner, one hop per request.
    Chain {
        /// Maximum distance of a single jump.
        jump_range: f32,
        /// Multiplier applied per hop, surfaced as `decay_per_jump^hops`.
        decay_per_jump: f32,
        /// Hop bound of a chain.
        max_jumps: u32,
    },
    /// Reach every owner within `radius` once the cooldown has elapsed.
    Range {
        /// Search radius around the carrier.
        radius: f32,
        /// Seconds between two successful transmissions of one instance.
        cooldown: f64,
        /// Only reach owners hostile to the carrier.
        #[serde(default)]
        enemies_only: bool,
    },
    /// Pass to the carrier's designated successor.
    Inheritance {
        /// How many times the buff may be handed down.
        max_generations: u32,
    },
}

/// Tag of a [`TransmissionMode`], carried by notifications.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransmissionKind {
    /// [`TransmissionMode::Contact`]
    Contact,
    /// [`TransmissionMode::Chain`]
    Chain,
    /// [`TransmissionMode::Range`]
    Range,
    /// [`TransmissionMode::Inheritance`]
    Inheritance,
}

impl fmt::Display for TransmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Contact => "contact",
            Self::Chain => "chain",
            Self::Range => "range",
            Self::Inheritance => "inheritance",
        };
        f.write_str(name)
    }
}

/// The transmissible behavior attached to a [`BuffData`](crate::model::BuffData).
///
/// Serialized as the bare [`TransmissionMode`].
///
/// # Example
///
/// ```
/// use buffwright::transmission::{TransmissionKind, TransmissionProfile};
///
/// let profile = TransmissionProfile::chain(4.0, 0.5, 3);
/// assert_eq!(profile.kind(), TransmissionKind::Chain);
/// assert_eq!(profile.max_chain(), 3);
/// assert!((profile.decay_at(2) - 0.25).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransmissionProfile {
    mode: TransmissionMode,
}

impl TransmissionProfile {
    /// Wraps a mode.
    #[must_use]
    pub const fn new(mode: TransmissionMode) -> Self {
        Self { mode }
    }

    /// Contact profile reaching owners of any team.
    #[must_use]
    pub fn contact(radius: f32, probability: f32, cooldown: f64) -> Self {
        Self::new(TransmissionMode::Contact {
            radius,
            probability: probability.clamp(0.0, 1.0),
            cooldown: cooldown.max(0.0),
            enemies_only: false,
        })
    }

    /// Chain profile.
    #[must_use]
    pub fn chain(jump_range: f32, decay_per_jump: f32, max_jumps: u32) -> Self {
        Self::new(TransmissionMode::Chain {
            jump_range,
            decay_per_jump,
            max_jumps,
        })
    }

    /// Range profile reaching owners of any team.
    #[must_use]
    pub fn range(radius: f32, cooldown: f64) -> Self {
        Self::new(TransmissionMode::Range {
            radius,
            cooldown: cooldown.max(0.0),
            enemies_only: false,
        })
    }

    /// Inheritance profile.
    #[must_use]
    pub const fn inheritance(max_generations: u32) -> Self {
        Self::new(TransmissionMode::Inheritance { max_generations })
    }

    /// Restricts contact and range profiles to hostile owners.
    #[must_use]
    pub fn enemies_only(mut self) -> Self {
        match &mut self.mode {
            TransmissionMode::Contact { enemies_only, .. }
            | TransmissionMode::Range { enemies_only, .. } => *enemies_only = true,
            TransmissionMode::Chain { .. } | TransmissionMode::Inheritance { .. } => {}
        }
        self
    }

    /// Returns the mode and its parameters.
    #[must_use]
    pub const fn mode(&self) -> &TransmissionMode {
        &self.mode
    }

    /// Returns the mode tag.
    #[must_use]
    pub const fn kind(&self) -> TransmissionKind {
        match self.mode {
            TransmissionMode::Contact { .. } => TransmissionKind::Contact,
            TransmissionMode::Chain { .. } => TransmissionKind::Chain,
            TransmissionMode::Range { .. } => TransmissionKind::Range,
            TransmissionMode::Inheritance { .. } => TransmissionKind::Inheritance,
        }
    }

    /// Maximum chain length an instance may carry and still spread.
    ///
    /// Contact and range never chain, so their bound is 1.
    #[must_use]
    pub const fn max_chain(&self) -> u32 {
        match self.mode {
            TransmissionMode::Contact { .. } | TransmissionMode::Range { .. } => 1,
            TransmissionMode::Chain { max_jumps, .. } => max_jumps,
            TransmissionMode::Inheritance { max_generations } => max_generations,
        }
    }

    /// Decay multiplier after `hops` hops (`1.0` for non-chain modes).
    #[must_use]
    pub fn decay_at(&self, hops: u32) -> f32 {
        match self.mode {
            TransmissionMode::Chain { decay_per_jump, .. } => {
                decay_per_jump.powi(i32::try_from(hops).unwrap_or(i32::MAX))
            }
            _ => 1.0,
        }
    }
}

impl From<TransmissionMode> for TransmissionProfile {
    fn from(mode: TransmissionMode) -> Self {
        Self::new(mode)
    }
}
