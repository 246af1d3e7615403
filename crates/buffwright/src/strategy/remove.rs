//! Remove strategies.
//!
//! A remove strategy is a small state machine driven by the container's tick.
//! It only acts on buffs that have already expired:
//!
//! ```text
//! DirectRemove:  expired ──▶ marked
//!
//! ReduceStack:   Active ──(timer ≥ interval)──▶ StackReduced
//!                   │                               │
//!                   └───(stack == 0 or marked)──────┴──▶ Removed
//! ```
//!
//! `ReduceStack` catches up within a single tick: a tick whose `dt` spans
//! several intervals sheds one batch of stacks per elapsed interval.

use serde::{Deserialize, Serialize};

use crate::model::Buff;

/// Floor applied to non-positive reduce intervals so the catch-up loop ends.
pub const MIN_REMOVE_INTERVAL: f64 = 0.001;

/// Phase of a [`RemoveStrategy::ReduceStack`] state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReducePhase {
    /// No stacks shed yet.
    Active,
    /// At least one interval has elapsed and stacks were shed.
    StackReduced,
    /// The buff ran out of stacks or was marked for removal.
    Removed,
}

/// How an expired buff leaves its owner, with per-buff timer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoveStrategy {
    /// Mark the buff for removal as soon as it expires.
    DirectRemove,
    /// Shed `amount` stacks every `interval` seconds until none are left.
    ReduceStack {
        /// Seconds between reductions (at least [`MIN_REMOVE_INTERVAL`]).
        interval: f64,
        /// Stacks shed per reduction (at least 1).
        amount: u32,
        /// Time accumulated towards the next reduction.
        timer: f64,
        /// Current phase.
        phase: ReducePhase,
    },
}

impl RemoveStrategy {
    /// Creates a [`RemoveStrategy::DirectRemove`].
    #[must_use]
    pub const fn direct() -> Self {
        Self::DirectRemove
    }

    /// Creates a [`RemoveStrategy::ReduceStack`] in its `Active` phase.
    #[must_use]
    pub fn reduce_stack(interval: f64, amount: u32) -> Self {
        let interval = if interval > MIN_REMOVE_INTERVAL {
            interval
        } else {
            MIN_REMOVE_INTERVAL
        };
        Self::ReduceStack {
            interval,
            amount: amount.max(1),
            timer: 0.0,
            phase: ReducePhase::Active,
        }
    }

    /// Returns the reduce phase, or `None` for direct removal.
    #[must_use]
    pub const fn phase(&self) -> Option<ReducePhase> {
        match self {
            Self::DirectRemove => None,
            Self::ReduceStack { phase, .. } => Some(*phase),
        }
    }

    /// Puts the state machine back to its initial state.
    ///
    /// Called when a merged application refreshes the buff.
    pub fn reset(&mut self) {
        if let Self::ReduceStack { timer, phase, .. } = self {
            *timer = 0.0;
            *phase = ReducePhase::Active;
        }
    }

    /// Drives the strategy for one tick.
    ///
    /// Does nothing while `buff` has time left.
    pub fn update(&mut self, buff: &mut Buff, dt: f64) {
        if !buff.is_expired() {
            return;
        }

        match self {
            Self::DirectRemove => buff.mark_for_removal(),
            Self::ReduceStack {
                interval,
                amount,
                timer,
                phase,
            } => {
                if buff.stack() == 0 {
                    buff.mark_for_removal();
                }

                *timer += dt;
                while *timer >= *interval && !buff.is_marked_for_removal() {
                    buff.remove_stack(*amount);
                    *timer -= *interval;
                    *phase = ReducePhase::StackReduced;
                    if buff.stack() == 0 {
                        buff.mark_for_removal();
                    }
                }

                if buff.is_marked_for_removal() {
                    *phase = ReducePhase::Removed;
                }
            }
        }
    }
}
