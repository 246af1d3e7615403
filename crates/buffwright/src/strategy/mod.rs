//! Strategy Engine: per-application lifecycle policy.
//!
//! Three independent decisions are made for every buff, each selected from
//! the buff's [`BuffData`](crate::model::BuffData):
//!
//! - [`StackStrategy`]: what a repeated application does to a live instance
//! - [`RefreshStrategy`]: whether a merged application restores duration
//! - [`RemoveStrategy`]: how an expired buff leaves its owner
//!
//! Selection is a plain tag-to-variant mapping; there is no trait object
//! behind these. Stack and refresh strategies are stateless. A remove strategy
//! carries the timer for one buff and must live alongside that buff for as
//! long as it exists.
//!
//! # Example
//!
//! ```
//! use buffwright::model::{Buff, BuffData, BuffDataId, BuffId, OwnerId, StackMode};
//! use buffwright::strategy::{select_stack_strategy, StackOutcome};
//!
//! let data = BuffData::new(BuffDataId::new(1), "rage")
//!     .with_stack_mode(StackMode::Stackable)
//!     .with_add_stack_count(2);
//! let mut live = Buff::new(BuffId::new(OwnerId::new(1), 0), &data, None);
//!
//! let outcome = select_stack_strategy(data.stack_mode).apply(&mut live, &data);
//! assert_eq!(outcome, StackOutcome::Merged);
//! assert_eq!(live.stack(), 4);
//! ```

mod refresh;
mod remove;
mod stack;

pub use refresh::RefreshStrategy;
pub use remove::{ReducePhase, RemoveStrategy, MIN_REMOVE_INTERVAL};
pub use stack::{StackOutcome, StackStrategy};

use crate::model::{BuffData, RemoveMode, StackMode};

/// Selects the stack strategy for a stack mode.
#[must_use]
pub const fn select_stack_strategy(mode: StackMode) -> StackStrategy {
    StackStrategy::select(mode)
}

/// Selects the refresh strategy for a `can_refresh` flag.
#[must_use]
pub const fn select_refresh_strategy(can_refresh: bool) -> RefreshStrategy {
    RefreshStrategy::select(can_refresh)
}

/// Selects a fresh remove strategy for `data`.
///
/// The cadence of [`RemoveMode::Reduce`] is read from the data at selection
/// time, so later catalog edits do not affect live buffs.
#[must_use]
pub fn select_remove_strategy(data: &BuffData) -> RemoveStrategy {
    match data.remove_mode {
        RemoveMode::Remove => RemoveStrategy::direct(),
        RemoveMode::Reduce => {
            RemoveStrategy::reduce_stack(data.remove_interval, data.remove_stack_count)
        }
    }
}
