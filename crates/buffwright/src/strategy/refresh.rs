//! Refresh strategies.

use serde::{Deserialize, Serialize};

use crate::model::Buff;

/// Whether a merged application restores the live instance's duration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshStrategy {
    /// Reset remaining duration to the full duration.
    Refreshable,
    /// Do nothing.
    NonRefreshable,
}

impl RefreshStrategy {
    /// Maps the data's `can_refresh` flag to its strategy.
    #[must_use]
    pub const fn select(can_refresh: bool) -> Self {
        if can_refresh {
            Self::Refreshable
        } else {
            Self::NonRefreshable
        }
    }

    /// Applies the strategy to `buff`.
    pub fn refresh(self, buff: &mut Buff) {
        if let Self::Refreshable = self {
            buff.refresh_duration();
        }
    }
}
