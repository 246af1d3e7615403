//! Stack strategies.

use serde::{Deserialize, Serialize};

use crate::model::{Buff, BuffData, StackMode};

/// Result of offering a repeated application to a live instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackOutcome {
    /// The live instance absorbed the application; do not create a new one.
    Merged,
    /// Create a separate instance next to the live one.
    CreateInstance,
}

/// How a repeated application combines with a live instance of the same data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackStrategy {
    /// Add the data's stack delta to the live instance.
    Stackable,
    /// Leave the live instance alone; the refresh strategy decides the rest.
    NonStackable,
    /// Always create another instance.
    Independent,
}

impl StackStrategy {
    /// Maps a [`StackMode`] tag to its strategy.
    #[must_use]
    pub const fn select(mode: StackMode) -> Self {
        match mode {
            StackMode::Stackable => Self::Stackable,
            StackMode::None => Self::NonStackable,
            StackMode::Independent => Self::Independent,
        }
    }

    /// Applies the strategy to `existing` for a new application of `data`.
    pub fn apply(self, existing: &mut Buff, data: &BuffData) -> StackOutcome {
        match self {
            Self::Stackable => {
                existing.add_stack(data.add_stack_count);
                StackOutcome::Merged
            }
            Self::NonStackable => StackOutcome::Merged,
            Self::Independent => StackOutcome::CreateInstance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuffDataId, BuffId, OwnerId};

    fn live(data: &BuffData) -> Buff {
        Buff::new(BuffId::new(OwnerId::new(1), 0), data, None)
    }

    #[test]
    fn select_maps_every_mode() {
        assert_eq!(StackStrategy::select(StackMode::Stackable), StackStrategy::Stackable);
        assert_eq!(StackStrategy::select(StackMode::None), StackStrategy::NonStackable);
        assert_eq!(StackStrategy::select(StackMode::Independent), StackStrategy::Independent);
    }

    #[test]
    fn stackable_adds_delta_and_merges() {
        let data = BuffData::new(BuffDataId::new(1), "rage")
            .with_stack_mode(StackMode::Stackable)
            .with_add_stack_count(3);
        let mut buff = live(&data);

        assert_eq!(StackStrategy::Stackable.apply(&mut buff, &data), StackOutcome::Merged);
        assert_eq!(buff.stack(), 6);
    }

    #[test]
    fn stackable_respects_max_stack() {
        let data = BuffData::new(BuffDataId::new(1), "rage")
            .with_stack_mode(StackMode::Stackable)
            .with_max_stack(2);
        let mut buff = live(&data);

        StackStrategy::Stackable.apply(&mut buff, &data);
        StackStrategy::Stackable.apply(&mut buff, &data);
        assert_eq!(buff.stack(), 2);
    }

    #[test]
    fn non_stackable_leaves_stack_untouched() {
        let data = BuffData::new(BuffDataId::new(1), "stun");
        let mut buff = live(&data);

        assert_eq!(StackStrategy::NonStackable.apply(&mut buff, &data), StackOutcome::Merged);
        assert_eq!(buff.stack(), 1);
    }

    #[test]
    fn independent_requests_new_instance() {
        let data = BuffData::new(BuffDataId::new(1), "dot")
            .with_stack_mode(StackMode::Independent);
        let mut buff = live(&data);

        assert_eq!(
            StackStrategy::Independent.apply(&mut buff, &data),
            StackOutcome::CreateInstance
        );
        assert_eq!(buff.stack(), 1);
    }
}
