//! In-memory buff container.
//!
//! [`BuffStore`] is the reference [`BuffContainer`]. It wires the Strategy
//! Engine into buff application and expiry:
//!
//! - `add_buff` asks the [`StackStrategy`] whether a live instance absorbs the
//!   application and, if so, runs the [`RefreshStrategy`] on it
//! - `tick` advances every buff and drives each one's [`RemoveStrategy`]
//!
//! Buffs are kept in a `BTreeMap` keyed by [`BuffId`], so iteration order is
//! application order and is identical across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::container::BuffContainer;
use crate::model::{Buff, BuffData, BuffId, OwnerId};
use crate::strategy::{
    select_refresh_strategy, select_remove_strategy, select_stack_strategy, RemoveStrategy,
    StackOutcome,
};

/// A buff together with the removal state machine that belongs to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot {
    buff: Buff,
    removal: RemoveStrategy,
}

/// Buff container for a single owner.
///
/// # Example
///
/// ```
/// use buffwright::container::BuffContainer;
/// use buffwright::model::{BuffData, BuffDataId, OwnerId, StackMode};
/// use buffwright::store::BuffStore;
///
/// let rage = BuffData::new(BuffDataId::new(1), "rage")
///     .with_stack_mode(StackMode::Stackable);
///
/// let mut store = BuffStore::new(OwnerId::new(1));
/// let first = store.add_buff(&rage, None);
/// let second = store.add_buff(&rage, None);
///
/// assert_eq!(first, second);
/// assert_eq!(store.get_buff(first).unwrap().stack(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffStore {
    owner: OwnerId,
    next_seq: u64,
    slots: BTreeMap<BuffId, Slot>,
}

impl BuffStore {
    /// Creates an empty store for `owner`.
    #[must_use]
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            next_seq: 0,
            slots: BTreeMap::new(),
        }
    }

    /// Returns the remove strategy state of a buff.
    #[must_use]
    pub fn removal_state(&self, id: BuffId) -> Option<&RemoveStrategy> {
        self.slots.get(&id).map(|slot| &slot.removal)
    }

    /// Advances every buff by `dt` seconds and drops those marked for removal.
    ///
    /// Returns the removed buffs in id order.
    pub fn tick(&mut self, dt: f64) -> Vec<Buff> {
        for slot in self.slots.values_mut() {
            let was_expired = slot.buff.is_expired();
            let remaining = slot.buff.remaining();
            slot.buff.advance(dt);

            // Only the part of dt past expiry counts towards removal timers.
            let overshoot = if was_expired {
                dt
            } else {
                (dt - remaining).max(0.0)
            };
            slot.removal.update(&mut slot.buff, overshoot);
        }
        self.sweep()
    }

    /// Removes every buff marked for removal, returning them in id order.
    pub fn sweep(&mut self) -> Vec<Buff> {
        let marked: Vec<BuffId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.buff.is_marked_for_removal())
            .map(|(id, _)| *id)
            .collect();

        marked
            .into_iter()
            .filter_map(|id| self.slots.remove(&id).map(|slot| slot.buff))
            .collect()
    }

    fn next_id(&mut self) -> BuffId {
        let id = BuffId::new(self.owner, self.next_seq);
        self.next_seq += 1;
        id
    }
}

impl BuffContainer for BuffStore {
    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn add_buff(&mut self, data: &BuffData, source: Option<OwnerId>) -> BuffId {
        let existing = self
            .slots
            .values_mut()
            .find(|slot| slot.buff.data_id() == data.id && !slot.buff.is_marked_for_removal());

        if let Some(slot) = existing {
            let outcome = select_stack_strategy(data.stack_mode).apply(&mut slot.buff, data);
            if outcome == StackOutcome::Merged {
                select_refresh_strategy(data.can_refresh).refresh(&mut slot.buff);
                if !slot.buff.is_expired() {
                    slot.removal.reset();
                }
                return slot.buff.id();
            }
        }

        let id = self.next_id();
        let slot = Slot {
            buff: Buff::new(id, data, source),
            removal: select_remove_strategy(data),
        };
        self.slots.insert(id, slot);
        id
    }

    fn remove_buff(&mut self, id: BuffId) -> Option<Buff> {
        self.slots.remove(&id).map(|slot| slot.buff)
    }

    fn get_buff(&self, id: BuffId) -> Option<&Buff> {
        self.slots.get(&id).map(|slot| &slot.buff)
    }

    fn get_buff_mut(&mut self, id: BuffId) -> Option<&mut Buff> {
        self.slots.get_mut(&id).map(|slot| &mut slot.buff)
    }

    fn buffs(&self) -> Box<dyn Iterator<Item = &Buff> + '_> {
        Box::new(self.slots.values().map(|slot| &slot.buff))
    }

    fn clear_all_buffs(&mut self) {
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}
