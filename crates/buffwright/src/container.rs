//! Interfaces the engines consume from the host's entity system.
//!
//! The engines never own buffs or owners. They reach them through these
//! traits, which a game implements over its own storage:
//!
//! - [`BuffContainer`]: the buffs attached to one owner
//! - [`BuffOwner`]: an entity with an immunity predicate and one container
//! - [`BuffWorld`]: all owners, the buff data catalog, and the spatial and
//!   relationship queries transmission needs
//! - [`AttributeSource`]: named numeric attributes read by snapshot capturers
//!
//! [`BuffStore`](crate::store::BuffStore) and [`Arena`](crate::arena::Arena)
//! are in-memory implementations used by the tests and usable as-is by small
//! hosts.

use std::sync::Arc;

use crate::model::{Buff, BuffData, BuffDataId, BuffId, OwnerId};

/// Read access to named numeric attributes of an entity.
pub trait AttributeSource {
    /// Returns the current value of `name`, if the entity has it.
    fn attribute(&self, name: &str) -> Option<f32>;
}

/// The buffs attached to a single owner.
///
/// # Invariants
///
/// - Every buff held has `buff.owner() == self.owner()`
/// - Buff ids are unique within the container
pub trait BuffContainer {
    /// Returns the owner this container belongs to.
    fn owner(&self) -> OwnerId;

    /// Applies `data`, honoring its stack and refresh strategies.
    ///
    /// Returns the id of the instance that now carries the application, which
    /// is an existing instance when the application merged.
    fn add_buff(&mut self, data: &BuffData, source: Option<OwnerId>) -> BuffId;

    /// Removes and returns a buff.
    fn remove_buff(&mut self, id: BuffId) -> Option<Buff>;

    /// Returns a buff by instance id.
    fn get_buff(&self, id: BuffId) -> Option<&Buff>;

    /// Returns a mutable buff by instance id.
    fn get_buff_mut(&mut self, id: BuffId) -> Option<&mut Buff>;

    /// Iterates over all buffs in instance id order.
    fn buffs(&self) -> Box<dyn Iterator<Item = &Buff> + '_>;

    /// Removes every buff.
    fn clear_all_buffs(&mut self);

    /// Returns every live instance of `data_id`, in instance id order.
    fn get_buffs(&self, data_id: BuffDataId) -> Vec<&Buff> {
        self.buffs().filter(|b| b.data_id() == data_id).collect()
    }

    /// Returns the number of instances of `data_id`.
    fn count_of(&self, data_id: BuffDataId) -> usize {
        self.buffs().filter(|b| b.data_id() == data_id).count()
    }

    /// Returns the total number of buffs.
    fn len(&self) -> usize {
        self.buffs().count()
    }

    /// Returns true if no buffs are attached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An entity that can carry buffs.
pub trait BuffOwner: AttributeSource {
    /// Container type owned by this entity.
    type Container: BuffContainer;

    /// Returns the owner's identity.
    fn id(&self) -> OwnerId;

    /// Returns a display name for diagnostics.
    fn name(&self) -> &str;

    /// Returns true if buffs of `data_id` must not be applied to this owner.
    fn is_immune_to(&self, data_id: BuffDataId) -> bool;

    /// Returns the owner's container.
    fn container(&self) -> &Self::Container;

    /// Returns the owner's container mutably.
    fn container_mut(&mut self) -> &mut Self::Container;
}

/// The host world as seen by the transmission and fusion engines.
///
/// Spatial discovery is injected through [`BuffWorld::owners_within`]; the
/// engines never look at positions themselves.
pub trait BuffWorld {
    /// Owner type stored in this world.
    type Owner: BuffOwner;

    /// Returns an owner by id.
    fn owner(&self, id: OwnerId) -> Option<&Self::Owner>;

    /// Returns a mutable owner by id.
    fn owner_mut(&mut self, id: OwnerId) -> Option<&mut Self::Owner>;

    /// Resolves a buff data id to its configuration.
    fn buff_data(&self, id: BuffDataId) -> Option<Arc<BuffData>>;

    /// Returns owners within `radius` of `origin`, nearest first.
    ///
    /// The result may include `origin` itself; callers filter it out.
    fn owners_within(&self, origin: OwnerId, radius: f32) -> Vec<OwnerId>;

    /// Returns true if `other` is hostile to `owner`.
    fn is_enemy(&self, owner: OwnerId, other: OwnerId) -> bool {
        owner != other
    }

    /// Returns the owner that inherits from `owner` when it goes away.
    fn successor_of(&self, owner: OwnerId) -> Option<OwnerId> {
        let _ = owner;
        None
    }

    /// Returns true if `owner` exists and is immune to `data_id`.
    fn is_immune(&self, owner: OwnerId, data_id: BuffDataId) -> bool {
        self.owner(owner).is_some_and(|o| o.is_immune_to(data_id))
    }

    /// Looks a buff up by instance id.
    fn buff(&self, id: BuffId) -> Option<&Buff> {
        self.owner(id.owner())?.container().get_buff(id)
    }

    /// Looks a buff up mutably by instance id.
    fn buff_mut(&mut self, id: BuffId) -> Option<&mut Buff> {
        self.owner_mut(id.owner())?.container_mut().get_buff_mut(id)
    }

    /// Applies `data` to `owner`'s container.
    ///
    /// Returns `None` if the owner does not exist.
    fn apply_buff(
        &mut self,
        owner: OwnerId,
        data: &BuffData,
        source: Option<OwnerId>,
    ) -> Option<BuffId> {
        Some(self.owner_mut(owner)?.container_mut().add_buff(data, source))
    }
}
