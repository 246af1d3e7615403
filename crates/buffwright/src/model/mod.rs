//! Core data model shared by every engine.
//!
//! This module provides the identifiers and records the engines operate on:
//! - [`OwnerId`]: Unique identifier for an entity that can carry buffs
//! - [`BuffDataId`]: Identifier of a read-only buff configuration
//! - [`BuffId`]: Identity of one applied buff instance
//! - [`BuffData`]: Read-only configuration (stack, refresh, removal, transmission)
//! - [`Buff`]: A live, timed or permanent effect instance
//!
//! # Instance Identity
//!
//! A [`BuffId`] embeds the owner it was applied to plus a per-owner sequence
//! number. Two owners can never hand out the same `BuffId`, so the id alone is
//! enough to locate a buff anywhere in a world and to key the snapshot cache.
//!
//! # Example
//!
//! ```
//! use buffwright::model::{BuffId, OwnerId};
//!
//! let id = BuffId::new(OwnerId::new(7), 3);
//! assert_eq!(id.owner(), OwnerId::new(7));
//! assert_eq!(id.to_string(), "7:3");
//! ```

pub mod buff;
pub mod data;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use buff::Buff;
pub use data::{BuffData, RemoveMode, StackMode, DEFAULT_MAX_STACK};

/// Unique identifier for an entity that owns a buff container.
///
/// `OwnerId` is a newtype wrapper around `u64`. Owner ids are ordered by their
/// numeric value, which gives deterministic iteration wherever owners are
/// stored in ordered maps.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Creates a new `OwnerId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<OwnerId> for u64 {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

/// Identifier of a buff configuration ([`BuffData`]).
///
/// Many live [`Buff`]s can share one `BuffDataId`; it names *what* the effect
/// is, not *which* application of it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuffDataId(u32);

impl BuffDataId {
    /// Creates a new `BuffDataId` from a raw `u32` value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw `u32` value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BuffDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuffDataId({})", self.0)
    }
}

impl fmt::Display for BuffDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BuffDataId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Identity of one applied buff instance.
///
/// Ordering is by owner first, then by sequence number, so iterating a
/// container's buffs in id order is iterating them in application order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuffId {
    owner: OwnerId,
    seq: u64,
}

impl BuffId {
    /// Creates a buff id for the `seq`-th application on `owner`.
    #[must_use]
    pub const fn new(owner: OwnerId, seq: u64) -> Self {
        Self { owner, seq }
    }

    /// Returns the owner this instance was applied to.
    #[must_use]
    pub const fn owner(self) -> OwnerId {
        self.owner
    }

    /// Returns the per-owner sequence number.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }
}

impl fmt::Debug for BuffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuffId({}:{})", self.owner.0, self.seq)
    }
}

impl fmt::Display for BuffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner.0, self.seq)
    }
}
