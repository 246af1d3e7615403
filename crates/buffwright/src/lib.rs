//! # Buffwright
//!
//! Rules engine for time-boxed status effects ("buffs") on game entities.
//!
//! The crate decides how repeated applications of an effect combine, how
//! effects spread between entities, how new effects are crafted from
//! existing ones, and how an entity's attributes are frozen at cast time.
//!
//! ## Architecture
//!
//! Four engines operate on a shared Buff / Owner / Container model:
//!
//! - **Strategy** ([`strategy`]): stack, refresh and removal policy per buff
//! - **Transmission** ([`transmission`]): budgeted, queue-driven propagation
//! - **Fusion** ([`fusion`]): recipe-driven crafting, instant or timed
//! - **Snapshot** ([`snapshot`]): bounded attribute cache keyed by buff instance
//!
//! The engines reach entities through the traits in [`container`]. The
//! [`arena`] and [`store`] modules provide in-memory implementations.
//! [`BuffSystem`] owns the stateful engines and ticks them in a fixed order.
//!
//! ## Usage
//!
//! ```
//! use buffwright::arena::Arena;
//! use buffwright::container::BuffWorld;
//! use buffwright::model::{BuffData, BuffDataId, StackMode};
//! use buffwright::{BuffSystem, BuffSystemConfig};
//! use glam::Vec2;
//!
//! let rage = BuffData::new(BuffDataId::new(1), "rage")
//!     .with_stack_mode(StackMode::Stackable)
//!     .with_duration(5.0);
//!
//! let mut arena = Arena::new();
//! arena.register_data(rage.clone());
//! let hero = arena.spawn("hero", 0, Vec2::ZERO);
//! arena.apply_buff(hero, &rage, None);
//! let id = arena.apply_buff(hero, &rage, None).unwrap();
//!
//! let mut system = BuffSystem::new(BuffSystemConfig::default());
//! system.tick(&mut arena, 1.0);
//!
//! assert_eq!(arena.buff(id).unwrap().stack(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod fusion;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod strategy;
pub mod system;
pub mod transmission;

#[cfg(test)]
mod tests;

pub use config::BuffSystemConfig;
pub use error::{Error, Result};
pub use system::{BuffSystem, TickReport};
