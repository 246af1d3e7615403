//! Cross-engine test suites.
//!
//! - `determinism.rs`: identical seeds give identical propagation
//! - `integration.rs`: end-to-end scenarios through the engines and the system
//! - `properties.rs`: property-based checks of the engine invariants
//! - `helpers.rs`: world setup and buff data factories

mod helpers;
mod integration;
