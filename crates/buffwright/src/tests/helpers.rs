//! Test helpers for building worlds and buff data.

use glam::Vec2;

use crate::arena::Arena;
use crate::config::BuffSystemConfig;
use crate::model::{BuffData, BuffDataId, OwnerId, StackMode};
use crate::system::BuffSystem;
use crate::transmission::TransmissionProfile;

// =============================================================================
// Logging
// =============================================================================

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Worlds
// =============================================================================

/// Spawns `n` owners on the x axis, `spacing` apart, alternating teams 0 and 1.
pub fn line_world(n: usize, spacing: f32) -> (Arena, Vec<OwnerId>) {
    let mut arena = Arena::new();
    let ids = (0..n)
        .map(|i| {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let (x, team) = (i as f32 * spacing, (i % 2) as u32);
            arena.spawn(&format!("owner-{i}"), team, Vec2::new(x, 0.0))
        })
        .collect();
    (arena, ids)
}

/// Creates a running system with debug logging and the given seed and budget.
pub fn debug_system(seed: u64, max_per_frame: usize) -> BuffSystem {
    init_tracing();
    BuffSystem::new(
        BuffSystemConfig::default()
            .with_debug_logging(true)
            .with_seed(seed)
            .with_max_per_frame(max_per_frame),
    )
}

// =============================================================================
// Buff Data
// =============================================================================

/// Stackable data adding `delta` stacks per application.
pub fn stackable(id: u32, delta: u32) -> BuffData {
    BuffData::new(BuffDataId::new(id), "stackable")
        .with_stack_mode(StackMode::Stackable)
        .with_add_stack_count(delta)
}

/// Independent data, one instance per application.
pub fn independent(id: u32) -> BuffData {
    BuffData::new(BuffDataId::new(id), "independent").with_stack_mode(StackMode::Independent)
}

/// Permanent data spreading with `profile`.
pub fn contagious(id: u32, profile: TransmissionProfile) -> BuffData {
    BuffData::new(BuffDataId::new(id), "contagious")
        .permanent()
        .with_transmission(profile)
}
