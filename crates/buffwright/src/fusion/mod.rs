//! Fusion Engine: recipe-driven crafting of new buffs from existing ones.
//!
//! Recipes are registered by id. [`FusionEngine::try_fusion`] checks a
//! recipe against one owner's container and either fuses on the spot or,
//! for recipes with a fusion time, starts an [`ActiveFusion`] that
//! [`FusionEngine::update`] completes later.
//!
//! # Atomicity
//!
//! The result buff's data is resolved before any ingredient is touched. A
//! recipe whose result cannot be resolved fails with
//! [`FusionError::ResultDataMissing`] and leaves the container unchanged.
//! Timed fusions do not reserve their ingredients; they are checked again
//! on completion and nothing is consumed if they have gone.

mod condition;
mod recipe;

pub use condition::{CustomCondition, FusionCondition};
pub use recipe::{FusionRecipe, Ingredient, Shortfall};

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::container::{BuffContainer, BuffOwner, BuffWorld};
use crate::event::EventLog;
use crate::model::{BuffDataId, BuffId, OwnerId};

// =============================================================================
// Errors, Outcomes and Events
// =============================================================================

/// Reasons a fusion does not happen.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    /// A recipe was registered without an id.
    #[error("recipe id must not be empty")]
    EmptyRecipeId,

    /// No recipe is registered under this id.
    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    /// The owner does not exist in the world.
    #[error("owner not found: {0}")]
    OwnerNotFound(OwnerId),

    /// The container holds too few instances of an ingredient.
    #[error("recipe {recipe_id}: insufficient ingredient {buff_id} ({available}/{required})")]
    InsufficientIngredients {
        /// Recipe being fused.
        recipe_id: String,
        /// Ingredient that is short.
        buff_id: BuffDataId,
        /// Instances required.
        required: usize,
        /// Instances held.
        available: usize,
    },

    /// A recipe condition does not hold.
    #[error("recipe {recipe_id}: condition not met: {condition}")]
    ConditionsNotMet {
        /// Recipe being fused.
        recipe_id: String,
        /// Description of the failing condition.
        condition: String,
    },

    /// The result buff data cannot be resolved.
    #[error("recipe {recipe_id}: result buff data {result} not found")]
    ResultDataMissing {
        /// Recipe being fused.
        recipe_id: String,
        /// Unresolved data id.
        result: BuffDataId,
    },

    /// A timed fusion was cancelled before completion.
    #[error("fusion {0} cancelled")]
    Cancelled(FusionHandle),
}

/// Handle of a timed fusion in progress.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FusionHandle(u64);

impl FusionHandle {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FusionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FusionHandle({})", self.0)
    }
}

impl fmt::Display for FusionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Successful result of [`FusionEngine::try_fusion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionOutcome {
    /// The recipe fused instantly into this buff.
    Completed(BuffId),
    /// A timed fusion started; the result arrives via [`FusionEvent::Completed`].
    Started(FusionHandle),
}

impl FusionOutcome {
    /// Returns the produced buff for instant fusions.
    #[must_use]
    pub const fn result(self) -> Option<BuffId> {
        match self {
            Self::Completed(id) => Some(id),
            Self::Started(_) => None,
        }
    }
}

/// Notifications emitted by the [`FusionEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum FusionEvent {
    /// A timed fusion began.
    Started {
        /// Handle of the new fusion.
        handle: FusionHandle,
        /// Recipe being fused.
        recipe_id: String,
        /// Owner whose container is fusing.
        owner: OwnerId,
    },
    /// A timed fusion advanced.
    Progress {
        /// Fusion that advanced.
        handle: FusionHandle,
        /// Recipe being fused.
        recipe_id: String,
        /// Completion in `[0, 1]`.
        progress: f32,
    },
    /// A fusion produced its result.
    Completed {
        /// Recipe that fused.
        recipe_id: String,
        /// Owner that received the result.
        owner: OwnerId,
        /// Produced buff.
        result: BuffId,
    },
    /// A fusion attempt or a timed fusion failed.
    Failed {
        /// Recipe attempted.
        recipe_id: String,
        /// Owner the attempt was made for.
        owner: OwnerId,
        /// Why it failed.
        reason: FusionError,
    },
}

/// A timed fusion in progress.
#[derive(Debug, Clone)]
pub struct ActiveFusion {
    handle: FusionHandle,
    recipe: FusionRecipe,
    owner: OwnerId,
    remaining: f64,
    total: f64,
}

impl ActiveFusion {
    /// Returns the fusion's handle.
    #[must_use]
    pub const fn handle(&self) -> FusionHandle {
        self.handle
    }

    /// Returns the recipe as it was when the fusion started.
    #[must_use]
    pub const fn recipe(&self) -> &FusionRecipe {
        &self.recipe
    }

    /// Returns the owner whose container is fusing.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the seconds left.
    #[must_use]
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Returns the total fusion time.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Returns `1 - remaining / total`, clamped to `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn progress(&self) -> f32 {
        if self.total <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.total).clamp(0.0, 1.0) as f32
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Recipe registry plus the timed fusions in progress.
///
/// # Example
///
/// ```
/// use buffwright::arena::Arena;
/// use buffwright::container::BuffWorld;
/// use buffwright::fusion::{FusionEngine, FusionOutcome, FusionRecipe, Ingredient};
/// use buffwright::model::{BuffData, BuffDataId, StackMode};
/// use glam::Vec2;
///
/// let spark = BuffData::new(BuffDataId::new(1), "spark")
///     .with_stack_mode(StackMode::Independent);
/// let blaze = BuffData::new(BuffDataId::new(100), "blaze");
///
/// let mut arena = Arena::new();
/// arena.register_data(spark.clone());
/// arena.register_data(blaze);
/// let hero = arena.spawn("hero", 0, Vec2::ZERO);
/// arena.apply_buff(hero, &spark, None);
/// arena.apply_buff(hero, &spark, None);
///
/// let mut engine = FusionEngine::new();
/// engine
///     .register_recipe(
///         FusionRecipe::new("r1", BuffDataId::new(100))
///             .with_ingredient(Ingredient::consumed(BuffDataId::new(1), 2)),
///     )
///     .unwrap();
///
/// let outcome = engine.try_fusion("r1", hero, &mut arena).unwrap();
/// assert!(matches!(outcome, FusionOutcome::Completed(_)));
/// assert_eq!(arena.count_of(hero, BuffDataId::new(1)), 0);
/// ```
#[derive(Debug, Default)]
pub struct FusionEngine {
    recipes: BTreeMap<String, FusionRecipe>,
    active: Vec<ActiveFusion>,
    next_handle: u64,
    debug_logging: bool,
    events: EventLog<FusionEvent>,
}

impl FusionEngine {
    /// Creates an engine with no recipes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `debug!` traces for fusion decisions.
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Returns the event log.
    #[must_use]
    pub const fn events(&self) -> &EventLog<FusionEvent> {
        &self.events
    }

    /// Returns the event log mutably, for subscribing.
    pub fn events_mut(&mut self) -> &mut EventLog<FusionEvent> {
        &mut self.events
    }

    /// Drains recorded notifications.
    pub fn take_events(&mut self) -> Vec<FusionEvent> {
        self.events.take_events()
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// Registers `recipe`, replacing any recipe with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::EmptyRecipeId`] if the id is blank; the
    /// registry is left unchanged.
    pub fn register_recipe(&mut self, recipe: FusionRecipe) -> Result<(), FusionError> {
        if recipe.recipe_id.trim().is_empty() {
            warn!("refusing to register a recipe with an empty id");
            return Err(FusionError::EmptyRecipeId);
        }

        let id = recipe.recipe_id.clone();
        if self.debug_logging && self.recipes.contains_key(&id) {
            debug!(recipe = %id, "recipe replaced");
        }
        self.recipes.insert(id, recipe);
        Ok(())
    }

    /// Removes a recipe. Timed fusions already running keep their copy.
    pub fn unregister_recipe(&mut self, recipe_id: &str) -> Option<FusionRecipe> {
        self.recipes.remove(recipe_id)
    }

    /// Returns a registered recipe.
    #[must_use]
    pub fn recipe(&self, recipe_id: &str) -> Option<&FusionRecipe> {
        self.recipes.get(recipe_id)
    }

    /// Returns the number of registered recipes.
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Iterates over registered recipes in id order.
    pub fn recipes(&self) -> impl Iterator<Item = &FusionRecipe> {
        self.recipes.values()
    }

    /// Returns every recipe `container` can fuse right now, in id order.
    #[must_use]
    pub fn available_fusions(&self, container: &dyn BuffContainer) -> Vec<&FusionRecipe> {
        self.recipes
            .values()
            .filter(|recipe| recipe.is_satisfied_by(container))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Fusion
    // -------------------------------------------------------------------------

    /// Attempts recipe `recipe_id` on `owner`'s container.
    ///
    /// Instant recipes fuse immediately. Timed recipes start an
    /// [`ActiveFusion`] and return its handle; the result is produced by a
    /// later [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// - [`FusionError::RecipeNotFound`] for unknown ids
    /// - [`FusionError::OwnerNotFound`] if `owner` is not in `world`
    /// - [`FusionError::InsufficientIngredients`] for a short ingredient
    /// - [`FusionError::ConditionsNotMet`] for a failing condition
    /// - [`FusionError::ResultDataMissing`] if the result cannot be resolved
    ///
    /// Every failure is also emitted as [`FusionEvent::Failed`]; the container
    /// is left unchanged.
    pub fn try_fusion<W: BuffWorld>(
        &mut self,
        recipe_id: &str,
        owner: OwnerId,
        world: &mut W,
    ) -> Result<FusionOutcome, FusionError> {
        let result = self.begin(recipe_id, owner, world);
        if let Err(reason) = &result {
            self.fail(recipe_id, owner, reason.clone());
        }
        result
    }

    fn begin<W: BuffWorld>(
        &mut self,
        recipe_id: &str,
        owner: OwnerId,
        world: &mut W,
    ) -> Result<FusionOutcome, FusionError> {
        let recipe = self
            .recipes
            .get(recipe_id)
            .ok_or_else(|| FusionError::RecipeNotFound(recipe_id.to_string()))?;
        check(recipe, owner, world)?;

        if recipe.is_instant() {
            let recipe = recipe.clone();
            return self.execute(&recipe, owner, world).map(FusionOutcome::Completed);
        }

        let handle = FusionHandle(self.next_handle);
        self.next_handle += 1;
        let fusion = ActiveFusion {
            handle,
            recipe: recipe.clone(),
            owner,
            remaining: recipe.fusion_time,
            total: recipe.fusion_time,
        };
        self.active.push(fusion);

        if self.debug_logging {
            debug!(recipe = recipe_id, %owner, %handle, "fusion started");
        }
        self.events.emit(FusionEvent::Started {
            handle,
            recipe_id: recipe_id.to_string(),
            owner,
        });
        Ok(FusionOutcome::Started(handle))
    }

    /// Consumes ingredients and produces the result. Assumes `check` passed.
    fn execute<W: BuffWorld>(
        &mut self,
        recipe: &FusionRecipe,
        owner: OwnerId,
        world: &mut W,
    ) -> Result<BuffId, FusionError> {
        let data = world
            .buff_data(recipe.result_buff_id)
            .ok_or_else(|| FusionError::ResultDataMissing {
                recipe_id: recipe.recipe_id.clone(),
                result: recipe.result_buff_id,
            })?;
        let container = world
            .owner_mut(owner)
            .ok_or(FusionError::OwnerNotFound(owner))?
            .container_mut();

        for ingredient in recipe.ingredients.iter().filter(|i| i.consume) {
            let consumed: Vec<BuffId> = container
                .get_buffs(ingredient.buff_id)
                .iter()
                .take(ingredient.required_count)
                .map(|b| b.id())
                .collect();
            for id in consumed {
                container.remove_buff(id);
            }
        }
        let result = container.add_buff(&data, Some(owner));

        if self.debug_logging {
            debug!(recipe = %recipe.recipe_id, %owner, %result, "fusion completed");
        }
        self.events.emit(FusionEvent::Completed {
            recipe_id: recipe.recipe_id.clone(),
            owner,
            result,
        });
        Ok(result)
    }

    fn fail(&mut self, recipe_id: &str, owner: OwnerId, reason: FusionError) {
        warn!(recipe = recipe_id, %owner, error = %reason, "fusion failed");
        self.events.emit(FusionEvent::Failed {
            recipe_id: recipe_id.to_string(),
            owner,
            reason,
        });
    }

    /// Advances every timed fusion by `dt` seconds.
    ///
    /// Fusions are visited in start order. Each emits a progress event;
    /// those that run out of time are removed and executed after their
    /// ingredients and conditions are checked again. Returns the buffs
    /// produced this tick.
    pub fn update<W: BuffWorld>(&mut self, world: &mut W, dt: f64) -> Vec<BuffId> {
        let mut finished = Vec::new();
        let mut running = Vec::with_capacity(self.active.len());

        for mut fusion in std::mem::take(&mut self.active) {
            fusion.remaining -= dt;
            self.events.emit(FusionEvent::Progress {
                handle: fusion.handle,
                recipe_id: fusion.recipe.recipe_id.clone(),
                progress: fusion.progress(),
            });
            if fusion.remaining <= 0.0 {
                finished.push(fusion);
            } else {
                running.push(fusion);
            }
        }
        self.active = running;

        let mut produced = Vec::new();
        for fusion in finished {
            let outcome = check(&fusion.recipe, fusion.owner, world)
                .and_then(|()| self.execute(&fusion.recipe, fusion.owner, world));
            match outcome {
                Ok(id) => produced.push(id),
                Err(reason) => self.fail(&fusion.recipe.recipe_id, fusion.owner, reason),
            }
        }
        produced
    }

    /// Returns the timed fusions in progress, in start order.
    #[must_use]
    pub fn active_fusions(&self) -> &[ActiveFusion] {
        &self.active
    }

    /// Returns true if `handle` is still in progress.
    #[must_use]
    pub fn is_active(&self, handle: FusionHandle) -> bool {
        self.active.iter().any(|f| f.handle == handle)
    }

    /// Discards a timed fusion without consuming anything.
    ///
    /// Emits [`FusionEvent::Failed`] with [`FusionError::Cancelled`]. Returns
    /// false if the handle is not in progress.
    pub fn cancel(&mut self, handle: FusionHandle) -> bool {
        let Some(index) = self.active.iter().position(|f| f.handle == handle) else {
            return false;
        };
        let fusion = self.active.remove(index);
        self.fail(
            &fusion.recipe.recipe_id,
            fusion.owner,
            FusionError::Cancelled(handle),
        );
        true
    }

    /// Drops every recipe and every timed fusion.
    pub fn clear(&mut self) {
        self.recipes.clear();
        self.active.clear();
    }
}

/// Verifies that `owner` exists and satisfies `recipe`, and that the result
/// data resolves.
fn check<W: BuffWorld>(
    recipe: &FusionRecipe,
    owner: OwnerId,
    world: &W,
) -> Result<(), FusionError> {
    let container = world
        .owner(owner)
        .ok_or(FusionError::OwnerNotFound(owner))?
        .container();

    if let Some(short) = recipe.shortfall(container) {
        return Err(FusionError::InsufficientIngredients {
            recipe_id: recipe.recipe_id.clone(),
            buff_id: short.buff_id,
            required: short.required,
            available: short.available,
        });
    }
    if let Some(condition) = recipe.unmet_condition(container) {
        return Err(FusionError::ConditionsNotMet {
            recipe_id: recipe.recipe_id.clone(),
            condition: condition.describe(),
        });
    }
    if world.buff_data(recipe.result_buff_id).is_none() {
        return Err(FusionError::ResultDataMissing {
            recipe_id: recipe.recipe_id.clone(),
            result: recipe.result_buff_id,
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::model::{BuffData, StackMode};
    use glam::Vec2;

    const SPARK: BuffDataId = BuffDataId::new(1);
    const EMBER: BuffDataId = BuffDataId::new(2);
    const BLAZE: BuffDataId = BuffDataId::new(100);

    fn setup(sparks: usize) -> (Arena, OwnerId) {
        let mut arena = Arena::new();
        let spark = BuffData::new(SPARK, "spark").with_stack_mode(StackMode::Independent);
        arena.register_data(spark.clone());
        arena.register_data(BuffData::new(EMBER, "ember"));
        arena.register_data(BuffData::new(BLAZE, "blaze"));

        let hero = arena.spawn("hero", 0, Vec2::ZERO);
        for _ in 0..sparks {
            arena.apply_buff(hero, &spark, None);
        }
        (arena, hero)
    }

    fn blaze_recipe(id: &str, time: f64) -> FusionRecipe {
        FusionRecipe::new(id, BLAZE)
            .with_ingredient(Ingredient::consumed(SPARK, 2))
            .with_fusion_time(time)
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn register_upserts_by_id() {
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r1", 0.0)).unwrap();
            engine.register_recipe(blaze_recipe("r1", 4.0)).unwrap();

            assert_eq!(engine.recipe_count(), 1);
            assert!((engine.recipe("r1").unwrap().fusion_time - 4.0).abs() < f64::EPSILON);
        }

        #[test]
        fn empty_id_is_rejected() {
            let mut engine = FusionEngine::new();
            assert_eq!(
                engine.register_recipe(blaze_recipe("  ", 0.0)),
                Err(FusionError::EmptyRecipeId)
            );
            assert_eq!(engine.recipe_count(), 0);
        }

        #[test]
        fn unregister_and_clear() {
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("a", 0.0)).unwrap();
            engine.register_recipe(blaze_recipe("b", 0.0)).unwrap();

            assert!(engine.unregister_recipe("a").is_some());
            assert!(engine.unregister_recipe("a").is_none());
            engine.clear();
            assert_eq!(engine.recipes().count(), 0);
        }

        #[test]
        fn available_fusions_in_id_order() {
            let (arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("zeta", 0.0)).unwrap();
            engine.register_recipe(blaze_recipe("alpha", 0.0)).unwrap();
            engine
                .register_recipe(
                    FusionRecipe::new("needs-ember", BLAZE)
                        .with_ingredient(Ingredient::consumed(EMBER, 1)),
                )
                .unwrap();

            let container = arena.get(hero).unwrap().container();
            let ids: Vec<&str> = engine
                .available_fusions(container)
                .iter()
                .map(|r| r.recipe_id.as_str())
                .collect();
            assert_eq!(ids, vec!["alpha", "zeta"]);
            assert!(engine.events().is_empty());
        }
    }

    mod instant_tests {
        use super::*;

        #[test]
        fn consumes_ingredients_and_produces_result() {
            let (mut arena, hero) = setup(3);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r1", 0.0)).unwrap();

            let result = engine
                .try_fusion("r1", hero, &mut arena)
                .unwrap()
                .result()
                .unwrap();

            assert_eq!(arena.buff(result).unwrap().data_id(), BLAZE);
            assert_eq!(arena.count_of(hero, SPARK), 1);
            assert!(matches!(
                &engine.take_events()[..],
                [FusionEvent::Completed { .. }]
            ));
        }

        #[test]
        fn catalysts_are_kept() {
            let (mut arena, hero) = setup(1);
            let mut engine = FusionEngine::new();
            engine
                .register_recipe(
                    FusionRecipe::new("r", BLAZE).with_ingredient(Ingredient::catalyst(SPARK, 1)),
                )
                .unwrap();

            engine.try_fusion("r", hero, &mut arena).unwrap();
            assert_eq!(arena.count_of(hero, SPARK), 1);
            assert_eq!(arena.count_of(hero, BLAZE), 1);
        }

        #[test]
        fn split_ingredient_needs_combined_count() {
            let (mut arena, hero) = setup(1);
            let mut engine = FusionEngine::new();
            engine
                .register_recipe(
                    FusionRecipe::new("split", BLAZE)
                        .with_ingredient(Ingredient::consumed(SPARK, 1))
                        .with_ingredient(Ingredient::consumed(SPARK, 1)),
                )
                .unwrap();

            let err = engine.try_fusion("split", hero, &mut arena).unwrap_err();
            assert_eq!(
                err,
                FusionError::InsufficientIngredients {
                    recipe_id: "split".to_string(),
                    buff_id: SPARK,
                    required: 2,
                    available: 1,
                }
            );
            assert_eq!(arena.count_of(hero, SPARK), 1);
            assert_eq!(arena.count_of(hero, BLAZE), 0);
        }

        #[test]
        fn unknown_recipe_fails() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();

            let err = engine.try_fusion("nope", hero, &mut arena).unwrap_err();
            assert_eq!(err, FusionError::RecipeNotFound("nope".to_string()));
            assert!(matches!(
                &engine.take_events()[..],
                [FusionEvent::Failed { reason: FusionError::RecipeNotFound(_), .. }]
            ));
        }

        #[test]
        fn insufficient_ingredients_fail() {
            let (mut arena, hero) = setup(1);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r1", 0.0)).unwrap();

            let err = engine.try_fusion("r1", hero, &mut arena).unwrap_err();
            assert!(matches!(
                err,
                FusionError::InsufficientIngredients {
                    required: 2,
                    available: 1,
                    ..
                }
            ));
            assert_eq!(arena.count_of(hero, SPARK), 1);
        }

        #[test]
        fn failed_condition_fails() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine
                .register_recipe(
                    blaze_recipe("r1", 0.0)
                        .with_condition(FusionCondition::MinStack { buff_id: SPARK, min: 5 }),
                )
                .unwrap();

            let err = engine.try_fusion("r1", hero, &mut arena).unwrap_err();
            assert!(matches!(err, FusionError::ConditionsNotMet { .. }));
            assert_eq!(arena.count_of(hero, SPARK), 2);
        }

        #[test]
        fn missing_result_data_keeps_ingredients() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine
                .register_recipe(
                    FusionRecipe::new("broken", BuffDataId::new(999))
                        .with_ingredient(Ingredient::consumed(SPARK, 2)),
                )
                .unwrap();

            let err = engine.try_fusion("broken", hero, &mut arena).unwrap_err();
            assert!(matches!(err, FusionError::ResultDataMissing { .. }));
            assert_eq!(arena.count_of(hero, SPARK), 2);
        }

        #[test]
        fn unknown_owner_fails() {
            let (mut arena, _) = setup(0);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r1", 0.0)).unwrap();

            let err = engine.try_fusion("r1", OwnerId::new(77), &mut arena).unwrap_err();
            assert_eq!(err, FusionError::OwnerNotFound(OwnerId::new(77)));
        }
    }

    mod timed_tests {
        use super::*;

        #[test]
        fn completes_after_fusion_time() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r2", 5.0)).unwrap();

            let outcome = engine.try_fusion("r2", hero, &mut arena).unwrap();
            let FusionOutcome::Started(handle) = outcome else {
                panic!("expected a timed fusion, got {outcome:?}");
            };
            assert!(engine.is_active(handle));
            assert_eq!(arena.count_of(hero, SPARK), 2);

            for _ in 0..4 {
                assert!(engine.update(&mut arena, 1.0).is_empty());
            }
            let progress: Vec<f32> = engine
                .take_events()
                .into_iter()
                .filter_map(|e| match e {
                    FusionEvent::Progress { progress, .. } => Some(progress),
                    _ => None,
                })
                .collect();
            let expected = [0.2, 0.4, 0.6, 0.8];
            assert_eq!(progress.len(), expected.len());
            for (got, want) in progress.iter().zip(expected) {
                assert!((got - want).abs() < 1e-6, "{got} != {want}");
            }

            let produced = engine.update(&mut arena, 1.0);
            assert_eq!(produced.len(), 1);
            assert!(engine.active_fusions().is_empty());
            assert_eq!(arena.count_of(hero, SPARK), 0);
            assert_eq!(arena.count_of(hero, BLAZE), 1);
        }

        #[test]
        fn ingredients_gone_at_completion_fails_cleanly() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r2", 1.0)).unwrap();
            engine.try_fusion("r2", hero, &mut arena).unwrap();

            arena.get_mut(hero).unwrap().container_mut().clear_all_buffs();
            assert!(engine.update(&mut arena, 1.0).is_empty());

            let events = engine.take_events();
            assert!(matches!(
                events.last(),
                Some(FusionEvent::Failed {
                    reason: FusionError::InsufficientIngredients { .. },
                    ..
                })
            ));
            assert_eq!(arena.count_of(hero, BLAZE), 0);
        }

        #[test]
        fn cancel_discards_without_consuming() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r2", 3.0)).unwrap();
            let FusionOutcome::Started(handle) = engine.try_fusion("r2", hero, &mut arena).unwrap()
            else {
                panic!("expected a timed fusion");
            };

            assert!(engine.cancel(handle));
            assert!(!engine.cancel(handle));
            engine.update(&mut arena, 10.0);

            assert_eq!(arena.count_of(hero, SPARK), 2);
            assert_eq!(arena.count_of(hero, BLAZE), 0);
        }

        #[test]
        fn running_fusion_survives_unregister() {
            let (mut arena, hero) = setup(2);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("r2", 1.0)).unwrap();
            engine.try_fusion("r2", hero, &mut arena).unwrap();
            engine.unregister_recipe("r2");

            assert_eq!(engine.update(&mut arena, 1.0).len(), 1);
        }

        #[test]
        fn progress_is_reported_in_start_order() {
            let (mut arena, hero) = setup(4);
            let mut engine = FusionEngine::new();
            engine.register_recipe(blaze_recipe("a", 2.0)).unwrap();
            engine.register_recipe(blaze_recipe("b", 4.0)).unwrap();
            engine.try_fusion("b", hero, &mut arena).unwrap();
            engine.try_fusion("a", hero, &mut arena).unwrap();
            engine.take_events();

            engine.update(&mut arena, 1.0);
            let order: Vec<String> = engine
                .take_events()
                .into_iter()
                .filter_map(|e| match e {
                    FusionEvent::Progress { recipe_id, .. } => Some(recipe_id),
                    _ => None,
                })
                .collect();
            assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
        }
    }
}
