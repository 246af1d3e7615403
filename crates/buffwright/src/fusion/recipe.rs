//! Recipes and their ingredients.

use serde::{Deserialize, Serialize};

use super::FusionCondition;
use crate::container::BuffContainer;
use crate::model::BuffDataId;

const fn consume_by_default() -> bool {
    true
}

/// One input of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Buff data that must be present.
    pub buff_id: BuffDataId,
    /// Number of live instances required.
    pub required_count: usize,
    /// Whether the instances are removed when the fusion executes.
    #[serde(default = "consume_by_default")]
    pub consume: bool,
}

impl Ingredient {
    /// An ingredient that is used up by the fusion.
    #[must_use]
    pub const fn consumed(buff_id: BuffDataId, required_count: usize) -> Self {
        Self {
            buff_id,
            required_count,
            consume: true,
        }
    }

    /// An ingredient that must be present but is left in place.
    #[must_use]
    pub const fn catalyst(buff_id: BuffDataId, required_count: usize) -> Self {
        Self {
            buff_id,
            required_count,
            consume: false,
        }
    }
}

/// A shortfall found while checking ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    /// Ingredient that is short.
    pub buff_id: BuffDataId,
    /// Instances the recipe asks for.
    pub required: usize,
    /// Instances the container holds.
    pub available: usize,
}

/// Recipe turning existing buffs into a new one.
///
/// `fusion_time == 0` fuses instantly; anything larger starts a timed
/// fusion that completes after that many seconds of engine ticks.
///
/// # Example
///
/// ```
/// use buffwright::fusion::{FusionRecipe, Ingredient};
/// use buffwright::model::BuffDataId;
///
/// let recipe = FusionRecipe::new("steam", BuffDataId::new(100))
///     .with_ingredient(Ingredient::consumed(BuffDataId::new(1), 1))
///     .with_ingredient(Ingredient::consumed(BuffDataId::new(2), 1))
///     .with_fusion_time(3.0);
///
/// assert!(!recipe.is_instant());
/// assert_eq!(recipe.ingredients.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionRecipe {
    /// Registry key.
    pub recipe_id: String,
    /// Inputs, checked and consumed in order.
    pub ingredients: Vec<Ingredient>,
    /// Data id of the buff produced.
    pub result_buff_id: BuffDataId,
    /// Seconds until completion; 0 is instant.
    #[serde(default)]
    pub fusion_time: f64,
    /// Extra preconditions, all of which must hold.
    #[serde(default)]
    pub conditions: Vec<FusionCondition>,
}

impl FusionRecipe {
    /// Creates an instant recipe with no ingredients or conditions.
    #[must_use]
    pub fn new(recipe_id: &str, result_buff_id: BuffDataId) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            ingredients: Vec::new(),
            result_buff_id,
            fusion_time: 0.0,
            conditions: Vec::new(),
        }
    }

    /// Appends an ingredient.
    #[must_use]
    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    /// Appends a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: FusionCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Sets the fusion time (negative values mean instant).
    #[must_use]
    pub fn with_fusion_time(mut self, seconds: f64) -> Self {
        self.fusion_time = seconds.max(0.0);
        self
    }

    /// Returns true if the recipe fuses without waiting.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.fusion_time <= 0.0
    }

    /// Instances of `buff_id` the recipe needs across all its ingredients.
    #[must_use]
    pub fn required_of(&self, buff_id: BuffDataId) -> usize {
        self.ingredients
            .iter()
            .filter(|i| i.buff_id == buff_id)
            .map(|i| i.required_count)
            .sum()
    }

    /// Returns the first ingredient the container cannot supply.
    ///
    /// Entries sharing a data id are checked against their combined count.
    #[must_use]
    pub fn shortfall(&self, container: &dyn BuffContainer) -> Option<Shortfall> {
        self.ingredients.iter().find_map(|ingredient| {
            let required = self.required_of(ingredient.buff_id);
            let available = container.count_of(ingredient.buff_id);
            (available < required).then_some(Shortfall {
                buff_id: ingredient.buff_id,
                required,
                available,
            })
        })
    }

    /// Returns the first condition that does not hold.
    #[must_use]
    pub fn unmet_condition(&self, container: &dyn BuffContainer) -> Option<&FusionCondition> {
        self.conditions.iter().find(|c| !c.is_met(container, self))
    }

    /// Returns true if every ingredient and condition is satisfied.
    #[must_use]
    pub fn is_satisfied_by(&self, container: &dyn BuffContainer) -> bool {
        self.shortfall(container).is_none() && self.unmet_condition(container).is_none()
    }
}
