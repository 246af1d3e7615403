//! Recipe conditions.
//!
//! Conditions are a closed set of variants evaluated by pattern match. The
//! built-in variants are plain data and load from JSON along with their
//! recipe; [`FusionCondition::Custom`] wraps a host predicate and exists only
//! in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::FusionRecipe;
use crate::container::BuffContainer;
use crate::model::BuffDataId;

type Predicate = dyn Fn(&dyn BuffContainer, &FusionRecipe) -> bool + Send + Sync;

/// A named, game-specific predicate over a container and a recipe.
#[derive(Clone)]
pub struct CustomCondition {
    name: String,
    predicate: Arc<Predicate>,
}

impl CustomCondition {
    /// Wraps `predicate` under a diagnostic `name`.
    pub fn new<F>(name: &str, predicate: F) -> Self
    where
        F: Fn(&dyn BuffContainer, &FusionRecipe) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns the diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, container: &dyn BuffContainer, recipe: &FusionRecipe) -> bool {
        (self.predicate)(container, recipe)
    }
}

impl fmt::Debug for CustomCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCondition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A precondition a container must satisfy before a recipe can fuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FusionCondition {
    /// Some instance of `buff_id` has at least `min` stacks.
    MinStack {
        /// Buff data inspected.
        buff_id: BuffDataId,
        /// Inclusive lower bound.
        min: u32,
    },
    /// Every instance of `buff_id` has at most `max` stacks.
    ///
    /// Holds vacuously when no instance exists.
    MaxStack {
        /// Buff data inspected.
        buff_id: BuffDataId,
        /// Inclusive upper bound.
        max: u32,
    },
    /// Some instance of `buff_id` has been alive for at least `seconds`.
    ///
    /// Permanent instances always qualify.
    MinDuration {
        /// Buff data inspected.
        buff_id: BuffDataId,
        /// Inclusive lower bound in seconds.
        seconds: f64,
    },
    /// The container's total buff count lies within `[min, max]`.
    BuffCount {
        /// Inclusive lower bound.
        min: usize,
        /// Inclusive upper bound, unbounded when absent.
        #[serde(default)]
        max: Option<usize>,
    },
    /// Host-defined predicate.
    #[serde(skip)]
    Custom(CustomCondition),
}

impl FusionCondition {
    /// Builds a [`FusionCondition::Custom`].
    pub fn custom<F>(name: &str, predicate: F) -> Self
    where
        F: Fn(&dyn BuffContainer, &FusionRecipe) -> bool + Send + Sync + 'static,
    {
        Self::Custom(CustomCondition::new(name, predicate))
    }

    /// Evaluates the condition against `container`.
    #[must_use]
    pub fn is_met(&self, container: &dyn BuffContainer, recipe: &FusionRecipe) -> bool {
        match self {
            Self::MinStack { buff_id, min } => container
                .get_buffs(*buff_id)
                .iter()
                .any(|b| b.stack() >= *min),
            Self::MaxStack { buff_id, max } => container
                .get_buffs(*buff_id)
                .iter()
                .all(|b| b.stack() <= *max),
            Self::MinDuration { buff_id, seconds } => container
                .get_buffs(*buff_id)
                .iter()
                .any(|b| b.is_permanent() || b.elapsed() >= *seconds),
            Self::BuffCount { min, max } => {
                let count = container.len();
                count >= *min && max.map_or(true, |max| count <= max)
            }
            Self::Custom(custom) => custom.check(container, recipe),
        }
    }

    /// Short description used in failure reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::MinStack { buff_id, min } => format!("stack of {buff_id} >= {min}"),
            Self::MaxStack { buff_id, max } => format!("stack of {buff_id} <= {max}"),
            Self::MinDuration { buff_id, seconds } => {
                format!("{buff_id} active for {seconds}s")
            }
            Self::BuffCount { min, max: Some(max) } => format!("buff count in {min}..={max}"),
            Self::BuffCount { min, max: None } => format!("buff count >= {min}"),
            Self::Custom(custom) => custom.name().to_string(),
        }
    }
}
