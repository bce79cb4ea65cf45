//! Meal domain: recipes as habit entities, instructions as substeps.
//!
//! The scheduler only sees recipes through the narrow [`RecipeSource`] read
//! interface. [`InMemoryRecipeSource`] backs tests and the host binary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::adapter::{DomainAdapter, DomainSnapshot, SubstepKey, SubstepPlan, VersionNumber};
use super::titles::TitleResolver;
use crate::error::{PlannerError, Result};

/// Registry key for the meal domain.
pub const MEAL_DOMAIN: &str = "meal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    /// 1-based position within the recipe.
    pub step: u32,
    pub text: String,
}

/// One version of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub version: VersionNumber,
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl Recipe {
    pub fn instruction(&self, instruction_id: &str) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == instruction_id)
    }

    /// Instructions ordered by step.
    pub fn ordered_instructions(&self) -> Vec<&Instruction> {
        let mut ordered: Vec<&Instruction> = self.instructions.iter().collect();
        ordered.sort_by_key(|i| i.step);
        ordered
    }
}

/// Read access to the recipe store.
pub trait RecipeSource: Send + Sync {
    fn latest_recipe(&self, recipe_id: &str) -> Option<Recipe>;

    fn recipe_version(&self, recipe_id: &str, version: VersionNumber) -> Option<Recipe>;
}

/// Versioned in-memory recipe store.
#[derive(Debug, Default)]
pub struct InMemoryRecipeSource {
    recipes: RwLock<HashMap<String, Vec<Recipe>>>,
}

impl InMemoryRecipeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new version of `recipe_id` and return its version number.
    ///
    /// Versions start at 1 and increase by one per call.
    pub fn publish(
        &self,
        recipe_id: &str,
        name: &str,
        instructions: Vec<Instruction>,
    ) -> Result<VersionNumber> {
        let mut recipes = self
            .recipes
            .write()
            .map_err(|e| PlannerError::Persistence(format!("recipe store lock poisoned: {e}")))?;
        let versions = recipes.entry(recipe_id.to_owned()).or_default();
        let version = versions.last().map_or(1, |r| r.version + 1);
        versions.push(Recipe {
            id: recipe_id.to_owned(),
            version,
            name: name.to_owned(),
            instructions,
        });
        Ok(version)
    }
}

impl RecipeSource for InMemoryRecipeSource {
    fn latest_recipe(&self, recipe_id: &str) -> Option<Recipe> {
        let recipes = self.recipes.read().ok()?;
        recipes.get(recipe_id)?.last().cloned()
    }

    fn recipe_version(&self, recipe_id: &str, version: VersionNumber) -> Option<Recipe> {
        let recipes = self.recipes.read().ok()?;
        recipes
            .get(recipe_id)?
            .iter()
            .find(|r| r.version == version)
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// [`DomainAdapter`] for recipes.
pub struct MealAdapter {
    source: Arc<dyn RecipeSource>,
}

impl MealAdapter {
    pub fn new(source: Arc<dyn RecipeSource>) -> Self {
        Self { source }
    }

    fn recipe_at(&self, recipe_id: &str, version: VersionNumber) -> Result<Recipe> {
        self.source
            .recipe_version(recipe_id, version)
            .ok_or_else(|| PlannerError::entity_not_found(MEAL_DOMAIN, format!("{recipe_id}@{version}")))
    }

    fn key(recipe: &Recipe, instruction_id: &str, offset_days: i32) -> SubstepKey {
        SubstepKey {
            domain: MEAL_DOMAIN.to_owned(),
            entity_id: recipe.id.clone(),
            entity_version: recipe.version,
            sub_entity_id: instruction_id.to_owned(),
            offset_days,
            time: None,
            title_override: None,
        }
    }
}

impl DomainAdapter for MealAdapter {
    fn domain(&self) -> &str {
        MEAL_DOMAIN
    }

    fn latest_version(&self, entity_id: &str) -> Result<VersionNumber> {
        self.source
            .latest_recipe(entity_id)
            .map(|r| r.version)
            .ok_or_else(|| PlannerError::entity_not_found(MEAL_DOMAIN, entity_id))
    }

    fn snapshot(&self, entity_id: &str, version: VersionNumber) -> Result<DomainSnapshot> {
        let recipe = self.recipe_at(entity_id, version)?;
        let payload = serde_json::to_value(&recipe)
            .map_err(|e| PlannerError::Persistence(format!("cannot snapshot recipe {entity_id}: {e}")))?;
        Ok(DomainSnapshot {
            domain: MEAL_DOMAIN.to_owned(),
            entity_id: entity_id.to_owned(),
            version,
            payload,
        })
    }

    fn resolve_plan(
        &self,
        plan: &SubstepPlan,
        entity_id: &str,
        entity_version: VersionNumber,
    ) -> Result<Vec<SubstepKey>> {
        match plan {
            SubstepPlan::All { offset_days, time } => {
                let recipe = self.recipe_at(entity_id, entity_version)?;
                Ok(recipe
                    .ordered_instructions()
                    .into_iter()
                    .map(|instruction| SubstepKey {
                        time: *time,
                        ..Self::key(&recipe, &instruction.id, *offset_days)
                    })
                    .collect())
            }
            SubstepPlan::Explicit { steps } => {
                let recipe = self.recipe_at(entity_id, entity_version)?;
                steps
                    .iter()
                    .map(|step| {
                        if recipe.instruction(&step.sub_entity_id).is_none() {
                            return Err(PlannerError::entity_not_found(
                                MEAL_DOMAIN,
                                format!("{entity_id}/{}", step.sub_entity_id),
                            ));
                        }
                        Ok(SubstepKey {
                            time: step.time,
                            title_override: step.title_override.clone(),
                            ..Self::key(&recipe, &step.sub_entity_id, step.offset_days)
                        })
                    })
                    .collect()
            }
            SubstepPlan::Tagged { tag } => {
                warn!(entity_id, tag = %tag, "tagged meal plans are not supported yet; no substeps resolved");
                Ok(Vec::new())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// [`TitleResolver`] for recipes and their instructions.
pub struct MealTitleResolver {
    source: Arc<dyn RecipeSource>,
}

impl MealTitleResolver {
    pub fn new(source: Arc<dyn RecipeSource>) -> Self {
        Self { source }
    }
}

impl TitleResolver for MealTitleResolver {
    fn domain(&self) -> &str {
        MEAL_DOMAIN
    }

    fn main_event_title(&self, entity_id: &str) -> Result<String> {
        self.source
            .latest_recipe(entity_id)
            .map(|r| r.name)
            .ok_or_else(|| PlannerError::entity_not_found(MEAL_DOMAIN, entity_id))
    }

    /// `sub_entity_id` is a [`SubstepKey::reference`]; the title is read
    /// from the recipe version the substep was resolved against.
    fn sub_entity_title(&self, sub_entity_id: &str) -> Result<String> {
        let (recipe_id, version, instruction_id) = SubstepKey::parse_reference(sub_entity_id)
            .ok_or_else(|| PlannerError::entity_not_found(MEAL_DOMAIN, sub_entity_id))?;
        let recipe = self
            .source
            .recipe_version(recipe_id, version)
            .ok_or_else(|| PlannerError::entity_not_found(MEAL_DOMAIN, sub_entity_id))?;
        let instruction = recipe
            .instruction(instruction_id)
            .ok_or_else(|| PlannerError::entity_not_found(MEAL_DOMAIN, sub_entity_id))?;
        Ok(format!("{}: step {} - {}", recipe.name, instruction.step, instruction.text))
    }

    fn placeholder_main_title(&self) -> String {
        "Meal".to_owned()
    }

    fn placeholder_sub_title(&self) -> String {
        "Meal step".to_owned()
    }
}
