//! Pluggable domains behind the scheduler.
//!
//! Sub-modules:
//! - `adapter`: [`DomainAdapter`] trait, substep plans, and the adapter registry.
//! - `titles`: [`TitleResolver`] trait and the never-failing resolver registry.
//! - `meal`: recipes as habit entities.

pub mod adapter;
pub mod meal;
pub mod titles;

pub use adapter::{
    DomainAdapter, DomainAdapterRegistry, DomainSnapshot, ExplicitStep, SubstepKey, SubstepPlan,
    VersionNumber,
};
pub use meal::{InMemoryRecipeSource, MealAdapter, MealTitleResolver, RecipeSource, MEAL_DOMAIN};
pub use titles::{TitleResolver, TitleResolverRegistry};
