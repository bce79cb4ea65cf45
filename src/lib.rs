//! Habit planner: turns recurring habits into dated, timezone-aware todos.
//!
//! A habit is a recurring commitment (daily, or weekly on a target weekday)
//! that may carry substeps scheduled on earlier weekdays of the same week.
//! Occurrences are generated lazily: reading a user's todos for a date first
//! generates whatever is due, exactly once per habit per cycle.
//!
//! # Architecture
//!
//! - **Habits**: data model and the trigger/recurrence rules
//! - **Timezone**: local date/time to UTC conversion with DST handling
//! - **Domains**: pluggable adapters and title resolvers (e.g. meals)
//! - **Store**: SQLite persistence with a per-cycle uniqueness guarantee
//! - **Generator**: builds occurrences and task instances, then publishes them
//! - **Trigger**: never-failing lazy entry point used on read paths
//! - **Planner**: facade tying the above together

pub mod config;
pub mod domains;
pub mod error;
pub mod generator;
pub mod habits;
pub mod planner;
pub mod publish;
pub mod store;
pub mod timezone;
pub mod trigger;

pub use config::PlannerConfig;
pub use error::{PlannerError, PublishError, Result};
pub use generator::{GenerationResult, OccurrenceGenerator};
pub use planner::Planner;
pub use publish::{ChannelPublisher, LogPublisher, TaskPublisher};
pub use store::{CommitOutcome, PlannerStore, SqlitePlannerStore};
pub use trigger::LazyTrigger;
