//! Lazy generation on read paths.
//!
//! Callers invoke [`LazyTrigger::ensure_generated`] before listing a user's
//! todos. It never fails: generation problems are logged and reported in the
//! returned [`GenerationResult`], and the read path carries on with whatever
//! is already stored.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{error, warn};

use crate::generator::{GenerationResult, OccurrenceGenerator};
use crate::timezone;

/// Entry point for request-triggered generation.
#[derive(Debug, Clone)]
pub struct LazyTrigger {
    generator: Arc<OccurrenceGenerator>,
}

impl LazyTrigger {
    pub fn new(generator: Arc<OccurrenceGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &Arc<OccurrenceGenerator> {
        &self.generator
    }

    /// Generate whatever is due for `user_id` on `local_date`.
    ///
    /// Safe to call repeatedly and concurrently for the same pair; cycles
    /// already generated are counted, not rewritten.
    pub fn ensure_generated(&self, user_id: &str, local_date: NaiveDate) -> GenerationResult {
        match self.generator.generate_for(user_id, local_date) {
            Ok(result) => {
                if !result.failed_habit_ids.is_empty() {
                    warn!(
                        user_id,
                        %local_date,
                        failed = ?result.failed_habit_ids,
                        "some habits were not generated"
                    );
                }
                result
            }
            Err(e) => {
                error!(user_id, %local_date, "habit generation aborted: {e}");
                GenerationResult::aborted(local_date, e)
            }
        }
    }

    /// [`ensure_generated`](Self::ensure_generated) for "today" in the
    /// caller's zone. A missing or unknown zone degrades to UTC with a warning.
    pub fn ensure_generated_today(
        &self,
        user_id: &str,
        timezone: Option<&str>,
    ) -> GenerationResult {
        let tz = timezone::timezone_or_utc(timezone);
        let today = Utc::now().with_timezone(&tz).date_naive();
        self.ensure_generated(user_id, today)
    }
}
