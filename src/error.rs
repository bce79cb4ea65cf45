//! Error types for the habit planner.

/// Failure to hand a finished batch of task instances to the downstream consumer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// The receiving side of the publish channel has gone away.
    #[error("publish channel closed")]
    ChannelClosed,

    /// The consumer refused the batch.
    #[error("batch rejected: {0}")]
    Rejected(String),
}

/// Top-level error type for the planner core.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// IANA zone name not recognised.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Local time is not a 24-hour `HH:MM` value.
    #[error("invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// No adapter or resolver registered for the domain.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    /// A domain entity referenced by a habit cannot be resolved.
    #[error("{domain} entity not found: {entity_id}")]
    EntityNotFound { domain: String, entity_id: String },

    /// The occurrence for this cycle was already written.
    ///
    /// `PlannerStore::commit_occurrence` reports this conflict as
    /// `CommitOutcome::AlreadyGenerated` and the generator counts it as a
    /// skip. The variant is for callers that write occurrences outside the
    /// generator and need the conflict as an error.
    #[error("occurrence already generated for habit {habit_id} in cycle {cycle_key}")]
    DuplicateOccurrence { habit_id: String, cycle_key: String },

    /// A habit, occurrence, or other stored record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Storage failure. The whole-habit transaction is safe to retry.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The batch was not delivered and the habit's transaction was rolled back.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// A habit definition violates the data-model invariants.
    #[error("validation error: {0}")]
    Validation(String),

    /// Generation deadline passed before this habit was attempted.
    #[error("generation timed out before habit {habit_id}")]
    Timeout { habit_id: String },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    /// Returns `true` for failures where retrying the whole habit is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Publish(_) | Self::Timeout { .. })
    }

    pub(crate) fn entity_not_found(domain: &str, entity_id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            domain: domain.to_owned(),
            entity_id: entity_id.into(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PlannerError>;
