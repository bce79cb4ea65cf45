//! Delivery of generated task instances to the downstream todo consumer.
//!
//! The generator publishes each habit's batch from inside its commit
//! transaction, so a failed publish leaves nothing behind in storage.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::PublishError;
use crate::habits::GeneratedTaskInstance;

/// Sink for finished batches.
pub trait TaskPublisher: Send + Sync {
    /// Deliver one habit's task instances under `topic`.
    fn publish_batch(
        &self,
        topic: &str,
        batch: &[GeneratedTaskInstance],
    ) -> Result<(), PublishError>;
}

/// One delivered batch as seen by a channel consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedBatch {
    pub topic: String,
    pub instances: Vec<GeneratedTaskInstance>,
}

/// In-process publisher backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<PublishedBatch>,
}

impl ChannelPublisher {
    /// Publisher plus the receiver the consumer reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PublishedBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: mpsc::UnboundedSender<PublishedBatch>) -> Self {
        Self { tx }
    }
}

impl TaskPublisher for ChannelPublisher {
    fn publish_batch(
        &self,
        topic: &str,
        batch: &[GeneratedTaskInstance],
    ) -> Result<(), PublishError> {
        self.tx
            .send(PublishedBatch {
                topic: topic.to_owned(),
                instances: batch.to_vec(),
            })
            .map_err(|_| PublishError::ChannelClosed)?;
        debug!(topic, count = batch.len(), "batch published");
        Ok(())
    }
}

/// Publisher that only records batches in the log. Used by the host binary
/// when nothing is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl TaskPublisher for LogPublisher {
    fn publish_batch(
        &self,
        topic: &str,
        batch: &[GeneratedTaskInstance],
    ) -> Result<(), PublishError> {
        for instance in batch {
            info!(
                topic,
                habit_id = %instance.habit_id,
                due_date = %instance.due_date,
                scheduled_for = %instance.scheduled_for,
                title = %instance.title,
                "task generated"
            );
        }
        Ok(())
    }
}
