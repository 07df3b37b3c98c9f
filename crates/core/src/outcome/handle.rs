use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::error;

use super::events::OutcomeEvent;
use crate::pending::AuditContext;

/// Envelope wrapping an event with its timestamp and provenance
#[derive(Debug, Clone)]
pub struct OutcomeEnvelope {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub correlation_id: String,
    pub event: OutcomeEvent,
}

/// Handle for emitting outcome events from anywhere in the application
///
/// Cheap to clone; all clones feed the same writer channel.
#[derive(Debug, Clone)]
pub struct OutcomeHandle {
    tx: mpsc::Sender<OutcomeEnvelope>,
}

impl OutcomeHandle {
    pub(crate) fn new(tx: mpsc::Sender<OutcomeEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an outcome event (async)
    ///
    /// If the channel is closed, the event is dropped and an error is logged.
    /// Emission never fails the caller's operation.
    pub async fn emit(&self, event: OutcomeEvent, ctx: &AuditContext) {
        let envelope = OutcomeEnvelope {
            timestamp: Utc::now(),
            actor: ctx.actor.clone(),
            correlation_id: ctx.correlation_id.to_string(),
            event,
        };

        if let Err(e) = self.tx.send(envelope).await {
            error!("Failed to emit outcome event: {}", e);
        }
    }

    /// Try to emit without waiting for channel capacity
    ///
    /// Returns false if the channel is full or closed.
    pub fn try_emit(&self, event: OutcomeEvent, ctx: &AuditContext) -> bool {
        let envelope = OutcomeEnvelope {
            timestamp: Utc::now(),
            actor: ctx.actor.clone(),
            correlation_id: ctx.correlation_id.to_string(),
            event,
        };

        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to emit outcome event: {}", e);
                false
            }
        }
    }
}
