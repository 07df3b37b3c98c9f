use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::events::OutcomeRecord;
use super::handle::{OutcomeEnvelope, OutcomeHandle};
use super::store::OutcomeStore;
use crate::metrics;

/// Background writer that drains the outcome channel and persists events
///
/// Persistence failures are logged and do not stop the loop; the daemon
/// must keep working when the outcome log is unwritable.
pub struct OutcomeWriter {
    rx: mpsc::Receiver<OutcomeEnvelope>,
    store: Arc<dyn OutcomeStore>,
}

impl OutcomeWriter {
    pub(crate) fn new(rx: mpsc::Receiver<OutcomeEnvelope>, store: Arc<dyn OutcomeStore>) -> Self {
        Self { rx, store }
    }

    /// Run the writer loop until all handles are dropped
    pub async fn run(mut self) {
        while let Some(envelope) = self.rx.recv().await {
            let record = OutcomeRecord {
                id: 0, // assigned by the store
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                torrent_hash: envelope.event.torrent_hash().map(String::from),
                actor: Some(envelope.actor),
                correlation_id: Some(envelope.correlation_id),
                data: envelope.event,
            };

            match self.store.insert(&record) {
                Ok(_) => {
                    metrics::OUTCOME_EVENTS
                        .with_label_values(&[&record.event_type])
                        .inc();
                }
                Err(e) => {
                    error!(
                        event_type = %record.event_type,
                        "Failed to persist outcome event: {}",
                        e
                    );
                }
            }
        }

        debug!("Outcome writer stopped (all handles dropped)");
    }
}

/// Create a connected handle/writer pair sharing a bounded channel
pub fn create_outcome_system(
    store: Arc<dyn OutcomeStore>,
    buffer_size: usize,
) -> (OutcomeHandle, OutcomeWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = OutcomeHandle::new(tx);
    let writer = OutcomeWriter::new(rx, store);
    (handle, writer)
}
