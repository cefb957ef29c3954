//! Sequential bulk import of device definitions.
//!
//! Devices are processed strictly one at a time so that a mid-batch
//! cancellation or failure leaves a well-defined prefix fully applied and
//! the rest untouched. Throughput is deliberately traded for an auditable
//! partial-failure boundary.

use crate::error::RegistryError;
use crate::router::DeviceRegistry;
use lorahub_model::DeviceRecord;
use lorahub_types::ApplicationId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Incremental notifications from a bulk import.
#[derive(Debug)]
pub enum ImportEvent {
    /// One device was fully created; its merged record.
    DeviceCreated(DeviceRecord),
    /// The batch stopped at `index`. No later definition was attempted.
    Failed { index: usize, error: RegistryError },
    /// Always the final event. `created` counts successful devices;
    /// `cancelled` is set when the batch stopped on the cancellation flag.
    Finished { created: usize, cancelled: bool },
}

/// Handle to a running bulk import.
pub struct ImportHandle {
    events: mpsc::Receiver<ImportEvent>,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ImportHandle {
    /// Receives the next event, in order. Returns `None` once the driver
    /// task is done and all events have been consumed.
    pub async fn next_event(&mut self) -> Option<ImportEvent> {
        self.events.recv().await
    }

    /// Requests cooperative cancellation. The flag is checked between
    /// devices; the device currently in flight runs to completion.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Waits for the driver task to finish.
    pub async fn join(self) {
        if let Err(error) = self.task.await {
            warn!("bulk import task failed: {error}");
        }
    }
}

/// Starts a bulk create over an ordered list of device definitions.
///
/// Each definition goes through the registry's create path, including its
/// own routing, gating, and rollback. The first error stops the batch;
/// partial success is reported implicitly by how many `DeviceCreated`
/// events were delivered before it.
pub fn bulk_create(
    registry: Arc<DeviceRegistry>,
    application_id: ApplicationId,
    definitions: Vec<DeviceRecord>,
) -> ImportHandle {
    let (events_tx, events_rx) = mpsc::channel(16);
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();

    let task = tokio::spawn(async move {
        let total = definitions.len();
        let mut created = 0;
        let mut cancelled = false;

        for (index, definition) in definitions.into_iter().enumerate() {
            if flag.load(Ordering::Acquire) {
                info!("bulk import cancelled after {created}/{total} devices");
                cancelled = true;
                break;
            }
            debug!("bulk import: creating device {index} of {total}");
            match registry.create(&application_id, definition).await {
                Ok(record) => {
                    created += 1;
                    if events_tx.send(ImportEvent::DeviceCreated(record)).await.is_err() {
                        // Receiver dropped; nobody is listening anymore.
                        return;
                    }
                }
                Err(error) => {
                    warn!("bulk import stopped at device {index}: {error}");
                    let _ = events_tx.send(ImportEvent::Failed { index, error }).await;
                    break;
                }
            }
        }

        let _ = events_tx.send(ImportEvent::Finished { created, cancelled }).await;
    });

    ImportHandle {
        events: events_rx,
        cancel,
        task,
    }
}
