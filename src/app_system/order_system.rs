use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::config::AppConfig;
use crate::actor_framework::{ResourceActor, Slot};
use crate::clients::OrderClient;
use crate::domain::{generate_order_id, Order};
use crate::order_actor::OrderError;
use crate::storage::{FileSlotStorage, PersistenceEvent, SlotStorage};

/// The order store with an explicit lifecycle.
///
/// Construction loads the durable slot and starts the store actor; hand out
/// clones of `order_client` to callers; [`shutdown`](Self::shutdown) flushes
/// and stops the actor.
pub struct OrderSystem {
    pub order_client: OrderClient,
    handle: tokio::task::JoinHandle<()>,
    persistence_events: Option<mpsc::UnboundedReceiver<PersistenceEvent>>,
}

impl OrderSystem {
    /// Starts the store on the file-backed slot named in `config`.
    /// Must be called from within a tokio runtime.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_storage(config, FileSlotStorage::new(&config.storage.dir))
    }

    pub fn with_storage(config: &AppConfig, storage: impl SlotStorage) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let slot = Slot::new(storage, config.storage.key.clone());

        let (order_actor, order_resource_client) = ResourceActor::<Order>::new(
            config.actor.buffer_size,
            || generate_order_id(Utc::now()),
            slot,
            Some(events_tx),
        );
        let order_client = OrderClient::new(order_resource_client);
        let handle = tokio::spawn(order_actor.run());

        info!(slot = %config.storage.key, "Order system started");
        Self {
            order_client,
            handle,
            persistence_events: Some(events_rx),
        }
    }

    /// Stream of load/save outcomes for the durable slot. Can be taken once.
    pub fn take_persistence_events(&mut self) -> Option<mpsc::UnboundedReceiver<PersistenceEvent>> {
        self.persistence_events.take()
    }

    pub async fn shutdown(self) -> Result<(), OrderError> {
        info!("Shutting down order system...");
        self.order_client.shutdown().await?;

        if let Err(e) = self.handle.await {
            error!("Order actor task failed: {:?}", e);
            return Err(OrderError::ActorCommunicationError(format!("Actor task failed: {:?}", e)));
        }

        info!("Order system shutdown complete.");
        Ok(())
    }
}
