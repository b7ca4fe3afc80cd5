use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_BUFFER: usize = 256;

/// Change notifications for anything that renders cart or identity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CartChanged { owner_id: Uuid },
    IdentityChanged { user_id: Option<Uuid> },
    OrderPlaced { owner_id: Uuid, order_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: StoreEvent) {
        // Err only means nobody is listening right now.
        if self.sender.send(event).is_err() {
            log::trace!("store event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Log every event until the bus is dropped.
pub async fn log_events(mut events: broadcast::Receiver<StoreEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => log::debug!("store event: {:?}", event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("event logger lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
