// Broadcast hub: fan-out of ingested events to live stream clients
//
// Every connected dashboard client holds one receiver; publish enqueues
// onto all of them. Delivery is at-most-once with no replay: a receiver
// created after an event was published never sees that event, and a
// receiver that falls more than the channel capacity behind observes
// Lagged and is disconnected by the stream endpoint (clients recover by
// re-bootstrapping from the query API).

use std::sync::Arc;

use pulseboard_core::Event;
use tokio::sync::broadcast;

const HUB_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Arc<Event>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_capacity(HUB_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a persisted event to all currently-registered receivers.
    /// Returns the number of receivers the event was enqueued for; zero
    /// receivers is not an error.
    pub fn publish(&self, event: Event) -> usize {
        self.tx.send(Arc::new(event)).unwrap_or(0)
    }

    /// Register a new delivery channel. Events published from this point
    /// on are enqueued for it, in publish order.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.tx.subscribe()
    }

    /// Number of currently-connected receivers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
