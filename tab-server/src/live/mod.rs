//! LiveHub: realtime fan-out of committed changes
//!
//! ```text
//! API handler (after commit)
//!       │ LiveEvent
//!       ▼
//! LiveHub
//!   ├── tx: broadcast::Sender<LiveEvent>   (one channel, every connection)
//!   └── rooms: tab_id → member count
//!         │
//!         ▼
//!   Subscription (per WS connection)
//!     drops item events for rooms it has not joined
//! ```
//!
//! Delivery is at-most-once and ordered per connection. A receiver that
//! falls more than [`BROADCAST_CAPACITY`] events behind gets `Lagged` and is
//! expected to resync from the API.

mod session;

pub use session::{LiveCredential, run_session};

use dashmap::DashMap;
use shared::live::LiveEvent;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity
pub const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct LiveHub {
    tx: broadcast::Sender<LiveEvent>,
    /// tab_id → joined connections; entries are removed at zero
    rooms: Arc<DashMap<i64, usize>>,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            rooms: Arc::new(DashMap::new()),
        }
    }

    /// Fan an event out to current subscribers. Returns how many received it;
    /// room events are skipped when nobody joined the room.
    pub fn publish(&self, event: LiveEvent) -> usize {
        if let Some(tab_id) = event.room()
            && !self.rooms.contains_key(&tab_id)
        {
            tracing::trace!(tab_id, event = event.name(), "No room members, event skipped");
            return 0;
        }
        let name = event.name();
        // send fails only when there are no receivers
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::debug!(event = name, delivered, "Live event published");
        delivered
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            rooms: HashSet::new(),
            hub: self.clone(),
        }
    }

    /// Connections currently subscribed
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Connections that joined `tab_id`
    pub fn room_members(&self, tab_id: i64) -> usize {
        self.rooms.get(&tab_id).map(|n| *n).unwrap_or(0)
    }

    /// Rooms with at least one member
    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    fn enter(&self, tab_id: i64) {
        *self.rooms.entry(tab_id).or_insert(0) += 1;
    }

    fn exit(&self, tab_id: i64) {
        self.rooms.remove_if_mut(&tab_id, |_, count| {
            *count = count.saturating_sub(1);
            *count == 0
        });
    }
}

/// One connection's view of the hub
pub struct Subscription {
    rx: broadcast::Receiver<LiveEvent>,
    rooms: HashSet<i64>,
    hub: LiveHub,
}

impl Subscription {
    /// Join a tab room; returns false if already a member
    pub fn join(&mut self, tab_id: i64) -> bool {
        let joined = self.rooms.insert(tab_id);
        if joined {
            self.hub.enter(tab_id);
        }
        joined
    }

    /// Leave a tab room; returns false if not a member
    pub fn leave(&mut self, tab_id: i64) -> bool {
        let left = self.rooms.remove(&tab_id);
        if left {
            self.hub.exit(tab_id);
        }
        left
    }

    /// Next event addressed to this connection.
    ///
    /// Global events always pass; room events pass only for joined rooms.
    pub async fn recv(&mut self) -> Result<LiveEvent, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            match event.room() {
                Some(tab_id) if !self.rooms.contains(&tab_id) => continue,
                _ => return Ok(event),
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for tab_id in self.rooms.drain() {
            self.hub.exit(tab_id);
        }
    }
}
