//! Per-transaction broadcast rooms
//!
//! The hub is a stateless relay over room membership: it owns no
//! transaction state, only a mapping from transaction id to an active
//! broadcast channel. Persistence always happens in the coordinator
//! before anything is published here. Horizontal scaling would back this
//! with a shared pub/sub backbone; a single hub instance covers one
//! process.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use types::ids::{MessageId, TransactionId, UserId};
use types::transaction::TransactionStatus;

/// Buffered events per room before slow receivers start lagging
const ROOM_CAPACITY: usize = 64;

/// Events pushed to every connection in a transaction's room
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RoomEvent {
    /// A chat message was persisted; fan out to all participants,
    /// including the sender's own connection
    NewMessage {
        id: MessageId,
        content: String,
        sender_id: UserId,
        sender_first_name: String,
        created_at: DateTime<Utc>,
    },
    /// Confirmation state changed via the REST confirm endpoint
    #[serde(rename = "transaction:updated")]
    TransactionUpdated {
        initiator_confirmed: bool,
        owner_confirmed: bool,
        status: TransactionStatus,
        completed: bool,
    },
}

impl RoomEvent {
    /// Serialize to the wire frame sent over the socket
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Maps transaction ids to live broadcast groups
#[derive(Default)]
pub struct RoomHub {
    rooms: DashMap<TransactionId, broadcast::Sender<RoomEvent>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a room, creating it on first subscription
    pub fn subscribe(&self, transaction_id: TransactionId) -> broadcast::Receiver<RoomEvent> {
        self.rooms
            .entry(transaction_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Push an event to every connection in a room
    ///
    /// Returns the number of receivers the event reached. Rooms whose
    /// last receiver has disconnected are pruned here.
    pub fn publish(&self, transaction_id: TransactionId, event: RoomEvent) -> usize {
        let delivered = match self.rooms.get(&transaction_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };
        self.rooms
            .remove_if(&transaction_id, |_, sender| sender.receiver_count() == 0);
        delivered
    }

    /// Number of live rooms (for introspection and tests)
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
