//! Chat message types
//!
//! Messages form a transaction's conversation log: an append-only,
//! strictly ordered sequence. No edits, no deletes.

use crate::ids::{MessageId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single chat message within a transaction's thread
///
/// Ordering is by `(created_at, seq)`: the store assigns a monotonic `seq`
/// at append time so same-millisecond sends keep their arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub transaction_id: TransactionId,
    pub sender_id: UserId,
    pub content: String,
    /// Store-assigned insertion sequence, monotonic per store
    pub seq: u64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with an assigned insertion sequence
    ///
    /// Content is expected to be already trimmed and non-empty; the
    /// coordinator enforces that before constructing a message.
    pub fn new(
        transaction_id: TransactionId,
        sender_id: UserId,
        content: impl Into<String>,
        seq: u64,
    ) -> Self {
        Self {
            id: MessageId::new(),
            transaction_id,
            sender_id,
            content: content.into(),
            seq,
            created_at: Utc::now(),
        }
    }

    /// Ordering key for retrieval: oldest first, insertion order on ties
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }
}
