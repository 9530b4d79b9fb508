//! Resolved view types returned to callers
//!
//! Operations return transactions with participant and offer details
//! attached, the shape the REST surface serializes directly. Counterparty
//! last names are reduced to an initial, matching what the marketplace
//! exposes between strangers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::prelude::*;

/// Participant details safe to show the other party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub first_name: String,
    pub last_initial: String,
    pub is_verified: bool,
    pub is_agency: bool,
    pub rating_avg: Decimal,
    pub rating_count: u32,
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_initial: user.last_initial(),
            is_verified: user.is_verified,
            is_agency: user.is_agency,
            rating_avg: user.rating_avg,
            rating_count: user.rating_count,
        }
    }
}

/// A transaction with resolved offer and participant details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub offer: Offer,
    pub initiator: Participant,
    pub owner: Participant,
}

/// A persisted message with its sender's display name resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub transaction_id: TransactionId,
    pub sender_id: UserId,
    pub sender_first_name: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Result of an initiation: the details plus whether this call created
/// the transaction (drives 201 vs 200 at the REST surface)
#[derive(Debug, Clone, PartialEq)]
pub struct InitiateOutcome {
    pub details: TransactionDetails,
    pub created: bool,
}

/// Result of a confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOutcome {
    pub details: TransactionDetails,
    pub completed: bool,
}
