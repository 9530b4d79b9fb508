//! Transaction lifecycle types
//!
//! A transaction is a negotiation instance between an offer's owner and one
//! interested initiator. Its status machine is deliberately small:
//! PENDING → COMPLETED once both parties confirm, and an externally driven
//! CANCELLED path never produced by the confirm flow.

use crate::ids::{OfferId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction status
///
/// COMPLETED and CANCELLED are terminal; there are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Negotiation in progress
    PENDING,
    /// Both parties confirmed the in-person exchange (terminal)
    COMPLETED,
    /// Abandoned via an external path (terminal)
    CANCELLED,
}

impl TransactionStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::COMPLETED | TransactionStatus::CANCELLED
        )
    }
}

/// Which side of a transaction a participant occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The user who requested contact on the offer
    Initiator,
    /// The user who owns the offer
    Owner,
}

/// Transaction record
///
/// `initiator_id` and `owner_id` are immutable after creation and always
/// differ. Each confirmation flag is settable only by the respective party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub offer_id: OfferId,
    pub initiator_id: UserId,
    pub owner_id: UserId,
    pub status: TransactionStatus,
    pub initiator_confirmed: bool,
    pub owner_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new PENDING transaction with both confirmation flags unset
    ///
    /// # Panics
    /// Panics if initiator and owner are the same user; callers must reject
    /// self-contact before constructing a transaction.
    pub fn new(offer_id: OfferId, initiator_id: UserId, owner_id: UserId) -> Self {
        assert_ne!(
            initiator_id, owner_id,
            "Transaction participants must differ"
        );
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            offer_id,
            initiator_id,
            owner_id,
            status: TransactionStatus::PENDING,
            initiator_confirmed: false,
            owner_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The role a user holds in this transaction, if any
    pub fn role_of(&self, user_id: UserId) -> Option<Role> {
        if user_id == self.initiator_id {
            Some(Role::Initiator)
        } else if user_id == self.owner_id {
            Some(Role::Owner)
        } else {
            None
        }
    }

    /// Check whether a user is one of the two participants
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.role_of(user_id).is_some()
    }

    /// Read the confirmation flag belonging to a role
    pub fn confirmed_by(&self, role: Role) -> bool {
        match role {
            Role::Initiator => self.initiator_confirmed,
            Role::Owner => self.owner_confirmed,
        }
    }

    /// Set the confirmation flag belonging to a role
    ///
    /// Only the named role's flag is mutated; the other party's flag is
    /// untouched.
    pub fn set_confirmed(&mut self, role: Role, timestamp: DateTime<Utc>) {
        match role {
            Role::Initiator => self.initiator_confirmed = true,
            Role::Owner => self.owner_confirmed = true,
        }
        self.updated_at = timestamp;
    }

    /// Check whether both parties have confirmed
    pub fn both_confirmed(&self) -> bool {
        self.initiator_confirmed && self.owner_confirmed
    }
}
