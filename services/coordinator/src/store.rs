//! Storage and collaborator interfaces
//!
//! The coordinator receives these through its constructor instead of a
//! framework injection layer, so tests substitute in-memory fakes and a
//! deployment substitutes relational-backed implementations.
//!
//! Every check-then-act sequence the lifecycle depends on is pushed down
//! into these interfaces as a single conditional operation: the offer
//! status transition is a compare-and-set, transaction insertion carries
//! the (offer, initiator) uniqueness constraint, and completion is a
//! compare-and-set on PENDING. Callers never hold locks across awaits.

use async_trait::async_trait;
use types::prelude::*;

/// Outcome of a conditional offer status transition
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The transition was applied by this call
    Applied,
    /// No offer with that id
    NotFound,
    /// The expected current status did not match
    Conflict { actual: OfferStatus },
}

/// Outcome of inserting a transaction under the uniqueness constraint
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// No transaction existed for (offer, initiator); this one was stored
    Inserted(Transaction),
    /// A transaction already existed for (offer, initiator); returned unchanged
    Existing(Transaction),
}

impl InsertOutcome {
    /// The stored transaction, whether freshly inserted or pre-existing
    pub fn into_transaction(self) -> Transaction {
        match self {
            InsertOutcome::Inserted(tx) | InsertOutcome::Existing(tx) => tx,
        }
    }
}

/// Outcome of the PENDING → COMPLETED compare-and-set
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    /// This call performed the transition
    Applied(Transaction),
    /// The transaction was already in a terminal state
    AlreadyTerminal(Transaction),
    /// No transaction with that id
    NotFound,
}

/// Read/conditional-write access to the external offer catalog
#[async_trait]
pub trait OfferRegistry: Send + Sync {
    /// Fetch an offer by id
    async fn get(&self, id: OfferId) -> Option<Offer>;

    /// Transition an offer's status, conditionally
    ///
    /// When `expected` is `Some`, the transition applies only if the
    /// offer's current status equals it; otherwise the call reports
    /// `Conflict` and writes nothing.
    async fn transition_status(
        &self,
        id: OfferId,
        to: OfferStatus,
        expected: Option<OfferStatus>,
    ) -> Transition;
}

/// Persistence for transactions and their message logs
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Fetch a transaction by id
    async fn get(&self, id: TransactionId) -> Option<Transaction>;

    /// Fetch the transaction a user initiated against an offer, if any
    async fn find_by_offer_and_initiator(
        &self,
        offer_id: OfferId,
        initiator_id: UserId,
    ) -> Option<Transaction>;

    /// Insert a transaction, enforcing (offer_id, initiator_id) uniqueness
    async fn insert_unique(&self, transaction: Transaction) -> InsertOutcome;

    /// Set the confirmation flag belonging to `role`, leaving the other
    /// party's flag untouched; returns the updated transaction
    async fn set_confirmed(&self, id: TransactionId, role: Role) -> Option<Transaction>;

    /// Compare-and-set: transition to COMPLETED only while still PENDING
    async fn complete_if_pending(&self, id: TransactionId) -> CompleteOutcome;

    /// Append a message to a transaction's log, assigning its insertion
    /// sequence and timestamp; arrival order is preserved
    async fn append_message(
        &self,
        transaction_id: TransactionId,
        sender_id: UserId,
        content: &str,
    ) -> Message;

    /// A transaction's full message history, oldest first
    async fn messages(&self, transaction_id: TransactionId) -> Vec<Message>;
}

/// Read access to user records for participant/sender resolution
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user by id
    async fn get(&self, id: UserId) -> Option<User>;
}
