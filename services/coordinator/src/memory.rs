//! In-memory store implementations
//!
//! Backing for tests and single-process deployments. Conditional
//! operations execute under the owning map entry's shard guard, so each
//! check-then-act is atomic per record without any lock spanning an await.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use types::prelude::*;

use crate::store::{
    CompleteOutcome, InsertOutcome, OfferRegistry, TransactionStore, Transition, UserDirectory,
};

/// Offer registry backed by a concurrent map
#[derive(Default)]
pub struct MemoryOfferRegistry {
    offers: DashMap<OfferId, Offer>,
}

impl MemoryOfferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an offer (stands in for the external catalog's writes)
    pub fn insert(&self, offer: Offer) {
        self.offers.insert(offer.id, offer);
    }
}

#[async_trait]
impl OfferRegistry for MemoryOfferRegistry {
    async fn get(&self, id: OfferId) -> Option<Offer> {
        self.offers.get(&id).map(|entry| entry.clone())
    }

    async fn transition_status(
        &self,
        id: OfferId,
        to: OfferStatus,
        expected: Option<OfferStatus>,
    ) -> Transition {
        match self.offers.get_mut(&id) {
            Some(mut offer) => {
                if let Some(expected) = expected {
                    if offer.status != expected {
                        return Transition::Conflict {
                            actual: offer.status,
                        };
                    }
                }
                offer.status = to;
                offer.updated_at = Utc::now();
                Transition::Applied
            }
            None => Transition::NotFound,
        }
    }
}

/// Transaction and message store backed by concurrent maps
///
/// The (offer_id, initiator_id) uniqueness constraint lives in a secondary
/// index whose entry guard serializes racing inserts for the same pair.
#[derive(Default)]
pub struct MemoryTransactionStore {
    transactions: DashMap<TransactionId, Transaction>,
    by_offer_initiator: DashMap<(OfferId, UserId), TransactionId>,
    logs: DashMap<TransactionId, Vec<Message>>,
    next_seq: AtomicU64,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&id).map(|entry| entry.clone())
    }

    async fn find_by_offer_and_initiator(
        &self,
        offer_id: OfferId,
        initiator_id: UserId,
    ) -> Option<Transaction> {
        let id = *self.by_offer_initiator.get(&(offer_id, initiator_id))?;
        self.transactions.get(&id).map(|entry| entry.clone())
    }

    async fn insert_unique(&self, transaction: Transaction) -> InsertOutcome {
        let key = (transaction.offer_id, transaction.initiator_id);
        match self.by_offer_initiator.entry(key) {
            Entry::Occupied(occupied) => {
                let existing = self
                    .transactions
                    .get(occupied.get())
                    .map(|entry| entry.clone())
                    .expect("indexed transaction must exist; records are never deleted");
                InsertOutcome::Existing(existing)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(transaction.id);
                self.transactions.insert(transaction.id, transaction.clone());
                InsertOutcome::Inserted(transaction)
            }
        }
    }

    async fn set_confirmed(&self, id: TransactionId, role: Role) -> Option<Transaction> {
        let mut tx = self.transactions.get_mut(&id)?;
        tx.set_confirmed(role, Utc::now());
        Some(tx.clone())
    }

    async fn complete_if_pending(&self, id: TransactionId) -> CompleteOutcome {
        match self.transactions.get_mut(&id) {
            Some(mut tx) => {
                if tx.status == TransactionStatus::PENDING {
                    tx.status = TransactionStatus::COMPLETED;
                    tx.updated_at = Utc::now();
                    CompleteOutcome::Applied(tx.clone())
                } else {
                    CompleteOutcome::AlreadyTerminal(tx.clone())
                }
            }
            None => CompleteOutcome::NotFound,
        }
    }

    async fn append_message(
        &self,
        transaction_id: TransactionId,
        sender_id: UserId,
        content: &str,
    ) -> Message {
        let mut log = self.logs.entry(transaction_id).or_default();
        // Sequence assigned under the log's entry guard so arrival order,
        // seq order, and timestamp order agree per transaction
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let message = Message::new(transaction_id, sender_id, content, seq);
        log.push(message.clone());
        message
    }

    async fn messages(&self, transaction_id: TransactionId) -> Vec<Message> {
        let mut messages = self
            .logs
            .get(&transaction_id)
            .map(|log| log.clone())
            .unwrap_or_default();
        messages.sort_by_key(|m| m.order_key());
        messages
    }
}

/// User directory backed by a concurrent map
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, User>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user (stands in for the external identity system)
    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|entry| entry.clone())
    }
}
