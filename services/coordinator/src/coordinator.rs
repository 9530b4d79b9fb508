//! Transaction Coordinator
//!
//! Sole mutator of transaction status and confirmation flags, and the only
//! component that transitions offers. All four operations authorize
//! against relationship membership: only the initiator and the offer
//! owner may act on a transaction.
//!
//! Concurrency contract: the two classic races — two initiators passing
//! the ACTIVE check on one offer, and both parties driving the completion
//! transition — are resolved by pushing the check-then-act down into the
//! stores as compare-and-set operations. The offer's ACTIVE → MATCHED
//! transition gates initiation, and PENDING → COMPLETED applies at most
//! once no matter how confirmations interleave.

use std::sync::Arc;

use types::prelude::*;

use crate::store::{CompleteOutcome, OfferRegistry, TransactionStore, Transition, UserDirectory};
use crate::views::{ConfirmOutcome, InitiateOutcome, MessageView, Participant, TransactionDetails};

/// Coordinates the transaction lifecycle against its collaborators
pub struct TransactionCoordinator {
    store: Arc<dyn TransactionStore>,
    registry: Arc<dyn OfferRegistry>,
    users: Arc<dyn UserDirectory>,
}

impl TransactionCoordinator {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        registry: Arc<dyn OfferRegistry>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            registry,
            users,
        }
    }

    /// Initiate (or re-fetch) a transaction against an offer
    ///
    /// Idempotent per (offer, initiator): repeat calls return the existing
    /// transaction unchanged, even after the offer has moved to MATCHED.
    /// Two initiators racing on one ACTIVE offer cannot both succeed; the
    /// ACTIVE → MATCHED compare-and-set admits exactly one.
    pub async fn initiate(
        &self,
        offer_id: OfferId,
        initiator_id: UserId,
    ) -> Result<InitiateOutcome, CoordinationError> {
        let offer = self
            .registry
            .get(offer_id)
            .await
            .ok_or(CoordinationError::OfferNotFound { offer_id })?;

        if offer.owner_id == initiator_id {
            return Err(CoordinationError::SelfContact);
        }

        // Re-initiation returns the existing record before the ACTIVE
        // check, so the same initiator gets the same transaction back
        // after the offer has been matched
        if let Some(existing) = self
            .store
            .find_by_offer_and_initiator(offer_id, initiator_id)
            .await
        {
            let details = self.resolve(existing).await?;
            return Ok(InitiateOutcome {
                details,
                created: false,
            });
        }

        if !offer.status.accepts_contact() {
            return Err(CoordinationError::OfferNotActive {
                status: offer.status,
            });
        }

        // CAS gate: exactly one initiator moves the offer off ACTIVE
        match self
            .registry
            .transition_status(offer_id, OfferStatus::MATCHED, Some(OfferStatus::ACTIVE))
            .await
        {
            Transition::Applied => {}
            Transition::NotFound => {
                return Err(CoordinationError::OfferNotFound { offer_id });
            }
            Transition::Conflict { .. } => {
                // A same-user double submit may have landed between the
                // lookup above and the gate; treat it as re-initiation
                if let Some(existing) = self
                    .store
                    .find_by_offer_and_initiator(offer_id, initiator_id)
                    .await
                {
                    let details = self.resolve(existing).await?;
                    return Ok(InitiateOutcome {
                        details,
                        created: false,
                    });
                }
                // The offer was ACTIVE at the read but the transition was
                // lost to a concurrent writer
                return Err(CoordinationError::StatusConflict { offer_id });
            }
        }

        let transaction = self
            .store
            .insert_unique(Transaction::new(offer_id, initiator_id, offer.owner_id))
            .await
            .into_transaction();

        tracing::info!(
            transaction_id = %transaction.id,
            offer_id = %offer_id,
            initiator_id = %initiator_id,
            "transaction initiated"
        );

        let details = self.resolve(transaction).await?;
        Ok(InitiateOutcome {
            details,
            created: true,
        })
    }

    /// A transaction with its full message history, oldest first
    ///
    /// Only the two participants may read a transaction or its messages.
    pub async fn get_with_messages(
        &self,
        transaction_id: TransactionId,
        user_id: UserId,
    ) -> Result<(TransactionDetails, Vec<MessageView>), CoordinationError> {
        let transaction = self
            .store
            .get(transaction_id)
            .await
            .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

        if !transaction.is_participant(user_id) {
            return Err(CoordinationError::Forbidden);
        }

        let details = self.resolve(transaction).await?;
        let messages = self.store.messages(transaction_id).await;

        let views = messages
            .into_iter()
            .map(|message| {
                let sender_first_name = if message.sender_id == details.initiator.id {
                    details.initiator.first_name.clone()
                } else {
                    details.owner.first_name.clone()
                };
                MessageView {
                    id: message.id,
                    transaction_id: message.transaction_id,
                    sender_id: message.sender_id,
                    sender_first_name,
                    content: message.content,
                    created_at: message.created_at,
                }
            })
            .collect();

        Ok((details, views))
    }

    /// Persist a chat message on behalf of a participant
    ///
    /// Content is trimmed; blank content is rejected. The returned view
    /// carries the sender's first name for the broadcast payload.
    pub async fn save_message(
        &self,
        transaction_id: TransactionId,
        sender_id: UserId,
        content: &str,
    ) -> Result<MessageView, CoordinationError> {
        let transaction = self
            .store
            .get(transaction_id)
            .await
            .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

        if !transaction.is_participant(sender_id) {
            return Err(CoordinationError::Forbidden);
        }

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(CoordinationError::EmptyMessage);
        }

        let sender = self
            .users
            .get(sender_id)
            .await
            .ok_or(CoordinationError::UserNotFound { user_id: sender_id })?;

        let message = self
            .store
            .append_message(transaction_id, sender_id, trimmed)
            .await;

        Ok(MessageView {
            id: message.id,
            transaction_id: message.transaction_id,
            sender_id: message.sender_id,
            sender_first_name: sender.first_name,
            content: message.content,
            created_at: message.created_at,
        })
    }

    /// Record a participant's confirmation; complete on the second one
    ///
    /// Sets only the caller's flag, then re-reads the combined state.
    /// Whichever call observes both flags true drives the COMPLETED
    /// transition, and the compare-and-set guarantees it lands exactly
    /// once even when both parties confirm simultaneously. Confirming an
    /// already-COMPLETED transaction is a read-only no-op, and so is
    /// re-confirming while the counterparty is still pending.
    pub async fn confirm(
        &self,
        transaction_id: TransactionId,
        user_id: UserId,
    ) -> Result<ConfirmOutcome, CoordinationError> {
        let transaction = self
            .store
            .get(transaction_id)
            .await
            .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

        let role = transaction
            .role_of(user_id)
            .ok_or(CoordinationError::Forbidden)?;

        match transaction.status {
            TransactionStatus::COMPLETED => {
                let details = self.resolve(transaction).await?;
                return Ok(ConfirmOutcome {
                    details,
                    completed: true,
                });
            }
            // Cancellation is driven externally; a cancelled transaction
            // takes no further writes from the confirm flow
            TransactionStatus::CANCELLED => {
                let details = self.resolve(transaction).await?;
                return Ok(ConfirmOutcome {
                    details,
                    completed: false,
                });
            }
            TransactionStatus::PENDING => {}
        }

        // Re-confirming an already-set flag is a read; flags never unset
        let updated = if transaction.confirmed_by(role) {
            transaction
        } else {
            self.store
                .set_confirmed(transaction_id, role)
                .await
                .ok_or(CoordinationError::TransactionNotFound { transaction_id })?
        };

        let mut completed = false;
        if updated.both_confirmed() {
            completed = true;
            match self.store.complete_if_pending(transaction_id).await {
                CompleteOutcome::Applied(_) => {
                    // Winner of the CAS also completes the offer, once
                    let transition = self
                        .registry
                        .transition_status(
                            updated.offer_id,
                            OfferStatus::COMPLETED,
                            Some(OfferStatus::MATCHED),
                        )
                        .await;
                    if let Transition::Conflict { actual } = transition {
                        tracing::warn!(
                            offer_id = %updated.offer_id,
                            ?actual,
                            "offer left MATCHED outside the confirm flow"
                        );
                    }
                    tracing::info!(
                        transaction_id = %transaction_id,
                        "transaction completed"
                    );
                }
                // The other party's confirm call won the transition
                CompleteOutcome::AlreadyTerminal(_) => {}
                CompleteOutcome::NotFound => {
                    return Err(CoordinationError::TransactionNotFound { transaction_id });
                }
            }
        }

        let latest = self
            .store
            .get(transaction_id)
            .await
            .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;
        let details = self.resolve(latest).await?;

        Ok(ConfirmOutcome { details, completed })
    }

    /// Attach resolved offer and participant details to a transaction
    async fn resolve(
        &self,
        transaction: Transaction,
    ) -> Result<TransactionDetails, CoordinationError> {
        let offer = self
            .registry
            .get(transaction.offer_id)
            .await
            .ok_or(CoordinationError::OfferNotFound {
                offer_id: transaction.offer_id,
            })?;
        let initiator =
            self.users
                .get(transaction.initiator_id)
                .await
                .ok_or(CoordinationError::UserNotFound {
                    user_id: transaction.initiator_id,
                })?;
        let owner = self
            .users
            .get(transaction.owner_id)
            .await
            .ok_or(CoordinationError::UserNotFound {
                user_id: transaction.owner_id,
            })?;

        Ok(TransactionDetails {
            transaction,
            offer,
            initiator: Participant::from(&initiator),
            owner: Participant::from(&owner),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryOfferRegistry, MemoryTransactionStore, MemoryUserDirectory};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    struct Harness {
        coordinator: TransactionCoordinator,
        registry: Arc<MemoryOfferRegistry>,
        users: Arc<MemoryUserDirectory>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryTransactionStore::new());
        let registry = Arc::new(MemoryOfferRegistry::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let coordinator =
            TransactionCoordinator::new(store, registry.clone(), users.clone());
        Harness {
            coordinator,
            registry,
            users,
        }
    }

    fn seed_user(h: &Harness, first_name: &str) -> UserId {
        let user = User::new(
            format!("{}@example.com", first_name.to_lowercase()),
            first_name,
            "Lastname",
        );
        let id = user.id;
        h.users.insert(user);
        id
    }

    fn seed_offer(h: &Harness, owner_id: UserId) -> OfferId {
        let offer = Offer::new(
            owner_id,
            OfferType::BUY,
            "USD",
            Decimal::new(30000, 2),
            "Market square",
            Utc::now() + Duration::hours(24),
        );
        let id = offer.id;
        h.registry.insert(offer);
        id
    }

    #[tokio::test]
    async fn test_initiate_creates_pending_and_matches_offer() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let outcome = h.coordinator.initiate(offer_id, initiator).await.unwrap();
        assert!(outcome.created);
        assert_eq!(
            outcome.details.transaction.status,
            TransactionStatus::PENDING
        );
        assert_eq!(outcome.details.offer.status, OfferStatus::MATCHED);
        assert_eq!(outcome.details.initiator.first_name, "Ivan");
        assert_eq!(outcome.details.owner.first_name, "Olive");
    }

    #[tokio::test]
    async fn test_initiate_missing_offer() {
        let h = harness();
        let initiator = seed_user(&h, "Ivan");

        let err = h
            .coordinator
            .initiate(OfferId::new(), initiator)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::OfferNotFound { .. }));
    }

    #[tokio::test]
    async fn test_initiate_own_offer_rejected() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let offer_id = seed_offer(&h, owner);

        let err = h.coordinator.initiate(offer_id, owner).await.unwrap_err();
        assert_eq!(err, CoordinationError::SelfContact);
    }

    #[tokio::test]
    async fn test_initiate_idempotent_after_match() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let first = h.coordinator.initiate(offer_id, initiator).await.unwrap();
        // Offer is now MATCHED; the same initiator still gets the same
        // transaction back
        let second = h.coordinator.initiate(offer_id, initiator).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(
            first.details.transaction.id,
            second.details.transaction.id
        );
    }

    #[tokio::test]
    async fn test_initiate_matched_offer_rejected_for_others() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let other = seed_user(&h, "Casey");
        let offer_id = seed_offer(&h, owner);

        h.coordinator.initiate(offer_id, initiator).await.unwrap();
        let err = h.coordinator.initiate(offer_id, other).await.unwrap_err();
        assert_eq!(
            err,
            CoordinationError::OfferNotActive {
                status: OfferStatus::MATCHED
            }
        );
    }

    #[tokio::test]
    async fn test_save_and_fetch_messages() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let tx_id = h
            .coordinator
            .initiate(offer_id, initiator)
            .await
            .unwrap()
            .details
            .transaction
            .id;

        let saved = h
            .coordinator
            .save_message(tx_id, initiator, "  hello  ")
            .await
            .unwrap();
        assert_eq!(saved.content, "hello");
        assert_eq!(saved.sender_first_name, "Ivan");

        let (_, messages) = h.coordinator.get_with_messages(tx_id, owner).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_save_message_rejects_blank() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let tx_id = h
            .coordinator
            .initiate(offer_id, initiator)
            .await
            .unwrap()
            .details
            .transaction
            .id;

        let err = h
            .coordinator
            .save_message(tx_id, initiator, "   \n\t  ")
            .await
            .unwrap_err();
        assert_eq!(err, CoordinationError::EmptyMessage);
    }

    #[tokio::test]
    async fn test_non_participant_forbidden() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let outsider = seed_user(&h, "Oscar");
        let offer_id = seed_offer(&h, owner);

        let tx_id = h
            .coordinator
            .initiate(offer_id, initiator)
            .await
            .unwrap()
            .details
            .transaction
            .id;

        assert_eq!(
            h.coordinator
                .get_with_messages(tx_id, outsider)
                .await
                .unwrap_err(),
            CoordinationError::Forbidden
        );
        assert_eq!(
            h.coordinator
                .save_message(tx_id, outsider, "hi")
                .await
                .unwrap_err(),
            CoordinationError::Forbidden
        );
        assert_eq!(
            h.coordinator.confirm(tx_id, outsider).await.unwrap_err(),
            CoordinationError::Forbidden
        );
    }

    #[tokio::test]
    async fn test_confirm_completes_after_both_parties() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let tx_id = h
            .coordinator
            .initiate(offer_id, initiator)
            .await
            .unwrap()
            .details
            .transaction
            .id;

        let first = h.coordinator.confirm(tx_id, owner).await.unwrap();
        assert!(!first.completed);
        assert!(first.details.transaction.owner_confirmed);
        assert!(!first.details.transaction.initiator_confirmed);
        assert_eq!(
            first.details.transaction.status,
            TransactionStatus::PENDING
        );

        let second = h.coordinator.confirm(tx_id, initiator).await.unwrap();
        assert!(second.completed);
        assert_eq!(
            second.details.transaction.status,
            TransactionStatus::COMPLETED
        );
        assert_eq!(second.details.offer.status, OfferStatus::COMPLETED);
    }

    #[tokio::test]
    async fn test_confirm_idempotent_once_completed() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let tx_id = h
            .coordinator
            .initiate(offer_id, initiator)
            .await
            .unwrap()
            .details
            .transaction
            .id;

        h.coordinator.confirm(tx_id, owner).await.unwrap();
        let done = h.coordinator.confirm(tx_id, initiator).await.unwrap();
        let updated_at = done.details.transaction.updated_at;

        let again = h.coordinator.confirm(tx_id, initiator).await.unwrap();
        assert!(again.completed);
        // No further writes: timestamp unchanged
        assert_eq!(again.details.transaction.updated_at, updated_at);
    }

    #[tokio::test]
    async fn test_repeat_confirm_before_completion_writes_nothing() {
        let h = harness();
        let owner = seed_user(&h, "Olive");
        let initiator = seed_user(&h, "Ivan");
        let offer_id = seed_offer(&h, owner);

        let tx_id = h
            .coordinator
            .initiate(offer_id, initiator)
            .await
            .unwrap()
            .details
            .transaction
            .id;

        let first = h.coordinator.confirm(tx_id, owner).await.unwrap();
        assert!(!first.completed);
        let updated_at = first.details.transaction.updated_at;

        let again = h.coordinator.confirm(tx_id, owner).await.unwrap();
        assert!(!again.completed);
        assert!(again.details.transaction.owner_confirmed);
        assert!(!again.details.transaction.initiator_confirmed);
        // Flag already set: no write, timestamp unchanged
        assert_eq!(again.details.transaction.updated_at, updated_at);
    }

    /// Registry that admits the offer read but loses every transition,
    /// standing in for a concurrent writer landing between the two.
    struct LosingRegistry {
        offer: Offer,
    }

    #[async_trait::async_trait]
    impl OfferRegistry for LosingRegistry {
        async fn get(&self, _id: OfferId) -> Option<Offer> {
            Some(self.offer.clone())
        }

        async fn transition_status(
            &self,
            _id: OfferId,
            _to: OfferStatus,
            _expected: Option<OfferStatus>,
        ) -> Transition {
            Transition::Conflict {
                actual: OfferStatus::MATCHED,
            }
        }
    }

    #[tokio::test]
    async fn test_initiate_lost_transition_reports_conflict() {
        let store = Arc::new(MemoryTransactionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let owner = User::new("olive@example.com", "Olive", "Lastname");
        let initiator = User::new("ivan@example.com", "Ivan", "Lastname");
        let initiator_id = initiator.id;
        let offer = Offer::new(
            owner.id,
            OfferType::BUY,
            "USD",
            Decimal::new(10000, 2),
            "Market square",
            Utc::now() + Duration::hours(24),
        );
        let offer_id = offer.id;
        users.insert(owner);
        users.insert(initiator);
        let registry = Arc::new(LosingRegistry { offer });
        let coordinator = TransactionCoordinator::new(store, registry, users);

        let err = coordinator
            .initiate(offer_id, initiator_id)
            .await
            .unwrap_err();
        assert_eq!(err, CoordinationError::StatusConflict { offer_id });
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_confirm_missing_transaction() {
        let h = harness();
        let user = seed_user(&h, "Ivan");
        let err = h
            .coordinator
            .confirm(TransactionId::new(), user)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinationError::TransactionNotFound { .. }
        ));
    }
}
