//! Error taxonomy for the coordination core
//!
//! Comprehensive error types using thiserror. The four caller-visible
//! classes are: not-found, forbidden, invalid request (business-rule
//! violation), and unauthenticated.

use crate::ids::{OfferId, TransactionId, UserId};
use crate::offer::OfferStatus;
use thiserror::Error;

/// Errors produced by the Transaction Coordinator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinationError {
    #[error("Offer not found: {offer_id}")]
    OfferNotFound { offer_id: OfferId },

    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: TransactionId },

    #[error("User is not a participant in this transaction")]
    Forbidden,

    #[error("Cannot contact your own offer")]
    SelfContact,

    #[error("Offer is not active: {status:?}")]
    OfferNotActive { status: OfferStatus },

    #[error("Message content is empty")]
    EmptyMessage,

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: UserId },

    #[error("Concurrent status transition lost for offer {offer_id}")]
    StatusConflict { offer_id: OfferId },
}

impl CoordinationError {
    /// Whether this error reflects a business-rule violation rather than a
    /// missing record or an authorization failure
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            CoordinationError::SelfContact
                | CoordinationError::OfferNotActive { .. }
                | CoordinationError::EmptyMessage
                | CoordinationError::StatusConflict { .. }
        )
    }
}

/// Credential verification errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },
}
