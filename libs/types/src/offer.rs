//! Offer types
//!
//! Offers are owned by the external offer catalog. The coordination core
//! reads them and conditionally transitions their status; it never creates
//! or deletes them.

use crate::ids::{OfferId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of an offer: the owner wants to buy or sell a currency amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferType {
    /// Owner wants to buy the listed currency
    BUY,
    /// Owner wants to sell the listed currency
    SELL,
}

/// Offer lifecycle status
///
/// Only ACTIVE offers accept contact from initiators. MATCHED marks an
/// offer with an open transaction; PAUSED is owner-initiated and
/// reversible; COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferStatus {
    /// Visible and open to contact
    ACTIVE,
    /// A transaction has been initiated against this offer
    MATCHED,
    /// Temporarily hidden by the owner
    PAUSED,
    /// Exchange completed (terminal)
    COMPLETED,
    /// Withdrawn by the owner (terminal)
    CANCELLED,
}

impl OfferStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OfferStatus::COMPLETED | OfferStatus::CANCELLED)
    }

    /// Check if the offer can be contacted by an initiator
    pub fn accepts_contact(&self) -> bool {
        matches!(self, OfferStatus::ACTIVE)
    }
}

/// Offer record as seen by the coordination core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub owner_id: UserId,
    pub offer_type: OfferType,
    /// ISO 4217 currency code (e.g., "EUR", "USD")
    pub currency: String,
    pub amount: Decimal,
    /// Free-text meeting area chosen by the owner
    pub meeting_zone: String,
    pub status: OfferStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Create a new ACTIVE offer
    pub fn new(
        owner_id: UserId,
        offer_type: OfferType,
        currency: impl Into<String>,
        amount: Decimal,
        meeting_zone: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OfferId::new(),
            owner_id,
            offer_type,
            currency: currency.into(),
            amount,
            meeting_zone: meeting_zone.into(),
            status: OfferStatus::ACTIVE,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }
}
