//! User types
//!
//! User records are owned by the external identity system; the chat core
//! reads them to resolve participant details and message sender names.

use crate::ids::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User record as seen by the coordination core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub is_agency: bool,
    pub rating_avg: Decimal,
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create an unverified user with no rating history
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_verified: false,
            is_agency: false,
            rating_avg: Decimal::ZERO,
            rating_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Last name reduced to its initial, as exposed to counterparties
    pub fn last_initial(&self) -> String {
        self.last_name.chars().next().map(String::from).unwrap_or_default()
    }
}
