//! Types library for the peer-to-peer exchange marketplace
//!
//! This library provides the core type definitions shared across the
//! coordination services, ensuring type safety and a single source of
//! truth for the transaction lifecycle.
//!
//! # Modules
//! - `ids`: Unique identifiers (UserId, OfferId, TransactionId, MessageId)
//! - `offer`: Offer lifecycle types (external collaborator's record)
//! - `transaction`: Transaction state machine types
//! - `message`: Chat message types
//! - `user`: User details resolved for participants
//! - `errors`: Error taxonomy

// Public modules
pub mod errors;
pub mod ids;
pub mod message;
pub mod offer;
pub mod transaction;
pub mod user;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::message::*;
    pub use crate::offer::*;
    pub use crate::transaction::*;
    pub use crate::user::*;
}
