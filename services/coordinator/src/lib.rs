//! Transaction coordination core
//!
//! Turns an offer into a negotiated, mutually-confirmed transaction with
//! an attached message thread. The coordinator owns the lifecycle state
//! machine and every authorization decision; storage and collaborator
//! access go through the trait seams in [`store`].
//!
//! # Modules
//! - `store`: storage/collaborator interfaces and conditional-write outcomes
//! - `memory`: in-memory implementations backed by concurrent maps
//! - `coordinator`: the lifecycle operations (initiate, fetch, message, confirm)
//! - `views`: resolved detail shapes returned to callers

pub mod coordinator;
pub mod memory;
pub mod store;
pub mod views;

pub use coordinator::TransactionCoordinator;
pub use store::{OfferRegistry, TransactionStore, UserDirectory};
pub use views::{ConfirmOutcome, InitiateOutcome, MessageView, Participant, TransactionDetails};
