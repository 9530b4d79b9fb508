use crate::auth::TokenVerifier;
use crate::rate_limit::RateLimiter;
use crate::rooms::RoomHub;
use coordinator::memory::{MemoryOfferRegistry, MemoryTransactionStore, MemoryUserDirectory};
use coordinator::TransactionCoordinator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<TransactionCoordinator>,
    pub hub: Arc<RoomHub>,
    pub verifier: Arc<TokenVerifier>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build application state over the in-memory stores
    ///
    /// A deployment substitutes relational-backed implementations of the
    /// coordinator's interfaces here; everything downstream only sees the
    /// trait objects.
    pub fn new(jwt_secret: &str) -> Self {
        let store = Arc::new(MemoryTransactionStore::new());
        let registry = Arc::new(MemoryOfferRegistry::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let coordinator = Arc::new(TransactionCoordinator::new(store, registry, users));

        Self {
            coordinator,
            hub: Arc::new(RoomHub::new()),
            verifier: Arc::new(TokenVerifier::new(jwt_secret)),
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }
}
