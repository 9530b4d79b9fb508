pub mod transactions;
pub mod ws;
