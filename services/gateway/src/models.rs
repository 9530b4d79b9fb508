//! REST request and response bodies

use coordinator::{MessageView, TransactionDetails};
use serde::{Deserialize, Serialize};
use types::ids::OfferId;

/// Body of `POST /v1/transactions`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub offer_id: OfferId,
}

/// Body of `GET /v1/transactions/{id}`
#[derive(Debug, Serialize)]
pub struct TransactionDetailResponse {
    pub transaction: TransactionDetails,
    pub messages: Vec<MessageView>,
}

/// Body of `POST /v1/transactions/{id}/confirm`
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub transaction: TransactionDetails,
    pub completed: bool,
}
