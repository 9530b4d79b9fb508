use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{ConfirmResponse, InitiateRequest, TransactionDetailResponse};
use crate::rooms::RoomEvent;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coordinator::TransactionDetails;
use types::ids::TransactionId;

pub async fn initiate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<InitiateRequest>,
) -> Result<(StatusCode, Json<TransactionDetails>), AppError> {
    state
        .rate_limiter
        .check_rate_limit(&format!("{}:initiate", user.user_id), 10, 1.0)?;

    let outcome = state
        .coordinator
        .initiate(payload.offer_id, user.user_id)
        .await?;

    // 201 when this call created the transaction, 200 for re-initiation
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.details)))
}

pub async fn get_details(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<TransactionId>,
) -> Result<Json<TransactionDetailResponse>, AppError> {
    let (transaction, messages) = state.coordinator.get_with_messages(id, user.user_id).await?;

    Ok(Json(TransactionDetailResponse {
        transaction,
        messages,
    }))
}

pub async fn confirm(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<TransactionId>,
) -> Result<Json<ConfirmResponse>, AppError> {
    state
        .rate_limiter
        .check_rate_limit(&format!("{}:confirm", user.user_id), 10, 1.0)?;

    let outcome = state.coordinator.confirm(id, user.user_id).await?;

    // Push the updated confirmation state to already-connected clients;
    // reconnecting clients re-fetch the full transaction instead
    let tx = &outcome.details.transaction;
    state.hub.publish(
        id,
        RoomEvent::TransactionUpdated {
            initiator_confirmed: tx.initiator_confirmed,
            owner_confirmed: tx.owner_confirmed,
            status: tx.status,
            completed: outcome.completed,
        },
    );

    Ok(Json(ConfirmResponse {
        transaction: outcome.details,
        completed: outcome.completed,
    }))
}
