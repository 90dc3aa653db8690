use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenewResponse {
    pub queued: bool,
}

pub async fn verify_code_handler(
    State(app_state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>> {
    let verified = app_state
        .confirmation_service
        .verify_code(&query.code)
        .await?;

    Ok(Json(VerifyResponse { verified }))
}

/// Always answers `202`: the renewal runs in the background and its outcome,
/// including an unknown user id, is never reported to the caller.
pub async fn renew_confirmation_code_handler(
    State(app_state): State<AppState>,
    Path(user_id): Path<i64>,
) -> (StatusCode, Json<RenewResponse>) {
    let queued = app_state.renewal_queue.request(user_id);
    (StatusCode::ACCEPTED, Json(RenewResponse { queued }))
}
