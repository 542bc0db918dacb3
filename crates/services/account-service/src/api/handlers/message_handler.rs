//! Message handlers.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use validator::Validate;

use common::AppResult;

use crate::api::extractors::ValidatedJson;
use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::service::MessageReceipt;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub job_id: i32,
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
}

pub fn message_routes() -> Router<AppState> {
    Router::new().route("/", post(send_message))
}

pub async fn send_message(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MessageReceipt>>)> {
    let receipt = state
        .messages
        .send_message(
            payload.sender_id,
            payload.receiver_id,
            payload.job_id,
            payload.content,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(receipt))))
}
