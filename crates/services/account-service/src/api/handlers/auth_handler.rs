//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use validator::Validate;

use common::AppResult;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::service::{AuthResponse, FederatedProfile};

/// Local account registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Identity forwarded by the client after a Google sign-in
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    #[serde(alias = "uid")]
    #[validate(length(min = 1, message = "External id is required"))]
    pub external_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, alias = "photoURL")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfirmRequest {
    #[validate(length(min = 1, message = "Reset code is required"))]
    pub token: String,
    #[serde(alias = "password")]
    pub new_password: String,
}

impl From<GoogleLoginRequest> for FederatedProfile {
    fn from(request: GoogleLoginRequest) -> Self {
        Self {
            external_id: request.external_id,
            email: request.email,
            display_name: request.display_name,
            photo_url: request.photo_url,
        }
    }
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/google", post(google_login))
        .route("/reset-password", post(request_password_reset))
        .route("/reset-password/confirm", post(confirm_password_reset))
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let response = state
        .accounts
        .register(payload.email, payload.password, payload.display_name)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state
        .accounts
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(response))
}

pub async fn google_login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<GoogleLoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.accounts.federated_login(payload.into()).await?;
    Ok(Json(response))
}

/// Always answers with the same message, whether or not the email exists
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.accounts.request_password_reset(payload.email).await?;
    Ok(Json(response))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetConfirmRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state
        .accounts
        .confirm_password_reset(payload.token, payload.new_password)
        .await?;

    Ok(Json(response))
}
