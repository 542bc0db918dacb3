//! User handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use validator::Validate;

use common::AppResult;
use domain::{AuthProvider, UserStats, UserView};

use crate::api::extractors::ValidatedJson;
use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::service::{FederatedProfile, ProfileUpdate};

/// Upsert pushed by the identity provider integration
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    #[serde(alias = "uid")]
    #[validate(length(min = 1, message = "External id is required"))]
    pub external_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, alias = "photoURL")]
    pub photo_url: Option<String>,
    /// Defaults to `google`
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    #[serde(alias = "photoURL")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgreementsRequest {
    pub terms_accepted: bool,
    pub privacy_accepted: bool,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_user))
        .route("/slug/:slug", get(get_user_by_slug))
        .route("/slug/:slug/stats", get(get_user_stats_by_slug))
        .route(
            "/:id",
            get(get_user).put(update_profile).delete(delete_account),
        )
        .route("/:id/stats", get(get_user_stats))
        .route("/:id/agreements", put(update_agreements))
}

pub async fn sync_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SyncUserRequest>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let provider = payload
        .provider
        .as_deref()
        .map(AuthProvider::from)
        .unwrap_or(AuthProvider::Google);
    let profile = FederatedProfile {
        external_id: payload.external_id,
        email: payload.email,
        display_name: payload.display_name,
        photo_url: payload.photo_url,
    };

    let user = state.accounts.sync_user(profile, provider).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let user = state.accounts.get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn get_user_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let user = state.accounts.get_user_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let stats = state.accounts.get_user_stats(id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn get_user_stats_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let stats = state.accounts.get_user_stats_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Invalid photo references are ignored; the stored photo is kept
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let update = ProfileUpdate {
        display_name: payload.display_name,
        bio: payload.bio,
        photo_url: payload.photo_url,
    };

    let user = state.accounts.update_profile(id, update).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_agreements(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<AgreementsRequest>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let user = state
        .accounts
        .update_agreements(id, payload.terms_accepted, payload.privacy_accepted)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.accounts.delete_account(id).await?;
    Ok(Json(ApiResponse::message("Account deleted")))
}
