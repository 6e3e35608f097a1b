use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{KycStatus, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/signup", post(signup))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub full_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub token: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }

    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("fullName cannot be empty".to_string()));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        full_name: payload.full_name.trim().to_string(),
        kyc_status: KycStatus::Pending,
        created_at: Utc::now(),
    };

    let token = state.identity.register(&user).await?;
    state.store.insert_user(user.clone()).await?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok(Json(SignupResponse {
        user_id: user.id,
        email: user.email,
        full_name: user.full_name,
        token,
    }))
}
