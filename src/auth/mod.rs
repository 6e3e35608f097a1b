use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Verified identity of the caller, as resolved by the identity provider.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// External identity provider seam. Resolves opaque bearer tokens to caller
/// identities; `register` issues a session for a newly created profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, user: &User) -> Result<String, AuthError>;

    async fn authenticate(&self, token: &str) -> Result<Option<CallerIdentity>, AuthError>;
}

/// In-process identity provider: opaque random tokens over a shared map.
/// Stands in for the managed auth backend during local runs and tests.
#[derive(Default)]
pub struct MemoryIdentity {
    sessions: DashMap<String, CallerIdentity>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn register(&self, user: &User) -> Result<String, AuthError> {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            token.clone(),
            CallerIdentity {
                id: user.id,
                email: user.email.clone(),
            },
        );
        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> Result<Option<CallerIdentity>, AuthError> {
        Ok(self.sessions.get(token).map(|entry| entry.value().clone()))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the bearer token to an authenticated caller or fails with 401.
pub async fn require_caller(
    state: &AppState,
    token: Option<&str>,
) -> Result<CallerIdentity, AppError> {
    let token = token.ok_or(AppError::Unauthenticated)?;
    state
        .identity
        .authenticate(token)
        .await?
        .ok_or(AppError::Unauthenticated)
}
