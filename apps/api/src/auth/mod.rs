//! Identity: bearer-token extractors backed by an `IdentityProvider`.
//!
//! `AuthUser` rejects anything but a valid token. `MaybeAuthUser` lets requests
//! without an `Authorization` header through as anonymous, but a header that is
//! present and invalid is still a 401.

pub mod handlers;
pub mod supabase;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub use supabase::SupabaseAuth;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider refused the credentials (4xx).
    #[error("{0}")]
    Rejected(String),

    #[error("invalid identity provider URL {0}")]
    InvalidUrl(String),

    #[error("identity provider error (status {status}): {message}")]
    Upstream { status: u16, message: String },
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Rejected(message) => AppError::bad_request("INVALID_CREDENTIALS", message),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the provider does not recognise the token.
    async fn verify(&self, token: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String;
}

/// Caller identity when present. `None` means the request carried no credentials.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized),
    )
}

async fn verify(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    match state.identity.verify(token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::Unauthorized),
        Err(e) => {
            warn!("Token verification failed: {e}");
            Err(e.into())
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)??;
        verify(state, token).await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match bearer_token(parts) {
            None => Ok(MaybeAuthUser(None)),
            Some(token) => Ok(MaybeAuthUser(Some(verify(state, token?).await?))),
        }
    }
}
