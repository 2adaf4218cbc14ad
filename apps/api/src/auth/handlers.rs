use axum::{
    extract::{RawQuery, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> Result<(String, String), AppError> {
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::missing_field("email"))?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing_field("password"))?;
        Ok((email, password))
    }
}

async fn session_response(state: &AppState, session: AuthSession) -> Result<Json<Value>, AppError> {
    state
        .store
        .ensure_user(session.user.id, &session.user.email)
        .await?;
    Ok(Json(json!({ "success": true, "session": session })))
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<Json<Value>, AppError> {
    let (email, password) = request.into_parts()?;
    let session = state.identity.sign_up(&email, &password).await?;
    info!("Signed up user {}", session.user.id);
    session_response(&state, session).await
}

/// POST /api/auth/signin
pub async fn handle_signin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<Json<Value>, AppError> {
    let (email, password) = request.into_parts()?;
    let session = state.identity.sign_in(&email, &password).await?;
    info!("Signed in user {}", session.user.id);
    session_response(&state, session).await
}

/// GET /api/auth/google
pub async fn handle_google(State(state): State<AppState>) -> Redirect {
    let callback = format!(
        "{}/api/auth/google/callback",
        state.config.public_url.trim_end_matches('/')
    );
    Redirect::to(&state.identity.authorize_url("google", &callback))
}

/// GET /api/auth/google/callback
///
/// The provider finishes the OAuth exchange; the frontend picks the session up
/// from the forwarded query string (tokens ride in the URL fragment).
pub async fn handle_google_callback(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Redirect {
    let mut target = format!(
        "{}/auth/callback",
        state.config.frontend_url.trim_end_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(&query);
    }
    Redirect::to(&target)
}
