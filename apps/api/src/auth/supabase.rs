//! Supabase Auth over its REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::{AuthError, AuthSession, AuthUser, IdentityProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    authorize_endpoint: Url,
    anon_key: String,
}

/// Sign-up returns a full session, or a bare user when email confirmation is pending.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

#[derive(Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: String) -> Result<Self, AuthError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let authorize_endpoint = Url::parse(&format!("{base_url}/auth/v1/authorize"))
            .map_err(|e| AuthError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url,
            authorize_endpoint,
            anon_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn credentials_request(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<reqwest::Response, AuthError> {
        let response = self
            .client
            .post(self.url(path))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(body);
    if status.is_client_error() {
        Err(AuthError::Rejected(message))
    } else {
        Err(AuthError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn verify(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Supabase rejected bearer token");
                Ok(None)
            }
            _ => {
                let response = ensure_success(response).await?;
                Ok(Some(response.json::<AuthUser>().await?))
            }
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self.credentials_request("signup", email, password).await?;
        Ok(match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(session) => session,
            SignUpResponse::User(user) => AuthSession {
                access_token: None,
                refresh_token: None,
                expires_in: None,
                token_type: None,
                user,
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .credentials_request("token?grant_type=password", email, password)
            .await?;
        Ok(response.json::<AuthSession>().await?)
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to);
        url.into()
    }
}
