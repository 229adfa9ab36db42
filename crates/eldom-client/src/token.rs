//! Bearer token lifecycle
//!
//! The API hands out JWTs from `/api/authenticate`. The provider caches one
//! token and reads its `exp` claim, without verifying the signature, to decide
//! locally when a new one is needed. There is no timer: expiry is checked each
//! time a token is requested.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{EldomClientError, Result};
use crate::transport::{Headers, Transport};
use crate::types::{AuthenticateRequest, TokenResponse};

const AUTHENTICATE_PATH: &str = "/api/authenticate";

/// Login credentials, fixed for the lifetime of a provider
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the cached token stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    Valid,
    Expired,
}

/// Read the `exp` claim (seconds since the epoch) of a JWT without verifying it
pub fn token_expiry(token: &str) -> Option<f64> {
    let claims = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(claims.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_f64()
}

/// Whether a token is expired at `now` (seconds since the epoch)
///
/// Tokens whose claims cannot be read count as expired.
pub fn token_expired_at(token: &str, now: i64) -> bool {
    match token_expiry(token) {
        Some(exp) => now as f64 >= exp,
        None => true,
    }
}

/// Whether a token is expired right now
pub fn token_expired(token: &str) -> bool {
    token_expired_at(token, Utc::now().timestamp())
}

/// Caches a bearer token and refreshes it when it expires
///
/// Concurrent callers may both refresh an expired token; the last refresh
/// wins. The token is always swapped in whole and the lock is never held
/// across a request.
pub struct TokenProvider {
    transport: Arc<dyn Transport>,
    login_url: Url,
    credentials: Credentials,
    token: RwLock<Option<Arc<str>>>,
}

impl TokenProvider {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        credentials: Credentials,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            login_url: config.endpoint(AUTHENTICATE_PATH)?,
            credentials,
            token: RwLock::new(None),
        })
    }

    /// Current state of the cache
    pub fn state(&self) -> TokenState {
        match self.token.read().as_deref() {
            None => TokenState::NoToken,
            Some(token) if token_expired(token) => TokenState::Expired,
            Some(_) => TokenState::Valid,
        }
    }

    /// Return a usable bearer token, authenticating first if needed
    #[instrument(skip(self), fields(username = %self.credentials.username))]
    pub async fn provide(&self) -> Result<String> {
        let cached = self.token.read().clone();
        if let Some(token) = cached {
            if !token_expired(&token) {
                return Ok(token.to_string());
            }
            debug!("Cached token expired");
        }

        let token = self.authenticate().await?;
        *self.token.write() = Some(Arc::clone(&token));
        Ok(token.to_string())
    }

    /// Drop the cached token so the next request authenticates again
    pub fn invalidate(&self) {
        *self.token.write() = None;
    }

    async fn authenticate(&self) -> Result<Arc<str>> {
        info!("Authenticating");

        let headers: Headers = vec![
            ("User-Agent", USER_AGENT.to_string()),
            ("Content-Type", "application/json".to_string()),
        ];
        let body = serde_json::to_string(&AuthenticateRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
            remember_me: false,
        })
        .map_err(|e| EldomClientError::ParseError(e.to_string()))?;

        let response = self
            .transport
            .post(self.login_url.clone(), headers, body)
            .await
            .map_err(|err| match err {
                EldomClientError::ServerError { status, message }
                    if matches!(status, 400 | 401 | 403) =>
                {
                    EldomClientError::AuthenticationFailed(format!(
                        "login rejected ({}): {}",
                        status, message
                    ))
                }
                other => other,
            })?;

        let parsed: TokenResponse = serde_json::from_str(&response).map_err(|e| {
            EldomClientError::AuthenticationFailed(format!("unreadable login response: {}", e))
        })?;

        match parsed.id_token {
            Some(token) if !token.is_empty() => Ok(Arc::from(token)),
            _ => Err(EldomClientError::AuthenticationFailed(
                "no access token received from login response".to_string(),
            )),
        }
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("login_url", &self.login_url.as_str())
            .field("credentials", &self.credentials)
            .field("state", &self.state())
            .finish()
    }
}
