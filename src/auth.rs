//! OAuth2 authorization-code flow against the Spotify accounts service.
//!
//! A single token set is shared by the whole process. The state value sent
//! with the authorization redirect is generated once at startup and checked
//! on the callback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::OAuthConfig;

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no refresh token available")]
    NoRefreshToken,
}

/// OAuth client plus the current token set.
#[derive(Clone)]
pub struct Auth {
    client: Client,
    config: Arc<OAuthConfig>,
    state: Arc<str>,
    token: Arc<RwLock<Option<Token>>>,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Instant,
}

impl Token {
    pub fn is_fresh(&self) -> bool {
        !self.access_token.is_empty() && self.expires_at > Instant::now()
    }
}

impl Auth {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
            state: generate_state().into(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn verify_state(&self, state: &str) -> bool {
        !state.is_empty() && state == &*self.state
    }

    /// URL of the provider's consent page.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
            self.config.accounts_base,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scopes.join(" ")),
            urlencoding::encode(&self.state),
        )
    }

    /// Exchanges an authorization code for a token set and stores it.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let body = self.request_token(&params).await?;
        let token = Token {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at: expiry(body.expires_in),
        };
        self.set_token(token.clone()).await;
        info!("Obtained access token from authorization code");
        Ok(token)
    }

    pub async fn is_valid(&self) -> bool {
        self.token.read().await.as_ref().is_some_and(Token::is_fresh)
    }

    /// Returns a usable access token, refreshing an expired one when a
    /// refresh token is available.
    pub async fn ensure_valid(&self) -> Option<String> {
        if let Some(token) = self.token.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Some(token.access_token.clone());
        }

        match self.refresh().await {
            Ok(token) => Some(token.access_token),
            Err(AuthError::NoRefreshToken) => None,
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                None
            }
        }
    }

    /// Refreshes an expired access token. The previous refresh token is kept
    /// when the provider does not rotate it.
    ///
    /// The token is checked again under the write lock, so callers that
    /// queued behind a refresh get its result instead of starting another.
    pub async fn refresh(&self) -> Result<Token, AuthError> {
        let mut slot = self.token.write().await;
        let refresh_token = match slot.as_ref() {
            Some(t) if t.is_fresh() => return Ok(t.clone()),
            Some(t) => t.refresh_token.clone().ok_or(AuthError::NoRefreshToken)?,
            None => return Err(AuthError::NoRefreshToken),
        };

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];
        let body = self.request_token(&params).await?;
        let token = Token {
            access_token: body.access_token,
            refresh_token: body.refresh_token.or(Some(refresh_token)),
            expires_at: expiry(body.expires_in),
        };
        *slot = Some(token.clone());
        debug!("Refreshed access token");
        Ok(token)
    }

    pub async fn logout(&self) {
        *self.token.write().await = None;
        info!("Cleared tokens");
    }

    pub(crate) async fn set_token(&self, token: Token) {
        *self.token.write().await = Some(token);
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let credentials = STANDARD.encode(
            format!("{}:{}", self.config.client_id, self.config.client_secret).as_bytes(),
        );

        let res = self
            .client
            .post(format!("{}/api/token", self.config.accounts_base))
            .header("Authorization", format!("Basic {}", credentials))
            .form(params)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Status { status, body });
        }

        Ok(res.json().await?)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

fn expiry(expires_in: u64) -> Instant {
    Instant::now() + Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN)
}

fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
