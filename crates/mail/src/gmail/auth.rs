//! Gmail OAuth2 authentication
//!
//! Implements the OAuth2 authorization code flow for the Gmail API.
//! Tokens are held in memory for the lifetime of the process; the
//! responder re-authorizes on every run, so nothing is written to disk.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the authorization-code exchange and token refresh
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authorized: complete the consent flow first")]
    NotAuthorized,

    #[error("authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("token refresh failed: {0}")]
    Refresh(String),
}

/// The live credential for this process
#[derive(Debug, Clone)]
struct Token {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

impl Token {
    /// Whether the access token is still usable, with a safety buffer
    fn is_fresh(&self, buffer_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > Utc::now().timestamp() + buffer_secs,
            // No expiry reported; assume usable until a call fails
            None => true,
        }
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: String,
}

/// OAuth2 configuration and token management for Gmail
///
/// Every outbound Gmail call goes through [`GmailAuth::access_token`],
/// which refreshes transparently before handing out a token. The token
/// sits behind a mutex so a single writer refreshes while any reader
/// observes a consistent credential.
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token: Mutex<Option<Token>>,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Required scope for Gmail access (modify allows read + send + label changes)
    const GMAIL_MODIFY_SCOPE: &'static str = "https://www.googleapis.com/auth/gmail.modify";

    /// Seconds of remaining validity below which the token is refreshed
    const EXPIRY_BUFFER_SECS: i64 = 300;

    /// Create a new GmailAuth instance
    ///
    /// # Arguments
    /// * `client_id` - OAuth2 client ID from Google Cloud Console
    /// * `client_secret` - OAuth2 client secret from Google Cloud Console
    /// * `redirect_uri` - Registered callback URI the code is delivered to
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            token: Mutex::new(None),
        }
    }

    /// Build the consent URL the operator must open to authorize access.
    ///
    /// Deterministic given the configuration. Always requests offline
    /// access so a refresh token is issued, and forces the consent
    /// prompt so repeat authorizations still return one.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(Self::GMAIL_MODIFY_SCOPE),
        )
    }

    /// Exchange an authorization code for the process-wide credential.
    ///
    /// On success the token pair becomes the active credential. On
    /// failure the previous state (usually none) is left untouched.
    pub fn exchange_code(&self, code: &str) -> Result<(), AuthError> {
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| AuthError::Exchange(format!("invalid token response: {e}")))?;

        self.install(token, None);
        Ok(())
    }

    /// Get a valid access token, refreshing transparently if needed.
    ///
    /// Never returns an expired token without attempting a refresh
    /// first. If the refresh itself fails (revoked consent, network
    /// failure), the error surfaces to the caller.
    pub fn access_token(&self) -> Result<String, AuthError> {
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());

        let token = guard.as_ref().ok_or(AuthError::NotAuthorized)?;
        if token.is_fresh(Self::EXPIRY_BUFFER_SECS) {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::Refresh("no refresh token was issued".to_string()))?;

        let refreshed = self.refresh_access_token(&refresh_token)?;
        let access = refreshed.access_token.clone();
        *guard = Some(Self::to_token(refreshed, Some(refresh_token)));
        Ok(access)
    }

    /// Check whether an authorization code has been exchanged this run
    pub fn is_authorized(&self) -> bool {
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        response
            .into_body()
            .read_json()
            .map_err(|e| AuthError::Refresh(format!("invalid refresh response: {e}")))
    }

    /// Install a token response as the active credential
    fn install(&self, response: TokenResponse, previous_refresh: Option<String>) {
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Self::to_token(response, previous_refresh));
    }

    fn to_token(response: TokenResponse, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: response.access_token,
            // Google omits the refresh token on refresh responses;
            // keep the one we already have
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response
                .expires_in
                .map(|d| Utc::now().timestamp() + d as i64),
        }
    }

    /// Install a token directly, bypassing the network. Test hook.
    #[cfg(test)]
    fn install_raw(&self, access: &str, refresh: Option<&str>, expires_at: Option<i64>) {
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Token {
            access_token: access.to_string(),
            refresh_token: refresh.map(|s| s.to_string()),
            expires_at,
        });
    }
}
