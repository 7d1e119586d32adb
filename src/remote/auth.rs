//! Credential providers for the Sheets API.
//!
//! Providers are tried in the order they were given to [`CredentialChain`].
//! A provider that is not configured answers `Ok(None)` and the chain moves
//! on; a provider that fails is logged and the chain also moves on. Only an
//! exhausted chain is an error.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};

/// Google's OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Default authorized-user token file
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Tokens this close to expiry are treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token
#[derive(Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Whether the token is expired (or about to be) at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|exp| exp <= now + Duration::seconds(EXPIRY_MARGIN_SECS))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A source of access tokens
pub trait CredentialProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this provider is not configured
    fn fetch(&self, client: &Client) -> Result<Option<AccessToken>>;
}

/// A pre-issued bearer token, typically from `GOOGLE_ACCESS_TOKEN`
pub struct EnvTokenProvider {
    token: Option<String>,
}

impl EnvTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GOOGLE_ACCESS_TOKEN").ok())
    }
}

impl CredentialProvider for EnvTokenProvider {
    fn name(&self) -> &'static str {
        "env-token"
    }

    fn fetch(&self, _client: &Client) -> Result<Option<AccessToken>> {
        Ok(self
            .token
            .as_ref()
            .map(|t| AccessToken::new(t.trim(), None)))
    }
}

/// On-disk authorized-user token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizedUserToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Token file with optional refresh, from `GOOGLE_TOKEN_FILE`.
/// A refreshed token is written back to the same file.
pub struct AuthorizedUserFileProvider {
    path: PathBuf,
}

impl AuthorizedUserFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        let path = std::env::var("GOOGLE_TOKEN_FILE")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<AuthorizedUserToken> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| unavailable(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| unavailable(&self.path, e))
    }

    fn save(&self, token: &AuthorizedUserToken) -> Result<()> {
        let json = serde_json::to_string_pretty(token).map_err(|e| unavailable(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| unavailable(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| unavailable(&self.path, e))
    }

    fn refresh(&self, client: &Client, token: &mut AuthorizedUserToken) -> Result<AccessToken> {
        let (Some(refresh), Some(id), Some(secret)) = (
            token.refresh_token.clone(),
            token.client_id.clone(),
            token.client_secret.clone(),
        ) else {
            return Err(SyncError::Unavailable(format!(
                "token in {} is expired and cannot be refreshed",
                self.path.display()
            )));
        };
        let uri = token
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        let response: RefreshResponse = client
            .post(&uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh.as_str()),
                ("client_id", id.as_str()),
                ("client_secret", secret.as_str()),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| SyncError::Unavailable(format!("token refresh failed: {}", e)))?;

        let expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        token.access_token = Some(response.access_token.clone());
        token.expiry = expiry;
        if let Err(e) = self.save(token) {
            warn!(error = %e, "refreshed token could not be written back");
        }
        info!(path = %self.path.display(), "refreshed access token");
        Ok(AccessToken::new(response.access_token, expiry))
    }
}

impl CredentialProvider for AuthorizedUserFileProvider {
    fn name(&self) -> &'static str {
        "token-file"
    }

    fn fetch(&self, client: &Client) -> Result<Option<AccessToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut token = self.load()?;
        if let Some(ref secret) = token.access_token {
            let access = AccessToken::new(secret.clone(), token.expiry);
            if !access.is_expired_at(Utc::now()) {
                return Ok(Some(access));
            }
        }
        self.refresh(client, &mut token).map(Some)
    }
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> SyncError {
    SyncError::Unavailable(format!("{}: {}", path.display(), e))
}

/// Ordered list of providers with a cached token
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
    cached: Mutex<Option<AccessToken>>,
}

impl CredentialChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self {
            providers,
            cached: Mutex::new(None),
        }
    }

    /// Pre-issued env token first, then the token file
    pub fn from_env() -> Self {
        Self::new(vec![
            Box::new(EnvTokenProvider::from_env()),
            Box::new(AuthorizedUserFileProvider::from_env()),
        ])
    }

    /// Provider names, in the order they are tried
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First usable token, reusing the cached one until it expires
    pub fn access_token(&self, client: &Client) -> Result<AccessToken> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ref token) = *cached {
            if !token.is_expired_at(Utc::now()) {
                return Ok(token.clone());
            }
        }

        for provider in &self.providers {
            match provider.fetch(client) {
                Ok(Some(token)) => {
                    debug!(provider = provider.name(), "credential provider produced a token");
                    *cached = Some(token.clone());
                    return Ok(token);
                }
                Ok(None) => debug!(provider = provider.name(), "credential provider not configured"),
                Err(e) => warn!(provider = provider.name(), error = %e, "credential provider failed"),
            }
        }

        Err(SyncError::Unavailable(format!(
            "no credential provider produced a token (tried: {})",
            self.provider_names().join(", ")
        )))
    }
}
