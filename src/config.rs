//! Zendesk connection configuration
//!
//! Credentials and the API base URL are passed explicitly to the client
//! instead of living in module-level globals.

use reqwest::Url;

/// Suffix Zendesk expects on the username for API token authentication
pub const TOKEN_MARKER: &str = "/token";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Base URL missing or not an http(s) URL
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// URL as given
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Required credential absent or blank
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Connection settings for the Zendesk API
#[derive(Clone)]
pub struct ZendeskConfig {
    base_url: String,
    username: String,
    token: String,
}

impl ZendeskConfig {
    /// Create a configuration from an explicit username.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://acme.zendesk.com/api/v2`
    /// * `username` - Basic auth username (`<email>/token` for token auth)
    /// * `token` - API token, sent as the basic auth password
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(base_url.into())?;
        let username = username.into();
        let token = token.into();

        if username.trim().is_empty() {
            return Err(ConfigError::MissingCredential("username"));
        }
        if token.trim().is_empty() {
            return Err(ConfigError::MissingCredential("token"));
        }

        Ok(Self {
            base_url,
            username,
            token,
        })
    }

    /// Create a configuration for API token auth from an agent email
    pub fn from_email(
        base_url: impl Into<String>,
        email: &str,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ConfigError::MissingCredential("email"));
        }
        Self::new(base_url, token_username(email), token)
    }

    /// API root without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Basic auth username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// API token
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for ZendeskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZendeskConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Username for token auth: `<email>/token`, unless the marker is already present
pub fn token_username(email: &str) -> String {
    if email.ends_with(TOKEN_MARKER) {
        email.to_string()
    } else {
        format!("{email}{TOKEN_MARKER}")
    }
}

fn normalize_base_url(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/').to_string();
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.clone(),
        reason,
    };

    let url = Url::parse(&trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}
