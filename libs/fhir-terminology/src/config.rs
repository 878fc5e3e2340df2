//! Declarative configuration for the remote terminology adapter.

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct TerminologyConfig {
    /// Primary terminology server, used for everything not routed elsewhere.
    pub server: ServerConfig,
    /// Optional specialized server for LOINC codes.
    #[serde(default)]
    pub loinc: Option<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    /// Remote terminology servers can be slow to accept connections.
    /// Default: 120 seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    #[serde(default)]
    pub authorization: Option<AuthorizationConfig>,
}

/// How outgoing requests authenticate against a terminology server.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthorizationConfig {
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    /// OAuth2 client-credentials grant.
    ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
    },
}

// Secrets stay out of logs.
impl std::fmt::Debug for AuthorizationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            AuthorizationConfig::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
            AuthorizationConfig::ClientCredentials {
                token_url,
                client_id,
                ..
            } => f
                .debug_struct("ClientCredentials")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

pub fn default_connect_timeout_seconds() -> u64 {
    120
}

impl ServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            authorization: None,
        }
    }

    pub fn validate(&self, section: &str) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config(format!("{section}.base_url must be provided")));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "{section}.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.connect_timeout_seconds == 0 {
            return Err(Error::Config(format!(
                "{section}.connect_timeout_seconds must be > 0"
            )));
        }
        if let Some(AuthorizationConfig::ClientCredentials { token_url, .. }) = &self.authorization
        {
            if token_url.trim().is_empty() {
                return Err(Error::Config(format!(
                    "{section}.authorization.token_url must be provided"
                )));
            }
        }
        Ok(())
    }
}

impl TerminologyConfig {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            loinc: None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate("server")?;
        if let Some(loinc) = &self.loinc {
            loinc.validate("loinc")?;
        }
        Ok(())
    }
}
