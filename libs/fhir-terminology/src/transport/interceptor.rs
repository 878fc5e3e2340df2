//! Request interceptors applied to every outgoing terminology call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::AuthorizationConfig;
use crate::error::{Error, Result};

/// Decorates an outgoing request, typically with credentials.
#[async_trait]
pub trait ClientInterceptor: Send + Sync {
    async fn intercept_request(&self, request: RequestBuilder) -> Result<RequestBuilder>;
}

/// Build the interceptor matching an authorization section.
pub fn from_authorization(config: &AuthorizationConfig) -> Result<Arc<dyn ClientInterceptor>> {
    Ok(match config {
        AuthorizationConfig::Basic { username, password } => Arc::new(
            BasicAuthInterceptor::new(username.clone(), password.clone()),
        ),
        AuthorizationConfig::Bearer { token } => {
            Arc::new(BearerTokenInterceptor::new(token.clone()))
        }
        AuthorizationConfig::ClientCredentials {
            token_url,
            client_id,
            client_secret,
        } => Arc::new(ClientCredentialsInterceptor::new(
            token_url.clone(),
            client_id.clone(),
            client_secret.clone(),
        )?),
    })
}

pub struct BasicAuthInterceptor {
    username: String,
    password: String,
}

impl BasicAuthInterceptor {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

#[async_trait]
impl ClientInterceptor for BasicAuthInterceptor {
    async fn intercept_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.basic_auth(&self.username, Some(&self.password)))
    }
}

pub struct BearerTokenInterceptor {
    token: String,
}

impl BearerTokenInterceptor {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl ClientInterceptor for BearerTokenInterceptor {
    async fn intercept_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(&self.token))
    }
}

/// Tokens are refreshed this long before the server says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// OAuth2 client-credentials grant; the access token is reused until shortly
/// before it expires.
pub struct ClientCredentialsInterceptor {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsInterceptor {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            token_url,
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        tracing::debug!(token_url = %self.token_url, "Requesting terminology access token");
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Authorization(format!(
                "Token request to {} failed with status: {}",
                self.token_url,
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME)
            .saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

#[async_trait]
impl ClientInterceptor for ClientCredentialsInterceptor {
    async fn intercept_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(request.bearer_auth(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorization_header(request: RequestBuilder) -> Option<String> {
        let built = request.build().unwrap();
        built
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_basic_auth_header() {
        let interceptor = BasicAuthInterceptor::new("user".to_string(), "pass".to_string());
        let request = Client::new().get("https://tx.example.org/fhir/metadata");

        let request = interceptor.intercept_request(request).await.unwrap();

        // base64("user:pass")
        assert_eq!(
            authorization_header(request).as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[tokio::test]
    async fn test_bearer_header() {
        let interceptor = BearerTokenInterceptor::new("abc123".to_string());
        let request = Client::new().get("https://tx.example.org/fhir/metadata");

        let request = interceptor.intercept_request(request).await.unwrap();

        assert_eq!(
            authorization_header(request).as_deref(),
            Some("Bearer abc123")
        );
    }

    #[tokio::test]
    async fn test_cached_token_is_reused_without_network() {
        let interceptor = ClientCredentialsInterceptor::new(
            "https://auth.invalid/token".to_string(),
            "id".to_string(),
            "secret".to_string(),
        )
        .unwrap();
        *interceptor.token.lock().await = Some(CachedToken {
            access_token: "cached".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        });

        let request = Client::new().get("https://tx.example.org/fhir/metadata");
        let request = interceptor.intercept_request(request).await.unwrap();

        assert_eq!(authorization_header(request).as_deref(), Some("Bearer cached"));
    }
}
