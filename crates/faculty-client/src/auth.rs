use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{Profile, service_url};
use crate::errors::{ClientError, HttpStatusError};

const AUTH_SERVICE: &str = "hudson";
const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

/// Supplies the `Authorization` header value for outgoing requests.
///
/// Implementations may perform network calls (token exchange); the shared
/// HTTP client of the calling session is passed in for that purpose.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authorization(&self, http: &reqwest::Client) -> Result<String, ClientError>;
}

/// Fixed bearer token, for callers that manage tokens themselves.
#[derive(Clone)]
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuth").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Authenticator for StaticTokenAuth {
    async fn authorization(&self, _http: &reqwest::Client) -> Result<String, ClientError> {
        Ok(format!("Bearer {}", self.token))
    }
}

#[derive(serde::Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, serde::Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Client-credentials token exchange against the deployment's auth service.
///
/// Tokens are cached until shortly before they expire; concurrent callers
/// share one in-flight exchange.
pub struct ClientCredentialsAuth {
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsAuth {
    pub fn new(profile: &Profile) -> Self {
        Self {
            token_url: service_url(
                &profile.protocol,
                &profile.service_host(AUTH_SERVICE),
                "access_token",
            ),
            client_id: profile.client_id.clone(),
            client_secret: profile.client_secret.clone(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch_token(&self, http: &reqwest::Client) -> Result<CachedToken, ClientError> {
        debug!(event = "auth.token_request", domain = "auth", url = %self.token_url);
        let requested_at = Instant::now();
        let response = http
            .post(&self.token_url)
            .json(&AccessTokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                grant_type: "client_credentials",
            })
            .send()
            .await
            .map_err(|e| ClientError::Auth(format!("access token request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Auth(format!("failed to read access token response: {e}")))?;
        if !status.is_success() {
            let err = HttpStatusError::from_response(status.as_u16(), body);
            return Err(ClientError::Auth(format!("access token request rejected: {err}")));
        }
        let token: AccessTokenResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Auth(format!("invalid access token response: {e}")))?;
        debug!(
            event = "auth.token_received",
            domain = "auth",
            expires_in = token.expires_in
        );
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            token: token.access_token,
            refresh_at: requested_at + lifetime,
        })
    }
}

#[async_trait::async_trait]
impl Authenticator for ClientCredentialsAuth {
    async fn authorization(&self, http: &reqwest::Client) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(format!("Bearer {}", token.token));
        }
        let fresh = self.fetch_token(http).await?;
        let header = format!("Bearer {}", fresh.token);
        *cached = Some(fresh);
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_renders_bearer_header() {
        let auth = StaticTokenAuth::new("token-123");
        let header = auth
            .authorization(&reqwest::Client::new())
            .await
            .expect("header");
        assert_eq!(header, "Bearer token-123");
    }

    #[test]
    fn static_token_debug_hides_secret() {
        let rendered = format!("{:?}", StaticTokenAuth::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn client_credentials_targets_auth_service() {
        let profile = Profile::new("services.example.com", "id", "secret").protocol("http");
        let auth = ClientCredentialsAuth::new(&profile);
        assert_eq!(
            auth.token_url,
            "http://hudson.services.example.com/access_token"
        );
    }

    #[test]
    fn access_token_request_serializes_grant_type() {
        let body = serde_json::to_value(AccessTokenRequest {
            client_id: "id",
            client_secret: "secret",
            grant_type: "client_credentials",
        })
        .expect("json");
        assert_eq!(
            body,
            serde_json::json!({
                "client_id": "id",
                "client_secret": "secret",
                "grant_type": "client_credentials"
            })
        );
    }
}
