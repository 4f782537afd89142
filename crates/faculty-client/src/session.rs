use std::sync::Arc;

use crate::auth::{Authenticator, ClientCredentialsAuth};
use crate::config::Profile;
use crate::errors::ClientError;

const USER_AGENT: &str = concat!("faculty-client/", env!("CARGO_PKG_VERSION"));

pub(crate) struct SessionInner {
    pub(crate) profile: Profile,
    pub(crate) http: reqwest::Client,
    pub(crate) auth: Arc<dyn Authenticator>,
}

/// Shared connection state for all service clients of one deployment.
///
/// Cloning is cheap; clones share the HTTP connection pool and the cached
/// access token.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl Session {
    /// Creates a session authenticating with the profile's client credentials.
    pub fn new(profile: Profile) -> Result<Self, ClientError> {
        let auth = Arc::new(ClientCredentialsAuth::new(&profile));
        Self::with_authenticator(profile, auth)
    }

    /// Creates a session from `FACULTY_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(Profile::from_env()?)
    }

    /// Creates a session that signs requests with the given authenticator.
    pub fn with_authenticator(
        profile: Profile,
        auth: Arc<dyn Authenticator>,
    ) -> Result<Self, ClientError> {
        // No client-wide timeout: it would also cut long-lived event streams.
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_http_client(profile, auth, http)
    }

    /// Creates a session over a caller-built HTTP client, for proxies, DNS
    /// overrides or extra root certificates.
    ///
    /// The client should not set a global timeout, or it also ends update
    /// streams.
    pub fn with_http_client(
        profile: Profile,
        auth: Arc<dyn Authenticator>,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        if profile.domain.trim().is_empty() {
            return Err(ClientError::Config("profile domain must not be empty".into()));
        }
        Ok(Self {
            inner: Arc::new(SessionInner { profile, http, auth }),
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.inner.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenAuth;

    #[test]
    fn with_authenticator_rejects_blank_domain() {
        let result = Session::with_authenticator(
            Profile::new(" ", "id", "secret"),
            Arc::new(StaticTokenAuth::new("t")),
        );
        assert!(
            matches!(result, Err(ClientError::Config(message)) if message.contains("domain"))
        );
    }

    #[test]
    fn with_http_client_rejects_blank_domain() {
        let result = Session::with_http_client(
            Profile::new("", "id", "secret"),
            Arc::new(StaticTokenAuth::new("t")),
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn clones_share_state() {
        let session = Session::with_authenticator(
            Profile::new("services.example.com", "id", "secret"),
            Arc::new(StaticTokenAuth::new("t")),
        )
        .expect("session");
        let clone = session.clone();
        assert!(Arc::ptr_eq(&session.inner, &clone.inner));
        assert_eq!(clone.profile().domain, "services.example.com");
    }
}
