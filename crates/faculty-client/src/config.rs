use std::time::Duration;

use crate::errors::ClientError;

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection profile for a platform deployment.
#[derive(Clone, Debug)]
pub struct Profile {
    /// URL scheme used for every service (`https` unless overridden).
    pub protocol: String,
    /// Deployment domain; service hosts are `<service>.<domain>`.
    pub domain: String,
    /// Client id used for client-credentials authentication.
    pub client_id: String,
    /// Client secret used for client-credentials authentication.
    pub client_secret: String,
    /// Default HTTP timeout for non-streaming requests.
    pub timeout: Duration,
}

impl Profile {
    /// Creates a profile with the default protocol and timeout.
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            domain: domain.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds a profile from `FACULTY_*` environment variables.
    ///
    /// `FACULTY_DOMAIN`, `FACULTY_CLIENT_ID` and `FACULTY_CLIENT_SECRET` are
    /// required; `FACULTY_PROTOCOL` and `FACULTY_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClientError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ClientError::Config(format!("missing {key}")))
        };
        let mut profile = Self::new(
            required("FACULTY_DOMAIN")?,
            required("FACULTY_CLIENT_ID")?,
            required("FACULTY_CLIENT_SECRET")?,
        );
        if let Some(protocol) = lookup("FACULTY_PROTOCOL").filter(|v| !v.trim().is_empty()) {
            profile = profile.protocol(protocol.trim());
        }
        if let Some(raw) = lookup("FACULTY_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ClientError::Config(format!(
                        "FACULTY_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    ))
                })?;
            profile = profile.timeout(Duration::from_secs(secs));
        }
        Ok(profile)
    }

    /// Overrides the URL scheme (for example `http` for local test servers).
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host serving the named service in this deployment.
    pub fn service_host(&self, service: &str) -> String {
        format!("{service}.{}", self.domain)
    }
}

/// Joins a scheme, host and endpoint into an absolute URL.
pub fn service_url(protocol: &str, host: &str, endpoint: &str) -> String {
    format!(
        "{protocol}://{}/{}",
        host.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
