use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::service_url;
use crate::errors::{ClientError, HttpStatusError};
use crate::session::Session;
use crate::sse::{ByteStream, EventStream, event_stream};

/// Authenticated request plumbing for one platform service.
#[derive(Clone)]
pub struct BaseClient {
    session: Session,
    protocol: String,
    host: String,
}

impl BaseClient {
    /// Client for `<service>.<domain>` using the profile's protocol.
    pub fn for_service(session: &Session, service: &str) -> Self {
        let profile = session.profile();
        Self {
            protocol: profile.protocol.clone(),
            host: profile.service_host(service),
            session: session.clone(),
        }
    }

    /// Client for an explicit protocol and host.
    pub fn with_endpoint(
        session: &Session,
        protocol: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            session: session.clone(),
            protocol: protocol.into(),
            host: host.into(),
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, endpoint: &str) -> String {
        service_url(&self.protocol, &self.host, endpoint)
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let inner = &self.session.inner;
        let authorization = inner.auth.authorization(&inner.http).await?;
        Ok(inner
            .http
            .request(method, self.url(endpoint))
            .header(AUTHORIZATION, authorization))
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        method: &Method,
        endpoint: &str,
    ) -> Result<reqwest::Response, ClientError> {
        debug!(event = "http.request", domain = "http", method = %method, host = %self.host, endpoint);
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::transport("request timeout", e)
            } else if e.is_connect() {
                ClientError::transport("connection failed", e)
            } else {
                ClientError::transport("request failed", e)
            }
        })?;
        let status = response.status();
        debug!(event = "http.response", domain = "http", method = %method, endpoint, status = status.as_u16());
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(HttpStatusError::from_response(status.as_u16(), body).into())
    }

    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut builder = self
            .request(method.clone(), endpoint)
            .await?
            .timeout(self.session.profile().timeout);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.send(builder, &method, endpoint).await
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, ClientError> {
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::transport("failed to read response body", e))?;
        serde_json::from_str(&text).map_err(|e| ClientError::decode(endpoint, e))
    }

    fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ClientError> {
        serde_json::to_value(body)
            .map_err(|e| ClientError::Validation(format!("failed to serialize request body: {e}")))
    }

    /// GETs `endpoint` and decodes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let response = self.call(Method::GET, endpoint, None).await?;
        Self::decode(response, endpoint).await
    }

    /// POSTs a JSON body and decodes the JSON response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .call(Method::POST, endpoint, Some(Self::encode(body)?))
            .await?;
        Self::decode(response, endpoint).await
    }

    /// PUTs a JSON body, ignoring the response body.
    pub async fn put_raw<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<(), ClientError> {
        self.call(Method::PUT, endpoint, Some(Self::encode(body)?))
            .await?;
        Ok(())
    }

    /// DELETEs `endpoint`, ignoring the response body.
    pub async fn delete_raw(&self, endpoint: &str) -> Result<(), ClientError> {
        self.call(Method::DELETE, endpoint, None).await?;
        Ok(())
    }

    /// Opens a long-lived GET on `endpoint` and decodes it as server-sent events.
    ///
    /// No request timeout is applied; callers bound the wait themselves.
    pub async fn get_stream(&self, endpoint: &str) -> Result<EventStream, ClientError> {
        let builder = self
            .request(Method::GET, endpoint)
            .await?
            .header(ACCEPT, "text/event-stream");
        let response = self.send(builder, &Method::GET, endpoint).await?;
        debug!(event = "sse.stream_opened", domain = "sse", host = %self.host, endpoint);
        let bytes: ByteStream = Box::pin(response.bytes_stream());
        Ok(event_stream(bytes))
    }
}
