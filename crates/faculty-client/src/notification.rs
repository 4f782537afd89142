use futures::Stream;

use crate::errors::ClientError;
use crate::http::BaseClient;
use crate::publish::await_publish_result_stream;
use crate::session::Session;
use crate::sse::{EventStream, ServerSentEvent};

const SERVICE_NAME: &str = "frontend";

/// Client for the per-user update stream.
#[derive(Clone)]
pub struct NotificationClient {
    base: BaseClient,
}

impl NotificationClient {
    /// Targets `frontend.<domain>` with the profile's protocol.
    pub fn new(session: &Session) -> Self {
        Self {
            base: BaseClient::for_service(session, SERVICE_NAME),
        }
    }

    /// Targets an explicit protocol and host.
    pub fn with_endpoint(
        session: &Session,
        protocol: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseClient::with_endpoint(session, protocol, host),
        }
    }

    pub fn protocol(&self) -> &str {
        self.base.protocol()
    }

    pub fn host(&self) -> &str {
        self.base.host()
    }

    /// Opens the live update stream for `user_id`.
    pub async fn user_updates(&self, user_id: uuid::Uuid) -> Result<EventStream, ClientError> {
        self.base
            .get_stream(&user_updates_endpoint(user_id))
            .await
    }

    /// Consumes `events` until the publish of `project_id` completes or fails.
    pub async fn check_publish_template_result<S>(
        &self,
        events: S,
        project_id: uuid::Uuid,
    ) -> Result<(), ClientError>
    where
        S: Stream<Item = Result<ServerSentEvent, ClientError>>,
    {
        await_publish_result_stream(events, project_id).await
    }
}

fn user_updates_endpoint(user_id: uuid::Uuid) -> String {
    format!("api/updates/user/{}", user_id.hyphenated())
}
