//! Correlation of template publishing results on a user's update stream.
//!
//! The platform publishes templates asynchronously and reports the outcome as
//! a server-sent event on the stream shared by every operation of the user.
//! The correlator pulls events in order, skips anything that does not belong
//! to the awaited project, and stops at the first completed or failed event
//! that does.

use futures::{Stream, StreamExt as _};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{ClientError, RenderingError, TemplatePublishingError};
use crate::sse::ServerSentEvent;

pub const PUBLISH_COMPLETED_EVENT: &str = "@SSE/PROJECT_TEMPLATE_PUBLISH_NEW_COMPLETED";
pub const PUBLISH_FAILED_EVENT: &str = "@SSE/PROJECT_TEMPLATE_PUBLISH_NEW_FAILED";

const NAME_CONFLICT: &str = "name_conflict";
const TEMPLATE_RENDERING_ERROR: &str = "template_rendering_error";

/// Terminal result of a publishing operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Completed,
    Failed(TemplatePublishingError),
}

impl PublishOutcome {
    pub fn into_result(self) -> Result<(), TemplatePublishingError> {
        match self {
            Self::Completed => Ok(()),
            Self::Failed(err) => Err(err),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRef {
    source_project_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureCode {
    error_code: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct FailureMessage {
    error: String,
}

#[derive(Deserialize)]
struct FailureRendering {
    errors: Vec<RenderingError>,
}

/// Maps a failed-event payload onto the publishing error taxonomy.
///
/// Recognized codes whose required fields are missing or mistyped, and codes
/// that are not strings, decode as `UnexpectedServerResponse`.
pub fn classify_failure(payload: &serde_json::Value) -> TemplatePublishingError {
    let code = match FailureCode::deserialize(payload) {
        Ok(FailureCode {
            error_code: Some(serde_json::Value::String(code)),
        }) => code,
        _ => return TemplatePublishingError::UnexpectedServerResponse,
    };

    match code.as_str() {
        NAME_CONFLICT => match FailureMessage::deserialize(payload) {
            Ok(FailureMessage { error }) => TemplatePublishingError::NameConflict { message: error },
            Err(_) => TemplatePublishingError::UnexpectedServerResponse,
        },
        TEMPLATE_RENDERING_ERROR => match FailureRendering::deserialize(payload) {
            Ok(FailureRendering { errors }) => {
                TemplatePublishingError::TemplateRenderingError { errors }
            }
            Err(_) => TemplatePublishingError::UnexpectedServerResponse,
        },
        _ => match payload.get("error").and_then(|v| v.as_str()) {
            Some(message) => TemplatePublishingError::GenericError {
                code,
                message: message.to_string(),
            },
            None => TemplatePublishingError::UnexpectedErrorCode { code },
        },
    }
}

enum PublishEventKind {
    Completed,
    Failed,
}

/// Per-event decision for one awaited project.
#[derive(Clone, Copy, Debug)]
pub struct PublishCorrelator {
    project_id: uuid::Uuid,
}

impl PublishCorrelator {
    pub fn new(project_id: uuid::Uuid) -> Self {
        Self { project_id }
    }

    pub fn project_id(&self) -> uuid::Uuid {
        self.project_id
    }

    /// Returns the outcome if `event` terminates the wait, `None` to keep consuming.
    pub fn observe(&self, event: &ServerSentEvent) -> Option<PublishOutcome> {
        let kind = match event.name() {
            Some(PUBLISH_COMPLETED_EVENT) => PublishEventKind::Completed,
            Some(PUBLISH_FAILED_EVENT) => PublishEventKind::Failed,
            _ => return None,
        };

        let payload: serde_json::Value = match serde_json::from_str(&event.data) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    event = "publish.payload_unparseable",
                    domain = "publish",
                    name = event.name().unwrap_or_default(),
                    error = %e
                );
                return None;
            }
        };
        let source = match ProjectRef::deserialize(&payload) {
            Ok(ProjectRef { source_project_id }) => source_project_id,
            Err(e) => {
                warn!(
                    event = "publish.payload_uncorrelated",
                    domain = "publish",
                    name = event.name().unwrap_or_default(),
                    error = %e
                );
                return None;
            }
        };
        if uuid::Uuid::parse_str(&source).ok() != Some(self.project_id) {
            debug!(
                event = "publish.event_skipped",
                domain = "publish",
                awaited = %self.project_id,
                source_project_id = %source
            );
            return None;
        }

        let outcome = match kind {
            PublishEventKind::Completed => PublishOutcome::Completed,
            PublishEventKind::Failed => PublishOutcome::Failed(classify_failure(&payload)),
        };
        debug!(
            event = "publish.event_matched",
            domain = "publish",
            project_id = %self.project_id,
            completed = matches!(outcome, PublishOutcome::Completed),
            error_code = match &outcome {
                PublishOutcome::Failed(err) => err.error_code(),
                PublishOutcome::Completed => None,
            }
        );
        Some(outcome)
    }
}

/// Blocks on `events` until the awaited project's publish completes or fails.
///
/// Events after the terminal one are never pulled. Returns `None` only if the
/// sequence ends first; bounding the wait is up to the event source.
pub fn await_publish_result<I>(events: I, project_id: uuid::Uuid) -> Option<PublishOutcome>
where
    I: IntoIterator<Item = ServerSentEvent>,
{
    let correlator = PublishCorrelator::new(project_id);
    events
        .into_iter()
        .find_map(|event| correlator.observe(&event))
}

/// Async counterpart of [`await_publish_result`] over a transport stream.
///
/// Transport errors are returned as they arrive; a closed stream is
/// `ClientError::StreamEnded`.
pub async fn await_publish_result_stream<S>(
    events: S,
    project_id: uuid::Uuid,
) -> Result<(), ClientError>
where
    S: Stream<Item = Result<ServerSentEvent, ClientError>>,
{
    let correlator = PublishCorrelator::new(project_id);
    let mut events = std::pin::pin!(events);
    while let Some(event) = events.next().await {
        if let Some(outcome) = correlator.observe(&event?) {
            return outcome.into_result().map_err(ClientError::from);
        }
    }
    Err(ClientError::StreamEnded)
}
