use std::fmt;

/// One per-file failure reported when the server could not render a project
/// template with its default parameters.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderingError {
    /// Renderer message, for example `Unexpected key { abc }`.
    pub error: String,
    /// Template-relative path of the offending file.
    pub path: String,
}

/// Reasons a template publishing operation can fail.
///
/// Every variant renders the user-facing message shown for that failure;
/// the structured fields are kept for programmatic inspection.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplatePublishingError {
    /// A template with the requested name already exists.
    #[error("{message}")]
    NameConflict { message: String },
    /// One or more template files failed to render.
    #[error("{}", render_rendering_errors(.errors))]
    TemplateRenderingError { errors: Vec<RenderingError> },
    /// The server reported an error code this client does not know, without a message.
    #[error("Unexpected error code received: {code}")]
    UnexpectedErrorCode { code: String },
    /// The failure payload did not have the expected shape.
    #[error("Unexpected server response")]
    UnexpectedServerResponse,
    /// Any other error code that came with a plain message.
    #[error("{message}")]
    GenericError { code: String, message: String },
}

impl TemplatePublishingError {
    /// Returns the server error code behind this failure, when there was one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::NameConflict { .. } => Some("name_conflict"),
            Self::TemplateRenderingError { .. } => Some("template_rendering_error"),
            Self::UnexpectedErrorCode { code } | Self::GenericError { code, .. } => Some(code),
            Self::UnexpectedServerResponse => None,
        }
    }
}

fn render_rendering_errors(errors: &[RenderingError]) -> String {
    let mut out = String::from("Failed to render the template with default parameters:");
    for entry in errors {
        out.push_str("\n\t");
        out.push_str(&entry.error);
        out.push_str(" in file ");
        out.push_str(&entry.path);
    }
    out
}

/// Class of a non-success HTTP status returned by a platform service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpStatusKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    Other,
}

impl HttpStatusKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            409 => Self::Conflict,
            500 => Self::InternalServerError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::Other,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::Conflict => "conflict",
            Self::InternalServerError => "internal server error",
            Self::BadGateway => "bad gateway",
            Self::ServiceUnavailable => "service unavailable",
            Self::GatewayTimeout => "gateway timeout",
            Self::Other => "http error",
        }
    }
}

/// Non-2xx response from a platform service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpStatusError {
    pub kind: HttpStatusKind,
    pub status: u16,
    /// `error` field of a JSON error body.
    pub error: Option<String>,
    /// `errorCode` field of a JSON error body.
    pub error_code: Option<String>,
    /// Raw response body.
    pub body: String,
}

impl HttpStatusError {
    /// Builds the error from a status and raw body, picking the `error` and
    /// `errorCode` fields out of the body when it is a JSON object.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let parsed = serde_json::from_str::<serde_json::Value>(&body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned)
        };
        Self {
            kind: HttpStatusKind::from_status(status),
            status,
            error: field("error"),
            error_code: field("errorCode"),
            body,
        }
    }
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.kind.label(), self.status)?;
        match (&self.error, &self.error_code) {
            (Some(error), Some(code)) => write!(f, ": {error} [{code}]"),
            (Some(error), None) => write!(f, ": {error}"),
            _ if !self.body.trim().is_empty() => write!(f, ": {}", self.body.trim()),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for HttpStatusError {}

/// Top-level error type for the public client API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Obtaining or applying credentials failed.
    #[error("auth error: {0}")]
    Auth(String),
    /// Connection, request or stream I/O failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error(transparent)]
    Http(HttpStatusError),
    /// A response body did not match the expected schema.
    #[error("decode error: {0}")]
    Decode(String),
    /// A value rejected by local validation before or after the wire.
    #[error("validation error: {0}")]
    Validation(String),
    /// The awaited template publishing operation failed.
    #[error(transparent)]
    TemplatePublishing(TemplatePublishingError),
    /// The update stream closed before a terminal event was seen.
    #[error("event stream ended before the awaited operation finished")]
    StreamEnded,
}

impl ClientError {
    pub(crate) fn transport(context: &str, err: impl fmt::Display) -> Self {
        Self::Transport(format!("{context}: {err}"))
    }

    pub(crate) fn decode(context: &str, err: impl fmt::Display) -> Self {
        Self::Decode(format!("{context}: {err}"))
    }

    /// Returns the HTTP status class when this is a service status error.
    pub fn http_status_kind(&self) -> Option<HttpStatusKind> {
        match self {
            Self::Http(err) => Some(err.kind),
            _ => None,
        }
    }
}

impl From<TemplatePublishingError> for ClientError {
    fn from(value: TemplatePublishingError) -> Self {
        ClientError::TemplatePublishing(value)
    }
}

impl From<HttpStatusError> for ClientError {
    fn from(value: HttpStatusError) -> Self {
        ClientError::Http(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_error_message_keeps_entry_order() {
        let err = TemplatePublishingError::TemplateRenderingError {
            errors: vec![
                RenderingError {
                    error: "Unexpected key { abc }".into(),
                    path: "b.py".into(),
                },
                RenderingError {
                    error: "Missing parameter".into(),
                    path: "a.py".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Failed to render the template with default parameters:\n\
             \tUnexpected key { abc } in file b.py\n\
             \tMissing parameter in file a.py"
        );
    }

    #[test]
    fn rendering_error_without_entries_is_header_only() {
        let err = TemplatePublishingError::TemplateRenderingError { errors: Vec::new() };
        assert_eq!(
            err.to_string(),
            "Failed to render the template with default parameters:"
        );
    }

    #[test]
    fn error_code_reflects_variant() {
        let generic = TemplatePublishingError::GenericError {
            code: "quota_exceeded".into(),
            message: "too many templates".into(),
        };
        assert_eq!(generic.error_code(), Some("quota_exceeded"));
        assert_eq!(generic.to_string(), "too many templates");
        assert_eq!(
            TemplatePublishingError::UnexpectedServerResponse.error_code(),
            None
        );
    }

    #[test]
    fn http_status_error_reads_json_error_fields() {
        let err = HttpStatusError::from_response(
            409,
            r#"{"error": "environment exists", "errorCode": "name_conflict"}"#,
        );
        assert_eq!(err.kind, HttpStatusKind::Conflict);
        assert_eq!(err.error.as_deref(), Some("environment exists"));
        assert_eq!(err.error_code.as_deref(), Some("name_conflict"));
        assert_eq!(
            err.to_string(),
            "conflict (status 409): environment exists [name_conflict]"
        );
    }

    #[test]
    fn http_status_error_falls_back_to_raw_body() {
        let err = HttpStatusError::from_response(418, "short and stout");
        assert_eq!(err.kind, HttpStatusKind::Other);
        assert_eq!(err.error, None);
        assert_eq!(err.to_string(), "http error (status 418): short and stout");
    }
}
