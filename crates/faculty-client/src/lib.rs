//! Typed async client for the Faculty platform HTTP API.
//!
//! Service clients share one [`Session`], which owns the connection pool and
//! signs every request through an [`Authenticator`]. Template publishing is
//! asynchronous on the server: its outcome arrives on the user's update
//! stream and is picked out by the [`publish`] correlator.
//!
//! # Waiting for a template publish
//!
//! ```no_run
//! use faculty_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let session = Session::from_env()?;
//! let user = User::me(&session).await?;
//! let project_id = uuid::Uuid::new_v4();
//!
//! let notifications = NotificationClient::new(&session);
//! let events = notifications.user_updates(user.id).await?;
//! match notifications
//!     .check_publish_template_result(events, project_id)
//!     .await
//! {
//!     Ok(()) => println!("published"),
//!     Err(ClientError::TemplatePublishing(err)) => eprintln!("{err}"),
//!     Err(err) => return Err(err),
//! }
//! # Ok(())
//! # }
//! ```

/// Request signing.
pub mod auth;
/// Deployment profile and URL helpers.
pub mod config;
/// Environment schemas and service client.
pub mod environment;
/// Public error types.
pub mod errors;
/// Authenticated per-service request plumbing.
pub mod http;
/// Update stream client.
pub mod notification;
/// Opt-in `tracing` subscriber setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Publish-result correlation over the update stream.
pub mod publish;
/// Shared session handle.
pub mod session;
/// Server-sent-event decoding.
pub mod sse;
/// Accounts service client.
pub mod user;

pub use auth::{Authenticator, ClientCredentialsAuth, StaticTokenAuth};
pub use config::{Profile, service_url};
pub use environment::{
    Apt, AptPackage, Conda, Constraint, Environment, EnvironmentClient,
    EnvironmentCreationResponse, EnvironmentUpdate, PackageVersion, Pip, Python, PythonPackage,
    PythonSpecification, Script, Specification, Version,
};
pub use errors::{
    ClientError, HttpStatusError, HttpStatusKind, RenderingError, TemplatePublishingError,
};
pub use http::BaseClient;
pub use notification::NotificationClient;
pub use observability::{ObservabilityConfig, init_observability, init_observability_with};
pub use publish::{
    PUBLISH_COMPLETED_EVENT, PUBLISH_FAILED_EVENT, PublishCorrelator, PublishOutcome,
    await_publish_result, await_publish_result_stream, classify_failure,
};
pub use session::Session;
pub use sse::{EventStream, ServerSentEvent, SseDecoder};
pub use user::{User, UserClient};
