//! Common imports for typical client usage.
pub use crate::{
    ClientError, EnvironmentClient, EventStream, NotificationClient, Profile, PublishOutcome,
    ServerSentEvent, Session, TemplatePublishingError, User, UserClient,
};
