use serde::Deserialize;

use crate::errors::ClientError;
use crate::http::BaseClient;
use crate::session::Session;

const SERVICE_NAME: &str = "hudson";

/// Platform user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct User {
    pub id: uuid::Uuid,
}

impl User {
    /// Resolves the user the session is authenticated as.
    pub async fn me(session: &Session) -> Result<Self, ClientError> {
        let id = UserClient::new(session).authenticated_user_id().await?;
        Ok(Self { id })
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Account {
    pub(crate) user_id: uuid::Uuid,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct AuthenticationResponse {
    pub(crate) account: Account,
}

/// Client for the accounts service.
#[derive(Clone)]
pub struct UserClient {
    base: BaseClient,
}

impl UserClient {
    pub fn new(session: &Session) -> Self {
        Self {
            base: BaseClient::for_service(session, SERVICE_NAME),
        }
    }

    /// Id of the user the session's credentials belong to.
    pub async fn authenticated_user_id(&self) -> Result<uuid::Uuid, ClientError> {
        let response: AuthenticationResponse = self.base.get("/authenticate").await?;
        Ok(response.account.user_id)
    }
}
