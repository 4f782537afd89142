//! Project environments: schemas and the environment service client.
//!
//! An environment is a reusable recipe of apt packages, Python packages and
//! bash scripts applied to servers of a project.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeStruct as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ClientError;
use crate::http::BaseClient;
use crate::session::Session;

const SERVICE_NAME: &str = "baskerville";

static PYTHON_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+!)?\d+(?:\.\d+)*(?:(?:a|b|rc)\d+)?(?:\.post\d+)?(?:\.dev\d+)?$")
        .expect("python version pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
}

/// Version requirement of a Python package.
///
/// The identifier must be a release-style version (`1.0.0`, `2.1rc1`,
/// `1!3.0.post2`); this is checked when decoding and when encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    pub constraint: Constraint,
    pub identifier: String,
}

impl Version {
    pub fn new(constraint: Constraint, identifier: impl Into<String>) -> Result<Self, ClientError> {
        let version = Self {
            constraint,
            identifier: identifier.into(),
        };
        version.validate().map_err(ClientError::Validation)?;
        Ok(version)
    }

    fn validate(&self) -> Result<(), String> {
        if PYTHON_VERSION.is_match(&self.identifier) {
            Ok(())
        } else {
            Err(format!("invalid version identifier: {:?}", self.identifier))
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.validate().map_err(S::Error::custom)?;
        let mut state = serializer.serialize_struct("Version", 2)?;
        state.serialize_field("constraint", &self.constraint)?;
        state.serialize_field("identifier", &self.identifier)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            constraint: Constraint,
            identifier: String,
        }
        let raw = Raw::deserialize(deserializer)?;
        let version = Version {
            constraint: raw.constraint,
            identifier: raw.identifier,
        };
        version.validate().map_err(D::Error::custom)?;
        Ok(version)
    }
}

/// Either the latest available release or a constrained version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageVersion {
    Latest,
    Pinned(Version),
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Latest => serializer.serialize_str("latest"),
            Self::Pinned(version) => version.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(keyword) if keyword == "latest" => Ok(Self::Latest),
            serde_json::Value::String(other) => Err(D::Error::custom(format!(
                "expected \"latest\" or a version object, got {other:?}"
            ))),
            other => Version::deserialize(other)
                .map(Self::Pinned)
                .map_err(D::Error::custom),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonPackage {
    pub name: String,
    pub version: PackageVersion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pip {
    pub extra_index_urls: Vec<String>,
    pub packages: Vec<PythonPackage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conda {
    pub channels: Vec<String>,
    pub packages: Vec<PythonPackage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonSpecification {
    pub conda: Conda,
    pub pip: Pip,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptPackage {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apt {
    pub packages: Vec<AptPackage>,
}

/// Per-interpreter package lists; an absent interpreter is left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Python {
    #[serde(rename = "Python2", default, skip_serializing_if = "Option::is_none")]
    pub python2: Option<PythonSpecification>,
    #[serde(rename = "Python3", default, skip_serializing_if = "Option::is_none")]
    pub python3: Option<PythonSpecification>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub script: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub apt: Apt,
    pub bash: Vec<Script>,
    pub python: Python,
}

/// Body of environment create and update requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub specification: Specification,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(rename = "environmentId")]
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub author_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub specification: Specification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EnvironmentCreationResponse {
    #[serde(rename = "environmentId")]
    pub id: uuid::Uuid,
}

/// Client for the environment service.
#[derive(Clone)]
pub struct EnvironmentClient {
    base: BaseClient,
}

impl EnvironmentClient {
    pub fn new(session: &Session) -> Self {
        Self {
            base: BaseClient::for_service(session, SERVICE_NAME),
        }
    }

    pub async fn list(&self, project_id: uuid::Uuid) -> Result<Vec<Environment>, ClientError> {
        self.base.get(&collection_endpoint(project_id)).await
    }

    pub async fn get(
        &self,
        project_id: uuid::Uuid,
        environment_id: uuid::Uuid,
    ) -> Result<Environment, ClientError> {
        self.base
            .get(&item_endpoint(project_id, environment_id))
            .await
    }

    pub async fn update(
        &self,
        project_id: uuid::Uuid,
        environment_id: uuid::Uuid,
        update: &EnvironmentUpdate,
    ) -> Result<(), ClientError> {
        self.base
            .put_raw(&item_endpoint(project_id, environment_id), update)
            .await
    }

    /// Creates an environment and returns its id.
    pub async fn create(
        &self,
        project_id: uuid::Uuid,
        update: &EnvironmentUpdate,
    ) -> Result<uuid::Uuid, ClientError> {
        let response: EnvironmentCreationResponse = self
            .base
            .post(&collection_endpoint(project_id), update)
            .await?;
        Ok(response.id)
    }

    pub async fn delete(
        &self,
        project_id: uuid::Uuid,
        environment_id: uuid::Uuid,
    ) -> Result<(), ClientError> {
        self.base
            .delete_raw(&item_endpoint(project_id, environment_id))
            .await
    }
}

fn collection_endpoint(project_id: uuid::Uuid) -> String {
    format!("/project/{project_id}/environment")
}

fn item_endpoint(project_id: uuid::Uuid, environment_id: uuid::Uuid) -> String {
    format!("/project/{project_id}/environment/{environment_id}")
}
