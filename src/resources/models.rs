//! Resource DTOs carried over the wire by [`EntityCodec`](crate::codec::EntityCodec).
//!
//! These are thin serde shapes; every one carries an optional
//! `modelEncoding` metadata field that is exempt from round-trip equality.

use serde::{Deserialize, Serialize};

use crate::codec::WireNamed;

/// One managed repository as listed under `repositories/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(rename = "repoType", default, skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<String>,
    #[serde(rename = "resourceURI", default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    #[serde(rename = "modelEncoding", default, skip_serializing_if = "Option::is_none")]
    pub model_encoding: Option<String>,
}

impl WireNamed for Repository {
    const WIRE_NAME: &'static str = "repository";
}

/// Service status of one repository; `remote_status` only applies to
/// proxy repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    pub id: String,
    #[serde(rename = "localStatus")]
    pub local_status: String,
    #[serde(rename = "remoteStatus", default, skip_serializing_if = "Option::is_none")]
    pub remote_status: Option<String>,
    #[serde(rename = "modelEncoding", default, skip_serializing_if = "Option::is_none")]
    pub model_encoding: Option<String>,
}

impl WireNamed for RepositoryStatus {
    const WIRE_NAME: &'static str = "repository-status";
}

/// One node of a repository content listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub text: String,
    pub leaf: bool,
    #[serde(rename = "resourceURI", default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    #[serde(rename = "modelEncoding", default, skip_serializing_if = "Option::is_none")]
    pub model_encoding: Option<String>,
}

impl WireNamed for ContentItem {
    const WIRE_NAME: &'static str = "content-item";
}

/// Login response document; the client only ever extracts the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationLogin {
    #[serde(rename = "authToken")]
    pub auth_token: String,
    #[serde(rename = "modelEncoding", default, skip_serializing_if = "Option::is_none")]
    pub model_encoding: Option<String>,
}

impl WireNamed for AuthenticationLogin {
    const WIRE_NAME: &'static str = "authentication-login";
}

/// Local service states a repository can be put into.
pub const LOCAL_STATUS_IN_SERVICE: &str = "inService";
pub const LOCAL_STATUS_OUT_OF_SERVICE: &str = "outOfService";

/// Remote availability states for proxy repositories.
pub const REMOTE_STATUS_AVAILABLE: &str = "available";
pub const REMOTE_STATUS_CHECKING: &str = "checking";
pub const REMOTE_STATUS_UNKNOWN: &str = "unknown";
