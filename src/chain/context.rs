//! Per-request scratch state carried through the filter chain.

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::codec::Variant;
use crate::instance::ServerInstance;

/// Authenticated caller identity attached by the authentication guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub anonymous: bool,
}

impl Principal {
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            username: "anonymous".to_string(),
            anonymous: true,
        }
    }
}

/// Mutable record owned by exactly one request's processing lifetime.
/// Created when a request enters the chain, dropped when it completes;
/// never shared across requests.
pub struct RequestContext {
    pub request_id: Uuid,
    pub instance: Option<Arc<ServerInstance>>,
    pub variant: Variant,
    pub principal: Option<Principal>,
    attributes: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            instance: None,
            variant: Variant::Xml,
            principal: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
