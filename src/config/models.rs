use std::collections::BTreeMap;
use std::net::SocketAddr;

use serde::Deserialize;

use crate::codec::Variant;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

/// Server-side settings: where to listen and who may talk to us.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// When set, requests without an Authorization header pass the guard
    /// as the anonymous principal. Wrong credentials still get a 401.
    pub anonymous_allowed: bool,
    /// username -> password pairs accepted by the authentication guard.
    pub users: BTreeMap<String, String>,
    /// Variant served when the client does not negotiate one.
    pub default_variant: Variant,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".parse().expect("valid default bind addr"),
            anonymous_allowed: false,
            users: BTreeMap::new(),
            default_variant: Variant::Xml,
        }
    }
}

/// Client-side settings for the typed dispatcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub default_variant: Variant,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            user_agent: format!("repohub/{}", env!("CARGO_PKG_VERSION")),
            default_variant: Variant::Xml,
        }
    }
}
