//! Typed operations against a repository-manager server.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::codec::{EntityCodec, Variant};
use crate::message::Request;
use crate::resources::models::{AuthenticationLogin, ContentItem, Repository, RepositoryStatus};
use crate::resources::paths;

use super::dispatcher::{Dispatcher, PendingCall};
use super::policy::SuccessPolicy;
use super::transport::Transport;

/// An authenticated session, carrying only the authorization token the
/// login response granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
}

/// Client surface for one repository-manager server instance.
///
/// Every operation submits asynchronously and yields a [`PendingCall`];
/// the caller is never blocked.
#[derive(Clone)]
pub struct RepoClient {
    dispatcher: Dispatcher,
    codec: EntityCodec,
    variant: Variant,
}

impl RepoClient {
    pub fn new(transport: Arc<dyn Transport>, variant: Variant) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport),
            codec: EntityCodec::new(),
            variant,
        }
    }

    /// The content variant this client declares on its requests.
    pub fn default_variant(&self) -> Variant {
        self.variant
    }

    /// Dispatch counters for every call issued through this client.
    pub fn metrics(&self) -> Arc<crate::observability::Metrics> {
        self.dispatcher.metrics()
    }

    pub fn list_repositories(&self) -> PendingCall<Vec<Repository>> {
        let codec = self.codec;
        let variant = self.variant;
        let request = Request::get(paths::REPOSITORIES).accept(variant).build();

        self.dispatcher.submit(request, SuccessPolicy::default(), move |response| {
            codec.parse_list::<Repository>(&response.body_text, variant)
        })
    }

    /// Fetches per-repository statuses. A `force_check` poll may come back
    /// 202 Accepted while remote checks are still running, so the policy
    /// admits both.
    pub fn repository_statuses(&self, force_check: bool) -> PendingCall<Vec<RepositoryStatus>> {
        let codec = self.codec;
        let variant = self.variant;
        let path = if force_check {
            format!("{}?forceCheck", paths::REPOSITORY_STATUSES)
        } else {
            paths::REPOSITORY_STATUSES.to_string()
        };
        let request = Request::get(path).accept(variant).build();

        self.dispatcher.submit(request, SuccessPolicy::ok_or_accepted(), move |response| {
            codec.parse_list::<RepositoryStatus>(&response.body_text, variant)
        })
    }

    /// Puts a new status for one repository; the server answers 202 while
    /// the change is still propagating.
    pub fn update_repository_status(
        &self,
        status: &RepositoryStatus,
    ) -> Result<PendingCall<RepositoryStatus>, crate::codec::CodecError> {
        let codec = self.codec;
        let variant = self.variant;
        let body = codec.serialize(status, variant)?;
        let request = Request::put(format!("repositories/{}/status", status.id))
            .accept(variant)
            .body(body, variant)
            .build();

        Ok(self.dispatcher.submit(request, SuccessPolicy::ok_or_accepted(), move |response| {
            codec.parse::<RepositoryStatus>(&response.body_text, variant)
        }))
    }

    /// Lists content under a repository given the resource URI of the
    /// parent node; only the part from `repositories` onward is sent.
    pub fn repository_content(&self, resource_uri: &str) -> PendingCall<Vec<ContentItem>> {
        let codec = self.codec;
        let variant = self.variant;
        let path = match resource_uri.find("repositories") {
            Some(i) => format!("{}/", resource_uri[i..].trim_end_matches('/')),
            None => format!("{}/", resource_uri.trim_end_matches('/')),
        };
        let request = Request::get(path).accept(variant).build();

        self.dispatcher.submit(request, SuccessPolicy::default(), move |response| {
            codec.parse_list::<ContentItem>(&response.body_text, variant)
        })
    }

    pub fn reindex_repository(&self, repository_id: &str) -> PendingCall<()> {
        self.maintenance_delete(format!("data_index/repositories/{repository_id}/content"))
    }

    pub fn clear_repository_cache(&self, repository_id: &str) -> PendingCall<()> {
        self.maintenance_delete(format!("data_cache/repositories/{repository_id}/content"))
    }

    pub fn rebuild_repository_attributes(&self, repository_id: &str) -> PendingCall<()> {
        self.maintenance_delete(format!("attributes/repositories/{repository_id}/content"))
    }

    fn maintenance_delete(&self, path: String) -> PendingCall<()> {
        let request = Request::delete(path).accept(self.variant).build();
        self.dispatcher.submit(request, SuccessPolicy::default(), |_| Ok(()))
    }

    /// Authenticated login. Attaches a precomputed Basic header and, on
    /// success, extracts only the authorization token out of the parsed
    /// body instead of round-tripping the whole document. Fixed to XML
    /// regardless of the client's declared default.
    pub fn login(&self, username: &str, password: &str) -> PendingCall<AuthSession> {
        let codec = self.codec;
        let credential = BASE64.encode(format!("{username}:{password}"));
        let request = Request::get(paths::LOGIN)
            .accept(Variant::Xml)
            .header("Authorization", format!("Basic {credential}"))
            .build();

        self.dispatcher.submit(request, SuccessPolicy::default(), move |response| {
            let login: AuthenticationLogin = codec.parse(&response.body_text, Variant::Xml)?;
            Ok(AuthSession {
                token: login.auth_token,
            })
        })
    }

    pub fn logout(&self) -> PendingCall<()> {
        let request = Request::get(paths::LOGOUT).accept(self.variant).build();
        self.dispatcher.submit(request, SuccessPolicy::default(), |_| Ok(()))
    }
}
