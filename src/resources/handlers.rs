//! Terminal handlers for the resource paths the client consumes.
//!
//! Handlers pull shared state off the request context (injected by the
//! instance filter) and speak the variant negotiated earlier in the chain.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::chain::RequestContext;
use crate::codec::EntityCodec;
use crate::instance::ServerInstance;
use crate::message::{Method, Request, Response};
use crate::registry::{HandlerError, PathParams, ResourceHandler};
use crate::resources::models::{
    AuthenticationLogin, REMOTE_STATUS_CHECKING, REMOTE_STATUS_UNKNOWN, RepositoryStatus,
};

fn instance_of(ctx: &RequestContext) -> Result<&Arc<ServerInstance>, HandlerError> {
    ctx.instance
        .as_ref()
        .ok_or_else(|| HandlerError::Internal("server instance not resolved".to_string()))
}

/// `repositories/` — lists the managed repositories.
pub struct RepositoriesHandler;

#[async_trait]
impl ResourceHandler for RepositoriesHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        _params: PathParams,
    ) -> Result<Response, HandlerError> {
        if request.method() != Method::Get {
            return Err(HandlerError::MethodNotAllowed);
        }
        let instance = instance_of(ctx)?;
        let repositories = instance.list_repositories().await;

        let body = EntityCodec::new()
            .serialize_list("repositories", &repositories, ctx.variant)
            .map_err(|e| HandlerError::Internal(e.to_string()))?;
        Ok(Response::with_body(200, ctx.variant, body))
    }
}

/// `repository_statuses[?forceCheck]` — lists statuses; a forced check
/// kicks off remote re-checks and answers 202 while they run.
pub struct RepositoryStatusesHandler;

#[async_trait]
impl ResourceHandler for RepositoryStatusesHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        _params: PathParams,
    ) -> Result<Response, HandlerError> {
        if request.method() != Method::Get {
            return Err(HandlerError::MethodNotAllowed);
        }
        let instance = instance_of(ctx)?;

        let force_check = request.has_query_flag("forceCheck");
        if force_check {
            let marked = instance.begin_remote_checks().await;
            debug!(marked, "forced remote status checks");
        }

        let statuses = instance.list_statuses().await;
        let body = EntityCodec::new()
            .serialize_list("repository-statuses", &statuses, ctx.variant)
            .map_err(|e| HandlerError::Internal(e.to_string()))?;

        let status = if force_check { 202 } else { 200 };
        Ok(Response::with_body(status, ctx.variant, body))
    }
}

/// `repositories/{id}/status` — reads or updates one repository's status.
pub struct RepositoryStatusHandler;

#[async_trait]
impl ResourceHandler for RepositoryStatusHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        params: PathParams,
    ) -> Result<Response, HandlerError> {
        let instance = instance_of(ctx)?;
        let id = params
            .get("id")
            .ok_or_else(|| HandlerError::Internal("missing id capture".to_string()))?;
        let codec = EntityCodec::new();

        match request.method() {
            Method::Get => {
                let status = instance
                    .repository_status(id)
                    .await
                    .ok_or_else(|| HandlerError::NotFound(format!("repository {id}")))?;
                let body = codec
                    .serialize(&status, ctx.variant)
                    .map_err(|e| HandlerError::Internal(e.to_string()))?;
                Ok(Response::with_body(200, ctx.variant, body))
            }
            Method::Put => {
                let payload = request
                    .body()
                    .ok_or_else(|| HandlerError::BadRequest("status body required".to_string()))?;
                let text = std::str::from_utf8(&payload.bytes)
                    .map_err(|_| HandlerError::BadRequest("body is not UTF-8".to_string()))?;
                let mut submitted: RepositoryStatus = codec
                    .parse(text, payload.variant)
                    .map_err(|e| HandlerError::BadRequest(e.to_string()))?;

                if instance.repository_status(id).await.is_none() {
                    return Err(HandlerError::NotFound(format!("repository {id}")));
                }

                // The path, not the payload, names the repository.
                submitted.id = id.to_string();

                // An unknown remote status asks for a re-check; the change
                // is then still propagating when we answer.
                let propagating =
                    submitted.remote_status.as_deref() == Some(REMOTE_STATUS_UNKNOWN);
                if propagating {
                    submitted.remote_status = Some(REMOTE_STATUS_CHECKING.to_string());
                }

                instance.set_repository_status(submitted.clone()).await;
                info!(id, local_status = %submitted.local_status, "repository status updated");

                let body = codec
                    .serialize(&submitted, ctx.variant)
                    .map_err(|e| HandlerError::Internal(e.to_string()))?;
                let status = if propagating { 202 } else { 200 };
                Ok(Response::with_body(status, ctx.variant, body))
            }
            _ => Err(HandlerError::MethodNotAllowed),
        }
    }
}

/// `repositories/{id}/content/{path..}` — lists one node of a repository
/// content tree; an empty rest path is the root listing.
pub struct ContentHandler;

#[async_trait]
impl ResourceHandler for ContentHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        params: PathParams,
    ) -> Result<Response, HandlerError> {
        if request.method() != Method::Get {
            return Err(HandlerError::MethodNotAllowed);
        }
        let instance = instance_of(ctx)?;
        let id = params
            .get("id")
            .ok_or_else(|| HandlerError::Internal("missing id capture".to_string()))?;
        let subpath = params.get("path").unwrap_or("");

        let items = instance
            .content_at(id, subpath)
            .await
            .ok_or_else(|| HandlerError::NotFound(format!("content node {id}/{subpath}")))?;
        let body = EntityCodec::new()
            .serialize_list("content", &items, ctx.variant)
            .map_err(|e| HandlerError::Internal(e.to_string()))?;
        Ok(Response::with_body(200, ctx.variant, body))
    }
}

/// Which maintenance surface a DELETE hits.
#[derive(Debug, Clone, Copy)]
pub enum MaintenanceKind {
    /// `data_index/repositories/{id}/content` — drop derived index data.
    Reindex,
    /// `data_cache/repositories/{id}/content` — drop proxied content.
    ClearCache,
    /// `attributes/repositories/{id}/content` — drop stored attributes.
    RebuildAttributes,
}

impl MaintenanceKind {
    fn cache_prefix(&self, repository_id: &str) -> String {
        match self {
            MaintenanceKind::Reindex => format!("index/repositories/{repository_id}/"),
            MaintenanceKind::ClearCache => format!("repositories/{repository_id}/"),
            MaintenanceKind::RebuildAttributes => {
                format!("attributes/repositories/{repository_id}/")
            }
        }
    }
}

/// DELETE-only maintenance endpoint backed by the path cache.
pub struct MaintenanceHandler {
    kind: MaintenanceKind,
}

impl MaintenanceHandler {
    pub fn new(kind: MaintenanceKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl ResourceHandler for MaintenanceHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        params: PathParams,
    ) -> Result<Response, HandlerError> {
        if request.method() != Method::Delete {
            return Err(HandlerError::MethodNotAllowed);
        }
        let instance = instance_of(ctx)?;
        let id = params
            .get("id")
            .ok_or_else(|| HandlerError::Internal("missing id capture".to_string()))?;

        let purged = instance.cache().purge_prefix(&self.kind.cache_prefix(id));
        info!(repository = id, kind = ?self.kind, purged, "maintenance delete");
        Ok(Response::ok())
    }
}

/// `authentication/login` — the guard already verified the Basic header;
/// this issues the authorization token the client extracts.
pub struct LoginHandler;

#[async_trait]
impl ResourceHandler for LoginHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        _params: PathParams,
    ) -> Result<Response, HandlerError> {
        if request.method() != Method::Get {
            return Err(HandlerError::MethodNotAllowed);
        }
        let instance = instance_of(ctx)?;

        let Some(principal) = ctx.principal.as_ref().filter(|p| !p.anonymous) else {
            return Ok(Response::unauthorized());
        };

        let token = instance.issue_token(&principal.username).await;
        let login = AuthenticationLogin {
            auth_token: token,
            model_encoding: None,
        };
        let body = EntityCodec::new()
            .serialize(&login, ctx.variant)
            .map_err(|e| HandlerError::Internal(e.to_string()))?;
        Ok(Response::with_body(200, ctx.variant, body))
    }
}

/// `authentication/logout` — revokes every token the principal holds.
pub struct LogoutHandler;

#[async_trait]
impl ResourceHandler for LogoutHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        _params: PathParams,
    ) -> Result<Response, HandlerError> {
        if request.method() != Method::Get {
            return Err(HandlerError::MethodNotAllowed);
        }
        let instance = instance_of(ctx)?;

        if let Some(principal) = ctx.principal.as_ref().filter(|p| !p.anonymous) {
            let revoked = instance.revoke_tokens(&principal.username).await;
            debug!(username = %principal.username, revoked, "logout");
        }
        Ok(Response::ok())
    }
}
