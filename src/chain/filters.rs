//! The stock filters, in their intended order: instance-context
//! injection, authentication guard, content-variant negotiation.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use crate::codec::Variant;
use crate::instance::ServerInstance;
use crate::message::{Request, Response};

use super::context::{Principal, RequestContext};
use super::filter::{Filter, FilterAction, FilterError};

/// Injects the shared server-instance handle into the request context so
/// later filters and terminal handlers can reach shared state.
pub struct InstanceFilter {
    instance: Arc<ServerInstance>,
}

impl InstanceFilter {
    pub fn new(instance: Arc<ServerInstance>) -> Self {
        Self { instance }
    }
}

#[async_trait]
impl Filter for InstanceFilter {
    fn name(&self) -> &'static str {
        "instance"
    }

    async fn apply(
        &self,
        ctx: &mut RequestContext,
        _request: &Request,
    ) -> Result<FilterAction, FilterError> {
        ctx.instance = Some(Arc::clone(&self.instance));
        Ok(FilterAction::Forward)
    }
}

/// HTTP Basic authentication guard. Rejection is an intentional
/// short-circuit with a 401, not an error path. Must run before anything
/// that could leak protected state.
pub struct AuthGuard {
    anonymous_allowed: bool,
}

impl AuthGuard {
    pub fn new(anonymous_allowed: bool) -> Self {
        Self { anonymous_allowed }
    }

    /// Pulls the username/password pair out of a `Basic` header value.
    fn decode_basic(value: &str) -> Option<(String, String)> {
        let encoded = value.strip_prefix("Basic ")?;
        let decoded = BASE64.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some((username.to_string(), password.to_string()))
    }
}

#[async_trait]
impl Filter for AuthGuard {
    fn name(&self) -> &'static str {
        "auth-guard"
    }

    async fn apply(
        &self,
        ctx: &mut RequestContext,
        request: &Request,
    ) -> Result<FilterAction, FilterError> {
        let instance = ctx.instance.as_ref().ok_or(FilterError::MissingInstance)?;

        let Some(header) = request.headers().get("Authorization") else {
            if self.anonymous_allowed {
                ctx.principal = Some(Principal::anonymous());
                return Ok(FilterAction::Forward);
            }
            debug!(path = request.path(), "no credentials presented");
            return Ok(FilterAction::ShortCircuit(Response::unauthorized()));
        };

        let Some((username, password)) = Self::decode_basic(header) else {
            warn!(path = request.path(), "malformed Authorization header");
            return Ok(FilterAction::ShortCircuit(Response::unauthorized()));
        };

        if !instance.credentials().verify(&username, &password) {
            warn!(path = request.path(), username, "authentication rejected");
            return Ok(FilterAction::ShortCircuit(Response::unauthorized()));
        }

        ctx.principal = Some(Principal::named(username));
        Ok(FilterAction::Forward)
    }
}

/// Content-variant negotiation: resolves the effective variant from the
/// Accept header and attaches it to the context. When the request carries
/// no usable Accept header, forwards a rewritten request with the
/// negotiated one made explicit.
pub struct VariantFilter {
    default: Variant,
}

impl VariantFilter {
    pub fn new(default: Variant) -> Self {
        Self { default }
    }

    fn negotiate(&self, accept: Option<&str>) -> Option<Variant> {
        let accept = accept?;
        accept
            .split(',')
            .filter_map(|part| Variant::from_media_type(part.trim()))
            .next()
    }
}

#[async_trait]
impl Filter for VariantFilter {
    fn name(&self) -> &'static str {
        "variant-negotiation"
    }

    async fn apply(
        &self,
        ctx: &mut RequestContext,
        request: &Request,
    ) -> Result<FilterAction, FilterError> {
        match self.negotiate(request.headers().get("Accept")) {
            Some(variant) => {
                ctx.variant = variant;
                Ok(FilterAction::Forward)
            }
            None => {
                ctx.variant = self.default;
                let mut builder = Request::builder(request.method(), request.path_and_query());
                for (name, value) in request.headers().iter() {
                    if !name.eq_ignore_ascii_case("Accept") {
                        builder = builder.header(name, value);
                    }
                }
                builder = builder.header("Accept", self.default.media_type());
                if let Some(body) = request.body() {
                    builder = builder.body(body.bytes.clone(), body.variant);
                }
                Ok(FilterAction::ForwardRewritten(builder.build()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::CredentialStore;

    fn guarded_context() -> RequestContext {
        let mut ctx = RequestContext::new();
        ctx.instance = Some(Arc::new(ServerInstance::new(CredentialStore::from_users(
            [("admin".to_string(), "secret".to_string())].into(),
        ))));
        ctx
    }

    #[test]
    fn basic_header_decodes_to_credentials() {
        let decoded = AuthGuard::decode_basic("Basic dTpw").unwrap();
        assert_eq!(decoded, ("u".to_string(), "p".to_string()));
        assert!(AuthGuard::decode_basic("Bearer xyz").is_none());
        assert!(AuthGuard::decode_basic("Basic ???").is_none());
    }

    #[tokio::test]
    async fn guard_rejects_wrong_password_with_short_circuit() {
        let guard = AuthGuard::new(false);
        let mut ctx = guarded_context();
        let credential = BASE64.encode("admin:wrong");
        let request = Request::get("repositories/")
            .header("Authorization", format!("Basic {credential}"))
            .build();

        match guard.apply(&mut ctx, &request).await.unwrap() {
            FilterAction::ShortCircuit(response) => {
                assert_eq!(response.status, 401);
                assert!(response.headers.contains("WWW-Authenticate"));
            }
            other => panic!("expected short-circuit, got {other:?}"),
        }
        assert!(ctx.principal.is_none());
    }

    #[tokio::test]
    async fn guard_accepts_valid_credentials() {
        let guard = AuthGuard::new(false);
        let mut ctx = guarded_context();
        let credential = BASE64.encode("admin:secret");
        let request = Request::get("repositories/")
            .header("Authorization", format!("Basic {credential}"))
            .build();

        assert!(matches!(
            guard.apply(&mut ctx, &request).await.unwrap(),
            FilterAction::Forward
        ));
        assert_eq!(ctx.principal.as_ref().unwrap().username, "admin");
    }

    #[tokio::test]
    async fn guard_allows_anonymous_when_configured() {
        let guard = AuthGuard::new(true);
        let mut ctx = guarded_context();
        let request = Request::get("repositories/").build();

        assert!(matches!(
            guard.apply(&mut ctx, &request).await.unwrap(),
            FilterAction::Forward
        ));
        assert!(ctx.principal.as_ref().unwrap().anonymous);
    }

    #[tokio::test]
    async fn variant_filter_negotiates_from_accept() {
        let filter = VariantFilter::new(Variant::Xml);
        let mut ctx = RequestContext::new();
        let request = Request::get("repositories/")
            .header("Accept", "application/json")
            .build();

        assert!(matches!(
            filter.apply(&mut ctx, &request).await.unwrap(),
            FilterAction::Forward
        ));
        assert_eq!(ctx.variant, Variant::Json);
    }

    #[tokio::test]
    async fn variant_filter_rewrites_when_accept_is_unusable() {
        let filter = VariantFilter::new(Variant::Xml);
        let mut ctx = RequestContext::new();
        let request = Request::get("repositories/").header("Accept", "*/*").build();

        match filter.apply(&mut ctx, &request).await.unwrap() {
            FilterAction::ForwardRewritten(rewritten) => {
                assert_eq!(rewritten.headers().get("Accept"), Some("application/xml"));
                assert_eq!(rewritten.headers().count("Accept"), 1);
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
        assert_eq!(ctx.variant, Variant::Xml);
    }
}
