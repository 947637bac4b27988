//! Terminal resource-handler registry: maps path patterns to handler
//! factories, assembled once at startup and read-only afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use crate::chain::RequestContext;
use crate::message::{Request, Response};

/// Path pattern of literal segments, `{name}` captures, and an optional
/// final `{name..}` rest capture that swallows the remaining path (which
/// may be empty), e.g. `repositories/{id}/content/{path..}`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param(String),
    Rest(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    match name.strip_suffix("..") {
                        Some(name) => Segment::Rest(name.to_string()),
                        None => Segment::Param(name.to_string()),
                    }
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Matches a path (query already stripped); trailing slashes are
    /// insignificant. A rest capture binds everything after the fixed
    /// segments, `/`-joined, possibly empty.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut params = BTreeMap::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    let part = parts.get(i)?;
                    if literal.as_str() != *part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(i)?;
                    params.insert(name.clone(), part.to_string());
                }
                Segment::Rest(name) => {
                    let rest = parts.get(i..).unwrap_or(&[]).join("/");
                    params.insert(name.clone(), rest);
                    return Some(PathParams(params));
                }
            }
        }
        if parts.len() != self.segments.len() {
            return None;
        }
        Some(PathParams(params))
    }
}

/// Captures bound by a pattern match.
#[derive(Debug, Clone, Default)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::BadRequest(_) => Response::bad_request(),
            HandlerError::NotFound(_) => Response::not_found(),
            HandlerError::MethodNotAllowed => Response::method_not_allowed(),
            HandlerError::Internal(_) => Response::server_error(),
        }
    }
}

/// Terminal request handler. Invoked once the chain is exhausted; never
/// re-enters the chain.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
        params: PathParams,
    ) -> Result<Response, HandlerError>;
}

type HandlerFactory = Arc<dyn Fn() -> Box<dyn ResourceHandler> + Send + Sync>;

struct HandlerRegistration {
    pattern: PathPattern,
    factory: HandlerFactory,
}

/// Ordered pattern table; first registered match wins, no match is a 404.
/// A fresh handler instance is produced per matched request.
#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<HandlerRegistration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<H, F>(&mut self, pattern: &str, factory: F)
    where
        H: ResourceHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.registrations.push(HandlerRegistration {
            pattern: PathPattern::parse(pattern),
            factory: Arc::new(move || Box::new(factory())),
        });
    }

    pub async fn dispatch(&self, ctx: &RequestContext, request: &Request) -> Response {
        for registration in &self.registrations {
            if let Some(params) = registration.pattern.matches(request.path()) {
                let handler = (registration.factory)();
                return match handler.handle(ctx, request, params).await {
                    Ok(response) => response,
                    Err(err) => {
                        if matches!(err, HandlerError::Internal(_)) {
                            error!(path = request.path(), %err, "handler failed");
                        } else {
                            debug!(path = request.path(), %err, "handler rejected request");
                        }
                        err.into_response()
                    }
                };
            }
        }

        debug!(path = request.path(), "no handler matched");
        Response::not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_with_or_without_trailing_slash() {
        let pattern = PathPattern::parse("repositories");
        assert!(pattern.matches("repositories").is_some());
        assert!(pattern.matches("repositories/").is_some());
        assert!(pattern.matches("repository_statuses").is_none());
    }

    #[test]
    fn param_segments_capture_values() {
        let pattern = PathPattern::parse("repositories/{id}/status");
        let params = pattern.matches("repositories/central/status").unwrap();
        assert_eq!(params.get("id"), Some("central"));
        assert!(pattern.matches("repositories/central").is_none());
        assert!(pattern.matches("repositories/central/status/extra").is_none());
    }

    #[test]
    fn rest_segment_captures_remaining_path() {
        let pattern = PathPattern::parse("repositories/{id}/content/{path..}");

        let params = pattern.matches("repositories/releases/content").unwrap();
        assert_eq!(params.get("id"), Some("releases"));
        assert_eq!(params.get("path"), Some(""));

        let params = pattern.matches("repositories/releases/content/org/acme/").unwrap();
        assert_eq!(params.get("path"), Some("org/acme"));

        assert!(pattern.matches("repositories/releases").is_none());
        assert!(pattern.matches("repositories/releases/status").is_none());
    }

    #[test]
    fn deep_maintenance_pattern() {
        let pattern = PathPattern::parse("data_cache/repositories/{id}/content");
        let params = pattern.matches("data_cache/repositories/r1/content").unwrap();
        assert_eq!(params.get("id"), Some("r1"));
        assert!(pattern.matches("data_index/repositories/r1/content").is_none());
    }
}
