//! The filter-chain router: an ordered, immutable pipeline walked
//! strictly forward for every inbound request.

use std::sync::Arc;

use tracing::{debug, error};

use crate::message::{Request, Response};
use crate::observability::Metrics;
use crate::registry::HandlerRegistry;

use super::context::RequestContext;
use super::filter::{Filter, FilterAction};

/// Builder for [`FilterChain`]. Ordering is a configuration-time
/// decision: the order filters are added is the order they run.
#[derive(Default)]
pub struct FilterChainBuilder {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Finishes the chain with its terminal handler registry.
    pub fn terminal(self, registry: HandlerRegistry, metrics: Arc<Metrics>) -> FilterChain {
        FilterChain {
            filters: self.filters,
            registry,
            metrics,
        }
    }
}

/// Assembled once at startup; thereafter read-only and safely shared
/// across concurrent requests. No chain-level locking.
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
    registry: HandlerRegistry,
    metrics: Arc<Metrics>,
}

impl FilterChain {
    pub fn builder() -> FilterChainBuilder {
        FilterChainBuilder::new()
    }

    /// Runs one request through the chain. Each filter runs at most once,
    /// in registration order; a short-circuit ends the walk, a filter
    /// error becomes a generic server error, and an exhausted chain hands
    /// off to the terminal registry.
    pub async fn handle(&self, mut request: Request) -> Response {
        let mut ctx = RequestContext::new();
        debug!(request_id = %ctx.request_id, method = %request.method(),
            path = request.path(), "request entered chain");

        for filter in &self.filters {
            match filter.apply(&mut ctx, &request).await {
                Ok(FilterAction::Forward) => {}
                Ok(FilterAction::ForwardRewritten(rewritten)) => {
                    debug!(request_id = %ctx.request_id, filter = filter.name(),
                        "request rewritten");
                    request = rewritten;
                }
                Ok(FilterAction::ShortCircuit(response)) => {
                    debug!(request_id = %ctx.request_id, filter = filter.name(),
                        status = response.status, "chain short-circuited");
                    self.metrics.chain_short_circuit();
                    return response;
                }
                Err(err) => {
                    error!(request_id = %ctx.request_id, filter = filter.name(),
                        %err, "filter failed, aborting chain");
                    self.metrics.chain_failure();
                    return Response::server_error();
                }
            }
        }

        let response = self.registry.dispatch(&ctx, &request).await;
        self.metrics.request_handled();
        response
    }
}
