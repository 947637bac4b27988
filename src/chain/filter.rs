//! The filter contract for the server-side request pipeline.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::{Request, Response};

use super::context::RequestContext;

/// What a filter decided to do with the request.
#[derive(Debug)]
pub enum FilterAction {
    /// Pass the current request on to the next link unchanged.
    Forward,
    /// Pass a rewritten request on instead (e.g. normalized content
    /// negotiation headers).
    ForwardRewritten(Request),
    /// Terminate the chain with this response; no later filter and no
    /// terminal handler runs. A normal outcome, not an error.
    ShortCircuit(Response),
}

/// Unexpected filter failure. Aborts the chain with a generic server
/// error, unlike an intentional short-circuit.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("server instance not resolved")]
    MissingInstance,
    #[error("filter failed: {0}")]
    Internal(String),
}

/// One link of the chain. Filters may read and attach context attributes,
/// forward, forward a rewritten request, or short-circuit.
#[async_trait]
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(
        &self,
        ctx: &mut RequestContext,
        request: &Request,
    ) -> Result<FilterAction, FilterError>;
}
