//! Server side: the ordered, short-circuiting filter chain and its
//! per-request context.

mod context;
mod filter;
pub mod filters;
mod router;

pub use context::{Principal, RequestContext};
pub use filter::{Filter, FilterAction, FilterError};
pub use router::{FilterChain, FilterChainBuilder};
