//! Bridge between the axum surface and the filter-chain router: inbound
//! hyper requests become [`message::Request`]s, the chain's responses go
//! back out as axum responses.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tracing::warn;

use crate::chain::FilterChain;
use crate::codec::Variant;
use crate::message::{Method, Request, Response};

#[derive(Clone)]
pub struct BridgeState {
    pub chain: Arc<FilterChain>,
}

/// Fallback handler: every path not served natively by axum goes through
/// the filter chain.
pub async fn route_through_chain(
    State(state): State<BridgeState>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();

    let method = match parts.method {
        axum::http::Method::GET => Method::Get,
        axum::http::Method::PUT => Method::Put,
        axum::http::Method::POST => Method::Post,
        axum::http::Method::DELETE => Method::Delete,
        other => {
            warn!(method = %other, "unsupported method");
            return StatusCode::METHOD_NOT_ALLOWED.into_response();
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let mut builder = Request::builder(method, path_and_query);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            builder = builder.header(name.as_str(), value);
        }
    }

    // Decompression already ran at the middleware layer.
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(%err, "failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    if !bytes.is_empty() {
        let variant = parts
            .headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(Variant::from_media_type)
            .unwrap_or(Variant::Xml);
        builder = builder.body(bytes, variant);
    }

    into_axum(state.chain.handle(builder.build()).await)
}

fn into_axum(response: Response) -> axum::response::Response {
    let mut builder = axum::http::Response::builder().status(response.status);
    for (name, value) in response.headers.iter() {
        builder = builder.header(name, value);
    }
    builder
        .body(axum::body::Body::from(response.body_text))
        .unwrap_or_else(|err| {
            warn!(%err, "failed to assemble response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}
