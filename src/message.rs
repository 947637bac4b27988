//! Wire-level request/response model shared by the client dispatcher
//! and the server filter chain.

use bytes::Bytes;

use crate::codec::Variant;

/// HTTP verbs this layer issues and routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header map: insertion order preserved, key lookup
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the first header with this name in place, or appends.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Appends without replacing existing headers with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// How many headers carry this name.
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized request payload plus its declared content variant.
#[derive(Debug, Clone)]
pub struct Body {
    pub bytes: Bytes,
    pub variant: Variant,
}

/// One outbound/inbound request. Built fresh per call via [`RequestBuilder`]
/// and not mutated afterwards by the issuing side.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Headers,
    body: Option<Body>,
}

impl Request {
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    pub fn get(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Get, path)
    }

    pub fn put(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Put, path)
    }

    pub fn post(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Delete, path)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path without the query string, without a leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// True when the query string carries this flag (`?forceCheck` style).
    pub fn has_query_flag(&self, flag: &str) -> bool {
        self.query
            .as_deref()
            .map(|q| q.split('&').any(|part| part == flag || part.starts_with(&format!("{flag}="))))
            .unwrap_or(false)
    }

    /// Path plus query string, as sent on the wire.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}

/// Builder for [`Request`]; splits the query string off the path and
/// strips the leading slash so client paths and routed paths compare equal.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Headers,
    body: Option<Body>,
}

impl RequestBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        let raw = path.into();
        let raw = raw.trim_start_matches('/');
        let (path, query) = match raw.split_once('?') {
            Some((p, q)) if !q.is_empty() => (p.to_string(), Some(q.to_string())),
            Some((p, _)) => (p.to_string(), None),
            None => (raw.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Declares the representation the caller wants back.
    pub fn accept(mut self, variant: Variant) -> Self {
        self.headers.set("Accept", variant.media_type());
        self
    }

    pub fn body(mut self, bytes: impl Into<Bytes>, variant: Variant) -> Self {
        self.headers.set("Content-Type", variant.media_type());
        self.body = Some(Body {
            bytes: bytes.into(),
            variant,
        });
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Response view delivered by the transport. Never mutated by the
/// dispatcher or the chain once constructed.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body_text: String,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body_text: String::new(),
        }
    }

    pub fn with_body(status: u16, variant: Variant, body_text: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", variant.media_type());
        Self {
            status,
            headers,
            body_text: body_text.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn accepted() -> Self {
        Self::new(202)
    }

    pub fn unauthorized() -> Self {
        let mut response = Self::new(401);
        response
            .headers
            .set("WWW-Authenticate", "Basic realm=\"repohub\"");
        response
    }

    pub fn bad_request() -> Self {
        Self::new(400)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405)
    }

    pub fn server_error() -> Self {
        Self::new(500)
    }
}
