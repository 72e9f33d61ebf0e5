//! Per-request context: the request view handed to every route handler.
//!
//! A [`Context`] wraps the parsed [`Request`] together with the path parameters
//! captured by the router ([`Params`]) and offers the request-side helpers of
//! the handler contract: JSON body binding and cookie lookup.

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;

use crate::http::{Headers, Method, cookie};
use crate::{Request, Response, StatusCode};

/// Path parameters extracted from the matched route.
///
/// Keys are unique: when a pattern declares the same name twice, the capture
/// further to the right wins.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Params {
    map: HashMap<String, String>,
}

impl Params {
    /// Create a new empty parameters map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, overwriting any previous value for `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    /// Get a value from the parameters map
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Number of captured parameters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if the route captured nothing.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Errors produced by [`Context::json`].
#[derive(Debug, Error)]
pub enum BindError {
    #[error("invalid content-type, expected application/json")]
    ContentType,

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl BindError {
    /// The status a handler would typically answer with for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            BindError::ContentType => StatusCode::UnsupportedMediaType,
            BindError::Json(_) => StatusCode::BadRequest,
        }
    }

    /// A plain-text response carrying [`status`](Self::status) and the error message.
    pub fn into_response(self) -> Response {
        Response::new(self.status()).body(self.to_string())
    }
}

/// The request as seen by a route handler.
///
/// # Examples
///
/// ```rust,no_run
/// use zapi::{App, Response, StatusCode, context::Context};
///
/// let mut app = App::new();
/// app.get("/users/[id]", |ctx: Context| async move {
///     let id = ctx.param("id").unwrap_or_default().to_owned();
///     Response::new(StatusCode::Ok).body(id)
/// });
/// ```
#[derive(Debug)]
pub struct Context {
    request: Request,
    params: Params,
}

impl Context {
    /// Create a context with no path parameters
    pub fn new(request: Request) -> Self {
        Self::with_params(request, Params::new())
    }

    /// Create a context carrying the parameters captured by the router
    pub fn with_params(request: Request, params: Params) -> Self {
        Self { request, params }
    }

    /// The underlying parsed request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The raw request path, without the query string.
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// The request headers.
    pub fn headers(&self) -> &Headers {
        self.request.headers()
    }

    /// The request body, exactly `Content-Length` bytes.
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// All path parameters captured by the matched route.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shorthand for `self.params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Deserialize the request body as JSON.
    ///
    /// # Errors
    ///
    /// - [`BindError::ContentType`] — the `Content-Type` header is missing or does not
    ///   begin with `application/json`.
    /// - [`BindError::Json`] — the body is not valid JSON for `T`.
    pub fn json<T>(&self) -> Result<T, BindError>
    where
        T: serde::de::DeserializeOwned,
    {
        let is_json = self
            .request
            .content_type()
            .is_some_and(|ct| ct.starts_with("application/json"));
        if !is_json {
            return Err(BindError::ContentType);
        }
        Ok(serde_json::from_slice(self.request.body())?)
    }

    /// Returns the value of the request cookie `name`, searching every `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get_all("cookie")
            .find_map(|header| cookie::find(header, name))
    }
}
