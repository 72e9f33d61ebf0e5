//! Cross-Origin Resource Sharing.
//!
//! [`Cors`] computes the `Access-Control-*` headers the dispatcher attaches to every
//! response, and identifies preflight requests, which the dispatcher answers with
//! `204 No Content` before any routing happens.

use serde::Deserialize;

use crate::http::{Headers, Method};

/// CORS policy — allow-lists for origins, methods and headers plus the credentials flag.
///
/// Constructed via [`Cors::new`] (or deserialized from configuration) and further
/// configured through the builder methods [`allow_origin`](Self::allow_origin),
/// [`allow_method`](Self::allow_method), [`allow_header`](Self::allow_header) and
/// [`allow_credentials`](Self::allow_credentials).
///
/// # Behavior
///
/// Every request gets:
///
/// - `Access-Control-Allow-Origin` — the request `Origin` echoed back if it exactly
///   matches an allow-listed origin, otherwise the empty string. A rejected origin is
///   not an error; the request continues normally.
/// - `Access-Control-Allow-Methods` and `Access-Control-Allow-Headers` — the
///   allow-lists joined with `", "`.
/// - `Access-Control-Allow-Credentials: true` — only when credentials are allowed.
///
/// # Examples
///
/// ```rust
/// use zapi::security::Cors;
///
/// let cors = Cors::new()
///     .allow_origin("https://example.com")
///     .allow_method("PATCH")
///     .allow_header("X-Custom-Header");
///
/// let headers = cors.headers_for(Some("https://example.com"));
/// assert_eq!(headers.get("access-control-allow-origin"), Some("https://example.com"));
///
/// let headers = cors.headers_for(Some("https://evil.example"));
/// assert_eq!(headers.get("access-control-allow-origin"), Some(""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for Cors {
    fn default() -> Self {
        Self::new()
    }
}

impl Cors {
    /// Creates a policy with the default settings:
    ///
    /// | Setting           | Default value                   |
    /// |-------------------|---------------------------------|
    /// | Allowed origins   | *(none)*                        |
    /// | Allowed methods   | `GET`, `POST`, `PUT`, `DELETE`  |
    /// | Allowed headers   | `Content-Type`, `Authorization` |
    /// | Allow credentials | `true`                          |
    pub fn new() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: true,
        }
    }

    /// Adds an allowed origin. Origins are compared exactly; there is no wildcard.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Adds an allowed HTTP method, sent verbatim in `Access-Control-Allow-Methods`.
    #[must_use]
    pub fn allow_method(mut self, method: impl Into<String>) -> Self {
        self.allowed_methods.push(method.into());
        self
    }

    /// Adds an allowed request header, sent verbatim in `Access-Control-Allow-Headers`.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        self.allowed_headers.push(header.into());
        self
    }

    /// Sets whether `Access-Control-Allow-Credentials: true` is sent.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Returns `true` for a preflight request (`OPTIONS`).
    pub fn is_preflight(method: &Method) -> bool {
        method == &Method::Options
    }

    /// Computes the CORS response headers for a request with the given `Origin`.
    ///
    /// A missing `Origin` is treated as the empty string.
    pub fn headers_for(&self, origin: Option<&str>) -> Headers {
        let origin = origin.unwrap_or("");
        let allow_origin = if self.allowed_origins.iter().any(|o| o == origin) {
            origin
        } else {
            ""
        };

        let mut headers = Headers::with_capacity(4);
        headers.insert("Access-Control-Allow-Origin", allow_origin);
        headers.insert(
            "Access-Control-Allow-Methods",
            self.allowed_methods.join(", "),
        );
        headers.insert(
            "Access-Control-Allow-Headers",
            self.allowed_headers.join(", "),
        );
        if self.allow_credentials {
            headers.insert("Access-Control-Allow-Credentials", "true");
        }
        headers
    }
}
