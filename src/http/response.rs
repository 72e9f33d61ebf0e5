//! HTTP/1.1 response builder.
//!
//! Provides a fluent builder API for constructing HTTP responses and
//! serializing them to a byte buffer for transmission over TCP. This is the
//! response side of the handler contract: headers, status, body bytes, JSON,
//! files, redirects and cookies.

use std::path::Path;

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use tracing::warn;

use super::cookie::{Cookie, CookieOptions};
use super::{Headers, StatusCode, mime};

/// An HTTP/1.1 response, ready to be serialized and sent.
///
/// # Examples
///
/// ```
/// use zapi::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Length: 15\r\n"));
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
    keep_alive: bool,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
            keep_alive: true,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a header in-place. Used by the dispatcher to decorate a handler's
    /// response without consuming it.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    /// Sets `name` to `value`, replacing any value already present.
    ///
    /// This is how a handler overrides a header the dispatcher has pre-computed,
    /// such as `Access-Control-Allow-Origin`.
    #[must_use]
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Replaces the status code.
    #[must_use]
    pub fn set_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the response body from a string.
    ///
    /// The `Content-Length` header is written automatically by [`into_bytes`](Self::into_bytes).
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Controls whether the `Connection: keep-alive` or `Connection: close` header is written.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the body bytes written so far.
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// Serializes `value` as a JSON `200 OK` response.
    ///
    /// If serialization fails the response is `500 Internal Server Error` with the
    /// serializer's error text as a plain-text body.
    ///
    /// # Examples
    ///
    /// ```
    /// use zapi::http::{Response, StatusCode};
    ///
    /// let response = Response::json(&serde_json::json!({ "id": 7 }));
    /// assert_eq!(response.status(), StatusCode::Ok);
    /// assert_eq!(response.content(), br#"{"id":7}"#);
    /// ```
    pub fn json<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(StatusCode::Ok)
                .header("Content-Type", "application/json")
                .body_bytes(body),
            Err(e) => Self::new(StatusCode::InternalServerError).body(e.to_string()),
        }
    }

    /// A `302 Found` response pointing at `url`.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::new(StatusCode::Found).header("Location", url)
    }

    /// Reads the file at `path` into a `200 OK` response.
    ///
    /// `Content-Type` comes from the file extension (see [`mime`]). If the file
    /// cannot be read the response is `404 Not Found` with body `File not found`.
    pub async fn send_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(data) => Self::new(StatusCode::Ok)
                .header("Content-Type", mime::content_type(path))
                .body_bytes(data),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "send_file failed");
                Self::new(StatusCode::NotFound).body("File not found")
            }
        }
    }

    /// Appends a `Set-Cookie` header.
    ///
    /// Without options the cookie gets `Path=/` and `HttpOnly`; see
    /// [`CookieOptions`] for how options override those defaults.
    #[must_use]
    pub fn set_cookie(
        mut self,
        name: &str,
        value: &str,
        opts: Option<&CookieOptions>,
    ) -> Self {
        let cookie = Cookie::new(name, value, opts);
        self.headers.insert("Set-Cookie", cookie.to_header_value());
        self
    }

    /// Appends a `Set-Cookie` header that expires `name` on the client.
    #[must_use]
    pub fn delete_cookie(mut self, name: &str) -> Self {
        self.headers
            .insert("Set-Cookie", Cookie::removal(name).to_header_value());
        self
    }

    /// Serializes the response into a `BytesMut` buffer using HTTP/1.1 wire format.
    ///
    /// Automatically adds:
    /// - `Content-Type: text/plain; charset=utf-8` if the body is non-empty and no
    ///   `Content-Type` header was set.
    /// - `Content-Length: <n>`, except on `204 No Content`, which carries neither
    ///   a length nor a body.
    /// - `Connection: keep-alive` or `Connection: close`.
    pub fn into_bytes(mut self) -> BytesMut {
        if self.status == StatusCode::NoContent {
            self.body.clear();
        }
        let content_length = self.body.len();

        if !self.body.is_empty() && !self.headers.contains("content-type") {
            self.headers
                .insert("Content-Type", "text/plain; charset=utf-8");
        }

        let connection = if self.keep_alive {
            "keep-alive"
        } else {
            "close"
        };
        self.headers.insert("Connection", connection);

        let estimated_size = 128 + self.headers.len() * 64 + content_length;
        let mut buf = BytesMut::with_capacity(estimated_size);

        // Status line
        buf.put(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason()
            )
            .as_bytes(),
        );

        // Headers
        for (name, value) in self.headers.iter() {
            buf.put(format!("{name}: {value}\r\n").as_bytes());
        }

        // Content-Length is the last header before the blank line
        if self.status != StatusCode::NoContent {
            buf.put(format!("Content-Length: {content_length}\r\n").as_bytes());
        }

        // Header/body separator
        buf.put(&b"\r\n"[..]);

        // Body
        if !self.body.is_empty() {
            buf.put(self.body.as_slice());
        }

        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}
