//! The application: route registration surface and request dispatcher.
//!
//! [`App`] owns the route table, the CORS policy and an optional static file
//! mapping. Every request flows through [`App::dispatch`]:
//!
//! 1. CORS headers are computed from the request `Origin`. An `OPTIONS` request
//!    is a preflight and is answered `204 No Content` right away.
//! 2. If a [`Public`] mapping is configured and a file exists for the path, the
//!    file is served, even if a dynamic route would also match.
//! 3. Otherwise the [`Router`] picks a handler, or answers `404 Not Found`.
//!
//! The CORS headers end up on every response. A handler that sets one of them
//! itself overrides the computed value.
//!
//! Routes are registered through `&mut App` before serving. [`App::run`] and
//! [`App::serve`] consume the app, so the route table cannot change once
//! requests are being handled.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::info;

use crate::config::AppConfig;
use crate::http::Headers;
use crate::router::IntoHandler;
use crate::security::Cors;
use crate::server::{Server, ServerError};
use crate::static_files::Public;
use crate::{Request, Response, Router, StatusCode};

/// A router plus the cross-cutting concerns applied before it.
///
/// # Examples
///
/// ```rust,no_run
/// use zapi::{App, Response, StatusCode, context::Context, security::Cors};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut app = App::new();
///     app.set_cors(Cors::new().allow_origin("http://localhost:3000"));
///     app.public("/static", "./public");
///
///     app.get("/users/[id]", |ctx: Context| async move {
///         let id = ctx.param("id").unwrap_or_default().to_owned();
///         Response::new(StatusCode::Ok).body(id)
///     });
///
///     app.run("127.0.0.1:8080").await?;
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct App {
    router: Router,
    cors: Cors,
    public: Option<Public>,
}

impl App {
    /// An app with no routes, the default CORS policy and no static mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// An app with CORS and static settings taken from `config`.
    ///
    /// The configured address is not stored; pass `config.address` to
    /// [`run`](Self::run).
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            router: Router::new(),
            cors: config.cors.clone(),
            public: config.public.clone(),
        }
    }

    /// Replace the CORS policy.
    pub fn set_cors(&mut self, cors: Cors) {
        self.cors = cors;
    }

    /// The CORS policy applied to every response.
    pub fn cors(&self) -> &Cors {
        &self.cors
    }

    /// Serve files under `dir` for request paths starting with `prefix/`.
    pub fn public(&mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) {
        self.public = Some(Public::new(prefix, dir));
    }

    /// The route table, for inspection.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Register a `GET` route. See [`Router::get`].
    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.router.get(pattern, handler);
    }

    /// Register a `POST` route. See [`Router::post`].
    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.router.post(pattern, handler);
    }

    /// Register a `PUT` route. See [`Router::put`].
    pub fn put(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.router.put(pattern, handler);
    }

    /// Register a `DELETE` route. See [`Router::delete`].
    pub fn delete(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.router.delete(pattern, handler);
    }

    /// Handle one request end to end.
    pub async fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.path().to_owned();
        let cors_headers = self.cors.headers_for(request.headers().get("origin"));

        let response = if Cors::is_preflight(&method) {
            Response::new(StatusCode::NoContent)
        } else if let Some(response) = self.serve_static(&path).await {
            response
        } else {
            self.router.route(request).await
        };
        let response = apply_defaults(response, &cors_headers);

        info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed = ?start.elapsed(),
            "request handled"
        );
        response
    }

    async fn serve_static(&self, path: &str) -> Option<Response> {
        self.public.as_ref()?.serve(path).await
    }

    /// Serve on an already bound [`Server`] until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn serve(self, server: Server) -> Result<(), ServerError> {
        let app = Arc::new(self);
        info!(routes = app.router.len(), "serving");
        server
            .run(move |request: Request| {
                let app = Arc::clone(&app);
                async move { app.dispatch(request).await }
            })
            .await
    }

    /// Bind to `addr` and serve. There is no graceful shutdown; this runs until
    /// the process exits or the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound and
    /// [`ServerError::Io`] if the listener fails afterwards.
    pub async fn run(self, addr: impl AsRef<str>) -> Result<(), ServerError> {
        let server = Server::bind(addr).await?;
        self.serve(server).await
    }
}

// Adds every header from `defaults` whose name the response does not already carry.
fn apply_defaults(mut response: Response, defaults: &Headers) -> Response {
    for (name, value) in defaults.iter() {
        if !response.headers().contains(name) {
            response.add_header(name, value);
        }
    }
    response
}
