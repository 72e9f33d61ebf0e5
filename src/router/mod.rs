//! Request routing — map URL patterns and HTTP methods to handler functions.
//!
//! This module provides [`Router`], the route table consulted by the dispatcher.
//! Patterns are compiled once at registration (see [`pattern`]):
//!
//! | Pattern              | Example match              | Captured params              |
//! |----------------------|----------------------------|------------------------------|
//! | `/users`             | `/users`                   | *(none)*                     |
//! | `/users/[id]`        | `/users/42`                | `id → "42"`                  |
//! | `/@[handle]`         | `/@ada`                    | `handle → "ada"`             |
//! | `/files/*`           | `/files/docs/readme.txt`   | `* → "docs/readme.txt"`      |
//!
//! ## Ordering
//!
//! Routes fall into two tiers. A route is *specific* if any segment is a literal
//! or an affixed parameter; otherwise (only bare `[x]` parameters and `*`) it is
//! *general*. Specific routes are always consulted before general ones, so
//! `/users/admin` beats `/users/[id]` whichever was registered first.
//!
//! Within the specific tier the most recently registered route is consulted
//! first; within the general tier the earliest registered route is consulted
//! first. Registering the same method and pattern twice keeps both entries.
//!
//! ## Concurrency
//!
//! Registration needs `&mut Router` and must finish before serving starts; after
//! that the table is only read, so it can be shared across tasks without locks.

use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::{Context, Params};
use crate::{Method, Request, Response, StatusCode};

pub mod pattern;

pub use pattern::{CompiledPattern, PatternError, WILDCARD_PARAM};

/// Body of the response sent when no route matches.
pub const NOT_FOUND_BODY: &str = "404 Not Found !";

/// Type-erased, heap-allocated async handler that processes a [`Context`] and returns a
/// [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and shared across
/// threads without copying the underlying closure. In practice you never construct this
/// type directly — use [`Router::get`], [`Router::post`], and the other method-specific
/// helpers instead.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket impl
/// below. Router methods accept `impl IntoHandler` so the two-type-parameter where-bound
/// does not need to be repeated at every call site.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

// A single registered route binding a method + pattern to a handler.
struct Route {
    method: Method,
    pattern: CompiledPattern,
    handler: Handler,
}

/// A successful [`Router::lookup`].
pub struct RouteMatch<'r> {
    pattern: &'r CompiledPattern,
    handler: &'r Handler,
    params: Params,
}

impl<'r> RouteMatch<'r> {
    /// The pattern string of the route that matched.
    pub fn pattern(&self) -> &'r str {
        self.pattern.as_str()
    }

    /// Parameters captured from the request path.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The handler registered for the matched route.
    pub fn handler(&self) -> &'r Handler {
        self.handler
    }

    /// Split into the handler and the captured parameters.
    pub fn into_parts(self) -> (&'r Handler, Params) {
        (self.handler, self.params)
    }
}

/// HTTP route table that dispatches requests to registered handler functions.
///
/// See the [module docs](self) for pattern syntax and ordering rules. When no
/// route matches, [`route`](Self::route) answers `404 Not Found`.
///
/// # Examples
///
/// ```rust,no_run
/// use zapi::{Router, Response, StatusCode, context::Context};
///
/// let mut router = Router::new();
///
/// router.get("/ping", |_ctx: Context| async { Response::new(StatusCode::Ok) });
///
/// router.get("/users/[id]", |ctx: Context| async move {
///     let id = ctx.param("id").unwrap_or("unknown").to_owned();
///     Response::new(StatusCode::Ok).body(id)
/// });
/// ```
#[derive(Default)]
pub struct Router {
    // Kept in registration order and consulted newest first.
    specific: Vec<Route>,
    // Kept in registration order and consulted oldest first.
    general: Vec<Route>,
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zapi::Router;
    ///
    /// let router = Router::new();
    /// assert!(router.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `GET` requests matching `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern cannot be compiled; see [`Router::try_add`].
    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add(Method::Get, pattern, handler);
    }

    /// Register a handler for `POST` requests matching `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern cannot be compiled; see [`Router::try_add`].
    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add(Method::Post, pattern, handler);
    }

    /// Register a handler for `PUT` requests matching `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern cannot be compiled; see [`Router::try_add`].
    pub fn put(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add(Method::Put, pattern, handler);
    }

    /// Register a handler for `DELETE` requests matching `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern cannot be compiled; see [`Router::try_add`].
    pub fn delete(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add(Method::Delete, pattern, handler);
    }

    /// Register a handler for `method` requests matching `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern cannot be compiled; see [`Router::try_add`].
    pub fn add(&mut self, method: Method, pattern: &str, handler: impl IntoHandler) {
        if let Err(e) = self.try_add(method, pattern, handler) {
            panic!("{e}");
        }
    }

    /// Register a handler, returning an error instead of panicking if the
    /// pattern cannot be compiled.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the generated matcher exceeds the regex
    /// engine's size limits. Malformed bracket syntax is never an error.
    pub fn try_add(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<(), PatternError> {
        let pattern = CompiledPattern::compile(pattern)?;
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));

        debug!(
            method = %method,
            pattern = pattern.as_str(),
            specific = pattern.is_specific(),
            params = ?pattern.param_names(),
            "route registered"
        );

        let route = Route {
            method,
            pattern,
            handler,
        };
        if route.pattern.is_specific() {
            self.specific.push(route);
        } else {
            self.general.push(route);
        }
        Ok(())
    }

    /// Return the number of routes registered in this router.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use zapi::{Router, Response, StatusCode, context::Context};
    ///
    /// let mut router = Router::new();
    /// assert_eq!(router.len(), 0);
    /// router.get("/a", |_ctx: Context| async { Response::new(StatusCode::Ok) });
    /// assert_eq!(router.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.specific.len() + self.general.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.general.is_empty()
    }

    // Routes in lookup order.
    fn routes(&self) -> impl Iterator<Item = &Route> {
        self.specific.iter().rev().chain(self.general.iter())
    }

    /// Pattern strings in the order lookups consult them.
    pub fn patterns(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes().map(|r| (&r.method, r.pattern.as_str()))
    }

    /// Find the first route whose pattern matches `path` and whose method equals `method`.
    ///
    /// A route whose pattern matches but whose method differs does not stop the
    /// scan; lookup moves on and returns `None` only after every route was tried.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        for route in self.routes() {
            let Some(params) = route.pattern.captures(path) else {
                continue;
            };
            if &route.method != method {
                trace!(
                    pattern = route.pattern.as_str(),
                    route_method = %route.method,
                    method = %method,
                    "path matched, method did not"
                );
                continue;
            }
            return Some(RouteMatch {
                pattern: &route.pattern,
                handler: &route.handler,
                params,
            });
        }
        None
    }

    /// Dispatch `request` to the first matching route and return its response.
    ///
    /// If no route matches, a `404 Not Found` response with body
    /// [`NOT_FOUND_BODY`] is returned.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use zapi::{Router, Response, StatusCode, context::Context};
    ///
    /// # async fn example(request: zapi::Request) {
    /// let mut router = Router::new();
    /// router.get("/ping", |_ctx: Context| async { Response::new(StatusCode::Ok) });
    ///
    /// let response = router.route(request).await;
    /// assert_eq!(response.status(), StatusCode::Ok);
    /// # }
    /// ```
    pub async fn route(&self, request: Request) -> Response {
        let Some(matched) = self.lookup(request.method(), request.path()) else {
            debug!(method = %request.method(), path = request.path(), "no route matched");
            return Response::new(StatusCode::NotFound).body(NOT_FOUND_BODY);
        };

        debug!(
            method = %request.method(),
            path = request.path(),
            pattern = matched.pattern(),
            "route matched"
        );
        let (handler, params) = matched.into_parts();
        handler(Context::with_params(request, params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Request;

    fn make_request(method: &str, path: &str) -> Request {
        let raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    fn body_of(res: &Response) -> &str {
        std::str::from_utf8(res.content()).unwrap()
    }

    // Handler answering with a fixed tag so tests can tell routes apart.
    fn tagged(tag: &'static str) -> impl IntoHandler {
        move |_ctx: Context| async move { Response::new(StatusCode::Ok).body(tag) }
    }

    // Handler echoing one parameter.
    fn echo(name: &'static str) -> impl IntoHandler {
        move |ctx: Context| async move {
            let value = ctx.param(name).unwrap_or("<none>").to_owned();
            Response::new(StatusCode::Ok).body(value)
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    #[test]
    fn router_starts_empty() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn router_default_is_empty() {
        let router = Router::default();
        assert!(router.is_empty());
    }

    #[test]
    fn router_len_counts_both_tiers() {
        let mut router = Router::new();
        router.get("/a", tagged("a"));
        router.post("/[b]", tagged("b"));
        router.put("/*", tagged("c"));
        assert_eq!(router.len(), 3);
        assert!(!router.is_empty());
    }

    #[test]
    fn specific_routes_go_to_the_front() {
        let mut router = Router::new();
        router.get("/[a]", tagged("1"));
        router.get("/x", tagged("2"));
        router.get("/*", tagged("3"));
        router.get("/y", tagged("4"));
        let order: Vec<_> = router.patterns().map(|(_, p)| p).collect();
        assert_eq!(order, vec!["/y", "/x", "/[a]", "/*"]);
    }

    #[test]
    fn duplicate_registrations_are_kept() {
        let mut router = Router::new();
        router.get("/same", tagged("first"));
        router.get("/same", tagged("second"));
        assert_eq!(router.len(), 2);
    }

    // ── lookup ────────────────────────────────────────────────────────────────

    #[test]
    fn lookup_none_on_empty() {
        assert!(Router::new().lookup(&Method::Get, "/").is_none());
    }

    #[test]
    fn lookup_reports_pattern_and_params() {
        let mut router = Router::new();
        router.get("/users/[id]", tagged("user"));
        let m = router.lookup(&Method::Get, "/users/42").unwrap();
        assert_eq!(m.pattern(), "/users/[id]");
        assert_eq!(m.params().get("id"), Some("42"));
    }

    #[test]
    fn lookup_skips_method_mismatch_and_keeps_scanning() {
        let mut router = Router::new();
        router.get("/items/[id]", tagged("get"));
        router.post("/items/[id]", tagged("post"));
        let m = router.lookup(&Method::Post, "/items/5").unwrap();
        assert_eq!(m.pattern(), "/items/[id]");
        assert!(router.lookup(&Method::Delete, "/items/5").is_none());
    }

    #[test]
    fn lookup_method_is_case_sensitive() {
        let mut router = Router::new();
        router.get("/a", tagged("a"));
        assert!(router.lookup(&Method::from("get"), "/a").is_none());
    }

    // ── route ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn router_empty_returns_404() {
        let router = Router::new();
        let res = router.route(make_request("GET", "/")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
        assert_eq!(body_of(&res), NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn router_get_does_not_match_post() {
        let mut router = Router::new();
        router.get("/items/[id]", tagged("get"));
        let res = router.route(make_request("POST", "/items/5")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn literal_beats_param_regardless_of_order() {
        let mut router = Router::new();
        router.get("/users/[id]", tagged("param"));
        router.get("/users/admin", tagged("literal"));
        let res = router.route(make_request("GET", "/users/admin")).await;
        assert_eq!(body_of(&res), "literal");

        let mut router = Router::new();
        router.get("/users/admin", tagged("literal"));
        router.get("/users/[id]", tagged("param"));
        let res = router.route(make_request("GET", "/users/admin")).await;
        assert_eq!(body_of(&res), "literal");
    }

    #[tokio::test]
    async fn param_route_receives_value() {
        let mut router = Router::new();
        router.get("/users/[id]", echo("id"));
        router.get("/users/admin", tagged("literal"));
        let res = router.route(make_request("GET", "/users/42")).await;
        assert_eq!(body_of(&res), "42");
    }

    #[tokio::test]
    async fn wildcard_receives_remainder() {
        let mut router = Router::new();
        router.get("/files/*", echo(WILDCARD_PARAM));
        let res = router.route(make_request("GET", "/files/a/b/c")).await;
        assert_eq!(body_of(&res), "a/b/c");
    }

    #[tokio::test]
    async fn trailing_slash_tolerated() {
        let mut router = Router::new();
        router.get("/items/[id]", echo("id"));
        for path in ["/items/5", "/items/5/"] {
            let res = router.route(make_request("GET", path)).await;
            assert_eq!(body_of(&res), "5", "path {path}");
        }
    }

    #[tokio::test]
    async fn newest_specific_route_wins() {
        let mut router = Router::new();
        router.get("/path", tagged("first"));
        router.get("/path", tagged("second"));
        let res = router.route(make_request("GET", "/path")).await;
        assert_eq!(body_of(&res), "second");
    }

    #[tokio::test]
    async fn oldest_general_route_wins() {
        let mut router = Router::new();
        router.get("/[a]", tagged("first"));
        router.get("/[b]", tagged("second"));
        let res = router.route(make_request("GET", "/x")).await;
        assert_eq!(body_of(&res), "first");
    }

    #[tokio::test]
    async fn specific_wildcard_route_beats_bare_param() {
        let mut router = Router::new();
        router.get("/[page]", tagged("page"));
        router.get("/docs/*", tagged("docs"));
        let res = router.route(make_request("GET", "/docs/intro")).await;
        assert_eq!(body_of(&res), "docs");
        let res = router.route(make_request("GET", "/about")).await;
        assert_eq!(body_of(&res), "page");
    }

    #[tokio::test]
    async fn router_method_variants_registered() {
        let mut router = Router::new();
        router.get("/r", tagged("get"));
        router.post("/r", tagged("post"));
        router.put("/r", tagged("put"));
        router.delete("/r", tagged("delete"));
        assert_eq!(router.len(), 4);
        for method in ["GET", "POST", "PUT", "DELETE"] {
            let res = router.route(make_request(method, "/r")).await;
            assert_eq!(body_of(&res), method.to_lowercase());
        }
        let res = router.route(make_request("PATCH", "/r")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }
}
