//! # zapi
//!
//! A minimal async HTTP/1.1 router and dispatcher written in Rust.
//!
//! Routes use bracket-style patterns (`/users/[id]`, `/@[handle]`, `/files/*`);
//! routes with literal text always take precedence over purely parameterized
//! ones. Every request also gets CORS headers, and an optional public directory
//! is served ahead of the dynamic routes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zapi::{App, Response, StatusCode, context::Context};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = App::new();
//!     app.get("/hello/[name]", |ctx: Context| async move {
//!         let name = ctx.param("name").unwrap_or("world").to_owned();
//!         Response::new(StatusCode::Ok).body(format!("Hello, {name}!"))
//!     });
//!     app.run("127.0.0.1:8080").await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod context;
pub mod http;
pub mod router;
pub mod security;
pub mod server;
pub mod static_files;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use app::App;
pub use config::AppConfig;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
