//! A small JSON API with CORS and a public directory.
//!
//! Run with `RUST_LOG=zapi=debug cargo run --example hello_world`, optionally
//! passing a TOML config path as the first argument.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use zapi::context::Context;
use zapi::http::CookieOptions;
use zapi::router::WILDCARD_PARAM;
use zapi::{App, AppConfig, Response, StatusCode};

#[derive(Serialize)]
struct User {
    id: String,
    admin: bool,
}

#[derive(Deserialize)]
struct Login {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let mut app = App::from_config(&config);
    if config.public.is_none() {
        app.public("/static", "./public");
    }

    app.get("/", |_ctx: Context| async { Response::redirect("/users/admin") });

    app.get("/users/[id]", |ctx: Context| async move {
        let id = ctx.param("id").unwrap_or_default().to_owned();
        Response::json(&User { id, admin: false })
    });

    // Wins over /users/[id] for this exact path.
    app.get("/users/admin", |_ctx: Context| async {
        Response::json(&User {
            id: "admin".into(),
            admin: true,
        })
    });

    app.get("/@[handle]", |ctx: Context| async move {
        let handle = ctx.param("handle").unwrap_or_default().to_owned();
        Response::new(StatusCode::Ok).body(format!("profile of {handle}"))
    });

    app.get("/readme", |_ctx: Context| async { Response::send_file("./README.md").await });

    app.get("/echo/*", |ctx: Context| async move {
        let rest = ctx.param(WILDCARD_PARAM).unwrap_or_default().to_owned();
        Response::new(StatusCode::Ok).body(rest)
    });

    app.post("/login", |ctx: Context| async move {
        match ctx.json::<Login>() {
            Ok(login) => Response::new(StatusCode::NoContent).set_cookie(
                "user",
                &login.name,
                Some(&CookieOptions::new().max_age(3600).http_only(true)),
            ),
            Err(e) => e.into_response(),
        }
    });

    app.delete("/login", |ctx: Context| async move {
        let who = ctx.cookie("user").unwrap_or("nobody").to_owned();
        Response::new(StatusCode::Ok)
            .delete_cookie("user")
            .body(format!("bye {who}"))
    });

    app.run(&config.address).await?;
    Ok(())
}
