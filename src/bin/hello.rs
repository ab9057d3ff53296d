//! Minimal service: two routes behind a composed pre-chain.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::Method;
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waypost::http::server;
use waypost::{compose, ContextExt, Handler, Service};

#[derive(Parser)]
#[command(about = "Minimal waypost service")]
struct Args {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,
}

/// Record the arrival instant for the post-chain timing log.
fn timestamper() -> Handler {
    Handler::with_context(|ctx, _w, _r| {
        ctx.insert("started-at", Instant::now());
    })
}

fn access_logger() -> Handler {
    Handler::with_context(|_ctx, _w, r| {
        tracing::info!(method = %r.method(), path = %r.path(), "request received");
    })
}

fn timing_logger() -> Handler {
    Handler::with_context(|ctx, w, _r| {
        if let Some(started) = ctx.get_as::<Instant>("started-at") {
            tracing::info!(
                status = %w.status(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "request finished"
            );
        }
    })
}

fn hello() -> Handler {
    Handler::plain(|w, _r| w.send("Hello, world!\n"))
}

fn time() -> Handler {
    Handler::plain(|w, _r| {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        w.send(json!({ "unix_ms": unix_ms }).to_string());
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,waypost=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut service = Service::new("/");
    service.add_pre(compose([timestamper(), access_logger()]));
    service.route(Method::GET, "/", "Greets the caller", hello());
    service.route(Method::GET, "/time", "Reports the server time", time());
    service.add_post(timing_logger());

    let listener = TcpListener::bind(&args.listen).await?;
    server::serve_service(listener, service).await?;
    Ok(())
}
