//! Token-authenticated JSON API exercising the full request lifecycle:
//! a pre-chain that tags and authenticates requests (halting on bad
//! tokens), handlers that publish values into the context, and a
//! post-chain that envelopes and serializes the response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use hyper::header::{HeaderValue, AUTHORIZATION};
use hyper::{Method, StatusCode};
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use waypost::http::middleware::json_response_writer;
use waypost::http::server;
use waypost::{ContextExt, Flow, Handler, Request, RequestHandler, ResponseWriter, Service};

const REQUEST_ID_KEY: &str = "request-id";
const STATUS_KEY: &str = "status-code";
const RESPONSE_KEY: &str = "response";
const USER_KEY: &str = "user";

#[derive(Parser)]
#[command(about = "Token-authenticated JSON API demo")]
struct Args {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,
}

/// Tag every request with a fresh id, visible to later handlers and to
/// the caller through the `x-request-id` header.
fn request_id() -> Handler {
    Handler::with_context(|ctx, w, _r| {
        let id = Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&id) {
            w.headers_mut().insert("x-request-id", value);
        }
        ctx.insert(REQUEST_ID_KEY, id);
    })
}

/// Bearer-token check. A bad token halts the pre-chain, skipping
/// dispatch entirely; the post-chain still serializes the 401 body.
fn authenticate(tokens: Arc<HashMap<String, String>>) -> Handler {
    Handler::with_context_flow(move |ctx, _w, r| {
        let token = r
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if let Some(user) = token.and_then(|t| tokens.get(t)) {
            tracing::debug!(user = %user, "token accepted");
            ctx.insert(USER_KEY, user.clone());
            return Flow::Continue;
        }
        ctx.insert(STATUS_KEY, StatusCode::UNAUTHORIZED);
        ctx.insert(
            RESPONSE_KEY,
            json!({ "error": "missing or invalid bearer token" }),
        );
        Flow::Halt
    })
}

/// GET /accounts/:id
fn account() -> Handler {
    Handler::with_context(|ctx, _w, r| {
        let id = r.form().get("id").unwrap_or_default().to_owned();
        let owner = ctx.get_as::<String>(USER_KEY).cloned().unwrap_or_default();
        ctx.insert(RESPONSE_KEY, json!({ "account": id, "owner": owner }));
    })
}

/// GET /whoami
fn whoami() -> Handler {
    Handler::with_context(|ctx, _w, _r| {
        let user = ctx.get_as::<String>(USER_KEY).cloned().unwrap_or_default();
        ctx.insert(RESPONSE_KEY, json!({ "user": user }));
    })
}

/// Stateful handler writing its response directly; the post-chain
/// leaves it alone since it publishes no context values.
struct Uptime {
    started: Instant,
}

impl RequestHandler for Uptime {
    fn handle(&self, w: &mut ResponseWriter, _r: &mut Request) {
        w.send(format!("up {}s\n", self.started.elapsed().as_secs()));
    }
}

fn not_found() -> Handler {
    Handler::with_context(|ctx, _w, r| {
        ctx.insert(STATUS_KEY, StatusCode::NOT_FOUND);
        ctx.insert(
            RESPONSE_KEY,
            json!({ "error": format!("no such endpoint: {}", r.path()) }),
        );
    })
}

/// Wrap whatever the handler published so every JSON body carries the
/// request id alongside its data.
fn envelope() -> Handler {
    Handler::with_context(|ctx, _w, _r| {
        let body = match ctx.get_as::<serde_json::Value>(RESPONSE_KEY) {
            Some(value) => value.clone(),
            None => return,
        };
        let id = ctx
            .get_as::<String>(REQUEST_ID_KEY)
            .cloned()
            .unwrap_or_default();
        ctx.insert(RESPONSE_KEY, json!({ "request_id": id, "data": body }));
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

    let mut tokens = HashMap::new();
    tokens.insert("local-dev-token".to_owned(), "dev".to_owned());
    tokens.insert("local-ops-token".to_owned(), "ops".to_owned());

    let mut service = Service::new("/api");
    service.add_pre(request_id());
    service.add_pre(authenticate(Arc::new(tokens)));
    service.route(Method::GET, "/accounts/:id", "Shows one account", account());
    service.route(Method::GET, "/whoami", "Names the caller", whoami());
    service.route(
        Method::GET,
        "/health",
        "Reports process uptime",
        Handler::object(Uptime {
            started: Instant::now(),
        }),
    );
    service.set_not_found(Some(not_found()));
    service.add_post(envelope());
    service.add_post(json_response_writer(STATUS_KEY, RESPONSE_KEY));

    let listener = TcpListener::bind(&args.listen).await?;
    server::serve_service(listener, service).await?;
    Ok(())
}
