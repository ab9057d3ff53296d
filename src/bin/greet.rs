//! Typed-parameter demo: path captures and query values decoded
//! through the same declarations, with usage metadata on bad input.

use clap::Parser;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, StatusCode};
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waypost::http::server;
use waypost::{ContextExt, Handler, Params, ResponseWriter, Service, ROUTE_USAGE_KEY};

#[derive(Parser)]
#[command(about = "Parameter decoding demo")]
struct Args {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,
}

fn reply_json(w: &mut ResponseWriter, value: serde_json::Value) {
    w.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.send(value.to_string());
}

/// Invalid input gets a 400 carrying the route's parameter table, so
/// callers can see what the endpoint accepts.
fn reject(w: &mut ResponseWriter, params: &Params, err: waypost::ParamsError) {
    w.set_status(StatusCode::BAD_REQUEST);
    reply_json(
        w,
        json!({ "error": err.to_string(), "params": params.usage() }),
    );
}

/// GET /greet/:name. The capture lands in the form and decodes like
/// any query value.
fn greet() -> Handler {
    Handler::plain(|w, r| {
        let mut params = Params::new();
        let name = params.string("name", "stranger", "who to greet");
        let greeting = params.string("greeting", "Hello", "salutation to use");
        if let Err(err) = params.parse(r.form()) {
            return reject(w, &params, err);
        }
        w.send(format!("{}, {}!\n", greeting.borrow(), name.borrow()));
    })
}

/// GET /square?number=7
fn square() -> Handler {
    Handler::plain(|w, r| {
        let mut params = Params::new();
        let number = params.int("number", 0, "value to square");
        if let Err(err) = params.parse(r.form()) {
            return reject(w, &params, err);
        }
        let n = number.get();
        reply_json(w, json!({ "number": n, "square": n.saturating_mul(n) }));
    })
}

/// GET /exponentiate/:base?power=3, capture and query mixed freely.
fn exponentiate() -> Handler {
    Handler::plain(|w, r| {
        let mut params = Params::new();
        let base = params.float("base", 0.0, "base of the exponentiation");
        let power = params.float("power", 2.0, "exponent to raise the base to");
        if let Err(err) = params.parse(r.form()) {
            return reject(w, &params, err);
        }
        reply_json(
            w,
            json!({
                "base": base.get(),
                "power": power.get(),
                "result": base.get().powf(power.get()),
            }),
        );
    })
}

/// GET /describe: this route's own usage line (read back from the
/// reserved context key) plus every route's parameter table.
fn describe() -> Handler {
    Handler::with_context(|ctx, w, _r| {
        let endpoint = ctx
            .get_as::<String>(ROUTE_USAGE_KEY)
            .cloned()
            .unwrap_or_default();

        let mut greet = Params::new();
        greet.string("name", "stranger", "who to greet");
        greet.string("greeting", "Hello", "salutation to use");

        let mut square = Params::new();
        square.int("number", 0, "value to square");

        let mut pow = Params::new();
        pow.float("base", 0.0, "base of the exponentiation");
        pow.float("power", 2.0, "exponent to raise the base to");

        reply_json(
            w,
            json!({
                "endpoint": endpoint,
                "routes": {
                    "/greet/:name": greet.usage(),
                    "/square": square.usage(),
                    "/exponentiate/:base": pow.usage(),
                },
            }),
        );
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
    service.route(Method::GET, "/greet/:name", "Greets whoever is named", greet());
    service.route(Method::GET, "/square", "Squares a number", square());
    service.route(
        Method::GET,
        "/exponentiate/:base",
        "Raises a base to a power",
        exponentiate(),
    );
    service.route(
        Method::GET,
        "/describe",
        "Describes every route and its parameters",
        describe(),
    );

    let listener = TcpListener::bind(&args.listen).await?;
    server::serve_service(listener, service).await?;
    Ok(())
}
