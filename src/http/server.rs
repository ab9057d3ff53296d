//! Transport adapter: tokio + hyper in front of the registry.
//!
//! # Responsibilities
//! - Accept connections and drive HTTP/1 on each
//! - Collect request bodies before handing off to the engine
//! - Convert the finished response writer into a transport response
//! - Exit the accept loop on ctrl-c
//!
//! # Design Decisions
//! - One task per connection; the engine core runs synchronously inside
//!   it, so handlers never hold the connection across an await point
//! - A handler panic tears down that connection's task only; the
//!   listener keeps serving

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info};

use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::registry::Registry;
use crate::service::Service;

/// Serve every service in `registry` on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, registry: Registry) -> io::Result<()> {
    let registry = Arc::new(registry);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, services = registry.len(), "listening");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let registry = registry.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let registry = registry.clone();
                        async move { Ok::<_, Infallible>(handle(&registry, req, peer).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %e, %peer, "connection closed with error");
                    }
                });
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// Serve a single service mounted at its base URI.
pub async fn serve_service(listener: TcpListener, service: Service) -> io::Result<()> {
    let mut registry = Registry::new();
    registry
        .register(service)
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))?;
    serve(listener, registry).await
}

async fn handle(
    registry: &Registry,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(error = %e, %peer, "failed to read request body");
            let mut w = ResponseWriter::new();
            w.set_status(StatusCode::BAD_REQUEST);
            return w.into_response();
        }
    };

    let mut request =
        Request::from_transport(parts.method, parts.uri, parts.headers, body, Some(peer));
    let mut w = ResponseWriter::new();
    registry.serve(&mut w, &mut request);
    w.into_response()
}
