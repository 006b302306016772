use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use appstats::Registry;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tracing::warn;

use crate::common::BuildError;

/// An HTTP endpoint exposing a [`Registry`] snapshot as JSON on `GET /stats`.
///
/// The server owns its registry; share [`registry`](Self::registry) with the rest of the
/// application to feed it.  Serving happens on a dedicated background thread running a
/// single-threaded runtime, so the host application does not need an async runtime of its own.
#[derive(Debug)]
pub struct StatsServer {
    registry: Arc<Registry>,
    listen_address: SocketAddr,
    bound: Mutex<Option<SocketAddr>>,
}

impl StatsServer {
    pub(crate) fn new(registry: Registry, listen_address: SocketAddr) -> StatsServer {
        StatsServer { registry: Arc::new(registry), listen_address, bound: Mutex::new(None) }
    }

    /// Gets the registry this server exposes.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Binds the configured address and starts serving in the background.
    ///
    /// Returns the bound address, which is the way to learn the actual port when listening on
    /// port 0.  Calling `start` again after a successful start is a no-op returning the same
    /// address.  A bind failure is surfaced to the caller and never retried internally.
    pub fn start(&self) -> Result<SocketAddr, BuildError> {
        let mut bound = self.bound.lock();
        if let Some(address) = *bound {
            return Ok(address);
        }

        let listener = std::net::TcpListener::bind(self.listen_address)
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .map_err(|e| BuildError::FailedToBindListener(e.to_string()))?;
        let address =
            listener.local_addr().map_err(|e| BuildError::FailedToBindListener(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let registry = Arc::clone(&self.registry);
        thread::Builder::new()
            .name("appstats-exporter-http".to_owned())
            .spawn(move || runtime.block_on(serve(listener, registry)))?;

        *bound = Some(address);
        Ok(address)
    }
}

async fn serve(listener: std::net::TcpListener, registry: Arc<Registry>) {
    let listener = match tokio::net::TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            warn!("failed to register stats listener with the runtime: {:?}", e);
            return;
        }
    };

    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!("error accepting connection, ignoring request: {:?}", e);
                continue;
            }
        };

        let registry = Arc::clone(&registry);
        tokio::task::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let registry = Arc::clone(&registry);
                async move { handle_request(&registry, &req) }
            });

            if let Err(e) =
                http1::Builder::new().serve_connection(TokioIo::new(stream), service).await
            {
                warn!("error serving connection: {:?}", e);
            }
        });
    }
}

fn handle_request(
    registry: &Registry,
    req: &Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    if req.uri().path() != "/stats" {
        return Ok(empty_response(StatusCode::NOT_FOUND));
    }

    match serde_json::to_string(&registry.snapshot()) {
        Ok(body) => Ok(Response::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Full::from(body))
            .expect("static response parts are valid")),
        Err(e) => {
            // A well-formed registry always serializes; reaching this arm means an internal
            // invariant was broken upstream.
            warn!("failed to serialize stats snapshot: {:?}", e);
            Ok(empty_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::default())
        .expect("static response parts are valid")
}
