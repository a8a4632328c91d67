//! Prometheus metrics HTTP server.

use crate::{encode_text, SnapshotCollector};
use alloy_primitives::Address;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use stader_state::{CacheError, SnapshotCache};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

/// Handle incoming HTTP requests.
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    collector: Option<Arc<SnapshotCollector>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => {
            let encoded = match &collector {
                Some(collector) => collector.scrape(),
                None => encode_text(),
            };
            match encoded {
                Ok(buffer) => {
                    let mut response = text_response(StatusCode::OK, buffer);
                    response
                        .headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static(prometheus::TEXT_FORMAT));
                    Ok(response)
                }
                Err(e) => {
                    error!("Failed to encode metrics: {}", e);
                    Ok(text_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to encode metrics",
                    ))
                }
            }
        }
        "/health" => {
            let ready = collector
                .as_ref()
                .map(|c| c.cache().get_network_snapshot().is_ok())
                .unwrap_or(true);
            if ready {
                Ok(text_response(StatusCode::OK, "OK"))
            } else {
                Ok(text_response(StatusCode::SERVICE_UNAVAILABLE, "Not Ready"))
            }
        }
        "/refresh" => {
            if req.method() != Method::POST {
                return Ok(text_response(StatusCode::METHOD_NOT_ALLOWED, "Use POST"));
            }
            let requested = collector
                .as_ref()
                .map(|c| c.request_refresh())
                .unwrap_or(false);
            if requested {
                debug!("Refresh requested over HTTP");
                Ok(text_response(StatusCode::ACCEPTED, "Refresh requested"))
            } else {
                Ok(text_response(StatusCode::NOT_FOUND, "Not Found"))
            }
        }
        "/snapshot" => Ok(match &collector {
            Some(collector) => snapshot_response(collector.cache(), req.uri().query()),
            None => text_response(StatusCode::NOT_FOUND, "Not Found"),
        }),
        _ => Ok(text_response(StatusCode::NOT_FOUND, "Not Found")),
    }
}

/// Address named by an `operator=` query parameter, if any.
fn requested_operator(query: Option<&str>) -> Option<Result<Address, String>> {
    let value = query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("operator="))?;
    Some(value.parse().map_err(|_| value.to_string()))
}

/// Served snapshot as JSON, for the tracked operator or `?operator=`.
fn snapshot_response(cache: &SnapshotCache, query: Option<&str>) -> Response<Full<Bytes>> {
    let operator = match requested_operator(query) {
        Some(Ok(address)) => address,
        Some(Err(value)) => {
            return text_response(
                StatusCode::BAD_REQUEST,
                format!("invalid operator address: {value}"),
            )
        }
        None => cache.tracked_address(),
    };

    match cache.get_snapshot(operator) {
        Ok(snapshot) => match serde_json::to_vec(&*snapshot) {
            Ok(body) => {
                let mut response = text_response(StatusCode::OK, body);
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(e) => {
                error!("Failed to encode snapshot: {}", e);
                text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to encode snapshot",
                )
            }
        },
        Err(e @ CacheError::OperatorNotTracked { .. }) => {
            text_response(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e) => text_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

/// Serve metrics on an already bound listener until `cancel` fires.
///
/// With a collector, `/metrics` refreshes the gauges from the served
/// snapshot on every request, `/snapshot` returns that snapshot as JSON,
/// `POST /refresh` requests an early rebuild and `/health` answers 503 until
/// a snapshot exists.
pub async fn serve(
    listener: TcpListener,
    collector: Option<Arc<SnapshotCollector>>,
    cancel: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Metrics server stopped");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
        };
        debug!(%peer, "Metrics connection");
        let io = TokioIo::new(stream);
        let collector = collector.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, collector.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving metrics connection: {}", e);
            }
        });
    }
}

/// Start the metrics HTTP server.
///
/// # Arguments
///
/// * `addr` - Socket address to bind to (e.g., "0.0.0.0:9102")
/// * `collector` - Snapshot source refreshed on each scrape
/// * `cancel` - Stops the accept loop
pub async fn start_metrics_server(
    addr: SocketAddr,
    collector: Option<Arc<SnapshotCollector>>,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on http://{}/metrics", addr);
    serve(listener, collector, cancel).await;
    Ok(())
}

/// Start the metrics server in the background.
pub fn spawn_metrics_server(
    addr: SocketAddr,
    collector: Option<Arc<SnapshotCollector>>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_metrics_server(addr, collector, cancel).await {
            error!("Metrics server error: {}", e);
        }
    })
}
