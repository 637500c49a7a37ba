// src/stats/server.rs
//! HTTP endpoint for the stats report
//!
//! Plain HTTP/1.1 on a local address. Every request takes a fresh snapshot;
//! nothing is cached and nothing is written.

use crate::counters::{LabelCounter, WrappingCounter};
use crate::observability::publish_snapshot;
use crate::stats::reporter::StatsReporter;
use crate::utils::errors::{EngineError, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::PrometheusHandle;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

/// Read-only stats server
pub struct StatsServer<C: LabelCounter + 'static = WrappingCounter> {
    listener: TcpListener,
    reporter: Arc<StatsReporter<C>>,
    metrics: Option<PrometheusHandle>,
}

impl<C: LabelCounter + 'static> StatsServer<C> {
    /// Bind the listening socket
    pub async fn bind(
        addr: SocketAddr,
        reporter: Arc<StatsReporter<C>>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            EngineError::StatsServerFailed(format!("Failed to bind {}: {}", addr, e))
        })?;

        Ok(Self {
            listener,
            reporter,
            metrics,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.local_addr()?;
        info!("Stats endpoint listening on {}", addr);

        let handler = Arc::new(StatsHandler::new(self.reporter, self.metrics));

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let handler = Arc::clone(&handler);
                    let shutdown = shutdown.clone();

                    tokio::spawn(async move {
                        debug!("Accepted stats connection from {}", peer);

                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req: Request<Incoming>| {
                            let handler = Arc::clone(&handler);
                            async move {
                                let response = handler.respond(req.method(), req.uri().path());
                                Ok::<_, Infallible>(response)
                            }
                        });

                        let conn = http1::Builder::new().serve_connection(io, service);
                        tokio::pin!(conn);

                        tokio::select! {
                            result = conn.as_mut() => {
                                if let Err(e) = result {
                                    debug!("Stats connection error: {}", e);
                                }
                            }
                            _ = shutdown.cancelled() => {
                                conn.as_mut().graceful_shutdown();
                                let _ = conn.await;
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept stats connection: {}", e);
                }
            }
        }

        info!("Stats endpoint stopped");
        Ok(())
    }
}

/// Request routing, shared by all connections
pub(crate) struct StatsHandler<C: LabelCounter> {
    reporter: Arc<StatsReporter<C>>,
    metrics: Option<PrometheusHandle>,
}

impl<C: LabelCounter> StatsHandler<C> {
    pub(crate) fn new(reporter: Arc<StatsReporter<C>>, metrics: Option<PrometheusHandle>) -> Self {
        Self { reporter, metrics }
    }

    pub(crate) fn respond(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        if method != Method::GET && method != Method::HEAD {
            let mut response = text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                TEXT_PLAIN,
                "Stats are read-only\n".to_string(),
            );
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        match path {
            "/stats" => text_response(StatusCode::OK, TEXT_PLAIN, self.reporter.render()),
            "/stats.json" => {
                text_response(StatusCode::OK, APPLICATION_JSON, self.reporter.render_json())
            }
            "/metrics" => match &self.metrics {
                Some(handle) => {
                    publish_snapshot(&self.reporter.snapshot());
                    text_response(StatusCode::OK, PROMETHEUS_TEXT, handle.render())
                }
                None => not_found(),
            },
            _ => not_found(),
        }
    }
}

fn not_found() -> Response<Full<Bytes>> {
    text_response(StatusCode::NOT_FOUND, TEXT_PLAIN, "Not found\n".to_string())
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
