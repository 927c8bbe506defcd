//! HTTP listener.
//!
//! Accepts TCP connections, serves HTTP/1.1 on each with hyper, and hands
//! every request to the [`Broker`]. On shutdown the accept loop stops,
//! open connections finish their in-flight request, and the server waits up
//! to the configured shutdown timeout for them to close.
//!
//! # Example
//!
//! ```rust,no_run
//! use hermes_server::{Broker, Server, ServerConfig};
//! # use hermes_core::fixtures::sample_catalog;
//! # use hermes_core::{BrokerResult, CreateServiceInstanceRequest, CreateServiceInstanceResponse};
//! # use hermes_core::{DeleteServiceInstanceRequest, DeleteServiceInstanceResponse};
//! # struct Instances;
//! # #[async_trait::async_trait]
//! # impl hermes_core::ServiceInstanceService for Instances {
//! #     async fn create_service_instance(&self, _: CreateServiceInstanceRequest)
//! #         -> BrokerResult<Option<CreateServiceInstanceResponse>> { Ok(None) }
//! #     async fn delete_service_instance(&self, _: DeleteServiceInstanceRequest)
//! #         -> BrokerResult<Option<DeleteServiceInstanceResponse>> { Ok(None) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Broker::builder()
//!         .catalog(sample_catalog())
//!         .instances(Instances)
//!         .build()?;
//!
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, broker).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hermes_core::ErrorMessage;
use hermes_middleware::{Response, ResponseExt};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use crate::broker::{into_pipeline_request, Broker};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The broker's HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    broker: Broker,
}

impl Server {
    /// Creates a server for `broker`.
    #[must_use]
    pub fn new(config: ServerConfig, broker: Broker) -> Self {
        Self { config, broker }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the broker answering requests.
    #[must_use]
    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the configured address is invalid
    /// or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the configured address is invalid
    /// or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::bind(self.config.http_addr(), e))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;

        self.run_with_listener(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the listener address cannot be read.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "broker listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            let result =
                                server.handle_connection(stream, remote_addr, shutdown).await;
                            if let Err(e) = result {
                                tracing::debug!(
                                    remote_addr = %remote_addr,
                                    error = %e,
                                    "connection error"
                                );
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout_secs = shutdown_timeout.as_secs(),
            connections = tracker.active_connections(),
            "draining connections"
        );

        if tokio::time::timeout(shutdown_timeout, tracker.wait_for_drain())
            .await
            .is_err()
        {
            tracing::warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("broker stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => return result,
            () = shutdown.recv() => {
                tracing::debug!(remote_addr = %remote_addr, "closing connection for shutdown");
                connection.as_mut().graceful_shutdown();
            }
        }

        connection.await
    }

    async fn handle_request(&self, request: http::Request<Incoming>) -> Response {
        let deadline = Instant::now() + self.config.request_timeout();
        let (parts, body) = request.into_parts();

        let body = match tokio::time::timeout_at(deadline, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "failed to read request body");
                return Response::json(
                    StatusCode::BAD_REQUEST,
                    &ErrorMessage::new(format!("Failed to read request body: {e}")),
                );
            }
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "timed out reading request body");
                return Response::json(
                    StatusCode::REQUEST_TIMEOUT,
                    &ErrorMessage::new("Timed out reading the request body"),
                );
            }
        };

        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let request = into_pipeline_request(parts, body);

        match tokio::time::timeout_at(deadline, self.broker.handle(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(%method, path = %path, "request timed out");
                Response::json(
                    StatusCode::GATEWAY_TIMEOUT,
                    &ErrorMessage::new("The service broker did not answer in time"),
                )
            }
        }
    }
}
