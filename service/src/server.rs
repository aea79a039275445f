//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! TCP listener and accept loop
//!
//! The Server is the substrate's entry point. It binds the TCP listener,
//! accepts connections, and hands each one to the ConnectionManager. A
//! failure inside any single connection never stops the accept loop.

use crate::{Connection, ConnectionId, ConnectionManager, Result, ServerConfig, ServerMetrics,
            ServerSnapshot, ServiceError, ServiceHandler, WorkerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// Protocol-agnostic TCP server
///
/// # Example
///
/// ```no_run
/// use oscarix_service::{Server, ServerConfig, ServiceHandler};
/// use async_trait::async_trait;
///
/// struct MyHandler;
///
/// #[async_trait]
/// impl ServiceHandler for MyHandler {}
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::new("127.0.0.1:5190".parse()?);
///     let server = Server::new(config).await?;
///     server.start(std::sync::Arc::new(MyHandler)).await?;
///     // ... wait for shutdown signal ...
///     server.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    config: ServerConfig,
    manager: Arc<ConnectionManager>,
    metrics: Arc<ServerMetrics>,
    /// Bound listener, consumed by the accept loop on start
    listener: Mutex<Option<TcpListener>>,
    bind_address: SocketAddr,
    started_at: Instant,
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Bind the listener without accepting anything yet
    ///
    /// Connections are only accepted once `start()` is called.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        let bind_address = listener.local_addr()?;

        let metrics = Arc::new(ServerMetrics::new());
        let worker_config = WorkerConfig {
            read_timeout: config.read_timeout,
            idle_timeout: config.idle_timeout,
            write_timeout: config.write_timeout,
            control_buffer_size: 100,
        };
        let manager = Arc::new(ConnectionManager::new(metrics.clone(), worker_config));

        tracing::info!("Listener bound on {}", bind_address);

        Ok(Self {
            config,
            manager,
            metrics,
            listener: Mutex::new(Some(listener)),
            bind_address,
            started_at: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            accept_handle: Mutex::new(None),
        })
    }

    /// Begin accepting connections, serving them through `handler`
    pub async fn start(&self, handler: Arc<dyn ServiceHandler>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::Other("Server already running".to_string()));
        }
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .ok_or(ServiceError::Other("Listener already consumed".to_string()))?;

        tracing::info!("Accepting connections on {}", self.bind_address);

        let handle = self.spawn_accept_loop(listener, handler);
        *self.accept_handle.lock().await = Some(handle);
        Ok(())
    }

    /// The accept loop owns the listener; it exits on shutdown notify
    fn spawn_accept_loop(
        &self,
        listener: TcpListener,
        handler: Arc<dyn ServiceHandler>,
    ) -> JoinHandle<()> {
        let manager = self.manager.clone();
        let metrics = self.metrics.clone();
        let max_connections = self.config.max_connections;
        let running = self.running.clone();
        let shutdown_notify = self.shutdown_notify.clone();

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let accepted = tokio::select! {
                    result = listener.accept() => result,
                    _ = shutdown_notify.notified() => break,
                };

                let (socket, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::error!("Accept failed: {}", e);
                        metrics.connection_error();
                        // avoid spinning on persistent accept errors
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                };

                if manager.connection_count() >= max_connections {
                    tracing::warn!(
                        "At connection limit ({}), dropping {}",
                        max_connections,
                        peer_addr
                    );
                    metrics.connection_error();
                    drop(socket);
                    continue;
                }

                // placeholder id; the manager assigns the real one
                let connection = match Connection::wrap(socket, ConnectionId::new(0)) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::error!("Could not wrap socket from {}: {}", peer_addr, e);
                        metrics.connection_error();
                        continue;
                    }
                };

                match manager.add_connection(connection, handler.clone()) {
                    Ok(id) => tracing::info!("Connection {} established from {}", id, peer_addr),
                    Err(e) => {
                        tracing::error!("Could not register connection: {}", e);
                        metrics.connection_error();
                    }
                }
            }

            tracing::info!("Accept loop terminated");
        })
    }

    /// Stop accepting and close every open connection
    pub async fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::ServerNotRunning);
        }

        tracing::info!("Shutting down server on {}", self.bind_address);
        self.shutdown_notify.notify_waiters();

        if let Some(handle) = self.accept_handle.lock().await.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.manager.shutdown().await;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Whether the accept loop is live
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the listener actually bound (resolves port 0)
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Number of open connections
    pub fn connection_count(&self) -> usize {
        self.manager.connection_count()
    }

    /// Point-in-time view of the server
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            active_connections: self.manager.connection_count(),
            total_connections: self.metrics.total_connections(),
            bind_address: self.bind_address,
            uptime: self.started_at.elapsed(),
        }
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Shared connection manager handle
    pub fn manager(&self) -> Arc<ConnectionManager> {
        self.manager.clone()
    }

    /// The configuration the server was built with
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("bind_address", &self.bind_address)
            .field("running", &self.is_running())
            .field("connections", &self.connection_count())
            .finish()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("Server dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown_notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct TestHandler;

    #[async_trait]
    impl ServiceHandler for TestHandler {}

    #[tokio::test]
    async fn test_server_lifecycle() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = Server::new(config).await.unwrap();
        assert!(!server.is_running());

        server.start(Arc::new(TestHandler)).await.unwrap();
        assert!(server.is_running());

        server.shutdown().await.unwrap();
        assert!(!server.is_running());
        assert!(server.shutdown().await.is_err());
    }

    #[tokio::test]
    async fn test_server_rejects_double_start() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = Server::new(config).await.unwrap();
        server.start(Arc::new(TestHandler)).await.unwrap();
        assert!(server.start(Arc::new(TestHandler)).await.is_err());
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_of_idle_server() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = Server::new(config).await.unwrap();
        let snapshot = server.snapshot();
        assert_eq!(snapshot.active_connections, 0);
        assert_eq!(snapshot.total_connections, 0);
        assert_eq!(snapshot.bind_address, server.bind_address());
    }
}
