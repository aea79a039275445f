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

//! Per-connection worker task
//!
//! Each accepted connection gets one ConnectionWorker. The worker is the
//! only task that reads from the socket; it feeds incoming bytes to the
//! protocol handler, services control messages from the manager (close,
//! server-initiated sends), enforces the read/idle/write timeouts, and
//! tears the connection down when any of those paths end.

use crate::{Connection, ConnectionId, ConnectionState, HandlerOutcome, Result, ServiceError,
            ServiceHandler};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// How often the worker wakes up with no traffic to re-check idleness
const IDLE_TICK: Duration = Duration::from_secs(10);
/// Inactivity span after which the state drops from Active to Idle
const IDLE_AFTER: Duration = Duration::from_secs(60);

/// Instructions the manager can queue for a worker
#[derive(Debug)]
pub enum ControlMessage {
    /// Gracefully close the connection
    Close,
    /// Send bytes to the connection
    Send(Bytes),
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Read timeout (max time to wait for data)
    pub read_timeout: Duration,
    /// Idle timeout (max time without activity)
    pub idle_timeout: Duration,
    /// Write timeout (max time for send operations)
    pub write_timeout: Duration,
    /// Control channel buffer size
    pub control_buffer_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(600),
            write_timeout: Duration::from_secs(30),
            control_buffer_size: 100,
        }
    }
}

/// Drives one connection from accept to close
pub struct ConnectionWorker {
    id: ConnectionId,
    connection: Connection,
    handler: Arc<dyn ServiceHandler>,
    config: WorkerConfig,
    /// Lifecycle state, shared with the manager without locking
    state: Arc<AtomicU8>,
    control_rx: mpsc::Receiver<ControlMessage>,
    /// When the socket last carried traffic in either direction
    last_activity: Instant,
}

impl ConnectionWorker {
    /// Build a worker and the control channel used to reach it
    pub fn new(
        id: ConnectionId,
        connection: Connection,
        handler: Arc<dyn ServiceHandler>,
        config: WorkerConfig,
        state: Arc<AtomicU8>,
    ) -> (Self, mpsc::Sender<ControlMessage>) {
        let (control_tx, control_rx) = mpsc::channel(config.control_buffer_size);
        let worker = Self {
            id,
            connection,
            handler,
            config,
            state,
            control_rx,
            last_activity: Instant::now(),
        };
        (worker, control_tx)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, to: ConnectionState) {
        self.state.store(to.as_u8(), Ordering::Release);
    }

    fn mark_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Run the connection to completion
    ///
    /// Returns once the peer disconnects, the handler asks to disconnect,
    /// a timeout fires, or an error occurs. Errors are reported to the
    /// handler and never escape the worker task.
    pub async fn run(mut self) {
        self.transition(ConnectionState::Active);

        let outcome = match self.handler.on_connect(self.id, &self.connection).await {
            Ok(()) => self.serve().await,
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.id,
                    error = %e,
                    "Connect hook failed"
                );
                Err(e)
            }
        };

        if let Err(e) = outcome {
            tracing::debug!(
                connection_id = %self.id,
                error = %e,
                "Connection terminated with error"
            );
            self.handler.on_error(self.id, &self.connection, &e).await;
        }

        self.teardown().await;
    }

    /// Read/control loop, alive until something ends the connection
    async fn serve(&mut self) -> Result<()> {
        loop {
            if self.last_activity.elapsed() > self.config.idle_timeout {
                return Err(ServiceError::Timeout);
            }

            select! {
                read = timeout(self.config.read_timeout, self.connection.read()) => {
                    let data = match read {
                        Ok(result) => result?,
                        Err(_) => return Err(ServiceError::Timeout),
                    };
                    let Some(data) = data else {
                        // peer closed its end
                        return Ok(());
                    };
                    if let HandlerOutcome::Disconnect = self.dispatch(data).await? {
                        return Ok(());
                    }
                }

                control = self.control_rx.recv() => {
                    // a closed channel means the manager dropped us
                    let Some(ControlMessage::Send(data)) = control else {
                        return Ok(());
                    };
                    match timeout(self.config.write_timeout, self.connection.send(data)).await {
                        Ok(result) => result?,
                        Err(_) => return Err(ServiceError::Timeout),
                    }
                    self.mark_activity();
                }

                _ = tokio::time::sleep(IDLE_TICK) => {
                    if self.last_activity.elapsed() > IDLE_AFTER {
                        self.transition(ConnectionState::Idle);
                    }
                }
            }
        }
    }

    /// Hand one chunk of inbound bytes to the protocol handler
    async fn dispatch(&mut self, data: Bytes) -> Result<HandlerOutcome> {
        self.mark_activity();
        self.transition(ConnectionState::Active);
        self.handler.on_data(self.id, &self.connection, data).await
    }

    async fn teardown(&mut self) {
        self.transition(ConnectionState::Closing);
        self.handler.on_disconnect(self.id, &self.connection).await;

        // discard anything still queued for a connection that is going away
        while self.control_rx.try_recv().is_ok() {}

        let _ = self.connection.shutdown().await;
        self.transition(ConnectionState::Closed);
    }
}

impl std::fmt::Debug for ConnectionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionWorker")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("last_activity", &self.last_activity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};

    struct TestHandler {
        connected: AtomicBool,
        disconnected: AtomicBool,
        chunks: AtomicUsize,
    }

    impl TestHandler {
        fn new() -> Self {
            Self {
                connected: AtomicBool::new(false),
                disconnected: AtomicBool::new(false),
                chunks: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ServiceHandler for TestHandler {
        async fn on_connect(&self, _id: ConnectionId, _conn: &Connection) -> Result<()> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn on_data(
            &self,
            _id: ConnectionId,
            _conn: &Connection,
            _data: Bytes,
        ) -> Result<HandlerOutcome> {
            self.chunks.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerOutcome::Continue)
        }

        async fn on_disconnect(&self, _id: ConnectionId, _conn: &Connection) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    async fn spawn_worker(
        handler: Arc<TestHandler>,
    ) -> (
        tokio::task::JoinHandle<()>,
        mpsc::Sender<ControlMessage>,
        TcpStream,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let client = TcpStream::connect(addr).await.unwrap();
        let socket = accept.await.unwrap();

        let id = ConnectionId::new(1);
        let connection = Connection::wrap(socket, id).unwrap();
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting.as_u8()));
        let (worker, control_tx) =
            ConnectionWorker::new(id, connection, handler, WorkerConfig::default(), state);

        let handle = tokio::spawn(async move { worker.run().await });
        (handle, control_tx, client)
    }

    #[tokio::test]
    async fn test_worker_lifecycle() {
        let handler = Arc::new(TestHandler::new());
        let (handle, control_tx, client) = spawn_worker(handler.clone()).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handler.connected.load(Ordering::SeqCst));

        control_tx.send(ControlMessage::Close).await.unwrap();
        handle.await.unwrap();

        assert!(handler.disconnected.load(Ordering::SeqCst));
        drop(client);
    }

    #[tokio::test]
    async fn test_worker_delivers_data_to_handler() {
        let handler = Arc::new(TestHandler::new());
        let (handle, control_tx, mut client) = spawn_worker(handler.clone()).await;

        client.write_all(b"chunk").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handler.chunks.load(Ordering::SeqCst), 1);

        control_tx.send(ControlMessage::Close).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_ends_on_peer_disconnect() {
        let handler = Arc::new(TestHandler::new());
        let (handle, _control_tx, client) = spawn_worker(handler.clone()).await;

        drop(client);
        handle.await.unwrap();
        assert!(handler.disconnected.load(Ordering::SeqCst));
    }
}
