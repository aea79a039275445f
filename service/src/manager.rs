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

//! Connection registry and worker supervision
//!
//! The ConnectionManager assigns ids, spawns one worker per accepted
//! connection, and keeps the id-to-worker map that server-initiated sends
//! and closes go through. Entries remove themselves when their worker
//! finishes, so the map only ever holds live connections.

use crate::{Connection, ConnectionId, ConnectionInfo, ConnectionState, ControlMessage, Result,
            ServiceError, ServiceHandler, ServerMetrics, WorkerConfig};
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Grace period when waiting for a closed worker to finish
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// One tracked connection and the handles needed to reach its worker
struct ConnectionEntry {
    id: ConnectionId,
    connection: Connection,
    control_tx: mpsc::Sender<ControlMessage>,
    worker_handle: JoinHandle<()>,
    /// Lifecycle state written by the worker, read here
    state: Arc<AtomicU8>,
    created_at: Instant,
}

impl ConnectionEntry {
    fn snapshot(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            state: ConnectionState::from_u8(self.state.load(Ordering::Acquire)),
            peer_addr: self.connection.peer_addr(),
            created_at: self.created_at,
            bytes_sent: self.connection.bytes_sent(),
            bytes_received: self.connection.bytes_received(),
        }
    }
}

/// Tracks every live connection and the worker serving it
pub struct ConnectionManager {
    connections: Arc<DashMap<ConnectionId, ConnectionEntry>>,
    /// Source of connection ids; never reset, so ids are never reused
    next_id: AtomicU64,
    metrics: Arc<ServerMetrics>,
    worker_config: WorkerConfig,
}

impl ConnectionManager {
    pub fn new(metrics: Arc<ServerMetrics>, worker_config: WorkerConfig) -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            metrics,
            worker_config,
        }
    }

    /// Assign an id, spawn a worker, and start tracking the connection
    ///
    /// The spawned task removes the entry itself once the worker returns,
    /// whichever way the connection ended.
    pub fn add_connection(
        &self,
        connection: Connection,
        handler: Arc<dyn ServiceHandler>,
    ) -> Result<ConnectionId> {
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting.as_u8()));

        let (worker, control_tx) = crate::ConnectionWorker::new(
            id,
            connection.clone(),
            handler,
            self.worker_config.clone(),
            state.clone(),
        );

        let connections = self.connections.clone();
        let metrics = self.metrics.clone();
        let worker_handle = tokio::spawn(async move {
            let opened = Instant::now();
            worker.run().await;
            connections.remove(&id);
            metrics.connection_closed(opened.elapsed());
        });

        self.connections.insert(
            id,
            ConnectionEntry {
                id,
                connection,
                control_tx,
                worker_handle,
                state,
                created_at: Instant::now(),
            },
        );
        self.metrics.connection_opened();

        Ok(id)
    }

    /// Handle to a tracked connection, if it is still live
    pub fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.connections
            .get(&id)
            .map(|entry| entry.connection.clone())
    }

    /// Point-in-time view of one connection
    pub fn connection_info(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.get(&id).map(|entry| entry.snapshot())
    }

    /// Queue bytes for delivery on the connection's worker
    pub async fn send_to(&self, id: ConnectionId, data: Bytes) -> Result<()> {
        let control_tx = self
            .connections
            .get(&id)
            .map(|entry| entry.control_tx.clone())
            .ok_or(ServiceError::ConnectionNotFound(id))?;
        control_tx
            .send(ControlMessage::Send(data))
            .await
            .map_err(|_| ServiceError::ConnectionClosed)
    }

    /// Ask a worker to close, waiting briefly for it to wind down
    pub async fn close(&self, id: ConnectionId) -> Result<()> {
        let Some((_, entry)) = self.connections.remove(&id) else {
            return Err(ServiceError::ConnectionNotFound(id));
        };
        let _ = entry.control_tx.send(ControlMessage::Close).await;
        let _ = tokio::time::timeout(CLOSE_GRACE, entry.worker_handle).await;
        Ok(())
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Close every tracked connection
    pub async fn shutdown(&self) {
        let ids: Vec<ConnectionId> = self.connections.iter().map(|entry| entry.id).collect();
        for id in ids {
            let _ = self.close(id).await;
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connection_count", &self.connection_count())
            .finish()
    }
}
