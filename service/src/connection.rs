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

//! Byte-level connection handle

use crate::{ConnectionId, Result};
use bytes::{Bytes, BytesMut};
use metrics::{counter, gauge};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, trace};

const READ_BUFFER_SIZE: usize = 8192;

/// A cheaply cloneable handle to one TCP connection.
///
/// The stream is split on creation: the read half is only ever used by the
/// connection's own worker, while the write half sits behind its own mutex
/// so that *any* task may send bytes to this socket. Cross-connection
/// delivery (one worker relaying a message to another worker's socket)
/// serializes on that mutex, so two writers can never interleave bytes
/// mid-frame on the wire.
#[derive(Clone)]
pub struct Connection {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,

    // Metadata (lock-free access)
    id: ConnectionId,
    peer_addr: SocketAddr,
    created_at: Instant,

    // Counters (lock-free)
    bytes_sent: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
}

impl Connection {
    /// Wrap a TCP stream into a Connection
    #[instrument(skip(socket), fields(connection_id = %id))]
    pub fn wrap(socket: TcpStream, id: ConnectionId) -> Result<Self> {
        let peer_addr = socket.peer_addr()?;
        let (reader, writer) = socket.into_split();

        info!(peer_addr = %peer_addr, "Creating new connection");

        counter!("oscarix.connections.total").increment(1);
        gauge!("oscarix.connections.active").increment(1.0);

        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
            id,
            peer_addr,
            created_at: Instant::now(),
            bytes_sent: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Get when the connection was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Get bytes sent
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Get bytes received
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Read the next chunk of available bytes.
    ///
    /// Returns `Ok(None)` when the peer has closed the connection. The
    /// returned chunk is whatever the socket had ready; it may contain a
    /// partial frame or several frames — framing is the handler's concern.
    ///
    /// Only the owning worker calls this; the read half has its own lock so
    /// a pending read never blocks writers.
    pub async fn read(&self) -> Result<Option<Bytes>> {
        let mut buffer = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let n = self.reader.lock().await.read_buf(&mut buffer).await?;
        if n == 0 {
            debug!(connection_id = %self.id, "Connection stream ended");
            gauge!("oscarix.connections.active").decrement(1.0);
            return Ok(None);
        }
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
        counter!("oscarix.bytes.received").increment(n as u64);
        trace!(connection_id = %self.id, bytes = n, "Read chunk");
        Ok(Some(buffer.freeze()))
    }

    /// Send bytes to the peer.
    ///
    /// Safe to call from any task; concurrent senders serialize on the
    /// write-half mutex.
    pub async fn send(&self, data: Bytes) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(&data).await?;
        writer.flush().await?;
        self.bytes_sent
            .fetch_add(data.len() as u64, Ordering::Relaxed);
        counter!("oscarix.bytes.sent").increment(data.len() as u64);
        trace!(connection_id = %self.id, bytes = data.len(), "Sent chunk");
        Ok(())
    }

    /// Shut down the write side of the socket, signalling EOF to the peer.
    pub async fn shutdown(&self) -> Result<()> {
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("created_at", &self.created_at)
            .finish()
    }
}
