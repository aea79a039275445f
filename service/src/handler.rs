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

//! Handler trait connecting the substrate to a protocol implementation

use crate::{Connection, ConnectionId, Result, ServiceError};
use async_trait::async_trait;
use bytes::Bytes;

/// What the worker should do after a hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Keep the connection open and continue reading.
    Continue,
    /// Close the connection gracefully.
    Disconnect,
}

/// Protocol hook trait.
///
/// Implement this trait to put a protocol on the substrate. The substrate
/// deals in raw bytes; the handler owns all framing and dispatch. Replies
/// are written through the [`Connection`] handle, which the handler may
/// clone and retain (e.g. in a session registry) for cross-connection
/// delivery.
///
/// An `Err` from [`on_data`](ServiceHandler::on_data) terminates only the
/// reporting connection — never the accept loop or any other connection.
///
/// # Example
///
/// ```no_run
/// use oscarix_service::{Connection, ConnectionId, HandlerOutcome, ServiceHandler};
/// use async_trait::async_trait;
/// use bytes::Bytes;
///
/// struct EchoHandler;
///
/// #[async_trait]
/// impl ServiceHandler for EchoHandler {
///     async fn on_data(
///         &self,
///         _id: ConnectionId,
///         conn: &Connection,
///         data: Bytes,
///     ) -> oscarix_service::Result<HandlerOutcome> {
///         conn.send(data).await?;
///         Ok(HandlerOutcome::Continue)
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceHandler: Send + Sync + 'static {
    /// Called when a new connection is established.
    ///
    /// A greeting may be written through `conn` before any data arrives.
    /// An `Err` closes the connection before the read loop starts.
    async fn on_connect(&self, _id: ConnectionId, _conn: &Connection) -> Result<()> {
        Ok(())
    }

    /// Called with each chunk of bytes read from the connection.
    ///
    /// The chunk boundary is arbitrary: it may hold a partial frame or many
    /// frames, and the handler is responsible for buffering.
    async fn on_data(
        &self,
        _id: ConnectionId,
        _conn: &Connection,
        _data: Bytes,
    ) -> Result<HandlerOutcome> {
        Ok(HandlerOutcome::Continue)
    }

    /// Called when an error terminates the connection.
    async fn on_error(&self, _id: ConnectionId, _conn: &Connection, _error: &ServiceError) {}

    /// Called when a connection is closed, for any reason.
    async fn on_disconnect(&self, _id: ConnectionId, _conn: &Connection) {}
}
