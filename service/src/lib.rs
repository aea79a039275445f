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

//! # Oscarix Connection Service Substrate
//!
//! A protocol-agnostic TCP listener and connection-lifecycle substrate. It
//! knows nothing about any wire protocol: it accepts sockets, runs one
//! worker task per connection, and hands freshly read bytes to a
//! protocol-specific [`ServiceHandler`]. The OSCAR server is one consumer;
//! any byte-oriented legacy protocol can sit on the same substrate.
//!
//! # Architecture
//!
//! ```text
//! Server (accept loop)
//!     ↓
//! ConnectionManager (DashMap of live connections)
//!     ↓
//! ConnectionWorker (per-connection task) → ServiceHandler hooks
//! ```
//!
//! Responsibilities per accepted connection:
//!
//! - invoke the handler's on-connect hook, which may write an immediate
//!   greeting through the [`Connection`] handle;
//! - repeatedly read available bytes and pass them to the on-data hook;
//! - close the socket when the peer disconnects, the hook requests
//!   disconnection, the hook errors, or a timeout fires.
//!
//! A failure inside one connection's worker terminates only that
//! connection; the accept loop keeps running.
//!
//! [`Connection`] handles are cheaply cloneable and writable from any task
//! (the write half sits behind its own mutex), so a handler may deliver
//! bytes to a socket owned by another connection's worker — the relay
//! pattern instant-messaging protocols need — without interleaving frames
//! mid-write.

mod config;
mod connection;
mod error;
mod handler;
mod manager;
mod metrics;
mod server;
mod types;
mod worker;

pub use config::ServerConfig;
pub use connection::Connection;
pub use error::{Result, ServiceError};
pub use handler::{HandlerOutcome, ServiceHandler};
pub use manager::ConnectionManager;
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use server::Server;
pub use types::{ConnectionId, ConnectionInfo, ConnectionState, ServerSnapshot};
pub use worker::{ConnectionWorker, ControlMessage, WorkerConfig};
