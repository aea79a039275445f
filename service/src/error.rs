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

//! Substrate error type
//!
//! Every variant here is scoped to a single connection except
//! `ServerNotRunning`; the accept loop and the other workers keep going
//! when one connection fails.

use crate::types::ConnectionId;
use thiserror::Error;

/// Result type for substrate operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failures surfaced by the connection substrate
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reported by a protocol handler
    ///
    /// The substrate is protocol-agnostic; handlers convert their codec
    /// errors into this variant. It is fatal to the reporting connection.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No live connection carries this id
    #[error("No connection with id {0}")]
    ConnectionNotFound(ConnectionId),

    /// The connection went away mid-operation
    #[error("Connection closed")]
    ConnectionClosed,

    /// A read, write, or idle deadline expired
    #[error("Operation timed out")]
    Timeout,

    /// The server was asked to do something before start or after shutdown
    #[error("Server not running")]
    ServerNotRunning,

    /// Anything without a more specific variant
    #[error("{0}")]
    Other(String),
}
