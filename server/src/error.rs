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

//! Error types for the OSCAR protocol server

use oscarix_flapcodec::CodecError;
use oscarix_service::{ConnectionId, ServiceError};
use thiserror::Error;

/// Result type for OSCAR server operations
pub type Result<T> = std::result::Result<T, OscarError>;

/// OSCAR protocol server error types
///
/// Framing and malformed-payload errors are fatal to the connection that
/// produced them; business-logic failures (unknown user, bad password)
/// never surface here — services answer those with well-formed error
/// SNACs or failure TLV sets on the wire.
#[derive(Debug, Error)]
pub enum OscarError {
    /// Framing error from the FLAP/SNAC/TLV stack
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Substrate error from the connection layer
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A structurally valid SNAC whose body is missing required fields
    #[error("malformed {0} payload: {1}")]
    MalformedPayload(&'static str, String),

    /// No session is tracked for the given connection
    #[error("no session for {0}")]
    SessionNotFound(ConnectionId),
}

impl From<OscarError> for ServiceError {
    fn from(error: OscarError) -> Self {
        match error {
            OscarError::Service(inner) => inner,
            other => ServiceError::Protocol(other.to_string()),
        }
    }
}
