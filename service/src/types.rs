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

//! Identifier, state, and snapshot types shared across the substrate

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Identity of one accepted connection
///
/// Ids are handed out by the manager from a monotonic counter and never
/// reused for the lifetime of the process, so a stale id can never alias a
/// newer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle of a connection, shared as an atomic u8
///
/// The worker owns forward transitions; other tasks only read. Valid
/// order: `Connecting → Active ⇄ Idle → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Active = 1,
    Idle = 2,
    Closing = 3,
    Closed = 4,
}

impl ConnectionState {
    /// Decode a value read from the shared atomic
    ///
    /// Out-of-range values map to `Closed`: treating garbage as a dead
    /// connection fails safe.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Idle,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// Encode for storage in the shared atomic
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Past the point of no return
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    /// Established and able to carry traffic
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::Idle)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Idle => "idle",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of one connection, safe to read without locks
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub state: ConnectionState,
    pub peer_addr: SocketAddr,
    pub created_at: Instant,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl ConnectionInfo {
    /// How long the connection has been open
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Point-in-time view of the whole server
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    pub active_connections: usize,
    pub total_connections: u64,
    pub bind_address: SocketAddr,
    pub uptime: Duration,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} active / {} total on {} (up {:?})",
            self.active_connections, self.total_connections, self.bind_address, self.uptime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_ordered_and_distinct() {
        let first = ConnectionId::new(1);
        let second = ConnectionId::new(2);
        assert!(first < second);
        assert_ne!(first, second);
        assert_eq!(first.to_string(), "conn-1");
    }

    #[test]
    fn test_state_atomic_round_trip() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Active,
            ConnectionState::Idle,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ] {
            assert_eq!(ConnectionState::from_u8(state.as_u8()), state);
        }
        // unknown values fail safe
        assert_eq!(ConnectionState::from_u8(200), ConnectionState::Closed);
    }

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Closing.is_terminal());
        assert!(!ConnectionState::Idle.is_terminal());
        assert!(ConnectionState::Idle.is_active());
        assert!(!ConnectionState::Connecting.is_active());
    }
}
