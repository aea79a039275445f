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

//! Per-connection OSCAR session state
//!
//! An [`OscarSession`] pairs the substrate [`Connection`] with everything
//! the protocol layer tracks for one client: its outbound FLAP sequence
//! counter, its sign-on state machine, and the identity and presence data
//! filled in as the client authenticates and configures itself.
//!
//! Sessions are shared as `Arc<OscarSession>` between the connection's own
//! worker task and any other session relaying messages to it. All mutable
//! state sits behind its own lock; none of the locks are held across await
//! points.

use crate::Result;
use bytes::Bytes;
use oscarix_flapcodec::{consts::tlv, Flap, FlapKind, Snac, SnacWriter, Tlv};
use oscarix_service::{Connection, ConnectionId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sign-on progress over the authentication connection
///
/// Clients open with a FLAP sign-on exchange; the variants track how far
/// this connection has gotten. Only `Authenticated` sessions participate
/// in presence and messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignonState {
    /// Server greeting sent, waiting for the client's sign-on frame
    HelloSent,
    /// Client sent a bare version sign-on frame (MD5 login path)
    Md5HandshakeSeen,
    /// Login or cookie resume succeeded
    Authenticated,
}

/// Presence status advertised to buddies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnlineStatus {
    #[default]
    Online,
    Away,
    DoNotDisturb,
    Invisible,
}

impl OnlineStatus {
    /// Wire encoding used in the user status TLV
    pub fn as_u32(self) -> u32 {
        match self {
            OnlineStatus::Online => 0x0000,
            OnlineStatus::Away => 0x0001,
            OnlineStatus::DoNotDisturb => 0x0002,
            OnlineStatus::Invisible => 0x0100,
        }
    }
}

/// Identity and presence data for one session
#[derive(Debug, Default)]
pub struct SessionInfo {
    /// Screen name as the client presented it
    pub screen_name: Option<String>,
    /// Resume cookie issued at login
    pub cookie: Option<Bytes>,
    /// Client identification string from the login TLVs
    pub user_agent: Option<String>,
    /// Current presence status
    pub status: OnlineStatus,
    /// Normalized screen names this session watches
    pub buddies: HashSet<String>,
    /// Capability UUIDs from locate set-info
    pub capabilities: Vec<[u8; 16]>,
    /// Profile as (mime type, text)
    pub profile: Option<(String, String)>,
    /// Away message as (mime type, text); None when not away
    pub away_message: Option<(String, String)>,
    /// Unix timestamp of successful authentication
    pub signon_time: u32,
}

/// One client's protocol state bound to its TCP connection
pub struct OscarSession {
    id: ConnectionId,
    connection: Connection,
    /// Outbound FLAP sequence counter; wraps at u16::MAX
    sequence: AtomicU16,
    signon: Mutex<SignonState>,
    info: RwLock<SessionInfo>,
}

impl OscarSession {
    /// Create a session for a freshly accepted connection
    pub fn new(id: ConnectionId, connection: Connection) -> Self {
        Self {
            id,
            connection,
            sequence: AtomicU16::new(0),
            signon: Mutex::new(SignonState::HelloSent),
            info: RwLock::new(SessionInfo::default()),
        }
    }

    /// Connection id of the underlying socket
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Underlying substrate connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Next outbound FLAP sequence number
    fn next_sequence(&self) -> u16 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Current sign-on state
    pub fn signon_state(&self) -> SignonState {
        *self.signon.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Advance the sign-on state machine
    pub fn set_signon_state(&self, state: SignonState) {
        *self.signon.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// True once login or cookie resume has completed
    pub fn is_authenticated(&self) -> bool {
        self.signon_state() == SignonState::Authenticated
    }

    /// Read access to the session info
    pub fn with_info<T>(&self, f: impl FnOnce(&SessionInfo) -> T) -> T {
        f(&self.info.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Write access to the session info
    pub fn with_info_mut<T>(&self, f: impl FnOnce(&mut SessionInfo) -> T) -> T {
        f(&mut self.info.write().unwrap_or_else(|e| e.into_inner()))
    }

    /// Screen name, if the session has presented one
    pub fn screen_name(&self) -> Option<String> {
        self.with_info(|info| info.screen_name.clone())
    }

    /// Mark this session authenticated as the given screen name
    pub fn authenticate(&self, screen_name: &str, cookie: Option<Bytes>) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        self.with_info_mut(|info| {
            info.screen_name = Some(screen_name.to_string());
            info.cookie = cookie;
            info.signon_time = now;
        });
        self.set_signon_state(SignonState::Authenticated);
    }

    /// Send a FLAP frame of the given kind, stamping the next sequence number
    pub async fn send_flap(&self, kind: FlapKind, payload: Bytes) -> Result<()> {
        let flap = Flap::new(kind, self.next_sequence(), payload);
        self.connection.send(flap.to_bytes()).await?;
        Ok(())
    }

    /// Send a SNAC wrapped in a data FLAP
    pub async fn send_snac(&self, snac: &Snac) -> Result<()> {
        self.send_flap(FlapKind::Data, snac.to_bytes()).await
    }

    /// Close the underlying socket
    ///
    /// A failed shutdown means the socket is already dead; nothing to do
    /// about it beyond a log line.
    pub async fn shutdown(&self) {
        if let Err(e) = self.connection.shutdown().await {
            tracing::debug!("Shutdown of {} failed: {}", self.id, e);
        }
    }

    /// Build this session's user info block
    ///
    /// Layout: length-prefixed screen name, warning level, TLV count, then
    /// the user class, sign-on time, and status TLVs. Used in self-info
    /// replies, buddy arrival notices, and incoming message headers.
    pub fn user_info_block(&self) -> Result<Bytes> {
        self.with_info(|info| {
            let name = info.screen_name.as_deref().unwrap_or("");
            let mut writer = SnacWriter::new();
            writer.pstr(name).u16(0).u16(3); // name, warning level, TLV count
            writer.tlv(&Tlv::from_u16(tlv::USER_CLASS, 0x0010))?;
            writer.tlv(&Tlv::from_u32(tlv::SIGNON_TIME, info.signon_time))?;
            writer.tlv(&Tlv::from_u32(tlv::USER_STATUS, info.status.as_u32()))?;
            Ok(writer.finish())
        })
    }
}

impl std::fmt::Debug for OscarSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscarSession")
            .field("id", &self.id)
            .field("signon", &self.signon_state())
            .field("screen_name", &self.screen_name())
            .finish()
    }
}

/// Canonical form of a screen name for lookups
///
/// AIM screen names compare case-insensitively and ignore spaces, so
/// "Bob Dole" and "bobdole" address the same user.
pub fn normalize(screen_name: &str) -> String {
    screen_name
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}
