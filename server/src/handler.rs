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

//! OSCAR protocol handler bound to the connection substrate
//!
//! Bridges raw socket bytes to the protocol: accumulates per-connection
//! read buffers, decodes FLAP frames, drives the sign-on state machine for
//! sign-on frames, and routes data frames through the SNAC service table.
//!
//! Frame processing is sequential per connection (the substrate runs one
//! worker per socket), so the per-connection decode state needs no lock
//! beyond the map entry guard, which is never held across an await.

use crate::services::{auth, broadcast_departure, host_online_snac, ServiceContext, SnacRouter};
use crate::session::{normalize, OscarSession, SignonState};
use crate::store::SessionRecord;
use crate::{OscarError, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use oscarix_flapcodec::consts::tlv;
use oscarix_flapcodec::{roast, Flap, FlapCodec, FlapKind, Snac, Tlv};
use oscarix_service::{Connection, ConnectionId, HandlerOutcome, ServiceError, ServiceHandler};
use std::sync::Arc;
use tokio_util::codec::Decoder;

/// Greeting payload: FLAP protocol version 1
const SIGNON_VERSION: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Per-connection decode state
struct ConnState {
    codec: FlapCodec,
    buffer: BytesMut,
}

/// [`ServiceHandler`] implementing the OSCAR protocol
pub struct OscarHandler {
    ctx: ServiceContext,
    router: SnacRouter,
    states: DashMap<ConnectionId, ConnState>,
}

impl OscarHandler {
    /// Create a handler over the given shared context
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            router: SnacRouter::with_core_services(),
            states: DashMap::new(),
        }
    }

    /// Decode every complete frame buffered for the connection
    ///
    /// Trailing partial frames stay in the buffer for the next read.
    fn drain_frames(&self, id: ConnectionId, data: &[u8]) -> Result<Vec<Flap>> {
        let Some(mut state) = self.states.get_mut(&id) else {
            return Err(OscarError::SessionNotFound(id));
        };
        state.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        let ConnState { codec, buffer } = &mut *state;
        while let Some(flap) = codec.decode(buffer)? {
            frames.push(flap);
        }
        Ok(frames)
    }

    async fn process_flap(
        &self,
        session: &Arc<OscarSession>,
        flap: Flap,
    ) -> Result<HandlerOutcome> {
        match flap.kind {
            FlapKind::SignOn => self.process_signon(session, &flap.payload).await,
            FlapKind::Data => {
                let snac = Snac::decode(&flap.payload)?;
                self.router.dispatch(&self.ctx, session, snac).await?;
                Ok(HandlerOutcome::Continue)
            }
            FlapKind::SignOff => {
                tracing::info!("Session {} signed off", session.id());
                if let Some(departing) = self.ctx.registry.unregister(session.id()) {
                    if departing.is_authenticated() {
                        broadcast_departure(&self.ctx.registry, &departing).await;
                    }
                }
                Ok(HandlerOutcome::Disconnect)
            }
            FlapKind::KeepAlive => Ok(HandlerOutcome::Continue),
            FlapKind::Error => {
                tracing::warn!("Error frame from {}", session.id());
                Ok(HandlerOutcome::Continue)
            }
        }
    }

    /// Sign-on frame state machine
    ///
    /// A bare 4-byte payload is the version marker of the MD5 login path;
    /// everything else carries TLVs after the 4-byte version prefix. Two or
    /// more TLVs is a channel-1 roasted-password login; exactly one is a
    /// cookie resume.
    async fn process_signon(
        &self,
        session: &Arc<OscarSession>,
        payload: &Bytes,
    ) -> Result<HandlerOutcome> {
        if payload.len() == 4 {
            session.set_signon_state(SignonState::Md5HandshakeSeen);
            tracing::debug!("Session {} entered MD5 handshake", session.id());
            return Ok(HandlerOutcome::Continue);
        }
        if payload.len() < 4 {
            return Err(OscarError::MalformedPayload(
                "sign-on frame",
                format!("{} bytes, need at least 4", payload.len()),
            ));
        }

        let tlvs = Tlv::decode_all(&payload[4..])?;
        match tlvs.len() {
            0 => {
                tracing::debug!("Empty sign-on frame from {}", session.id());
                Ok(HandlerOutcome::Continue)
            }
            1 => self.resume_with_cookie(session, &tlvs).await,
            _ => self.channel1_login(session, &tlvs).await,
        }
    }

    /// Channel-1 login: screen name plus roasted password
    async fn channel1_login(
        &self,
        session: &Arc<OscarSession>,
        tlvs: &[Tlv],
    ) -> Result<HandlerOutcome> {
        let screen_name = Tlv::find(tlvs, tlv::SCREEN_NAME)
            .map(|t| t.as_str())
            .transpose()?;
        let roasted = Tlv::find(tlvs, tlv::ROASTED_PASSWORD);

        let (Some(screen_name), Some(roasted)) = (screen_name, roasted) else {
            tracing::debug!("Channel-1 login from {} missing TLVs", session.id());
            let body = auth::login_failure_tlvs("", &self.ctx.config.error_url)?;
            session.send_flap(FlapKind::SignOff, body).await?;
            return Ok(HandlerOutcome::Continue);
        };

        let presented = roast(&roasted.value);
        if presented != self.ctx.config.password.as_bytes() {
            tracing::info!("Channel-1 login failed for {}", screen_name);
            let body = auth::login_failure_tlvs(screen_name, &self.ctx.config.error_url)?;
            session.send_flap(FlapKind::SignOff, body).await?;
            return Ok(HandlerOutcome::Continue);
        }

        let user_agent = Tlv::find(tlvs, tlv::CLIENT_ID)
            .and_then(|t| t.as_str().ok())
            .map(str::to_string);

        let cookie = auth::new_cookie();
        self.ctx
            .session_store
            .save_session(SessionRecord {
                cookie: cookie.clone(),
                screen_name: screen_name.to_string(),
                user_agent,
            })
            .await;

        tracing::info!("Channel-1 login succeeded for {}", screen_name);
        let body =
            auth::login_success_tlvs(screen_name, &self.ctx.config.bos_address, &cookie)?;
        session.send_flap(FlapKind::SignOff, body).await?;
        // the client reconnects to the BOS address with its cookie
        Ok(HandlerOutcome::Disconnect)
    }

    /// Cookie resume: redeem a stored cookie on a fresh connection
    async fn resume_with_cookie(
        &self,
        session: &Arc<OscarSession>,
        tlvs: &[Tlv],
    ) -> Result<HandlerOutcome> {
        let Some(cookie) = Tlv::find(tlvs, tlv::COOKIE) else {
            tracing::debug!("Single-TLV sign-on from {} without cookie", session.id());
            let body = auth::login_failure_tlvs("", &self.ctx.config.error_url)?;
            session.send_flap(FlapKind::SignOff, body).await?;
            return Ok(HandlerOutcome::Disconnect);
        };

        let Some(record) = self
            .ctx
            .session_store
            .get_session_by_cookie(&cookie.value)
            .await
        else {
            tracing::info!("Unknown cookie presented by {}", session.id());
            let body = auth::login_failure_tlvs("", &self.ctx.config.error_url)?;
            session.send_flap(FlapKind::SignOff, body).await?;
            return Ok(HandlerOutcome::Disconnect);
        };

        session.authenticate(&record.screen_name, Some(cookie.value.clone()));
        session.with_info_mut(|info| info.user_agent = record.user_agent.clone());

        // last login wins: displace any older session holding this name
        if let Some(displaced) = self
            .ctx
            .registry
            .claim_screen_name(&record.screen_name, session.id())
        {
            let _ = displaced
                .send_flap(FlapKind::SignOff, Bytes::new())
                .await;
            displaced.shutdown().await;
        }

        tracing::info!(
            "Session {} resumed as {} ({})",
            session.id(),
            record.screen_name,
            normalize(&record.screen_name)
        );
        session.send_snac(&host_online_snac()).await?;
        Ok(HandlerOutcome::Continue)
    }
}

#[async_trait]
impl ServiceHandler for OscarHandler {
    async fn on_connect(&self, id: ConnectionId, conn: &Connection) -> oscarix_service::Result<()> {
        let session = Arc::new(OscarSession::new(id, conn.clone()));
        self.ctx.registry.register(session.clone());
        self.states.insert(
            id,
            ConnState {
                codec: FlapCodec::new(),
                buffer: BytesMut::new(),
            },
        );
        session
            .send_flap(FlapKind::SignOn, Bytes::copy_from_slice(&SIGNON_VERSION))
            .await?;
        Ok(())
    }

    async fn on_data(
        &self,
        id: ConnectionId,
        _conn: &Connection,
        data: Bytes,
    ) -> oscarix_service::Result<HandlerOutcome> {
        let frames = self.drain_frames(id, &data)?;

        let session = self
            .ctx
            .registry
            .get(id)
            .ok_or(OscarError::SessionNotFound(id))?;

        for flap in frames {
            if let HandlerOutcome::Disconnect = self.process_flap(&session, flap).await? {
                return Ok(HandlerOutcome::Disconnect);
            }
        }
        Ok(HandlerOutcome::Continue)
    }

    async fn on_error(&self, id: ConnectionId, _conn: &Connection, error: &ServiceError) {
        tracing::warn!("Connection {} failed: {}", id, error);
    }

    async fn on_disconnect(&self, id: ConnectionId, _conn: &Connection) {
        self.states.remove(&id);
        // the sign-off path unregisters first, so this only fires for
        // sockets that dropped without a clean sign-off
        if let Some(departing) = self.ctx.registry.unregister(id) {
            if departing.is_authenticated() {
                tracing::info!(
                    "Session {} ({:?}) dropped, broadcasting departure",
                    id,
                    departing.screen_name()
                );
                broadcast_departure(&self.ctx.registry, &departing).await;
            }
        }
    }
}

impl std::fmt::Debug for OscarHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscarHandler")
            .field("router", &self.router)
            .field("tracked", &self.states.len())
            .finish()
    }
}
