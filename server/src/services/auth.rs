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

//! Authorization (family 0x0017)
//!
//! The MD5 challenge login flow carried over data frames: a key exchange
//! followed by a digest login. The digest is `md5(screenName + secret +
//! fixedString)` with the fixed protocol string required for historical
//! client compatibility. Success and failure replies reuse the same TLV
//! shapes as the channel-1 sign-on path, wrapped in a SNAC instead of a
//! bare FLAP; the server never closes the connection itself on a failed
//! MD5 login.

use super::{ServiceContext, SnacService};
use crate::session::{OscarSession, SignonState};
use crate::store::SessionRecord;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use md5::{Digest, Md5};
use oscarix_flapcodec::consts::{error_code, family, subtype, tlv, AIM_MD5_STRING};
use oscarix_flapcodec::{Snac, SnacWriter, Tlv};
use rand::Rng;
use std::sync::Arc;

/// Fresh 16-byte resume cookie
pub(crate) fn new_cookie() -> Bytes {
    let mut cookie = [0u8; 16];
    rand::thread_rng().fill(&mut cookie[..]);
    Bytes::copy_from_slice(&cookie)
}

/// Expected MD5 login digest for a screen name under the shared secret
pub(crate) fn expected_digest(screen_name: &str, secret: &str) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(screen_name.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(AIM_MD5_STRING.as_bytes());
    hasher.finalize().into()
}

/// TLV set for a successful login: screen name, BOS address, cookie
pub(crate) fn login_success_tlvs(
    screen_name: &str,
    bos_address: &str,
    cookie: &Bytes,
) -> Result<Bytes> {
    let mut writer = SnacWriter::new();
    writer.tlv(&Tlv::from_str(tlv::SCREEN_NAME, screen_name))?;
    writer.tlv(&Tlv::from_str(tlv::BOS_ADDRESS, bos_address))?;
    writer.tlv(&Tlv::new(tlv::COOKIE, cookie.clone()))?;
    Ok(writer.finish())
}

/// TLV set for a failed login: screen name, help URL, error code
pub(crate) fn login_failure_tlvs(screen_name: &str, error_url: &str) -> Result<Bytes> {
    let mut writer = SnacWriter::new();
    writer.tlv(&Tlv::from_str(tlv::SCREEN_NAME, screen_name))?;
    writer.tlv(&Tlv::from_str(tlv::ERROR_URL, error_url))?;
    writer.tlv(&Tlv::from_u16(tlv::ERROR_CODE, error_code::BAD_CREDENTIALS))?;
    Ok(writer.finish())
}

/// Family 0x0017 service
pub struct AuthService;

impl AuthService {
    /// Key exchange: hand out a challenge key of random digits
    ///
    /// The simplified login path never feeds the key into the digest, but
    /// clients expect the exchange before they will send CLI_MD5_LOGIN.
    fn key_reply(&self, snac: &Snac) -> Snac {
        let mut rng = rand::thread_rng();
        let key: String = (0..10).map(|_| rng.gen_range(b'0'..=b'9') as char).collect();
        let mut writer = SnacWriter::new();
        writer.u16(key.len() as u16).str(&key);
        snac.reply(None, Some(subtype::AUTH_KEY_REPLY), None, writer.finish())
    }

    async fn handle_md5_login(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        let tlvs = Tlv::decode_all(&snac.body)?;
        let screen_name = Tlv::find(&tlvs, tlv::SCREEN_NAME)
            .map(|t| t.as_str())
            .transpose()?;
        let digest = Tlv::find(&tlvs, tlv::MD5_DIGEST);

        let (Some(screen_name), Some(digest)) = (screen_name, digest) else {
            tracing::debug!("MD5 login from {} missing required TLVs", session.id());
            let body = login_failure_tlvs("", &ctx.config.error_url)?;
            return Ok(vec![snac.reply(None, Some(subtype::AUTH_LOGIN_REPLY), None, body)]);
        };

        let expected = expected_digest(screen_name, &ctx.config.password);
        if digest.value.as_ref() != expected {
            tracing::info!("MD5 login failed for {}", screen_name);
            let body = login_failure_tlvs(screen_name, &ctx.config.error_url)?;
            return Ok(vec![snac.reply(None, Some(subtype::AUTH_LOGIN_REPLY), None, body)]);
        }

        let user_agent = Tlv::find(&tlvs, tlv::CLIENT_ID)
            .and_then(|t| t.as_str().ok())
            .map(str::to_string);

        let cookie = new_cookie();
        ctx.session_store
            .save_session(SessionRecord {
                cookie: cookie.clone(),
                screen_name: screen_name.to_string(),
                user_agent,
            })
            .await;

        tracing::info!("MD5 login succeeded for {}", screen_name);
        let body = login_success_tlvs(screen_name, &ctx.config.bos_address, &cookie)?;
        Ok(vec![snac.reply(None, Some(subtype::AUTH_LOGIN_REPLY), None, body)])
    }
}

#[async_trait]
impl SnacService for AuthService {
    fn family(&self) -> u16 {
        family::AUTH
    }

    async fn process_snac(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::AUTH_KEY_QUERY => Ok(vec![self.key_reply(snac)]),
            subtype::AUTH_MD5_LOGIN => {
                // only honored after the client's bare version sign-on frame
                if session.signon_state() != SignonState::Md5HandshakeSeen {
                    tracing::debug!(
                        "MD5 login from {} outside the handshake",
                        session.id()
                    );
                    let body = login_failure_tlvs("", &ctx.config.error_url)?;
                    return Ok(vec![snac.reply(
                        None,
                        Some(subtype::AUTH_LOGIN_REPLY),
                        None,
                        body,
                    )]);
                }
                self.handle_md5_login(ctx, session, snac).await
            }
            other => {
                tracing::debug!("Ignoring auth subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}
