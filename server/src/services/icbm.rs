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

//! Instant messaging (family 0x0004)
//!
//! Relays channel-1 messages between online sessions. The message content
//! TLV travels verbatim from sender to recipient; the server rewrites only
//! the envelope, replacing the target name with the sender's info block.
//! A message to an offline or unknown user earns the sender an error SNAC
//! with code 0x0004 and nothing else; the connection stays up.

use super::{ServiceContext, SnacService};
use crate::session::OscarSession;
use crate::{OscarError, Result};
use async_trait::async_trait;
use oscarix_flapcodec::consts::{error_code, family, subtype, tlv};
use oscarix_flapcodec::{Snac, SnacReader, SnacWriter, Tlv};
use std::sync::Arc;

/// Family 0x0004 service
pub struct IcbmService;

impl IcbmService {
    fn params_reply(&self, snac: &Snac) -> Snac {
        let mut writer = SnacWriter::new();
        writer.u16(1); // channel
        writer.u32(0x0000_0003); // flags: messages + missed-call notices
        writer.u16(8000); // max message size
        writer.u16(999); // max sender warning level
        writer.u16(999); // max receiver warning level
        writer.u32(0); // minimum message interval
        snac.reply(None, Some(subtype::ICBM_PARAMS_REPLY), None, writer.finish())
    }

    async fn handle_send(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        let mut reader = SnacReader::new(&snac.body);
        let cookie = reader.u64()?;
        let channel = reader.u16()?;
        let target_name = reader.pstr()?.to_string();
        let tlvs = Tlv::decode_all(reader.remainder())?;

        let Some(message) = Tlv::find(&tlvs, tlv::ICBM_MESSAGE) else {
            return Err(OscarError::MalformedPayload(
                "ICBM send",
                "missing message TLV 0x0002".to_string(),
            ));
        };

        let Some(target) = ctx.registry.find_by_screen_name(&target_name) else {
            tracing::debug!(
                "Message from {} to offline user {}",
                session.id(),
                target_name
            );
            return Ok(vec![snac.error_reply(error_code::USER_OFFLINE)]);
        };

        // incoming message: cookie, channel, sender info block, message TLV
        let mut writer = SnacWriter::new();
        writer.u64(cookie).u16(channel);
        writer.bytes(&session.user_info_block()?);
        writer.tlv(message)?;
        let incoming = Snac::with_body(
            family::ICBM,
            subtype::ICBM_INCOMING,
            0,
            0,
            writer.finish(),
        );
        target.send_snac(&incoming).await?;

        // host ack back to the sender: cookie, channel, target name
        let mut writer = SnacWriter::new();
        writer.u64(cookie).u16(channel).pstr(&target_name);
        Ok(vec![snac.reply(
            None,
            Some(subtype::ICBM_HOST_ACK),
            None,
            writer.finish(),
        )])
    }
}

#[async_trait]
impl SnacService for IcbmService {
    fn family(&self) -> u16 {
        family::ICBM
    }

    async fn process_snac(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::ICBM_SET_PARAMS => Ok(Vec::new()),
            subtype::ICBM_PARAMS_QUERY => Ok(vec![self.params_reply(snac)]),
            subtype::ICBM_SEND => self.handle_send(ctx, session, snac).await,
            other => {
                tracing::debug!("Ignoring ICBM subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}
