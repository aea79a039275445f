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

//! Location services (family 0x0002)
//!
//! Profiles, away messages, and capabilities. Set-info stores whatever mix
//! of fields the client sent; user-info queries return the target's info
//! block plus only the requested field, and only if the target has set it.

use super::{ServiceContext, SnacService};
use crate::session::OscarSession;
use crate::Result;
use async_trait::async_trait;
use oscarix_flapcodec::consts::{error_code, family, subtype, tlv};
use oscarix_flapcodec::{Snac, SnacReader, SnacWriter, Tlv};
use std::sync::Arc;

/// Info type selector in a user-info query
const INFO_TYPE_PROFILE: u16 = 0x0001;
const INFO_TYPE_AWAY: u16 = 0x0003;

/// Family 0x0002 service
pub struct LocateService;

impl LocateService {
    fn rights_reply(&self, snac: &Snac) -> Result<Snac> {
        let mut writer = SnacWriter::new();
        writer.tlv(&Tlv::from_u16(0x0001, 1024))?; // max profile length
        Ok(snac.reply(None, Some(subtype::LOCATE_RIGHTS_REPLY), None, writer.finish()))
    }

    fn handle_set_info(&self, session: &Arc<OscarSession>, snac: &Snac) -> Result<()> {
        let tlvs = Tlv::decode_all(&snac.body)?;

        let profile_mime = Tlv::find(&tlvs, tlv::PROFILE_MIME);
        let profile_text = Tlv::find(&tlvs, tlv::PROFILE_TEXT);
        let away_mime = Tlv::find(&tlvs, tlv::AWAY_MIME);
        let away_text = Tlv::find(&tlvs, tlv::AWAY_TEXT);
        let capabilities = Tlv::find(&tlvs, tlv::CAPABILITIES);

        let profile = match (profile_mime, profile_text) {
            (Some(mime), Some(text)) => {
                Some((mime.as_str()?.to_string(), text.as_str()?.to_string()))
            }
            _ => None,
        };

        // an away TLV with empty text means "back"; absent means unchanged
        enum AwayUpdate {
            Unchanged,
            Clear,
            Set(String, String),
        }
        let away = match away_text {
            None => AwayUpdate::Unchanged,
            Some(text) if text.value.is_empty() => AwayUpdate::Clear,
            Some(text) => {
                let mime = away_mime.map(|m| m.as_str()).transpose()?.unwrap_or("text/plain");
                AwayUpdate::Set(mime.to_string(), text.as_str()?.to_string())
            }
        };

        let caps: Option<Vec<[u8; 16]>> = match capabilities {
            Some(blob) => Some(
                blob.value
                    .chunks_exact(16)
                    .map(|chunk| {
                        let mut uuid = [0u8; 16];
                        uuid.copy_from_slice(chunk);
                        uuid
                    })
                    .collect(),
            ),
            None => None,
        };

        session.with_info_mut(|info| {
            if let Some(profile) = profile {
                info.profile = Some(profile);
            }
            match away {
                AwayUpdate::Unchanged => {}
                AwayUpdate::Clear => info.away_message = None,
                AwayUpdate::Set(mime, text) => info.away_message = Some((mime, text)),
            }
            if let Some(caps) = caps {
                info.capabilities = caps;
            }
        });
        Ok(())
    }

    async fn handle_user_info_query(
        &self,
        ctx: &ServiceContext,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        let mut reader = SnacReader::new(&snac.body);
        let info_type = reader.u16()?;
        let target_name = reader.pstr()?;

        let Some(target) = ctx.registry.find_by_screen_name(target_name) else {
            return Ok(vec![snac.error_reply(error_code::USER_OFFLINE)]);
        };

        let mut writer = SnacWriter::new();
        writer.bytes(&target.user_info_block()?);

        let field = target.with_info(|info| match info_type {
            INFO_TYPE_PROFILE => info.profile.clone(),
            INFO_TYPE_AWAY => info.away_message.clone(),
            _ => None,
        });
        if let Some((mime, text)) = field {
            let (mime_kind, text_kind) = if info_type == INFO_TYPE_AWAY {
                (tlv::AWAY_MIME, tlv::AWAY_TEXT)
            } else {
                (tlv::PROFILE_MIME, tlv::PROFILE_TEXT)
            };
            writer.tlv(&Tlv::from_str(mime_kind, &mime))?;
            writer.tlv(&Tlv::from_str(text_kind, &text))?;
        }

        Ok(vec![snac.reply(
            None,
            Some(subtype::LOCATE_USER_INFO_REPLY),
            None,
            writer.finish(),
        )])
    }
}

#[async_trait]
impl SnacService for LocateService {
    fn family(&self) -> u16 {
        family::LOCATE
    }

    async fn process_snac(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::LOCATE_RIGHTS_QUERY => Ok(vec![self.rights_reply(snac)?]),
            subtype::LOCATE_SET_INFO => {
                self.handle_set_info(session, snac)?;
                Ok(Vec::new())
            }
            subtype::LOCATE_USER_INFO_QUERY => self.handle_user_info_query(ctx, snac).await,
            other => {
                tracing::debug!("Ignoring locate subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rights_reply_carries_profile_limit() {
        let request = Snac::new(family::LOCATE, subtype::LOCATE_RIGHTS_QUERY, 0, 2);
        let reply = LocateService.rights_reply(&request).unwrap();
        let tlvs = Tlv::decode_all(&reply.body).unwrap();
        assert_eq!(Tlv::find(&tlvs, 0x0001).unwrap().as_u16().unwrap(), 1024);
    }
}
