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

//! Thin fixed-shape services: privacy (0x0009), directory lookup (0x000A),
//! invitation (0x0006), and usage statistics (0x000B)
//!
//! Legacy clients probe these during sign-on; each answers with a minimal
//! rights or acknowledgement SNAC so the client proceeds. Lookup is the
//! only one with real logic: it consults the user directory.

use super::{ServiceContext, SnacService};
use crate::session::OscarSession;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use oscarix_flapcodec::consts::{error_code, family, subtype};
use oscarix_flapcodec::{Snac, SnacWriter, Tlv};
use std::sync::Arc;

/// Family 0x0009 service
pub struct PrivacyService;

#[async_trait]
impl SnacService for PrivacyService {
    fn family(&self) -> u16 {
        family::PRIVACY
    }

    async fn process_snac(
        &self,
        _ctx: &ServiceContext,
        _session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::PRIVACY_RIGHTS_QUERY => {
                let mut writer = SnacWriter::new();
                writer.tlv(&Tlv::from_u16(0x0001, 200))?; // max visible entries
                writer.tlv(&Tlv::from_u16(0x0002, 200))?; // max invisible entries
                Ok(vec![snac.reply(
                    None,
                    Some(subtype::PRIVACY_RIGHTS_REPLY),
                    None,
                    writer.finish(),
                )])
            }
            other => {
                tracing::debug!("Ignoring privacy subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}

/// Family 0x000A service
pub struct LookupService;

#[async_trait]
impl SnacService for LookupService {
    fn family(&self) -> u16 {
        family::LOOKUP
    }

    async fn process_snac(
        &self,
        ctx: &ServiceContext,
        _session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::LOOKUP_EMAIL_QUERY => {
                // body is the bare email address; the mailbox half doubles
                // as the screen name to probe
                let email = String::from_utf8_lossy(&snac.body).into_owned();
                let screen_name = email.split('@').next().unwrap_or(&email);
                if ctx.user_directory.user_exists(screen_name).await {
                    let mut writer = SnacWriter::new();
                    writer.tlv(&Tlv::from_str(0x0001, &email))?;
                    Ok(vec![snac.reply(
                        None,
                        Some(subtype::LOOKUP_EMAIL_REPLY),
                        None,
                        writer.finish(),
                    )])
                } else {
                    Ok(vec![snac.error_reply(error_code::NO_MATCH)])
                }
            }
            other => {
                tracing::debug!("Ignoring lookup subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}

/// Family 0x0006 service
pub struct InviteService;

#[async_trait]
impl SnacService for InviteService {
    fn family(&self) -> u16 {
        family::INVITE
    }

    async fn process_snac(
        &self,
        _ctx: &ServiceContext,
        _session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::INVITE_REQUEST => {
                Ok(vec![snac.reply(None, Some(subtype::INVITE_ACK), None, Bytes::new())])
            }
            other => {
                tracing::debug!("Ignoring invite subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}

/// Family 0x000B service
pub struct StatsService;

#[async_trait]
impl SnacService for StatsService {
    fn family(&self) -> u16 {
        family::STATS
    }

    async fn process_snac(
        &self,
        _ctx: &ServiceContext,
        _session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::STATS_REPORT => {
                Ok(vec![snac.reply(None, Some(subtype::STATS_REPORT_ACK), None, Bytes::new())])
            }
            other => {
                tracing::debug!("Ignoring stats subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}
