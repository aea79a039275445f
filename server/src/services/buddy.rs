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

//! Buddy list and presence (family 0x0003)
//!
//! A buddy upload replaces the session's watch list and triggers mutual
//! arrival notices: the uploader learns which of its buddies are online,
//! and each online buddy learns the uploader arrived. Departure notices
//! go out when a session signs off or its socket drops.

use super::{ServiceContext, SnacService};
use crate::session::{normalize, OscarSession};
use crate::Result;
use async_trait::async_trait;
use oscarix_flapcodec::consts::{family, subtype};
use oscarix_flapcodec::{Snac, SnacReader, SnacWriter, Tlv};
use std::collections::HashSet;
use std::sync::Arc;

/// Family 0x0003 service
pub struct BuddyService;

impl BuddyService {
    fn rights_reply(&self, snac: &Snac) -> Result<Snac> {
        let mut writer = SnacWriter::new();
        writer.tlv(&Tlv::from_u16(0x0001, 500))?; // max buddies
        writer.tlv(&Tlv::from_u16(0x0002, 750))?; // max watchers
        writer.tlv(&Tlv::from_u16(0x0003, 512))?; // max online notifications
        Ok(snac.reply(None, Some(subtype::BUDDY_RIGHTS_REPLY), None, writer.finish()))
    }

    /// Arrival notice carrying `subject`'s full user info block
    fn arrival_snac(subject: &OscarSession) -> Result<Snac> {
        Ok(Snac::with_body(
            family::BUDDY,
            subtype::BUDDY_ARRIVED,
            0,
            0,
            subject.user_info_block()?,
        ))
    }

    /// Departure notice; carries a minimal info block (no TLVs)
    fn departure_snac(screen_name: &str) -> Snac {
        let mut writer = SnacWriter::new();
        writer.pstr(screen_name).u16(0).u16(0);
        Snac::with_body(
            family::BUDDY,
            subtype::BUDDY_DEPARTED,
            0,
            0,
            writer.finish(),
        )
    }

    async fn handle_upload(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<()> {
        let mut reader = SnacReader::new(&snac.body);
        let mut buddies = HashSet::new();
        while !reader.remainder().is_empty() {
            buddies.insert(normalize(reader.pstr()?));
        }
        tracing::debug!(
            "Session {} uploaded {} buddies",
            session.id(),
            buddies.len()
        );
        session.with_info_mut(|info| info.buddies = buddies.clone());

        // a session with no name yet has nothing to announce
        if session.screen_name().is_none() {
            return Ok(());
        }

        for buddy_name in &buddies {
            let Some(buddy) = ctx.registry.find_by_screen_name(buddy_name) else {
                continue;
            };
            // uploader learns the buddy is online
            session.send_snac(&Self::arrival_snac(&buddy)?).await?;
            // the buddy learns the uploader arrived, whether or not it
            // watches the uploader back
            if let Err(e) = buddy.send_snac(&Self::arrival_snac(session)?).await {
                tracing::warn!("Failed to notify {}: {}", buddy.id(), e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnacService for BuddyService {
    fn family(&self) -> u16 {
        family::BUDDY
    }

    async fn process_snac(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::BUDDY_RIGHTS_QUERY => Ok(vec![self.rights_reply(snac)?]),
            subtype::BUDDY_ADD => {
                self.handle_upload(ctx, session, snac).await?;
                Ok(Vec::new())
            }
            other => {
                tracing::debug!("Ignoring buddy subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}

/// Announce that `departing` went offline to every online session watching it
///
/// Called on sign-off and on socket drop. Send failures to individual
/// watchers are logged, never propagated; one dead watcher must not stop
/// the rest of the broadcast.
pub async fn broadcast_departure(registry: &crate::SessionRegistry, departing: &OscarSession) {
    let Some(name) = departing.screen_name() else {
        return;
    };
    let wanted = normalize(&name);
    let notice = BuddyService::departure_snac(&name);

    for watcher in registry.authenticated_sessions() {
        if watcher.id() == departing.id() {
            continue;
        }
        let watches = watcher.with_info(|info| info.buddies.contains(&wanted));
        if watches {
            if let Err(e) = watcher.send_snac(&notice).await {
                tracing::warn!("Failed to send departure to {}: {}", watcher.id(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_departure_body_layout() {
        let snac = BuddyService::departure_snac("bob");
        assert_eq!(snac.subtype, subtype::BUDDY_DEPARTED);
        assert_eq!(
            snac.body.as_ref(),
            &[0x03, b'b', b'o', b'b', 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_rights_reply_tlvs() {
        let request = Snac::new(family::BUDDY, subtype::BUDDY_RIGHTS_QUERY, 0, 3);
        let reply = BuddyService.rights_reply(&request).unwrap();
        let tlvs = Tlv::decode_all(&reply.body).unwrap();
        assert_eq!(Tlv::find(&tlvs, 0x0001).unwrap().as_u16().unwrap(), 500);
        assert_eq!(Tlv::find(&tlvs, 0x0002).unwrap().as_u16().unwrap(), 750);
        assert_eq!(Tlv::find(&tlvs, 0x0003).unwrap().as_u16().unwrap(), 512);
    }
}
