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

//! Generic service controls (family 0x0001)
//!
//! Handles the post-sign-on negotiation every client runs: family version
//! agreement, rate limit parameters, and the self-info query that doubles
//! as the client's "I am now online" signal.

use super::{ServiceContext, SnacService};
use crate::session::{OnlineStatus, OscarSession};
use crate::Result;
use async_trait::async_trait;
use oscarix_flapcodec::consts::{family, subtype};
use oscarix_flapcodec::{Snac, SnacReader, SnacWriter};
use std::sync::Arc;

/// Families this server's BOS side answers for, in wire order
const SUPPORTED_FAMILIES: [u16; 10] = [
    family::OSERVICE,
    family::LOCATE,
    family::BUDDY,
    family::ICBM,
    family::INVITE,
    family::PRIVACY,
    family::LOOKUP,
    family::STATS,
    family::ICQ,
    family::AUTH,
];

/// Build the host-online SNAC (0x0001/0x0003) listing supported families
///
/// Sent unprompted right after a successful cookie resume.
pub fn host_online_snac() -> Snac {
    let mut writer = SnacWriter::new();
    for fam in SUPPORTED_FAMILIES {
        writer.u16(fam);
    }
    Snac::with_body(
        family::OSERVICE,
        subtype::OSERVICE_HOST_ONLINE,
        0,
        0,
        writer.finish(),
    )
}

/// Family 0x0001 service
pub struct OserviceService;

impl OserviceService {
    /// Intersect the client's (family, version) pairs with what we support
    ///
    /// Never offers a family the client did not ask for; everything we do
    /// support is pinned to version 1.
    fn family_versions_reply(&self, snac: &Snac) -> Result<Snac> {
        let mut reader = SnacReader::new(&snac.body);
        let mut writer = SnacWriter::new();
        while !reader.remainder().is_empty() {
            let fam = reader.u16()?;
            let _requested_version = reader.u16()?;
            if SUPPORTED_FAMILIES.contains(&fam) {
                writer.u16(fam).u16(1);
            }
        }
        Ok(snac.reply(
            None,
            Some(subtype::OSERVICE_FAMILY_VERSIONS_REPLY),
            None,
            writer.finish(),
        ))
    }

    /// One rate class covering subtypes 0x00..=0x20 of every supported family
    fn rates_reply(&self, snac: &Snac) -> Snac {
        let mut writer = SnacWriter::new();
        writer.u16(1); // rate class count

        // class 1: window size, clear/alert/limit/disconnect thresholds,
        // current average, max average, last time, current state
        writer.u16(1);
        writer.u32(80); // window size
        writer.u32(2500); // clear level
        writer.u32(2000); // alert level
        writer.u32(1500); // limit level
        writer.u32(800); // disconnect level
        writer.u32(6000); // current average
        writer.u32(6000); // max average
        writer.u32(0); // last time
        writer.u8(0); // current state

        // group membership for class 1
        writer.u16(1);
        let pairs_per_family = 0x21u16;
        writer.u16(SUPPORTED_FAMILIES.len() as u16 * pairs_per_family);
        for fam in SUPPORTED_FAMILIES {
            for sub in 0..pairs_per_family {
                writer.u16(fam).u16(sub);
            }
        }

        snac.reply(
            None,
            Some(subtype::OSERVICE_RATES_REPLY),
            None,
            writer.finish(),
        )
    }
}

#[async_trait]
impl SnacService for OserviceService {
    fn family(&self) -> u16 {
        family::OSERVICE
    }

    async fn process_snac(
        &self,
        _ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        match snac.subtype {
            subtype::OSERVICE_FAMILY_VERSIONS => Ok(vec![self.family_versions_reply(snac)?]),
            subtype::OSERVICE_RATES_QUERY => Ok(vec![self.rates_reply(snac)]),
            subtype::OSERVICE_RATES_ACK => Ok(Vec::new()),
            subtype::OSERVICE_SELF_INFO_QUERY => {
                // the self-info query is the client's "I'm ready" signal
                session.with_info_mut(|info| info.status = OnlineStatus::Online);
                let block = session.user_info_block()?;
                Ok(vec![snac.reply(
                    None,
                    Some(subtype::OSERVICE_SELF_INFO_REPLY),
                    None,
                    block,
                )])
            }
            other => {
                tracing::debug!("Ignoring oservice subtype {:#06x}", other);
                Ok(Vec::new())
            }
        }
    }
}
