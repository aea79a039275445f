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

//! SNAC service dispatch
//!
//! Each SNAC family the server speaks is a [`SnacService`]. The
//! [`SnacRouter`] keys services by family number and routes every decoded
//! data-channel SNAC to the matching service; frames for unknown families
//! or subtypes are logged and dropped without touching the connection.
//!
//! Services return the SNACs to send back to the requesting session.
//! Side-effect traffic to *other* sessions (arrival notices, relayed
//! messages) is sent directly through the registry inside the service.

pub(crate) mod auth;
mod buddy;
mod icbm;
mod icq;
mod locate;
mod oservice;
mod stubs;

pub use self::auth::AuthService;
pub use self::buddy::{broadcast_departure, BuddyService};
pub use self::icbm::IcbmService;
pub use self::icq::IcqService;
pub use self::locate::LocateService;
pub use self::oservice::{host_online_snac, OserviceService};
pub use self::stubs::{InviteService, LookupService, PrivacyService, StatsService};

use crate::{OscarConfig, Result, SessionRegistry, SessionStore, UserDirectory};
use crate::session::OscarSession;
use async_trait::async_trait;
use oscarix_flapcodec::Snac;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared state handed to every service invocation
#[derive(Clone)]
pub struct ServiceContext {
    pub registry: Arc<SessionRegistry>,
    pub session_store: Arc<dyn SessionStore>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub config: OscarConfig,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("sessions", &self.registry.len())
            .finish()
    }
}

/// Handler for one SNAC family
#[async_trait]
pub trait SnacService: Send + Sync {
    /// Family number this service answers for
    fn family(&self) -> u16;

    /// Process one inbound SNAC, returning the replies for the sender
    ///
    /// Errors are reserved for malformed payloads and I/O failures; they
    /// terminate the sending connection. Business failures answer with an
    /// error SNAC in the returned vector instead.
    async fn process_snac(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>>;
}

/// Family-keyed dispatch table
pub struct SnacRouter {
    services: HashMap<u16, Box<dyn SnacService>>,
}

impl SnacRouter {
    /// Empty router
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Router preloaded with every family the server implements
    pub fn with_core_services() -> Self {
        let mut router = Self::new();
        router.register(Box::new(OserviceService));
        router.register(Box::new(LocateService));
        router.register(Box::new(BuddyService));
        router.register(Box::new(IcbmService));
        router.register(Box::new(InviteService));
        router.register(Box::new(PrivacyService));
        router.register(Box::new(LookupService));
        router.register(Box::new(StatsService));
        router.register(Box::new(IcqService));
        router.register(Box::new(AuthService));
        router
    }

    /// Register a service, replacing any previous one for its family
    pub fn register(&mut self, service: Box<dyn SnacService>) {
        self.services.insert(service.family(), service);
    }

    /// Family numbers with a registered service
    pub fn supported_families(&self) -> Vec<u16> {
        let mut families: Vec<u16> = self.services.keys().copied().collect();
        families.sort_unstable();
        families
    }

    /// Route one inbound SNAC and send the replies back to the session
    pub async fn dispatch(
        &self,
        ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: Snac,
    ) -> Result<()> {
        let Some(service) = self.services.get(&snac.family) else {
            tracing::debug!(
                "Ignoring SNAC for unsupported family {:#06x} from {}",
                snac.family,
                session.id()
            );
            return Ok(());
        };

        let replies = service.process_snac(ctx, session, &snac).await?;
        for reply in &replies {
            session.send_snac(reply).await?;
        }
        Ok(())
    }
}

impl Default for SnacRouter {
    fn default() -> Self {
        Self::with_core_services()
    }
}

impl std::fmt::Debug for SnacRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnacRouter")
            .field("families", &self.supported_families())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oscarix_flapcodec::consts::family;

    #[test]
    fn test_core_router_covers_all_families() {
        let router = SnacRouter::with_core_services();
        let families = router.supported_families();
        for expected in [
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
        ] {
            assert!(families.contains(&expected), "missing family {expected:#06x}");
        }
    }
}
