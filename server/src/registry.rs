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

//! Registry of live sessions
//!
//! Concurrent map from connection id to session. Screen-name lookups scan
//! the map and only ever match authenticated sessions, so a half-signed-on
//! connection can never receive relayed traffic.

use crate::session::{normalize, OscarSession};
use dashmap::DashMap;
use oscarix_service::ConnectionId;
use std::sync::Arc;

/// Concurrent registry of live OSCAR sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Arc<OscarSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session for the given connection
    pub fn register(&self, session: Arc<OscarSession>) {
        tracing::debug!("Registering session {}", session.id());
        self.sessions.insert(session.id(), session);
    }

    /// Stop tracking the session for the given connection
    ///
    /// Returns the removed session so the caller can still broadcast its
    /// departure.
    pub fn unregister(&self, id: ConnectionId) -> Option<Arc<OscarSession>> {
        self.sessions.remove(&id).map(|(_, session)| session)
    }

    /// Session for the given connection id
    pub fn get(&self, id: ConnectionId) -> Option<Arc<OscarSession>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Authenticated session signed on as the given screen name
    ///
    /// Comparison uses the normalized form, so case and spacing in the
    /// query do not matter.
    pub fn find_by_screen_name(&self, screen_name: &str) -> Option<Arc<OscarSession>> {
        let wanted = normalize(screen_name);
        self.sessions.iter().find_map(|entry| {
            let session = entry.value();
            if !session.is_authenticated() {
                return None;
            }
            session
                .screen_name()
                .filter(|name| normalize(name) == wanted)
                .map(|_| session.clone())
        })
    }

    /// Claim a screen name for the given session
    ///
    /// If another authenticated session already holds the name, the newer
    /// login wins: the older session is removed from the registry and
    /// returned so the caller can notify and close it.
    pub fn claim_screen_name(
        &self,
        screen_name: &str,
        claimant: ConnectionId,
    ) -> Option<Arc<OscarSession>> {
        let displaced = self
            .find_by_screen_name(screen_name)
            .filter(|session| session.id() != claimant)?;
        tracing::info!(
            "Screen name {} claimed by {}, displacing {}",
            screen_name,
            claimant,
            displaced.id()
        );
        self.sessions.remove(&displaced.id());
        Some(displaced)
    }

    /// All authenticated sessions
    pub fn authenticated_sessions(&self) -> Vec<Arc<OscarSession>> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_authenticated())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of tracked sessions, authenticated or not
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
