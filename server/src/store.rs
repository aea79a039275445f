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

//! Pluggable persistence seams
//!
//! The server only needs two stores: issued login cookies (for the
//! reconnect-with-cookie flow) and a user directory (for email lookups).
//! Both are traits so deployments can back them with a real database; the
//! in-memory implementations here are the defaults and what the tests use.

use crate::session::normalize;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

/// A cookie issued at login, redeemable on a fresh connection
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Opaque cookie bytes handed to the client
    pub cookie: Bytes,
    /// Screen name the cookie was issued to
    pub screen_name: String,
    /// Client identification string captured at login
    pub user_agent: Option<String>,
}

/// Storage for login cookies
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up the record for a presented cookie
    async fn get_session_by_cookie(&self, cookie: &[u8]) -> Option<SessionRecord>;

    /// Persist a record for a freshly issued cookie
    async fn save_session(&self, record: SessionRecord);
}

/// Directory of known users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether a screen name is registered
    async fn user_exists(&self, screen_name: &str) -> bool;
}

/// In-memory cookie store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: DashMap<Bytes, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session_by_cookie(&self, cookie: &[u8]) -> Option<SessionRecord> {
        self.records
            .get(cookie)
            .map(|entry| entry.value().clone())
    }

    async fn save_session(&self, record: SessionRecord) {
        self.records.insert(record.cookie.clone(), record);
    }
}

/// In-memory user directory keyed by normalized screen name
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: DashMap<String, ()>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a screen name
    pub fn add_user(&self, screen_name: &str) {
        self.users.insert(normalize(screen_name), ());
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn user_exists(&self, screen_name: &str) -> bool {
        self.users.contains_key(&normalize(screen_name))
    }
}
