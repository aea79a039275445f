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

//! # Oscarix Server
//!
//! An OSCAR (AIM/ICQ) instant-messaging server built on the
//! `oscarix-service` connection substrate and the `oscarix-flapcodec`
//! wire stack.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     OscarServer                     │
//! │  ┌───────────────┐      ┌─────────────────────────┐ │
//! │  │ oscarix-      │ data │       OscarHandler      │ │
//! │  │ service       ├─────►│ FLAP decode → sign-on   │ │
//! │  │ (TCP workers) │      │ state machine → SNAC    │ │
//! │  └───────────────┘      │ router                  │ │
//! │                         └───────────┬─────────────┘ │
//! │  ┌────────────────┐     ┌───────────▼─────────────┐ │
//! │  │ SessionRegistry│◄────┤ services: auth, locate, │ │
//! │  │ (presence,     │     │ buddy, ICBM, ICQ meta,  │ │
//! │  │  message relay)│     │ privacy/lookup/invite/  │ │
//! │  └────────────────┘     │ stats                   │ │
//! │                         └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every accepted socket gets one session. Sign-on happens either over
//! channel-1 FLAP frames (roasted password, then a cookie handed back for
//! reconnection) or over data frames (MD5 challenge login). Authenticated
//! sessions exchange presence through the buddy service and messages
//! through ICBM; the registry lets any session's worker write to any
//! other session's socket.

mod config;
mod error;
mod handler;
mod registry;
mod server;
mod session;
mod store;

pub mod services;

pub use config::OscarConfig;
pub use error::{OscarError, Result};
pub use handler::OscarHandler;
pub use registry::SessionRegistry;
pub use server::OscarServer;
pub use session::{normalize, OnlineStatus, OscarSession, SessionInfo, SignonState};
pub use store::{
    MemorySessionStore, MemoryUserDirectory, SessionRecord, SessionStore, UserDirectory,
};
