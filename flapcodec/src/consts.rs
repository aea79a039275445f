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

//! OSCAR protocol constants.
//!
//! Numeric identifiers for SNAC families and subtypes, TLV type codes, and
//! the fixed values the protocol requires bit-for-bit for interoperability
//! with historical clients.

/// The well-known OSCAR/AIM listening port.
pub const DEFAULT_PORT: u16 = 5190;

/// FLAP marker byte; every frame starts with `'*'`.
pub const FLAP_MARKER: u8 = 0x2A;

/// Length of a FLAP header (marker, kind, sequence, length).
pub const FLAP_HEADER_LEN: usize = 6;

/// Length of a SNAC header (family, subtype, flags, request id).
pub const SNAC_HEADER_LEN: usize = 10;

/// The fixed 16-byte XOR key used for the password "roast" obfuscation.
///
/// This key is part of the wire contract; it must match byte-for-byte or
/// historical clients cannot authenticate.
pub const ROAST_KEY: [u8; 16] = [
    0xF3, 0x26, 0x81, 0xC4, 0x39, 0x86, 0xDB, 0x92, 0x71, 0xA3, 0xB9, 0xE6, 0x53, 0x7A, 0x95, 0x7C,
];

/// The fixed protocol string appended when computing the MD5 login digest.
///
/// The digest is `md5(screen_name + shared_secret + AIM_MD5_STRING)`.
pub const AIM_MD5_STRING: &str = "AOL Instant Messenger (SM)";

/// SNAC family identifiers.
pub mod family {
    /// Generic service controls: family negotiation, rate limits, self info.
    pub const OSERVICE: u16 = 0x0001;
    /// Location services: profiles, away messages, capabilities.
    pub const LOCATE: u16 = 0x0002;
    /// Buddy list management and presence notification.
    pub const BUDDY: u16 = 0x0003;
    /// Inter-client basic messaging (instant messages).
    pub const ICBM: u16 = 0x0004;
    /// Invitation service.
    pub const INVITE: u16 = 0x0006;
    /// Privacy management.
    pub const PRIVACY: u16 = 0x0009;
    /// User directory lookup.
    pub const LOOKUP: u16 = 0x000A;
    /// Usage statistics.
    pub const STATS: u16 = 0x000B;
    /// ICQ extended profile ("meta") service.
    pub const ICQ: u16 = 0x0015;
    /// Authorization and registration.
    pub const AUTH: u16 = 0x0017;
}

/// Subtype identifiers within each family.
///
/// Every family reserves subtype `0x01` for its error report.
pub mod subtype {
    /// Family-local error report (all families).
    pub const ERROR: u16 = 0x0001;

    // family 0x0001 — generic service controls
    /// Server lists the families it supports (sent after sign-on).
    pub const OSERVICE_HOST_ONLINE: u16 = 0x0003;
    /// Client requests rate limit parameters.
    pub const OSERVICE_RATES_QUERY: u16 = 0x0006;
    /// Server reports rate limit parameters.
    pub const OSERVICE_RATES_REPLY: u16 = 0x0007;
    /// Client acknowledges rate limit parameters.
    pub const OSERVICE_RATES_ACK: u16 = 0x0008;
    /// Client requests its own user info.
    pub const OSERVICE_SELF_INFO_QUERY: u16 = 0x000E;
    /// Server reports the requester's user info.
    pub const OSERVICE_SELF_INFO_REPLY: u16 = 0x000F;
    /// Client reports the family versions it speaks.
    pub const OSERVICE_FAMILY_VERSIONS: u16 = 0x0017;
    /// Server reports the family versions it accepted.
    pub const OSERVICE_FAMILY_VERSIONS_REPLY: u16 = 0x0018;

    // family 0x0002 — location
    /// Client requests location rights.
    pub const LOCATE_RIGHTS_QUERY: u16 = 0x0002;
    /// Server reports location rights.
    pub const LOCATE_RIGHTS_REPLY: u16 = 0x0003;
    /// Client sets profile/away/capability info.
    pub const LOCATE_SET_INFO: u16 = 0x0004;
    /// Client requests another user's info block.
    pub const LOCATE_USER_INFO_QUERY: u16 = 0x0005;
    /// Server returns a user info block.
    pub const LOCATE_USER_INFO_REPLY: u16 = 0x0006;

    // family 0x0003 — buddy list
    /// Client requests buddy list rights.
    pub const BUDDY_RIGHTS_QUERY: u16 = 0x0002;
    /// Server reports buddy list rights.
    pub const BUDDY_RIGHTS_REPLY: u16 = 0x0003;
    /// Client uploads its buddy list.
    pub const BUDDY_ADD: u16 = 0x0004;
    /// Server announces a buddy came online.
    pub const BUDDY_ARRIVED: u16 = 0x000B;
    /// Server announces a buddy went offline.
    pub const BUDDY_DEPARTED: u16 = 0x000C;

    // family 0x0004 — ICBM
    /// Client sets messaging parameters.
    pub const ICBM_SET_PARAMS: u16 = 0x0002;
    /// Client requests messaging parameters.
    pub const ICBM_PARAMS_QUERY: u16 = 0x0004;
    /// Server reports messaging parameters.
    pub const ICBM_PARAMS_REPLY: u16 = 0x0005;
    /// Client sends an instant message.
    pub const ICBM_SEND: u16 = 0x0006;
    /// Server delivers an instant message to the target client.
    pub const ICBM_INCOMING: u16 = 0x0007;
    /// Server acknowledges message delivery to the sender.
    pub const ICBM_HOST_ACK: u16 = 0x000C;

    // family 0x0006 — invitation
    /// Client invites a friend to the service.
    pub const INVITE_REQUEST: u16 = 0x0002;
    /// Server acknowledges the invitation.
    pub const INVITE_ACK: u16 = 0x0003;

    // family 0x0009 — privacy
    /// Client requests privacy rights.
    pub const PRIVACY_RIGHTS_QUERY: u16 = 0x0002;
    /// Server reports privacy rights.
    pub const PRIVACY_RIGHTS_REPLY: u16 = 0x0003;

    // family 0x000A — directory lookup
    /// Client looks up a user by email address.
    pub const LOOKUP_EMAIL_QUERY: u16 = 0x0002;
    /// Server reports the lookup result.
    pub const LOOKUP_EMAIL_REPLY: u16 = 0x0003;

    // family 0x000B — usage statistics
    /// Server requests a stats report interval.
    pub const STATS_SET_REPORT_INTERVAL: u16 = 0x0002;
    /// Client submits a usage report.
    pub const STATS_REPORT: u16 = 0x0003;
    /// Server acknowledges a usage report.
    pub const STATS_REPORT_ACK: u16 = 0x0004;

    // family 0x0015 — ICQ extended profile
    /// Client sends a wrapped meta request.
    pub const ICQ_META_REQUEST: u16 = 0x0002;
    /// Server sends a wrapped meta reply chunk.
    pub const ICQ_META_REPLY: u16 = 0x0003;

    // family 0x0017 — authorization
    /// Client performs an MD5 digest login.
    pub const AUTH_MD5_LOGIN: u16 = 0x0002;
    /// Server replies to a login attempt.
    pub const AUTH_LOGIN_REPLY: u16 = 0x0003;
    /// Client requests an MD5 challenge key.
    pub const AUTH_KEY_QUERY: u16 = 0x0006;
    /// Server sends the MD5 challenge key.
    pub const AUTH_KEY_REPLY: u16 = 0x0007;
}

/// TLV type codes used by the sign-on handshake and the core services.
pub mod tlv {
    /// Screen name.
    pub const SCREEN_NAME: u16 = 0x0001;
    /// Roasted password (channel-1 sign-on).
    pub const ROASTED_PASSWORD: u16 = 0x0002;
    /// Client id string / user agent.
    pub const CLIENT_ID: u16 = 0x0003;
    /// Error description URL.
    pub const ERROR_URL: u16 = 0x0004;
    /// BOS server address (`host:port`).
    pub const BOS_ADDRESS: u16 = 0x0005;
    /// Reconnection cookie.
    pub const COOKIE: u16 = 0x0006;
    /// Authentication error code.
    pub const ERROR_CODE: u16 = 0x0008;
    /// MD5 digest of the password (MD5 login).
    pub const MD5_DIGEST: u16 = 0x0025;

    // user info block TLVs
    /// User class flags.
    pub const USER_CLASS: u16 = 0x0001;
    /// Account creation / sign-on time.
    pub const SIGNON_TIME: u16 = 0x0003;
    /// Online status.
    pub const USER_STATUS: u16 = 0x0006;

    // locate TLVs
    /// Profile MIME type.
    pub const PROFILE_MIME: u16 = 0x0001;
    /// Profile text.
    pub const PROFILE_TEXT: u16 = 0x0002;
    /// Away message MIME type.
    pub const AWAY_MIME: u16 = 0x0003;
    /// Away message text.
    pub const AWAY_TEXT: u16 = 0x0004;
    /// Capability GUID list (16 bytes per capability).
    pub const CAPABILITIES: u16 = 0x0005;

    // ICBM TLVs
    /// Message content block.
    pub const ICBM_MESSAGE: u16 = 0x0002;
    /// ICQ meta request/reply wrapper.
    pub const ICQ_META: u16 = 0x0001;
}

/// Error codes carried in error SNACs and auth-failure TLV 0x08.
pub mod error_code {
    /// The addressed user is not signed on.
    pub const USER_OFFLINE: u16 = 0x0004;
    /// Incorrect screen name or password.
    pub const BAD_CREDENTIALS: u16 = 0x0004;
    /// Directory lookup found no match.
    pub const NO_MATCH: u16 = 0x0014;
}
