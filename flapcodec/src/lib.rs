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

//! # Oscarix OSCAR Framing Codec
//!
//! This crate implements the three-layer binary framing stack of the OSCAR
//! instant-messaging protocol, the wire format spoken by the classic AOL
//! Instant Messenger and ICQ clients:
//!
//! - **[`Flap`]** — the outermost frame layer. Every logical message on an
//!   OSCAR connection travels inside a FLAP: a `0x2A` marker byte, a frame
//!   kind, a per-connection sequence number, a length, and a payload.
//!   [`FlapCodec`] implements [`Decoder`] and [`Encoder`] from
//!   `tokio_util::codec` so the frame layer slots into a [`Framed`] stream.
//! - **[`Snac`]** — the typed message envelope carried inside FLAP `Data`
//!   frames. A SNAC is addressed by a 16-bit service *family* and a 16-bit
//!   *subtype* within that family, and echoes a 32-bit request id so clients
//!   can correlate replies.
//! - **[`Tlv`]** — Type-Length-Value fields, the self-describing encoding
//!   used pervasively inside SNAC bodies and in the sign-on handshake.
//!
//! All multi-byte integers on the wire are big-endian unless a service says
//! otherwise (the ICQ meta service embeds little-endian records; that is a
//! service concern, not a framing one).
//!
//! The crate also carries the protocol constants ([`consts`]) and the
//! reversible password "roast" obfuscation ([`roast`]) that legacy clients
//! apply before transmitting a password.
//!
//! ## Usage Example
//!
//! ```rust
//! use oscarix_flapcodec::{Flap, FlapCodec, FlapKind, Snac};
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//!
//! # fn example() -> Result<(), oscarix_flapcodec::CodecError> {
//! let mut codec = FlapCodec::new();
//! let mut wire = BytesMut::new();
//!
//! let snac = Snac::new(0x0001, 0x0003, 0, 0);
//! codec.encode(Flap::data(1, snac.to_bytes()), &mut wire)?;
//!
//! if let Some(frame) = codec.decode(&mut wire)? {
//!     assert_eq!(frame.kind, FlapKind::Data);
//!     let decoded = Snac::decode(&frame.payload)?;
//!     assert_eq!(decoded.family, 0x0001);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`Decoder`]: tokio_util::codec::Decoder
//! [`Encoder`]: tokio_util::codec::Encoder
//! [`Framed`]: tokio_util::codec::Framed

pub mod consts;
mod flap;
mod result;
mod roast;
mod snac;
mod tlv;

pub use flap::{decode_all, Flap, FlapCodec, FlapKind};
pub use result::{CodecError, CodecResult};
pub use roast::roast;
pub use snac::{Snac, SnacReader, SnacWriter};
pub use tlv::Tlv;
