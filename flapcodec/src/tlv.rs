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

//! Type-Length-Value field codec.

use crate::result::{CodecError, CodecResult};
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};

/// A Type-Length-Value field.
///
/// TLVs are the self-describing encoding OSCAR uses inside SNAC bodies and
/// in the sign-on handshake: a 16-bit type code, a 16-bit length, and up to
/// 65535 bytes of value, all big-endian.
///
/// Lookup within a TLV sequence is "first match by type"; an absent TLV is
/// a distinct case from a present-but-empty one, and the accessors on this
/// type validate length and encoding so call sites never index blindly into
/// malformed input.
///
/// # Example
/// ```
/// use oscarix_flapcodec::Tlv;
///
/// let tlv = Tlv::from_str(0x0001, "foo");
/// let decoded = Tlv::decode_all(&tlv.to_bytes()).unwrap();
/// assert_eq!(decoded[0].as_str().unwrap(), "foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    /// The 16-bit type code.
    pub kind: u16,
    /// The value blob, at most 65535 bytes.
    pub value: Bytes,
}

impl Tlv {
    /// Create a TLV from a type code and raw value bytes.
    pub fn new(kind: u16, value: impl Into<Bytes>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Create a TLV whose value is the UTF-8 bytes of `text`.
    pub fn from_str(kind: u16, text: &str) -> Self {
        Self::new(kind, Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Create a TLV carrying a single big-endian `u16`.
    pub fn from_u16(kind: u16, value: u16) -> Self {
        Self::new(kind, Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    /// Create a TLV carrying a single big-endian `u32`.
    pub fn from_u32(kind: u16, value: u32) -> Self {
        Self::new(kind, Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    /// Append the encoded form of this TLV to `dst`.
    ///
    /// Fails with [`CodecError::ValueTooLarge`] if the value does not fit
    /// behind the 16-bit length field.
    pub fn encode_to(&self, dst: &mut BytesMut) -> CodecResult<()> {
        if self.value.len() > u16::MAX as usize {
            return Err(CodecError::ValueTooLarge(self.value.len()));
        }
        dst.reserve(4 + self.value.len());
        dst.put_u16(self.kind);
        dst.put_u16(self.value.len() as u16);
        dst.put_slice(&self.value);
        Ok(())
    }

    /// Encode this TLV into a fresh buffer.
    ///
    /// # Panics
    /// Panics if the value exceeds 65535 bytes; use [`Tlv::encode_to`] when
    /// the value length is not statically known.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(4 + self.value.len());
        self.encode_to(&mut dst)
            .unwrap_or_else(|e| panic!("TLV encode failed: {}", e));
        dst.freeze()
    }

    /// Decode a buffer into the TLV sequence it contains.
    ///
    /// The buffer must be consumed exactly: a header or value that runs off
    /// the end of the buffer is a [`CodecError::TruncatedTlv`], never a
    /// partial record. An empty buffer decodes to an empty sequence.
    pub fn decode_all(buffer: &[u8]) -> CodecResult<Vec<Tlv>> {
        let mut tlvs = Vec::new();
        let mut offset = 0;
        while offset < buffer.len() {
            if buffer.len() - offset < 4 {
                return Err(CodecError::TruncatedTlv {
                    required: 4,
                    available: buffer.len() - offset,
                });
            }
            let kind = BigEndian::read_u16(&buffer[offset..]);
            let length = BigEndian::read_u16(&buffer[offset + 2..]) as usize;
            offset += 4;
            if buffer.len() - offset < length {
                return Err(CodecError::TruncatedTlv {
                    required: length,
                    available: buffer.len() - offset,
                });
            }
            tlvs.push(Tlv::new(
                kind,
                Bytes::copy_from_slice(&buffer[offset..offset + length]),
            ));
            offset += length;
        }
        Ok(tlvs)
    }

    /// Find the first TLV of the given type in a sequence.
    pub fn find(tlvs: &[Tlv], kind: u16) -> Option<&Tlv> {
        tlvs.iter().find(|tlv| tlv.kind == kind)
    }

    /// Interpret the value as UTF-8 text.
    pub fn as_str(&self) -> CodecResult<&str> {
        std::str::from_utf8(&self.value).map_err(|_| CodecError::InvalidString)
    }

    /// Interpret the value as a big-endian `u16`.
    pub fn as_u16(&self) -> CodecResult<u16> {
        if self.value.len() != 2 {
            return Err(CodecError::BufferTooSmall {
                required: 2,
                available: self.value.len(),
            });
        }
        Ok(BigEndian::read_u16(&self.value))
    }

    /// Interpret the value as a big-endian `u32`.
    pub fn as_u32(&self) -> CodecResult<u32> {
        if self.value.len() != 4 {
            return Err(CodecError::BufferTooSmall {
                required: 4,
                available: self.value.len(),
            });
        }
        Ok(BigEndian::read_u32(&self.value))
    }
}
