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

//! SNAC message envelope codec.

use crate::consts::SNAC_HEADER_LEN;
use crate::result::{CodecError, CodecResult};
use crate::tlv::Tlv;
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};

/// A SNAC ("Sub-Network Access Codec") message.
///
/// The typed envelope carried inside FLAP `Data` frames. A SNAC is addressed
/// by a 16-bit service `family` and a 16-bit operation `subtype` within that
/// family, carries 16 bits of flags (usually zero), and echoes a 32-bit
/// `request_id` so the client can correlate replies with requests.
///
/// The body is opaque at this layer; each service dictates its own mix of
/// fixed fields and TLVs, assembled with [`SnacWriter`] and picked apart
/// with [`SnacReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snac {
    /// Service family identifier.
    pub family: u16,
    /// Operation identifier within the family.
    pub subtype: u16,
    /// Flag bits, usually zero.
    pub flags: u16,
    /// Request correlation id, echoed in replies.
    pub request_id: u32,
    /// Opaque message body.
    pub body: Bytes,
}

impl Snac {
    /// Create a SNAC with an empty body.
    pub fn new(family: u16, subtype: u16, flags: u16, request_id: u32) -> Self {
        Self {
            family,
            subtype,
            flags,
            request_id,
            body: Bytes::new(),
        }
    }

    /// Create a SNAC with the given body.
    pub fn with_body(
        family: u16,
        subtype: u16,
        flags: u16,
        request_id: u32,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            family,
            subtype,
            flags,
            request_id,
            body: body.into(),
        }
    }

    /// Build a reply to this SNAC.
    ///
    /// Header fields passed as `None` are inherited from the request;
    /// `request_id` is always inherited so the client can correlate the
    /// reply. Services rely on this override-or-inherit asymmetry: a reply
    /// usually keeps the request's family and overrides only the subtype.
    ///
    /// # Example
    /// ```
    /// use oscarix_flapcodec::Snac;
    ///
    /// let request = Snac::new(0x0003, 0x0002, 0, 42);
    /// let reply = request.reply(None, Some(0x0003), None, b"rights".as_ref());
    /// assert_eq!(reply.family, 0x0003);
    /// assert_eq!(reply.subtype, 0x0003);
    /// assert_eq!(reply.request_id, 42);
    /// ```
    pub fn reply(
        &self,
        family: Option<u16>,
        subtype: Option<u16>,
        flags: Option<u16>,
        body: impl Into<Bytes>,
    ) -> Snac {
        Snac {
            family: family.unwrap_or(self.family),
            subtype: subtype.unwrap_or(self.subtype),
            flags: flags.unwrap_or(self.flags),
            request_id: self.request_id,
            body: body.into(),
        }
    }

    /// Build a family-local error reply (subtype `0x01`) carrying `code`.
    pub fn error_reply(&self, code: u16) -> Snac {
        self.reply(
            None,
            Some(crate::consts::subtype::ERROR),
            Some(0),
            Bytes::copy_from_slice(&code.to_be_bytes()),
        )
    }

    /// Append the encoded form of this SNAC to `dst`.
    pub fn encode_to(&self, dst: &mut BytesMut) {
        dst.reserve(SNAC_HEADER_LEN + self.body.len());
        dst.put_u16(self.family);
        dst.put_u16(self.subtype);
        dst.put_u16(self.flags);
        dst.put_u32(self.request_id);
        dst.put_slice(&self.body);
    }

    /// Encode this SNAC into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(SNAC_HEADER_LEN + self.body.len());
        self.encode_to(&mut dst);
        dst.freeze()
    }

    /// Decode a FLAP `Data` payload into a SNAC.
    ///
    /// Fails with [`CodecError::BufferTooSmall`] when the payload is shorter
    /// than the 10-byte SNAC header; everything after the header becomes the
    /// body.
    pub fn decode(payload: &[u8]) -> CodecResult<Snac> {
        if payload.len() < SNAC_HEADER_LEN {
            return Err(CodecError::BufferTooSmall {
                required: SNAC_HEADER_LEN,
                available: payload.len(),
            });
        }
        Ok(Snac {
            family: BigEndian::read_u16(&payload[0..]),
            subtype: BigEndian::read_u16(&payload[2..]),
            flags: BigEndian::read_u16(&payload[4..]),
            request_id: BigEndian::read_u32(&payload[6..]),
            body: Bytes::copy_from_slice(&payload[SNAC_HEADER_LEN..]),
        })
    }
}

/// Incremental writer for SNAC bodies.
///
/// Appends big-endian integers, raw bytes, strings, and TLVs in encounter
/// order; the ordering is part of the wire contract per subtype, dictated by
/// each service rather than by the codec.
#[derive(Debug, Default)]
pub struct SnacWriter {
    buffer: BytesMut,
}

impl SnacWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `u8`.
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(value);
        self
    }

    /// Append a big-endian `u16`.
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buffer.put_u16(value);
        self
    }

    /// Append a big-endian `u32`.
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buffer.put_u32(value);
        self
    }

    /// Append a big-endian `u64`.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buffer.put_u64(value);
        self
    }

    /// Append raw bytes verbatim.
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buffer.put_slice(value);
        self
    }

    /// Append the bytes of an ASCII string with no length prefix.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.buffer.put_slice(value.as_bytes());
        self
    }

    /// Append a u8-length-prefixed string (the screen name wire form).
    ///
    /// Screen names are bounded well below 255 bytes by the protocol, so
    /// the length is truncated rather than failed.
    pub fn pstr(&mut self, value: &str) -> &mut Self {
        let len = value.len().min(u8::MAX as usize);
        self.buffer.put_u8(len as u8);
        self.buffer.put_slice(&value.as_bytes()[..len]);
        self
    }

    /// Append an encoded TLV.
    pub fn tlv(&mut self, tlv: &Tlv) -> CodecResult<&mut Self> {
        tlv.encode_to(&mut self.buffer)?;
        Ok(self)
    }

    /// Finish writing and take the accumulated body.
    pub fn finish(self) -> Bytes {
        self.buffer.freeze()
    }
}

/// Sequential reader for fixed fields at the front of a SNAC body.
#[derive(Debug)]
pub struct SnacReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> SnacReader<'a> {
    /// Create a reader over `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.buffer.len() - self.offset < len {
            return Err(CodecError::BufferTooSmall {
                required: len,
                available: self.buffer.len() - self.offset,
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Read a `u8`.
    pub fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian `u16`.
    pub fn u16(&mut self) -> CodecResult<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    /// Read a big-endian `u32`.
    pub fn u32(&mut self) -> CodecResult<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    /// Read a big-endian `u64`.
    pub fn u64(&mut self) -> CodecResult<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    /// Read `len` raw bytes.
    pub fn bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.take(len)
    }

    /// Read a u8-length-prefixed string.
    pub fn pstr(&mut self) -> CodecResult<&'a str> {
        let len = self.u8()? as usize;
        std::str::from_utf8(self.take(len)?).map_err(|_| CodecError::InvalidString)
    }

    /// Everything not yet consumed.
    pub fn remainder(&self) -> &'a [u8] {
        &self.buffer[self.offset..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::subtype;

    #[test]
    fn test_snac_roundtrip() {
        let snac = Snac::with_body(0x0004, 0x0006, 0x8000, 0xDEADBEEF, b"hello".as_ref());
        let decoded = Snac::decode(&snac.to_bytes()).unwrap();
        assert_eq!(decoded, snac);
    }

    #[test]
    fn test_snac_decode_too_small() {
        let err = Snac::decode(&[0u8; 9]).unwrap_err();
        assert_eq!(
            err,
            CodecError::BufferTooSmall {
                required: 10,
                available: 9,
            }
        );
    }

    #[test]
    fn test_snac_reply_inherits_everything_by_default() {
        let request = Snac::with_body(0x0001, 0x0017, 0x0002, 77, b"body".as_ref());
        let reply = request.reply(None, None, None, Bytes::new());
        assert_eq!(reply.family, 0x0001);
        assert_eq!(reply.subtype, 0x0017);
        assert_eq!(reply.flags, 0x0002);
        assert_eq!(reply.request_id, 77);
    }

    #[test]
    fn test_snac_reply_overrides_only_what_is_given() {
        let request = Snac::new(0x0001, 0x0017, 0, 12);
        let reply = request.reply(Some(0x0002), None, None, Bytes::new());
        assert_eq!(reply.family, 0x0002);
        assert_eq!(reply.subtype, 0x0017);
        assert_eq!(reply.request_id, 12);

        let reply = request.reply(None, Some(0x0018), None, Bytes::new());
        assert_eq!(reply.family, 0x0001);
        assert_eq!(reply.subtype, 0x0018);
    }

    #[test]
    fn test_snac_error_reply() {
        let request = Snac::new(0x0004, 0x0006, 0, 9);
        let error = request.error_reply(0x0004);
        assert_eq!(error.family, 0x0004);
        assert_eq!(error.subtype, subtype::ERROR);
        assert_eq!(error.request_id, 9);
        assert_eq!(error.body.as_ref(), &[0x00, 0x04]);
    }

    #[test]
    fn test_writer_encounter_order() {
        let mut writer = SnacWriter::new();
        writer.u16(0xAABB).pstr("bob").u32(1);
        let body = writer.finish();
        assert_eq!(
            body.as_ref(),
            &[0xAA, 0xBB, 0x03, b'b', b'o', b'b', 0x00, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_reader_matches_writer() {
        let mut writer = SnacWriter::new();
        writer.u64(0x0102030405060708).u16(1).pstr("alice");
        let body = writer.finish();

        let mut reader = SnacReader::new(&body);
        assert_eq!(reader.u64().unwrap(), 0x0102030405060708);
        assert_eq!(reader.u16().unwrap(), 1);
        assert_eq!(reader.pstr().unwrap(), "alice");
        assert!(reader.remainder().is_empty());
    }

    #[test]
    fn test_reader_truncation() {
        let mut reader = SnacReader::new(&[0x01]);
        assert!(reader.u16().is_err());
    }
}
