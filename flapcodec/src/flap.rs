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

//! FLAP frame layer codec.

use crate::consts::{FLAP_HEADER_LEN, FLAP_MARKER};
use crate::result::{CodecError, CodecResult};
use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

/// The kind of a FLAP frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlapKind {
    /// Connection greeting and sign-on handshake.
    SignOn = 0x01,
    /// Carries a SNAC message.
    Data = 0x02,
    /// Frame-level error report.
    Error = 0x03,
    /// Connection teardown; also carries the channel-1 auth reply.
    SignOff = 0x04,
    /// Keeps an idle connection alive.
    KeepAlive = 0x05,
}

impl FlapKind {
    /// Convert a wire byte into a frame kind.
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        match value {
            0x01 => Ok(Self::SignOn),
            0x02 => Ok(Self::Data),
            0x03 => Ok(Self::Error),
            0x04 => Ok(Self::SignOff),
            0x05 => Ok(Self::KeepAlive),
            other => Err(CodecError::InvalidFrameKind(other)),
        }
    }

    /// The wire byte for this frame kind.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for FlapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignOn => write!(f, "sign-on"),
            Self::Data => write!(f, "data"),
            Self::Error => write!(f, "error"),
            Self::SignOff => write!(f, "sign-off"),
            Self::KeepAlive => write!(f, "keep-alive"),
        }
    }
}

/// A FLAP frame, the outermost unit of the OSCAR protocol.
///
/// A stateless value type: sequence numbers are assigned by the *sender* of
/// a frame (each connection direction keeps its own strictly increasing
/// 16-bit counter), never by the codec.
///
/// Wire form: marker byte `0x2A`, kind byte, 16-bit sequence, 16-bit payload
/// length, payload — all big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flap {
    /// Frame kind.
    pub kind: FlapKind,
    /// Sender-assigned per-connection sequence number.
    pub sequence: u16,
    /// Frame payload, 0 to 65535 bytes.
    pub payload: Bytes,
}

impl Flap {
    /// Create a frame.
    pub fn new(kind: FlapKind, sequence: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            sequence,
            payload: payload.into(),
        }
    }

    /// Create a `Data` frame.
    pub fn data(sequence: u16, payload: impl Into<Bytes>) -> Self {
        Self::new(FlapKind::Data, sequence, payload)
    }

    /// Encode this frame into a fresh buffer.
    ///
    /// # Panics
    /// Panics if the payload exceeds 65535 bytes; frame payloads are built
    /// by this crate's writers and stay far below the limit.
    pub fn to_bytes(&self) -> Bytes {
        assert!(self.payload.len() <= u16::MAX as usize);
        let mut dst = BytesMut::with_capacity(FLAP_HEADER_LEN + self.payload.len());
        dst.put_u8(FLAP_MARKER);
        dst.put_u8(self.kind.as_u8());
        dst.put_u16(self.sequence);
        dst.put_u16(self.payload.len() as u16);
        dst.put_slice(&self.payload);
        dst.freeze()
    }
}

/// Stream codec for FLAP frames.
///
/// Implements the tokio-util [`Decoder`]/[`Encoder`] pair: a byte-stream to
/// discrete-frame converter. A frame is never partially interpreted — the
/// decoder returns `Ok(None)` until all `6 + len(payload)` bytes of a frame
/// have arrived, and one socket read may yield several frames (the framed
/// stream keeps calling `decode` until the buffer is exhausted).
///
/// The receiver is not required to validate sequence monotonicity, but a
/// regression is logged at debug level as a malformed-client signal.
#[derive(Debug, Default)]
pub struct FlapCodec {
    last_sequence: Option<u16>,
}

impl FlapCodec {
    /// Creates a new instance of `FlapCodec`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FlapCodec {
    type Item = Flap;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Flap>, CodecError> {
        if src.len() < FLAP_HEADER_LEN {
            return Ok(None);
        }
        if src[0] != FLAP_MARKER {
            return Err(CodecError::InvalidFrameHeader(src[0]));
        }
        let kind = FlapKind::from_u8(src[1])?;
        let sequence = BigEndian::read_u16(&src[2..]);
        let length = BigEndian::read_u16(&src[4..]) as usize;
        if src.len() < FLAP_HEADER_LEN + length {
            src.reserve(FLAP_HEADER_LEN + length - src.len());
            return Ok(None);
        }

        if let Some(last) = self.last_sequence {
            if sequence <= last && last != u16::MAX {
                debug!(
                    last_sequence = last,
                    sequence, "FLAP sequence number regressed"
                );
            }
        }
        self.last_sequence = Some(sequence);

        src.advance(FLAP_HEADER_LEN);
        let payload = src.split_to(length).freeze();
        Ok(Some(Flap {
            kind,
            sequence,
            payload,
        }))
    }
}

impl Encoder<Flap> for FlapCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: Flap, dst: &mut BytesMut) -> Result<(), CodecError> {
        if frame.payload.len() > u16::MAX as usize {
            return Err(CodecError::ValueTooLarge(frame.payload.len()));
        }
        dst.reserve(FLAP_HEADER_LEN + frame.payload.len());
        dst.put_u8(FLAP_MARKER);
        dst.put_u8(frame.kind.as_u8());
        dst.put_u16(frame.sequence);
        dst.put_u16(frame.payload.len() as u16);
        dst.put_slice(&frame.payload);
        Ok(())
    }
}

/// Decode every complete frame in `buffer`.
///
/// The buffer must hold a whole number of frames; trailing bytes that do not
/// form a complete frame are a [`CodecError::BufferTooSmall`]. Used by call
/// sites that accumulate reads themselves rather than running a
/// [`tokio_util::codec::Framed`] stream.
pub fn decode_all(buffer: &mut BytesMut) -> CodecResult<Vec<Flap>> {
    let mut codec = FlapCodec::new();
    let mut frames = Vec::new();
    while !buffer.is_empty() {
        match codec.decode(buffer)? {
            Some(frame) => frames.push(frame),
            None => {
                return Err(CodecError::BufferTooSmall {
                    required: FLAP_HEADER_LEN,
                    available: buffer.len(),
                });
            }
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flap_roundtrip() {
        let mut codec = FlapCodec::new();
        let frame = Flap::new(FlapKind::Data, 0x1234, Bytes::from_static(b"payload"));
        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).unwrap();
        let decoded = codec.decode(&mut wire).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(wire.is_empty());
    }

    #[test]
    fn test_flap_empty_payload_roundtrip() {
        let mut codec = FlapCodec::new();
        let frame = Flap::new(FlapKind::KeepAlive, 7, Bytes::new());
        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).unwrap();
        assert_eq!(codec.decode(&mut wire).unwrap().unwrap(), frame);
    }

    #[test]
    fn test_multi_frame_decode_preserves_order() {
        let frames = vec![
            Flap::new(FlapKind::SignOn, 1, Bytes::from_static(&[0, 0, 0, 1])),
            Flap::data(2, Bytes::from_static(b"first")),
            Flap::data(3, Bytes::from_static(b"second")),
            Flap::new(FlapKind::SignOff, 4, Bytes::new()),
        ];
        let mut wire = BytesMut::new();
        for frame in &frames {
            wire.put_slice(&frame.to_bytes());
        }
        let decoded = decode_all(&mut wire).unwrap();
        assert_eq!(decoded, frames);
    }

    #[test]
    fn test_partial_frame_yields_none() {
        let mut codec = FlapCodec::new();
        let frame = Flap::data(1, Bytes::from_static(b"0123456789"));
        let encoded = frame.to_bytes();

        // feed everything but the last byte
        let mut wire = BytesMut::from(&encoded[..encoded.len() - 1]);
        assert_eq!(codec.decode(&mut wire).unwrap(), None);

        // the remaining byte completes the frame
        wire.put_u8(encoded[encoded.len() - 1]);
        assert_eq!(codec.decode(&mut wire).unwrap().unwrap(), frame);
    }

    #[test]
    fn test_partial_header_yields_none() {
        let mut codec = FlapCodec::new();
        let mut wire = BytesMut::from(&[FLAP_MARKER, 0x02, 0x00][..]);
        assert_eq!(codec.decode(&mut wire).unwrap(), None);
    }

    #[test]
    fn test_invalid_marker() {
        let mut codec = FlapCodec::new();
        let mut wire = BytesMut::from(&[0x2B, 0x02, 0x00, 0x01, 0x00, 0x00][..]);
        assert_eq!(
            codec.decode(&mut wire).unwrap_err(),
            CodecError::InvalidFrameHeader(0x2B)
        );
    }

    #[test]
    fn test_invalid_kind() {
        let mut codec = FlapCodec::new();
        let mut wire = BytesMut::from(&[FLAP_MARKER, 0x06, 0x00, 0x01, 0x00, 0x00][..]);
        assert_eq!(
            codec.decode(&mut wire).unwrap_err(),
            CodecError::InvalidFrameKind(0x06)
        );
    }

    #[test]
    fn test_encode_oversized_payload() {
        let mut codec = FlapCodec::new();
        let frame = Flap::data(1, Bytes::from(vec![0u8; 65536]));
        let mut wire = BytesMut::new();
        assert_eq!(
            codec.encode(frame, &mut wire).unwrap_err(),
            CodecError::ValueTooLarge(65536)
        );
    }

    #[test]
    fn test_decode_all_rejects_trailing_garbage() {
        let mut wire = BytesMut::new();
        wire.put_slice(&Flap::data(1, Bytes::from_static(b"ok")).to_bytes());
        wire.put_slice(&[FLAP_MARKER, 0x02]); // incomplete second frame
        assert!(matches!(
            decode_all(&mut wire).unwrap_err(),
            CodecError::BufferTooSmall { .. }
        ));
    }

    #[test]
    fn test_kind_conversion() {
        for kind in [
            FlapKind::SignOn,
            FlapKind::Data,
            FlapKind::Error,
            FlapKind::SignOff,
            FlapKind::KeepAlive,
        ] {
            assert_eq!(FlapKind::from_u8(kind.as_u8()).unwrap(), kind);
        }
        assert!(FlapKind::from_u8(0x00).is_err());
        assert!(FlapKind::from_u8(0x06).is_err());
    }
}
