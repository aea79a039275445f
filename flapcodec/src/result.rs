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

/// Result Type for Codec Operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Represents possible errors that can occur while encoding or decoding the
/// OSCAR framing stack.
///
/// Framing errors are fatal to the connection that produced them: the
/// decoder cannot resynchronize a byte stream after a bad marker or a
/// truncated frame, so callers are expected to close the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// An I/O error occurred while reading from or writing to the underlying
    /// stream.
    IOError {
        /// The kind of I/O error that occurred
        kind: std::io::ErrorKind,
        /// Description of the operation that failed
        operation: String,
    },

    /// A FLAP frame did not start with the `0x2A` marker byte.
    ///
    /// Contains the byte found where the marker was expected.
    InvalidFrameHeader(u8),

    /// A FLAP frame carried an unknown kind byte.
    ///
    /// Valid kinds are `0x01` (SignOn) through `0x05` (KeepAlive).
    InvalidFrameKind(u8),

    /// A buffer ended mid-way through a TLV header or value.
    ///
    /// Decoding a TLV sequence must consume its buffer exactly; a truncated
    /// trailing record is an error, never a partial value.
    TruncatedTlv {
        /// Number of bytes required to finish the record
        required: usize,
        /// Number of bytes available
        available: usize,
    },

    /// A buffer was too small to hold the structure being decoded.
    BufferTooSmall {
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        available: usize,
    },

    /// A value exceeded the 16-bit length field it must be encoded behind.
    ValueTooLarge(usize),

    /// A field that must be ASCII/UTF-8 text did not decode as text.
    InvalidString,
}

impl std::error::Error for CodecError {}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::IOError { kind, operation } => {
                write!(f, "I/O error during {}: {:?}", operation, kind)
            }
            CodecError::InvalidFrameHeader(byte) => {
                write!(f, "invalid FLAP marker byte: 0x{:02X}", byte)
            }
            CodecError::InvalidFrameKind(kind) => {
                write!(f, "invalid FLAP frame kind: 0x{:02X}", kind)
            }
            CodecError::TruncatedTlv {
                required,
                available,
            } => {
                write!(
                    f,
                    "truncated TLV (required: {}, available: {})",
                    required, available
                )
            }
            CodecError::BufferTooSmall {
                required,
                available,
            } => {
                write!(
                    f,
                    "buffer too small (required: {}, available: {})",
                    required, available
                )
            }
            CodecError::ValueTooLarge(len) => {
                write!(f, "value of {} bytes exceeds 16-bit length field", len)
            }
            CodecError::InvalidString => {
                write!(f, "field is not valid text")
            }
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(error: std::io::Error) -> Self {
        CodecError::IOError {
            kind: error.kind(),
            operation: "stream I/O".to_string(),
        }
    }
}
