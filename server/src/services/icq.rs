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

//! ICQ extended profile service (family 0x0015)
//!
//! A nested protocol: the outer SNAC carries a single TLV 0x0001 whose
//! value is a little-endian "meta" chunk, unlike everything else on the
//! wire which is big-endian. A meta request names the client's UIN, a
//! request type, a sequence number, and a meta subtype; the server streams
//! back one or more meta reply chunks. Each reply chunk repeats the UIN
//! and sequence, carries a meta type and a success byte, and sets bit 0 of
//! its flags byte only on the final chunk so the client knows the stream
//! ended.

use super::{ServiceContext, SnacService};
use crate::session::OscarSession;
use crate::{OscarError, Result};
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use oscarix_flapcodec::consts::{family, subtype, tlv};
use oscarix_flapcodec::{Snac, SnacWriter, Tlv};
use std::sync::Arc;

/// Outer request type in every client meta chunk
const META_REQUEST_TYPE: u16 = 0x07D0;
/// Outer reply type in every server meta chunk
const META_REPLY_TYPE: u16 = 0x07DA;
/// Success byte carried by every reply chunk
const META_SUCCESS: u8 = 0x0A;
/// Flags bit marking the final chunk of a reply stream
const META_FLAG_FINAL: u8 = 0x01;

/// Meta subtype: full profile query
const META_FULL_INFO_REQUEST: u16 = 0x04B2;
/// Meta subtype: XML configuration query
const META_XML_REQUEST: u16 = 0x0898;

/// Profile record chunk meta types, streamed in this order
const META_BASIC_INFO: u16 = 0x00C8;
const META_MORE_INFO: u16 = 0x00DC;
const META_WORK_INFO: u16 = 0x00D2;
const META_NOTES_INFO: u16 = 0x00E6;
const META_INTERESTS_INFO: u16 = 0x00F0;
const META_AFFILIATIONS_INFO: u16 = 0x00FA;
/// Meta type of the XML configuration reply
const META_XML_REPLY: u16 = 0x08A2;

/// Decoded inner meta request
#[derive(Debug, PartialEq, Eq)]
struct MetaRequest {
    uin: u32,
    sequence: u16,
    meta_subtype: u16,
}

impl MetaRequest {
    /// Decode the little-endian chunk inside TLV 0x0001
    fn decode(value: &[u8]) -> Result<Self> {
        // u16 length, u32 uin, u16 request type, u16 sequence, u16 subtype
        if value.len() < 12 {
            return Err(OscarError::MalformedPayload(
                "ICQ meta request",
                format!("chunk too short: {} bytes", value.len()),
            ));
        }
        let declared = u16::from_le_bytes([value[0], value[1]]) as usize;
        if declared + 2 != value.len() {
            return Err(OscarError::MalformedPayload(
                "ICQ meta request",
                format!("declared {} bytes, got {}", declared, value.len() - 2),
            ));
        }
        let request_type = u16::from_le_bytes([value[6], value[7]]);
        if request_type != META_REQUEST_TYPE {
            return Err(OscarError::MalformedPayload(
                "ICQ meta request",
                format!("unexpected request type {request_type:#06x}"),
            ));
        }
        Ok(Self {
            uin: u32::from_le_bytes([value[2], value[3], value[4], value[5]]),
            sequence: u16::from_le_bytes([value[8], value[9]]),
            meta_subtype: u16::from_le_bytes([value[10], value[11]]),
        })
    }
}

/// Append a little-endian length-prefixed string to a meta payload
fn put_meta_str(buffer: &mut BytesMut, text: &str) {
    buffer.put_u16_le(text.len() as u16);
    buffer.put_slice(text.as_bytes());
}

/// Family 0x0015 service
pub struct IcqService;

impl IcqService {
    /// Wrap one meta reply chunk into a SNAC
    fn reply_chunk(
        request: &Snac,
        meta: &MetaRequest,
        meta_type: u16,
        payload: &[u8],
        last: bool,
    ) -> Result<Snac> {
        let mut chunk = BytesMut::new();
        // inner length excludes the length field itself
        let inner_len = 4 + 2 + 2 + 2 + 1 + 1 + payload.len();
        chunk.put_u16_le(inner_len as u16);
        chunk.put_u32_le(meta.uin);
        chunk.put_u16_le(META_REPLY_TYPE);
        chunk.put_u16_le(meta.sequence);
        chunk.put_u16_le(meta_type);
        chunk.put_u8(META_SUCCESS);
        chunk.put_u8(if last { META_FLAG_FINAL } else { 0 });
        chunk.put_slice(payload);

        let mut writer = SnacWriter::new();
        writer.tlv(&Tlv::new(tlv::ICQ_META, chunk.freeze()))?;
        Ok(request.reply(
            None,
            Some(subtype::ICQ_META_REPLY),
            None,
            writer.finish(),
        ))
    }

    /// Canned profile record, streamed as six chunks
    fn profile_chunks(
        request: &Snac,
        meta: &MetaRequest,
        screen_name: &str,
    ) -> Result<Vec<Snac>> {
        let mut basic = BytesMut::new();
        put_meta_str(&mut basic, screen_name); // nickname
        put_meta_str(&mut basic, ""); // first name
        put_meta_str(&mut basic, ""); // last name
        put_meta_str(&mut basic, ""); // email

        let mut more = BytesMut::new();
        more.put_u16_le(0); // age unknown
        more.put_u8(0); // gender unspecified
        put_meta_str(&mut more, ""); // homepage

        let mut work = BytesMut::new();
        put_meta_str(&mut work, ""); // company
        put_meta_str(&mut work, ""); // department
        put_meta_str(&mut work, ""); // position

        let mut notes = BytesMut::new();
        put_meta_str(&mut notes, "");

        let mut interests = BytesMut::new();
        interests.put_u8(0); // interest count

        let mut affiliations = BytesMut::new();
        affiliations.put_u8(0); // affiliation count

        let sections: [(u16, &[u8]); 6] = [
            (META_BASIC_INFO, &basic),
            (META_MORE_INFO, &more),
            (META_WORK_INFO, &work),
            (META_NOTES_INFO, &notes),
            (META_INTERESTS_INFO, &interests),
            (META_AFFILIATIONS_INFO, &affiliations),
        ];

        let mut chunks = Vec::with_capacity(sections.len());
        let final_index = sections.len() - 1;
        for (index, (meta_type, payload)) in sections.iter().enumerate() {
            chunks.push(Self::reply_chunk(
                request,
                meta,
                *meta_type,
                payload,
                index == final_index,
            )?);
        }
        Ok(chunks)
    }

    fn xml_chunk(request: &Snac, meta: &MetaRequest) -> Result<Vec<Snac>> {
        let mut payload = BytesMut::new();
        put_meta_str(&mut payload, "<icq_config/>");
        Ok(vec![Self::reply_chunk(
            request,
            meta,
            META_XML_REPLY,
            &payload,
            true,
        )?])
    }
}

#[async_trait]
impl SnacService for IcqService {
    fn family(&self) -> u16 {
        family::ICQ
    }

    async fn process_snac(
        &self,
        _ctx: &ServiceContext,
        session: &Arc<OscarSession>,
        snac: &Snac,
    ) -> Result<Vec<Snac>> {
        if snac.subtype != subtype::ICQ_META_REQUEST {
            tracing::debug!("Ignoring ICQ subtype {:#06x}", snac.subtype);
            return Ok(Vec::new());
        }

        let tlvs = Tlv::decode_all(&snac.body)?;
        let Some(wrapper) = Tlv::find(&tlvs, tlv::ICQ_META) else {
            return Err(OscarError::MalformedPayload(
                "ICQ meta request",
                "missing wrapper TLV 0x0001".to_string(),
            ));
        };
        let meta = MetaRequest::decode(&wrapper.value)?;
        tracing::debug!(
            "ICQ meta request {:#06x} from UIN {} (session {})",
            meta.meta_subtype,
            meta.uin,
            session.id()
        );

        let name = session.screen_name().unwrap_or_default();
        match meta.meta_subtype {
            META_FULL_INFO_REQUEST => Self::profile_chunks(snac, &meta, &name),
            META_XML_REQUEST => Self::xml_chunk(snac, &meta),
            // unknown meta subtypes get an empty final chunk echoing the type
            other => Ok(vec![Self::reply_chunk(snac, &meta, other, &[], true)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn meta_request_bytes(uin: u32, sequence: u16, meta_subtype: u16) -> Bytes {
        let mut chunk = BytesMut::new();
        chunk.put_u16_le(10); // uin + type + seq + subtype
        chunk.put_u32_le(uin);
        chunk.put_u16_le(META_REQUEST_TYPE);
        chunk.put_u16_le(sequence);
        chunk.put_u16_le(meta_subtype);
        chunk.freeze()
    }

    #[test]
    fn test_meta_request_decode() {
        let bytes = meta_request_bytes(123456, 2, META_FULL_INFO_REQUEST);
        let meta = MetaRequest::decode(&bytes).unwrap();
        assert_eq!(
            meta,
            MetaRequest {
                uin: 123456,
                sequence: 2,
                meta_subtype: META_FULL_INFO_REQUEST,
            }
        );
    }

    #[test]
    fn test_meta_request_rejects_bad_length() {
        let mut chunk = BytesMut::new();
        chunk.put_u16_le(50); // claims more than present
        chunk.put_slice(&[0u8; 10]);
        assert!(MetaRequest::decode(&chunk).is_err());
    }

    #[test]
    fn test_profile_stream_marks_only_last_chunk_final() {
        let request = Snac::new(family::ICQ, subtype::ICQ_META_REQUEST, 0, 9);
        let meta = MetaRequest {
            uin: 42,
            sequence: 1,
            meta_subtype: META_FULL_INFO_REQUEST,
        };
        let chunks = IcqService::profile_chunks(&request, &meta, "42").unwrap();
        assert_eq!(chunks.len(), 6);

        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.subtype, subtype::ICQ_META_REPLY);
            assert_eq!(chunk.request_id, 9);
            let tlvs = Tlv::decode_all(&chunk.body).unwrap();
            let inner = &Tlv::find(&tlvs, tlv::ICQ_META).unwrap().value;
            // uin and sequence echoed back, little-endian
            assert_eq!(u32::from_le_bytes([inner[2], inner[3], inner[4], inner[5]]), 42);
            assert_eq!(u16::from_le_bytes([inner[6], inner[7]]), META_REPLY_TYPE);
            let flags = inner[13];
            if index == chunks.len() - 1 {
                assert_eq!(flags, META_FLAG_FINAL);
            } else {
                assert_eq!(flags, 0);
            }
        }
    }

    #[test]
    fn test_reply_chunk_inner_length() {
        let request = Snac::new(family::ICQ, subtype::ICQ_META_REQUEST, 0, 1);
        let meta = MetaRequest {
            uin: 7,
            sequence: 3,
            meta_subtype: META_XML_REQUEST,
        };
        let chunk = IcqService::reply_chunk(&request, &meta, META_XML_REPLY, b"abc", true).unwrap();
        let tlvs = Tlv::decode_all(&chunk.body).unwrap();
        let inner = &Tlv::find(&tlvs, tlv::ICQ_META).unwrap().value;
        let declared = u16::from_le_bytes([inner[0], inner[1]]) as usize;
        assert_eq!(declared + 2, inner.len());
    }
}
