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

//! Property tests for the FLAP/SNAC/TLV framing stack.

use bytes::{BufMut, Bytes, BytesMut};
use oscarix_flapcodec::{Flap, FlapCodec, FlapKind, Snac, Tlv, roast};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

fn arb_flap_kind() -> impl Strategy<Value = FlapKind> {
    prop_oneof![
        Just(FlapKind::SignOn),
        Just(FlapKind::Data),
        Just(FlapKind::Error),
        Just(FlapKind::SignOff),
        Just(FlapKind::KeepAlive),
    ]
}

proptest! {
    #[test]
    fn flap_roundtrip(
        kind in arb_flap_kind(),
        sequence in any::<u16>(),
        payload in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let frame = Flap::new(kind, sequence, Bytes::from(payload));
        let mut codec = FlapCodec::new();
        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).unwrap();
        let decoded = codec.decode(&mut wire).unwrap().unwrap();
        prop_assert_eq!(decoded, frame);
        prop_assert!(wire.is_empty());
    }

    #[test]
    fn concatenated_flaps_decode_in_order(
        payloads in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..128),
            1..16,
        ),
    ) {
        let frames: Vec<Flap> = payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| Flap::data(i as u16 + 1, Bytes::from(payload)))
            .collect();

        let mut wire = BytesMut::new();
        for frame in &frames {
            wire.put_slice(&frame.to_bytes());
        }

        let mut codec = FlapCodec::new();
        let mut decoded = Vec::new();
        while let Some(frame) = codec.decode(&mut wire).unwrap() {
            decoded.push(frame);
        }
        prop_assert_eq!(decoded, frames);
    }

    #[test]
    fn tlv_roundtrip(
        kind in any::<u16>(),
        value in proptest::collection::vec(any::<u8>(), 0..1024),
    ) {
        let tlv = Tlv::new(kind, Bytes::from(value));
        let decoded = Tlv::decode_all(&tlv.to_bytes()).unwrap();
        prop_assert_eq!(decoded.len(), 1);
        prop_assert_eq!(&decoded[0], &tlv);
    }

    #[test]
    fn tlv_concatenation_roundtrip(
        entries in proptest::collection::vec(
            (any::<u16>(), proptest::collection::vec(any::<u8>(), 0..64)),
            0..12,
        ),
    ) {
        let tlvs: Vec<Tlv> = entries
            .into_iter()
            .map(|(kind, value)| Tlv::new(kind, Bytes::from(value)))
            .collect();
        let mut wire = BytesMut::new();
        for tlv in &tlvs {
            tlv.encode_to(&mut wire).unwrap();
        }
        let decoded = Tlv::decode_all(&wire).unwrap();
        prop_assert_eq!(decoded, tlvs);
    }

    #[test]
    fn snac_roundtrip(
        family in any::<u16>(),
        subtype in any::<u16>(),
        flags in any::<u16>(),
        request_id in any::<u32>(),
        body in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let snac = Snac::with_body(family, subtype, flags, request_id, Bytes::from(body));
        let decoded = Snac::decode(&snac.to_bytes()).unwrap();
        prop_assert_eq!(decoded, snac);
    }

    #[test]
    fn snac_reply_preserves_request_id(
        family in any::<u16>(),
        subtype in any::<u16>(),
        request_id in any::<u32>(),
        new_family in any::<u16>(),
    ) {
        let request = Snac::new(family, subtype, 0, request_id);

        let inherited = request.reply(None, None, None, Bytes::new());
        prop_assert_eq!(inherited.family, family);
        prop_assert_eq!(inherited.subtype, subtype);
        prop_assert_eq!(inherited.request_id, request_id);

        let overridden = request.reply(Some(new_family), None, None, Bytes::new());
        prop_assert_eq!(overridden.family, new_family);
        prop_assert_eq!(overridden.subtype, subtype);
        prop_assert_eq!(overridden.request_id, request_id);
    }

    #[test]
    fn roast_is_self_inverse(password in proptest::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(roast(&roast(&password)), password);
    }
}

#[test]
fn roast_concrete_vector() {
    assert_eq!(roast(&roast(b"penis")), b"penis");
    // roasting is not the identity
    assert_ne!(roast(b"penis"), b"penis".to_vec());
}
