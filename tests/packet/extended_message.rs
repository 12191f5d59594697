//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use bgp_engine::config::PeerType;
use bgp_engine::packet::attribute::{
    AsPath, Attrs, BaseAttrs, UnknownAttr,
};
use bgp_engine::packet::consts::{AttrFlags, Origin};
use bgp_engine::packet::error::{DecodeError, MessageHeaderError};
use bgp_engine::packet::message::{
    DecodeCxt, EncodeCxt, Message, NegotiatedCapability, ReachNlri, UpdateMsg,
};
use bytes::Bytes;
use ipnetwork::Ipv4Network;

// A >4096-byte UPDATE, padded with a filler unknown optional attribute.
// Only decodable once the extended-message capability has been negotiated.
fn build_oversized_update() -> Message {
    let nexthop = Ipv4Addr::from_str("1.1.1.1").unwrap();
    let prefix = Ipv4Network::new(Ipv4Addr::from_str("10.0.0.0").unwrap(), 24)
        .unwrap();

    Message::Update(UpdateMsg {
        reach: Some(ReachNlri { prefixes: vec![prefix], nexthop }),
        unreach: None,
        mp_reach: None,
        mp_unreach: None,
        attrs: Some(Attrs {
            base: BaseAttrs {
                origin: Origin::Igp,
                as_path: AsPath::default(),
                nexthop: Some(IpAddr::V4(nexthop)),
                ll_nexthop: None,
                med: None,
                local_pref: None,
                aggregator: None,
                atomic_aggregate: false,
                originator_id: None,
                cluster_list: None,
            },
            comm: None,
            ext_comm: None,
            extv6_comm: None,
            large_comm: None,
            unknown: vec![UnknownAttr::new(
                200,
                AttrFlags::OPTIONAL | AttrFlags::EXTENDED,
                4050,
                Bytes::from(vec![0u8; 4050]),
            )],
        }),
    })
}

#[test]
fn test_decode_rejects_oversized_message_without_extended_message_cap() {
    let msg = build_oversized_update();
    let encode_cxt = EncodeCxt { capabilities: BTreeSet::new(), four_byte_asn: false };
    let bytes = msg.encode(&encode_cxt);
    assert!(bytes.len() > Message::MAX_LEN as usize);

    let decode_cxt = DecodeCxt {
        peer_type: PeerType::External,
        peer_as: 65550,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };

    // The header-level length check alone must reject this before the
    // body is ever parsed.
    assert_eq!(
        Message::get_message_len(&bytes, decode_cxt.message_len_ceiling()),
        None
    );
    let result = Message::decode(&bytes, &decode_cxt);
    assert!(matches!(
        result,
        Err(DecodeError::MessageHeader(
            MessageHeaderError::BadMessageLength(len)
        )) if len == bytes.len() as u16
    ));
}

#[test]
fn test_decode_accepts_oversized_message_with_extended_message_cap() {
    let msg = build_oversized_update();
    let encode_cxt = EncodeCxt { capabilities: BTreeSet::new(), four_byte_asn: false };
    let bytes = msg.encode(&encode_cxt);
    assert!(bytes.len() > Message::MAX_LEN as usize);

    let decode_cxt = DecodeCxt {
        peer_type: PeerType::External,
        peer_as: 65550,
        capabilities: [NegotiatedCapability::ExtendedMessage].into(),
        four_byte_asn: false,
    };
    assert_eq!(decode_cxt.message_len_ceiling(), u16::MAX);

    let msg_size =
        Message::get_message_len(&bytes, decode_cxt.message_len_ceiling())
            .expect("oversized message should be accepted once negotiated");
    assert_eq!(msg_size, bytes.len());
    let decoded =
        Message::decode(&bytes[0..msg_size], &decode_cxt).unwrap();
    assert_eq!(msg, decoded);
}
