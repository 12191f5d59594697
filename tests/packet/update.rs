//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use bgp_engine::config::PeerType;
use bgp_engine::packet::attribute::{AsPath, Attrs, BaseAttrs};
use bgp_engine::packet::consts::Origin;
use bgp_engine::packet::message::{
    DecodeCxt, EncodeCxt, Message, ReachNlri, UpdateMsg,
};
use ipnetwork::Ipv4Network;

#[test]
fn test_update_roundtrip1() {
    let nexthop = Ipv4Addr::from_str("1.1.1.1").unwrap();
    let prefix = Ipv4Network::new(Ipv4Addr::from_str("10.0.0.0").unwrap(), 24)
        .unwrap();

    let msg = Message::Update(UpdateMsg {
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
            unknown: Vec::new(),
        }),
    });

    let encode_cxt = EncodeCxt { capabilities: BTreeSet::new(), four_byte_asn: false };
    let bytes = msg.encode(&encode_cxt);

    let decode_cxt = DecodeCxt {
        peer_type: PeerType::External,
        peer_as: 65550,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let msg_size =
        Message::get_message_len(&bytes, Message::MAX_LEN).unwrap();
    let decoded = Message::decode(&bytes[0..msg_size], &decode_cxt).unwrap();
    assert_eq!(msg, decoded);
}
