//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use bgp_engine::config::PeerType;
use bgp_engine::packet::message::{DecodeCxt, Message};

// A ROUTE-REFRESH message carries no state this engine interprets; it
// decodes to `Message::Nop`.
#[test]
fn test_decode_route_refresh1() {
    let bytes: &[u8] = &[
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x13, 0x05,
    ];
    let cxt = DecodeCxt {
        peer_type: PeerType::Internal,
        peer_as: 65550,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let msg_size =
        Message::get_message_len(bytes, Message::MAX_LEN).unwrap();
    let msg = Message::decode(&bytes[0..msg_size], &cxt).unwrap();
    assert_eq!(Message::Nop, msg);
}
