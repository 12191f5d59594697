//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod attrs;
mod extended_message;
mod ip;
mod keepalive;
mod nlri;
mod notification;
mod open;
mod route_refresh;
mod update;

use bgp_engine::config::PeerType;
use bgp_engine::packet::message::{
    DecodeCxt, EncodeCxt, Message, NegotiatedCapability,
};

//
// Helper functions.
//

fn test_encode_msg(bytes_expected: &[u8], msg: &Message) {
    let cxt = EncodeCxt {
        capabilities: [NegotiatedCapability::FourOctetAsNumber].into(),
        four_byte_asn: true,
    };

    let bytes_actual = msg.encode(&cxt);
    assert_eq!(bytes_expected, &bytes_actual[..]);
}

fn test_decode_msg(bytes: &[u8], msg_expected: &Message) {
    let cxt = DecodeCxt {
        peer_type: PeerType::Internal,
        peer_as: 65550,
        capabilities: [NegotiatedCapability::FourOctetAsNumber].into(),
        four_byte_asn: true,
    };

    let msg_size = Message::get_message_len(bytes, Message::MAX_LEN)
        .expect("Buffer doesn't contain a full BGP message");
    let msg_actual = Message::decode(&bytes[0..msg_size], &cxt).unwrap();
    assert_eq!(*msg_expected, msg_actual);
}
