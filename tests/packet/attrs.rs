//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use bytes::Bytes;
use bgp_engine::config::PeerType;
use bgp_engine::packet::attribute::{AsPathSegment, Attrs, MpReachNlri};
use bgp_engine::packet::consts::AsPathSegmentType;
use bgp_engine::packet::error::UpdateMessageError;
use bgp_engine::packet::message::DecodeCxt;

#[test]
fn test_attr_decode1() {
    let data: &[u8] = &[0x6e, 0x02, 0x02, 0x02, 0x01, 0x73, 0x73, 0x00];
    let mut buf = Bytes::copy_from_slice(data);
    let cxt = DecodeCxt {
        peer_type: PeerType::Internal,
        peer_as: 7566081,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let mut mp_unreach = None;
    let mut mp_reach = None;
    let result = Attrs::decode(&mut buf, &cxt, false, &mut mp_unreach, &mut mp_reach);
    assert!(result.is_err());
}

#[test]
fn test_attr_decode2() {
    let data: &[u8] = &[
        0xe2, 0x11, 0x01, 0x02, 0x02, 0x4b, 0x02, 0xbe, 0x63, 0x27, 0xff, 0xfd,
        0x03, 0x21,
    ];
    let mut buf = Bytes::copy_from_slice(data);
    let cxt = DecodeCxt {
        peer_type: PeerType::Internal,
        peer_as: 3187821314,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let mut mp_unreach = None;
    let mut mp_reach = None;
    let result = Attrs::decode(&mut buf, &cxt, false, &mut mp_unreach, &mut mp_reach);
    let expected = Err(UpdateMessageError::UnrecognizedWellKnownAttribute);
    assert_eq!(expected, result);
}

#[test]
fn test_as_path_segment_decode1() {
    let data: &[u8] = &[];
    let mut buf = Bytes::copy_from_slice(data);
    let result = AsPathSegment::decode(&mut buf, false);
    let expected = Err(UpdateMessageError::MalformedAsPath);

    assert_eq!(expected, result);
}

// AS_PATH AS_SEQUENCE [23456, 23456, 100], AS4_PATH AS_SEQUENCE
// [70000, 100]: L2=3 >= L4=2, so the merged AS_SEQUENCE keeps AS_PATH's
// leading (3-2)=1 entry and appends AS4_PATH's entries in full.
// AS_PATH AS_SET [500, 600], AS4_PATH AS_SET [800, 900]: L2=2 >= L4=2,
// so the merged AS_SET keeps zero leading entries and is just AS4_PATH's
// set. The two merges run independently: neither counter affects the
// other's length accounting.
#[test]
fn test_attr_decode_merges_as_path_and_as4_path_sequence_and_set() {
    let data: &[u8] = &[
        // ORIGIN: IGP
        0x40, 0x01, 0x01, 0x00,
        // AS_PATH: SEQUENCE[23456, 23456, 100], SET[500, 600]
        0x40, 0x02, 0x0e, 0x02, 0x03, 0x5b, 0xa0, 0x5b, 0xa0, 0x00, 0x64,
        0x01, 0x02, 0x01, 0xf4, 0x02, 0x58,
        // AS4_PATH: SEQUENCE[70000, 100], SET[800, 900]
        0xc0, 0x11, 0x14, 0x02, 0x02, 0x00, 0x01, 0x11, 0x70, 0x00, 0x00,
        0x00, 0x64, 0x01, 0x02, 0x00, 0x00, 0x03, 0x20, 0x00, 0x00, 0x03,
        0x84,
    ];
    let mut buf = Bytes::copy_from_slice(data);
    let cxt = DecodeCxt {
        peer_type: PeerType::External,
        peer_as: 23456,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let mut mp_unreach = None;
    let mut mp_reach = None;
    let attrs =
        Attrs::decode(&mut buf, &cxt, false, &mut mp_unreach, &mut mp_reach)
            .unwrap();

    let segments: Vec<_> = attrs.base.as_path.segments.into_iter().collect();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].seg_type, AsPathSegmentType::Sequence);
    assert_eq!(
        segments[0].members.iter().copied().collect::<Vec<_>>(),
        vec![23456, 70000, 100]
    );
    assert_eq!(segments[1].seg_type, AsPathSegmentType::Set);
    assert_eq!(
        segments[1].members.iter().copied().collect::<Vec<_>>(),
        vec![800, 900]
    );
}

// AS_PATH AS_SET [10] (L2=1) is shorter than AS4_PATH AS_SET [20, 30]
// (L4=2): the merge rule for AS_SET keeps AS_PATH's set untouched and
// drops AS4_PATH's entirely, independent of how the AS_SEQUENCE merge
// resolves in the same attribute set.
#[test]
fn test_attr_decode_as_set_merge_keeps_shorter_as_path_set() {
    let data: &[u8] = &[
        // ORIGIN: IGP
        0x40, 0x01, 0x01, 0x00,
        // AS_PATH: SEQUENCE[111, 222], SET[10]
        0x40, 0x02, 0x0a, 0x02, 0x02, 0x00, 0x6f, 0x00, 0xde, 0x01, 0x01,
        0x00, 0x0a,
        // AS4_PATH: SEQUENCE[99999], SET[20, 30]
        0xc0, 0x11, 0x10, 0x02, 0x01, 0x00, 0x01, 0x86, 0x9f, 0x01, 0x02,
        0x00, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00, 0x1e,
    ];
    let mut buf = Bytes::copy_from_slice(data);
    let cxt = DecodeCxt {
        peer_type: PeerType::External,
        peer_as: 111,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let mut mp_unreach = None;
    let mut mp_reach = None;
    let attrs =
        Attrs::decode(&mut buf, &cxt, false, &mut mp_unreach, &mut mp_reach)
            .unwrap();

    let segments: Vec<_> = attrs.base.as_path.segments.into_iter().collect();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].seg_type, AsPathSegmentType::Sequence);
    assert_eq!(
        segments[0].members.iter().copied().collect::<Vec<_>>(),
        vec![111, 99999]
    );
    assert_eq!(segments[1].seg_type, AsPathSegmentType::Set);
    assert_eq!(
        segments[1].members.iter().copied().collect::<Vec<_>>(),
        vec![10]
    );
}

#[test]
fn test_mp_reach_nlri_decode1() {
    // Checks that the AFI/SAFI/nexthop-length/reserved fields are all read
    // from the buffer before anything else is inspected.
    let data: &[u8] = &[
        0x0, 0x02, 0x1, 0x10, 0x00, 0xdf, 0x3f, 0x1a, 0x1a, 0x1a, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut buf = Bytes::copy_from_slice(data);
    let cxt = DecodeCxt {
        peer_type: PeerType::Internal,
        peer_as: 1,
        capabilities: BTreeSet::new(),
        four_byte_asn: false,
    };
    let _ = MpReachNlri::decode(&mut buf, &cxt);
}
