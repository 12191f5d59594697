//
// SPDX-License-Identifier: MIT
//

use bytes::{Buf, Bytes, BytesMut};
use bgp_engine::packet::consts::{Afi, Safi};
use bgp_engine::packet::nlri::Nlri;

// Bottom-of-stack label (label value 100, bottom bit set) followed by a
// /24 IPv4 prefix: prefix_bit_len = 24 (label) + 24 (prefix) = 48.
#[test]
fn test_labeled_nlri_bottom_of_stack() {
    let mut raw = BytesMut::new();
    raw.extend_from_slice(&[
        48,           // prefix_bit_len
        0x00, 0x06, 0x41, // label 100 << 4 | bottom-of-stack bit
        10, 0, 0,     // 10.0.0.0/24
    ]);
    let mut buf = Bytes::from(raw.freeze());

    let nlri = Nlri::decode(&mut buf, Afi::Ipv4, Safi::LabeledUnicast, false)
        .unwrap()
        .unwrap();
    assert_eq!(nlri.labels, vec![100]);
    assert_eq!(nlri.prefix.prefix(), 24);
    assert!(!buf.has_remaining());
}

// A label entry equal to the literal withdraw value `0x000000` must also
// terminate the stack, not just the bottom-of-stack bit or `0x800000`.
#[test]
fn test_labeled_nlri_zero_label_terminates() {
    let mut raw = BytesMut::new();
    raw.extend_from_slice(&[
        48,           // prefix_bit_len
        0x00, 0x00, 0x00, // label == 0x000000, terminator
        10, 0, 0,     // 10.0.0.0/24
    ]);
    let mut buf = Bytes::from(raw.freeze());

    let nlri = Nlri::decode(&mut buf, Afi::Ipv4, Safi::LabeledUnicast, false)
        .unwrap()
        .unwrap();
    assert_eq!(nlri.labels, vec![0]);
    assert_eq!(nlri.prefix.prefix(), 24);
    assert!(!buf.has_remaining());
}

// The `0x800000` withdraw-label placeholder terminates the stack too,
// even without the bottom-of-stack bit set.
#[test]
fn test_labeled_nlri_withdraw_label_terminates() {
    let mut raw = BytesMut::new();
    raw.extend_from_slice(&[
        48,           // prefix_bit_len
        0x80, 0x00, 0x00, // label == 0x800000
        10, 0, 0,     // 10.0.0.0/24
    ]);
    let mut buf = Bytes::from(raw.freeze());

    let nlri = Nlri::decode(&mut buf, Afi::Ipv4, Safi::LabeledUnicast, false)
        .unwrap()
        .unwrap();
    assert_eq!(nlri.labels, vec![0x80000]);
    assert_eq!(nlri.prefix.prefix(), 24);
    assert!(!buf.has_remaining());
}

// Without the fix, a genuine `0x000000` entry in the middle of a multi-label
// stack would never be recognized as a terminator and decoding would
// misparse the rest of the NLRI as bogus label bytes. Here the stack has
// two entries: a non-terminal label, then an explicit zero terminator.
#[test]
fn test_labeled_nlri_multi_label_stack_with_zero_terminator() {
    let mut raw = BytesMut::new();
    raw.extend_from_slice(&[
        72,           // prefix_bit_len: 24 + 24 + 24
        0x00, 0x06, 0x40, // label 100, bottom bit clear: more labels follow
        0x00, 0x00, 0x00, // label == 0, terminator
        10, 0, 0,     // 10.0.0.0/24
    ]);
    let mut buf = Bytes::from(raw.freeze());

    let nlri = Nlri::decode(&mut buf, Afi::Ipv4, Safi::LabeledUnicast, false)
        .unwrap()
        .unwrap();
    assert_eq!(nlri.labels, vec![100, 0]);
    assert_eq!(nlri.prefix.prefix(), 24);
    assert!(!buf.has_remaining());
}
