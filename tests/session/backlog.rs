//
// SPDX-License-Identifier: MIT
//

use std::time::{Duration, Instant};

use bgp_engine::error::Failure;
use bgp_engine::session::backlog::{chunk_fragments, Backlog};
use bytes::Bytes;

#[test]
fn test_backlog_is_fifo() {
    let mut backlog = Backlog::new();
    let now = Instant::now();
    backlog.push(Bytes::from_static(b"first"), now);
    backlog.push(Bytes::from_static(b"second"), now);
    backlog.push(Bytes::from_static(b"third"), now);

    assert_eq!(backlog.peek_front(), Some(Bytes::from_static(b"first")));
    assert_eq!(backlog.pop_front(), Some(Bytes::from_static(b"first")));
    assert_eq!(backlog.pop_front(), Some(Bytes::from_static(b"second")));
    assert_eq!(backlog.pop_front(), Some(Bytes::from_static(b"third")));
    assert_eq!(backlog.pop_front(), None);
}

#[test]
fn test_backlog_kill_on_stall() {
    // Mirrors the spec's hold_time=30s stall scenario, scaled to
    // milliseconds so the test doesn't need to sleep for 31 real seconds.
    let hold_time = Duration::from_millis(30);
    let mut backlog = Backlog::new();
    let started = Instant::now();
    backlog.push(Bytes::from_static(b"stuck"), started);

    assert!(backlog.check_kill(started, hold_time).is_ok());

    std::thread::sleep(Duration::from_millis(40));
    let result = backlog.check_kill(Instant::now(), hold_time);
    assert!(matches!(result, Err(Failure::PeerNotReading)));
}

#[test]
fn test_backlog_kill_on_depth() {
    let mut backlog = Backlog::new();
    let now = Instant::now();
    for _ in 0..=bgp_engine::packet::consts::MAX_BACKLOG {
        backlog.push(Bytes::from_static(b"x"), now);
    }
    let result = backlog.check_kill(now, Duration::ZERO);
    assert!(matches!(result, Err(Failure::PeerNotReading)));
}

#[test]
fn test_backlog_never_kills_within_hold_time() {
    let hold_time = Duration::from_secs(30);
    let mut backlog = Backlog::new();
    let now = Instant::now();
    backlog.push(Bytes::from_static(b"pending"), now);
    assert!(backlog.check_kill(now, hold_time).is_ok());
}

#[test]
fn test_chunk_fragments_respects_cap() {
    let fragments = vec![
        Bytes::from_static(b"aaaa"),
        Bytes::from_static(b"bb"),
        Bytes::from_static(b"cccccc"),
    ];
    let chunks = chunk_fragments(fragments.into_iter(), 6).unwrap();

    // "aaaa" + "bb" fit in one 6-byte chunk; "cccccc" starts a new one.
    assert_eq!(chunks.len(), 2);
    assert_eq!(&chunks[0][..], b"aaaabb");
    assert_eq!(&chunks[1][..], b"cccccc");
}

#[test]
fn test_chunk_fragments_oversized_is_fatal() {
    let fragments = vec![Bytes::from_static(b"toolong")];
    let result = chunk_fragments(fragments.into_iter(), 4);
    assert!(matches!(result, Err(Failure::FragmentTooLarge(7, 4))));
}
