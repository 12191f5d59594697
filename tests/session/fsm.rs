//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bgp_engine::config::{AddPathDirections, NeighborConfig, PeerType};
use bgp_engine::error::Failure;
use bgp_engine::packet::consts::{ErrorCode, OpenMessageErrorSubcode};
use bgp_engine::session::connection::test::MemoryConnection;
use bgp_engine::session::delta::test::FixedDelta;
use bgp_engine::session::fsm::State;
use bgp_engine::session::notifier::test::NullNotifier;
use bgp_engine::session::Session;

fn base_config() -> NeighborConfig {
    NeighborConfig {
        local_as: 65002,
        peer_as: 65001,
        local_address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        peer_address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 11)),
        router_id: Ipv4Addr::new(10, 0, 0, 1),
        peer_type: PeerType::External,
        hold_time: 180,
        connect_retry_time: 120,
        four_byte_asn: false,
        extended_message: false,
        add_path: AddPathDirections::default(),
        families: Vec::new(),
        md5: None,
        ttl: None,
        parse_routes: true,
        peer_updates: false,
    }
}

fn open_msg(as_no: u16, holdtime: u16, identifier: Ipv4Addr) -> Vec<u8> {
    let mut bytes = vec![0xff; 16];
    bytes.extend_from_slice(&[0x00, 0x1d, 0x01]);
    bytes.push(0x04); // version
    bytes.extend_from_slice(&as_no.to_be_bytes());
    bytes.extend_from_slice(&holdtime.to_be_bytes());
    bytes.extend_from_slice(&identifier.octets());
    bytes.push(0x00); // opt param len
    bytes
}

fn keepalive_msg() -> Vec<u8> {
    let mut bytes = vec![0xff; 16];
    bytes.extend_from_slice(&[0x00, 0x13, 0x04]);
    bytes
}

#[tokio::test]
async fn test_open_happy_path() {
    let config = base_config();
    let mut connection = MemoryConnection::new();
    connection.push_inbound(&open_msg(65001, 180, Ipv4Addr::new(10, 0, 0, 11)));
    connection.push_inbound(&keepalive_msg());

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    // The session reaches Established and then loops forever pulling
    // deltas/keepalives; bound the run so the test terminates.
    let _ = tokio::time::timeout(Duration::from_millis(200), session.run()).await;

    assert_eq!(session.state, State::Established);
    assert_eq!(session.negotiated_hold_time(), Some(Duration::from_secs(180)));
    assert!(session.negotiated_families().is_empty());
}

#[tokio::test]
async fn test_open_bad_identifier_is_rejected() {
    // A zero BGP identifier is invalid on its own, independent of any
    // collision check; the codec itself rejects it while decoding the OPEN.
    let config = base_config();
    let mut connection = MemoryConnection::new();
    connection.push_inbound(&open_msg(65001, 180, Ipv4Addr::new(0, 0, 0, 0)));

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    let result = session.run().await;
    match result {
        Err(Failure::NotifySent(notify)) => {
            assert_eq!(notify.code, ErrorCode::OpenMessageError);
            assert_eq!(notify.subcode, OpenMessageErrorSubcode::BadBgpIdentifier as u8);
        }
        other => panic!("expected a NOTIFICATION(2,3), got {other:?}"),
    }
    assert_eq!(session.state, State::Closed);
}

#[tokio::test]
async fn test_ibgp_self_collision_is_rejected() {
    // The peer's reported identifier matches our own router-id while the
    // peer claims our own ASN: an iBGP session colliding with ourself.
    let mut config = base_config();
    config.local_as = 65001;
    config.peer_as = 65001;
    config.router_id = Ipv4Addr::new(10, 0, 0, 1);

    let mut connection = MemoryConnection::new();
    connection.push_inbound(&open_msg(65001, 180, Ipv4Addr::new(10, 0, 0, 1)));

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    let result = session.run().await;
    match result {
        Err(Failure::NotifySent(notify)) => {
            assert_eq!(notify.code, ErrorCode::OpenMessageError);
            assert_eq!(notify.subcode, OpenMessageErrorSubcode::BadBgpIdentifier as u8);
        }
        other => panic!("expected a NOTIFICATION(2,3), got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_peer_as_is_rejected() {
    let config = base_config();
    let mut connection = MemoryConnection::new();
    // Peer claims AS 100, but config.peer_as is 65001.
    connection.push_inbound(&open_msg(100, 180, Ipv4Addr::new(10, 0, 0, 11)));

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    let result = session.run().await;
    match result {
        Err(Failure::NotifySent(notify)) => {
            assert_eq!(notify.code, ErrorCode::OpenMessageError);
            assert_eq!(notify.subcode, OpenMessageErrorSubcode::BadPeerAs as u8);
        }
        other => panic!("expected a NOTIFICATION(2,2), got {other:?}"),
    }
}

#[tokio::test]
async fn test_header_rejection_on_desynced_marker() {
    let config = base_config();
    let mut connection = MemoryConnection::new();
    // 16 non-0xff marker bytes followed by a 19-byte length/type header.
    let mut bytes = vec![0x00; 16];
    bytes.extend_from_slice(&[0x00, 0x13, 0x04]);
    connection.push_inbound(&bytes);

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    let result = session.run().await;
    match result {
        Err(Failure::NotifySent(notify)) => {
            assert_eq!(notify.code, ErrorCode::MessageHeaderError);
            assert_eq!(notify.subcode, 1);
        }
        other => panic!("expected a NOTIFICATION(1,1), got {other:?}"),
    }
}
