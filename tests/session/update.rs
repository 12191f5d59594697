//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bgp_engine::config::{AddPathDirections, NeighborConfig, PeerType};
use bgp_engine::route::RouteAction;
use bgp_engine::session::connection::test::MemoryConnection;
use bgp_engine::session::delta::test::FixedDelta;
use bgp_engine::session::notifier::test::NullNotifier;
use bgp_engine::session::Session;
use ipnetwork::IpNetwork;

fn base_config(parse_routes: bool) -> NeighborConfig {
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
        parse_routes,
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

// One announced route for 10.0.0.0/24 via nexthop 1.1.1.1, AS_PATH = [65001]
// (required for the eBGP first-AS check), no withdrawals.
fn update_msg_one_announced() -> Vec<u8> {
    let mut bytes = vec![0xff; 16];
    bytes.extend_from_slice(&[0x00, 0x2d, 0x02]); // length=45, type=Update
    bytes.extend_from_slice(&[0x00, 0x00]); // withdrawn routes length
    bytes.extend_from_slice(&[0x00, 0x12]); // total path attribute length=18
    bytes.extend_from_slice(&[0x40, 0x01, 0x01, 0x00]); // ORIGIN = IGP
    bytes.extend_from_slice(&[
        0x40, 0x02, 0x04, 0x02, 0x01, 0xfd, 0xe9,
    ]); // AS_PATH = SEQUENCE[65001]
    bytes.extend_from_slice(&[
        0x40, 0x03, 0x04, 0x01, 0x01, 0x01, 0x01,
    ]); // NEXT_HOP = 1.1.1.1
    bytes.extend_from_slice(&[0x18, 0x0a, 0x00, 0x00]); // NLRI 10.0.0.0/24
    bytes
}

#[tokio::test]
async fn test_established_update_is_surfaced_to_delta_producer() {
    let config = base_config(true);
    let mut connection = MemoryConnection::new();
    connection.push_inbound(&open_msg(65001, 180, Ipv4Addr::new(10, 0, 0, 11)));
    connection.push_inbound(&keepalive_msg());
    connection.push_inbound(&update_msg_one_announced());

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    let _ = tokio::time::timeout(Duration::from_millis(200), session.run()).await;

    let received = &session.delta().received;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].action, RouteAction::Announced);
    assert_eq!(
        received[0].nlri.prefix,
        IpNetwork::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)), 24).unwrap()
    );
}

#[tokio::test]
async fn test_established_update_is_not_surfaced_when_parse_routes_is_false() {
    let config = base_config(false);
    let mut connection = MemoryConnection::new();
    connection.push_inbound(&open_msg(65001, 180, Ipv4Addr::new(10, 0, 0, 11)));
    connection.push_inbound(&keepalive_msg());
    connection.push_inbound(&update_msg_one_announced());

    let mut session = Session::new(
        config,
        connection,
        FixedDelta { fragments: Vec::new(), ..Default::default() },
        NullNotifier,
    );

    let _ = tokio::time::timeout(Duration::from_millis(200), session.run()).await;

    assert!(session.delta().received.is_empty());
}
