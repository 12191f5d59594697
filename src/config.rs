//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::packet::consts::{Afi, Safi};

// Whether a peer sits inside or outside the local autonomous system. This
// drives several wire-level decisions (LOCAL_PREF acceptance, eBGP first-AS
// enforcement, TTL/AS-path-prepend policy left to external collaborators).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PeerType {
    Internal,
    External,
}

// Static, read-only configuration for a single BGP session. Loading and
// validating this struct from whatever source (file, gRPC, YANG) is outside
// this crate; the session engine only ever reads it.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct NeighborConfig {
    pub local_as: u32,
    pub peer_as: u32,
    pub local_address: IpAddr,
    pub peer_address: IpAddr,
    pub router_id: std::net::Ipv4Addr,
    pub peer_type: PeerType,
    pub hold_time: u16,
    pub connect_retry_time: u16,
    pub four_byte_asn: bool,
    pub extended_message: bool,
    pub add_path: AddPathDirections,
    // Families advertised locally via MULTIPROTOCOL_EXTENSIONS.
    pub families: Vec<(Afi, Safi)>,
    // TCP-level concerns, consumed by whatever builds the `Connection` this
    // session is handed; the engine itself never reads these.
    pub md5: Option<String>,
    pub ttl: Option<u8>,
    // Whether decoded UPDATEs are handed to a RIB; false means this session
    // exists purely to hold the BGP state machine open (e.g. a monitoring
    // peer). The engine always validates UPDATEs regardless of this flag.
    pub parse_routes: bool,
    // Whether helper processes are notified on connect.
    pub peer_updates: bool,
}

impl NeighborConfig {
    // Negotiated hold time keepalive cadence: hold_time / 3, floored at one
    // second, per RFC 4271 section 10.
    pub fn keepalive_interval(&self) -> std::time::Duration {
        let secs = (self.hold_time / 3).max(1);
        std::time::Duration::from_secs(secs as u64)
    }
}

// Per-(AFI,SAFI) ADD-PATH send/receive directions requested locally. Kept
// deliberately simple: a crate consuming this engine is expected to flatten
// its own richer per-family config into this shape before starting a
// session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AddPathDirections {
    pub send: bool,
    pub receive: bool,
}
