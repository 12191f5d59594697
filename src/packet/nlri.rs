//
// SPDX-License-Identifier: MIT
//

// Generalized NLRI codec shared by the legacy (AFI-implicit) reachability
// fields and by MP_REACH_NLRI/MP_UNREACH_NLRI. Handles the optional
// AddPath path identifier, MPLS label stack and Route Distinguisher ahead
// of the prefix bits, in the wire order RFC 7911 / RFC 3107 / RFC 4364
// prescribe: [path-id] [labels] [rd] prefix-bits.

use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::{Deserialize, Serialize};

use crate::packet::consts::{Afi, Safi};
use crate::packet::error::UpdateMessageError;
use crate::packet::ext::{
    BytesExt, BytesMutExt, Ipv4NetworkExt, Ipv6NetworkExt,
};

// A single decoded MPLS label. The bottom-of-stack bit lives in the low
// order bit of the 3-byte-on-the-wire value; `0x800000` (not the `0x80000`
// found in some older implementations) marks an implicit-null / withdraw
// placeholder label.
pub const LABEL_BOTTOM_OF_STACK: u32 = 0x0000_01;
pub const WITHDRAW_LABEL: u32 = 0x80_0000;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
#[derive(Deserialize, Serialize)]
pub struct RouteDistinguisher(pub [u8; 8]);

impl RouteDistinguisher {
    pub const ZERO: RouteDistinguisher = RouteDistinguisher([0; 8]);

    fn decode(buf: &mut Bytes) -> Self {
        let mut value = [0; 8];
        buf.copy_to_slice(&mut value);
        RouteDistinguisher(value)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }
}

// One decoded NLRI entry: an optional AddPath identifier, an optional MPLS
// label stack, an optional Route Distinguisher, and the prefix itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Nlri {
    pub path_id: Option<u32>,
    pub labels: Vec<u32>,
    pub rd: Option<RouteDistinguisher>,
    pub prefix: IpNetwork,
}

impl Nlri {
    pub fn decode(
        buf: &mut Bytes,
        afi: Afi,
        safi: Safi,
        addpath: bool,
    ) -> Result<Option<Self>, UpdateMessageError> {
        if buf.remaining() == 0 {
            return Ok(None);
        }

        let path_id = if addpath {
            if buf.remaining() < 4 {
                return Err(UpdateMessageError::InvalidNetworkField);
            }
            Some(buf.get_u32())
        } else {
            None
        };

        if buf.remaining() == 0 {
            return Err(UpdateMessageError::InvalidNetworkField);
        }
        let mut prefix_bit_len = buf.get_u8() as usize;

        let mut labels = Vec::new();
        if safi.has_labels() {
            loop {
                if buf.remaining() < 3 || prefix_bit_len < 24 {
                    return Err(UpdateMessageError::InvalidNetworkField);
                }
                let label = buf.get_u24();
                prefix_bit_len -= 24;
                let bottom = label & LABEL_BOTTOM_OF_STACK != 0;
                labels.push(label >> 4);
                if bottom || label == WITHDRAW_LABEL || label == 0 {
                    break;
                }
            }
        }

        let rd = if safi.has_rd() {
            if buf.remaining() < 8 || prefix_bit_len < 64 {
                return Err(UpdateMessageError::InvalidNetworkField);
            }
            prefix_bit_len -= 64;
            Some(RouteDistinguisher::decode(buf))
        } else {
            None
        };

        let prefix_byte_len = prefix_bit_len.div_ceil(8);
        if buf.remaining() < prefix_byte_len {
            return Err(UpdateMessageError::InvalidNetworkField);
        }

        let prefix = match afi {
            Afi::Ipv4 => {
                if prefix_bit_len > 32 {
                    return Err(UpdateMessageError::InvalidNetworkField);
                }
                let mut octets = [0u8; 4];
                buf.copy_to_slice(&mut octets[..prefix_byte_len]);
                let network =
                    Ipv4Network::new(Ipv4Addr::from(octets), prefix_bit_len as u8)
                        .map_err(|_| UpdateMessageError::InvalidNetworkField)?;
                IpNetwork::V4(network.apply_mask())
            }
            Afi::Ipv6 => {
                if prefix_bit_len > 128 {
                    return Err(UpdateMessageError::InvalidNetworkField);
                }
                let mut octets = [0u8; 16];
                buf.copy_to_slice(&mut octets[..prefix_byte_len]);
                let network =
                    Ipv6Network::new(Ipv6Addr::from(octets), prefix_bit_len as u8)
                        .map_err(|_| UpdateMessageError::InvalidNetworkField)?;
                IpNetwork::V6(network.apply_mask())
            }
        };

        Ok(Some(Nlri { path_id, labels, rd, prefix }))
    }

    pub fn encode(&self, buf: &mut BytesMut, safi: Safi) {
        if let Some(path_id) = self.path_id {
            buf.put_u32(path_id);
        }

        let prefix_bits = match self.prefix {
            IpNetwork::V4(net) => net.prefix() as usize,
            IpNetwork::V6(net) => net.prefix() as usize,
        };
        let label_bits = self.labels.len() * 24;
        let rd_bits = if self.rd.is_some() { 64 } else { 0 };
        buf.put_u8((prefix_bits + label_bits + rd_bits) as u8);

        if safi.has_labels() {
            for (i, label) in self.labels.iter().enumerate() {
                let mut value = (*label) << 4;
                if i == self.labels.len() - 1 {
                    value |= LABEL_BOTTOM_OF_STACK;
                }
                buf.put_u24(value);
            }
        }
        if let Some(rd) = &self.rd {
            rd.encode(buf);
        }

        match self.prefix {
            IpNetwork::V4(net) => {
                let bytes = net.ip().octets();
                let len = (net.prefix() as usize).div_ceil(8);
                buf.put_slice(&bytes[..len]);
            }
            IpNetwork::V6(net) => {
                let bytes = net.ip().octets();
                let len = (net.prefix() as usize).div_ceil(8);
                buf.put_slice(&bytes[..len]);
            }
        }
    }
}

// Next-hop length expected on the wire for a given (AFI, SAFI) pair, per
// RFC 4760 and RFC 4364. MPLS-VPN next hops are prefixed with an 8-byte
// Route Distinguisher that is always zero and carries no meaning.
pub fn nexthop_wire_len(afi: Afi, safi: Safi, link_local: bool) -> usize {
    let addr_len = afi.addr_len();
    let rd_len = if safi.has_rd() { 8 } else { 0 };
    let extra = if link_local && afi == Afi::Ipv6 { addr_len } else { 0 };
    rd_len + addr_len + extra
}
