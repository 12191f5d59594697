//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::config::PeerType;
use crate::packet::consts::{
    Afi, AsPathSegmentType, AttrFlags, AttrType, Origin, Safi,
    WellKnownCommunities,
};
use crate::packet::error::UpdateMessageError;
use crate::packet::ext::{
    BytesExt, BytesMutExt, Ipv4AddrExt, Ipv6AddrExt,
};
use crate::packet::message::{DecodeCxt, EncodeCxt};
use crate::packet::nlri::Nlri;

pub const ATTR_MIN_LEN: u16 = 3;
pub const ATTR_MIN_LEN_EXT: u16 = 4;

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Attrs {
    pub base: BaseAttrs,
    pub comm: Option<Comms>,
    pub ext_comm: Option<ExtComms>,
    pub extv6_comm: Option<Extv6Comms>,
    pub large_comm: Option<LargeComms>,
    pub unknown: Vec<UnknownAttr>,
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct BaseAttrs {
    pub origin: Origin,
    pub as_path: AsPath,
    pub nexthop: Option<IpAddr>,
    pub ll_nexthop: Option<Ipv6Addr>,
    pub med: Option<u32>,
    pub local_pref: Option<u32>,
    pub aggregator: Option<Aggregator>,
    pub atomic_aggregate: bool,
    pub originator_id: Option<Ipv4Addr>,
    pub cluster_list: Option<ClusterList>,
}

#[derive(Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct AsPath {
    pub segments: VecDeque<AsPathSegment>,
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct AsPathSegment {
    pub seg_type: AsPathSegmentType,
    pub members: VecDeque<u32>,
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Aggregator {
    pub asn: u32,
    pub identifier: Ipv4Addr,
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct ClusterList(pub BTreeSet<Ipv4Addr>);

// Regular (RFC 1997) community: a bare 4-byte opaque value, conventionally
// split ASN:VALUE.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Comm(pub u32);

// Extended community (RFC 4360): 8 bytes, type/subtype prefixed.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct ExtComm(pub [u8; 8]);

// IPv6 Address Specific Extended Community (RFC 5701): a 16-byte IPv6
// global administrator plus a 2-byte local administrator, wrapped in the
// usual type/subtype header.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Extv6Comm(pub Ipv6Addr, pub u32);

// Large community (RFC 8092): three 4-byte fields.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct LargeComm(pub [u8; 12]);

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct CommList<T: CommType>(pub BTreeSet<T>);

pub trait CommType:
    Clone + std::fmt::Debug + Eq + Ord + PartialEq + PartialOrd
{
    const TYPE: AttrType;
    const LENGTH: usize;

    fn encode(&self, buf: &mut BytesMut);
    fn decode(buf: &mut Bytes) -> Self;
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct UnknownAttr {
    pub attr_type: u8,
    pub flags: AttrFlags,
    pub length: u16,
    pub value: Bytes,
}

// Useful type definitions.
pub type Comms = CommList<Comm>;
pub type ExtComms = CommList<ExtComm>;
pub type Extv6Comms = CommList<Extv6Comm>;
pub type LargeComms = CommList<LargeComm>;

// MP_REACH_NLRI attribute (RFC 4760), generalized over any (AFI, SAFI)
// pair the NLRI codec understands rather than just IPv4/IPv6 unicast.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MpReachNlri {
    pub afi: Afi,
    pub safi: Safi,
    pub nexthop: IpAddr,
    pub ll_nexthop: Option<Ipv6Addr>,
    pub nlri: Vec<Nlri>,
}

// MP_UNREACH_NLRI attribute (RFC 4760).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MpUnreachNlri {
    pub afi: Afi,
    pub safi: Safi,
    pub nlri: Vec<Nlri>,
}

// ===== impl Attrs =====

impl Attrs {
    // A minimal attribute set carrying nothing but a mandatory ORIGIN/
    // AS_PATH pair, used for end-of-RIB markers whose MP_UNREACH_NLRI is
    // the only attribute that matters.
    pub fn empty() -> Self {
        Attrs {
            base: BaseAttrs {
                origin: Origin::Igp,
                as_path: AsPath::default(),
                nexthop: None,
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
        }
    }

    pub(crate) fn encode(
        &self,
        buf: &mut BytesMut,
        mp_reach: &Option<MpReachNlri>,
        mp_unreach: &Option<MpUnreachNlri>,
        cxt: &EncodeCxt,
    ) {
        let four_byte_asn_cap = cxt.four_byte_asn;

        // MP_REACH_NLRI/MP_UNREACH_NLRI go first: neither is mandatory but
        // both are cheap to locate when they lead the attribute list.
        if let Some(mp_reach) = mp_reach {
            mp_reach_nlri::encode(mp_reach, buf);
        }
        if let Some(mp_unreach) = mp_unreach {
            mp_unreach_nlri::encode(mp_unreach, buf);
        }

        // RFC 4271 - Section 5:
        // "The sender of an UPDATE message SHOULD order path attributes
        // within the UPDATE message in ascending order of attribute type".

        origin::encode(self.base.origin, buf);

        self.base.as_path.encode(buf, four_byte_asn_cap);

        if let Some(IpAddr::V4(nexthop)) = self.base.nexthop {
            nexthop::encode(nexthop, buf);
        }

        if let Some(metric) = self.base.med {
            med::encode(metric, buf);
        }

        if let Some(local_pref) = self.base.local_pref {
            local_pref::encode(local_pref, buf);
        }

        if self.base.atomic_aggregate {
            atomic_aggregate::encode(buf);
        }

        if let Some(aggregator) = &self.base.aggregator {
            aggregator.encode(
                buf,
                AttrType::Aggregator,
                four_byte_asn_cap,
            );
        }

        if let Some(comm) = &self.comm {
            comm.encode(buf);
        }

        if let Some(originator_id) = self.base.originator_id {
            originator_id::encode(originator_id, buf);
        }

        if let Some(cluster_list) = &self.base.cluster_list {
            cluster_list.encode(buf);
        }

        if let Some(ext_comm) = &self.ext_comm {
            ext_comm.encode(buf);
        }

        if let Some(extv6_comm) = &self.extv6_comm {
            extv6_comm.encode(buf);
        }

        if let Some(large_comm) = &self.large_comm {
            large_comm.encode(buf);
        }

        for attr in &self.unknown {
            attr.encode(buf);
        }
    }

    // Parses the attribute section of an UPDATE message. Any malformed or
    // conflicting attribute is a hard decode failure: there is no
    // treat-as-withdraw salvage path, matching a fail-fast session policy
    // instead of RFC 7606's partial recovery.
    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        nlri_present: bool,
        mp_unreach: &mut Option<MpUnreachNlri>,
        mp_reach: &mut Option<MpReachNlri>,
    ) -> Result<Self, UpdateMessageError> {
        let mut origin = None;
        let mut as_path = None;
        let mut as4_path = None;
        let mut med = None;
        let mut local_pref = None;
        let mut aggregator = None;
        let mut as4_aggregator = None;
        let mut atomic_aggregate = false;
        let mut originator_id = None;
        let mut cluster_list = None;
        let mut comm = None;
        let mut ext_comm = None;
        let mut extv6_comm = None;
        let mut large_comm = None;
        let mut nexthop = None;
        let mut unknown = vec![];

        let four_byte_asn_cap = cxt.four_byte_asn;

        let mut attr_list = HashSet::new();

        while buf.remaining() > 0 {
            if buf.remaining() < 2 {
                return Err(UpdateMessageError::ReadOutOfBounds);
            }

            let attr_flags = buf.get_u8();
            let attr_flags = AttrFlags::from_bits_truncate(attr_flags);

            let attr_type_raw = buf.get_u8();
            let attr_type = AttrType::from_u8(attr_type_raw);

            let attr_len = if attr_flags.contains(AttrFlags::EXTENDED) {
                if buf.remaining() < 2 {
                    return Err(UpdateMessageError::ReadOutOfBounds);
                }
                buf.get_u16() as usize
            } else {
                if buf.remaining() < 1 {
                    return Err(UpdateMessageError::ReadOutOfBounds);
                }
                buf.get_u8() as usize
            };
            if attr_len > buf.remaining() {
                return Err(UpdateMessageError::AttributeLengthError(
                    attr_len as u16,
                ));
            }
            let mut attr_buf = buf.copy_to_bytes(attr_len);

            if let Some(attr_type) = attr_type
                && (attr_flags & (AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE))
                    != attribute_flags(attr_type)
            {
                return Err(UpdateMessageError::AttributeFlagsError);
            }

            // Duplicate well-known attribute types are always a fatal
            // malformed-list error under fail-fast processing, not just for
            // MP_REACH_NLRI/MP_UNREACH_NLRI.
            if !attr_list.insert(attr_type_raw) {
                return Err(UpdateMessageError::MalformedAttributeList);
            }

            match attr_type {
                Some(AttrType::Origin) => {
                    origin::decode(&mut attr_buf, &mut origin)?
                }
                Some(AttrType::AsPath) => {
                    as_path = Some(AsPath::decode(
                        &mut attr_buf,
                        cxt,
                        AttrType::AsPath,
                        four_byte_asn_cap,
                    )?);
                }
                Some(AttrType::As4Path) => {
                    as4_path = Some(AsPath::decode(
                        &mut attr_buf,
                        cxt,
                        AttrType::As4Path,
                        true,
                    )?);
                }
                Some(AttrType::Nexthop) => {
                    nexthop::decode(&mut attr_buf, &mut nexthop)?
                }
                Some(AttrType::Med) => med::decode(&mut attr_buf, &mut med)?,
                Some(AttrType::LocalPref) => local_pref::decode(
                    &mut attr_buf,
                    cxt,
                    &mut local_pref,
                )?,
                Some(AttrType::AtomicAggregate) => {
                    atomic_aggregate::decode(&mut attr_buf, &mut atomic_aggregate)?
                }
                Some(AttrType::Aggregator) => {
                    aggregator = Some(Aggregator::decode(
                        &mut attr_buf,
                        AttrType::Aggregator,
                        four_byte_asn_cap,
                    )?);
                }
                Some(AttrType::As4Aggregator) => {
                    as4_aggregator = Some(Aggregator::decode(
                        &mut attr_buf,
                        AttrType::As4Aggregator,
                        true,
                    )?);
                }
                Some(AttrType::Communities) => {
                    comm = Some(Comms::decode(&mut attr_buf)?)
                }
                Some(AttrType::OriginatorId) => originator_id::decode(
                    &mut attr_buf,
                    cxt,
                    &mut originator_id,
                )?,
                Some(AttrType::ClusterList) => {
                    cluster_list = Some(ClusterList::decode(&mut attr_buf)?)
                }
                Some(AttrType::MpReachNlri) => {
                    *mp_reach = Some(MpReachNlri::decode(&mut attr_buf, cxt)?);
                }
                Some(AttrType::MpUnreachNlri) => {
                    *mp_unreach =
                        Some(MpUnreachNlri::decode(&mut attr_buf, cxt)?);
                }
                Some(AttrType::ExtCommunities) => {
                    ext_comm = Some(ExtComms::decode(&mut attr_buf)?)
                }
                Some(AttrType::Extv6Community) => {
                    extv6_comm = Some(Extv6Comms::decode(&mut attr_buf)?)
                }
                Some(AttrType::LargeCommunity) => {
                    large_comm = Some(LargeComms::decode(&mut attr_buf)?)
                }
                // Recognized but not interpreted by this engine: preserved
                // verbatim like an unknown optional attribute.
                Some(AttrType::Otc) => {
                    unknown.push(UnknownAttr::new(
                        attr_type_raw,
                        attr_flags,
                        attr_len as u16,
                        attr_buf.clone(),
                    ));
                }
                // Unrecognized well-known attribute: always fatal.
                None if !attr_flags.contains(AttrFlags::OPTIONAL) => {
                    return Err(
                        UpdateMessageError::UnrecognizedWellKnownAttribute,
                    );
                }
                // Unrecognized optional attribute: retained verbatim.
                None => {
                    unknown.push(UnknownAttr::new(
                        attr_type_raw,
                        attr_flags,
                        attr_len as u16,
                        attr_buf.clone(),
                    ));
                }
            }
        }

        let Some(origin) = origin else {
            return Err(UpdateMessageError::MissingWellKnownAttribute);
        };
        let Some(mut as_path) = as_path else {
            return Err(UpdateMessageError::MissingWellKnownAttribute);
        };
        if local_pref.is_none() && cxt.peer_type == PeerType::Internal {
            return Err(UpdateMessageError::MissingWellKnownAttribute);
        }
        if nexthop.is_none() && nlri_present && mp_reach.is_none() {
            return Err(UpdateMessageError::MissingWellKnownAttribute);
        }

        // RFC 4893 / RFC 6793 section 4.2.3: merge AS4_PATH into AS_PATH
        // when both are present and the peer isn't a four-byte-ASN speaker.
        if !four_byte_asn_cap
            && let Some(as4_path) = as4_path
        {
            as_path = merge_as_path(as_path, as4_path);
        }

        Ok(Attrs {
            base: BaseAttrs {
                origin,
                as_path,
                nexthop: nexthop.map(IpAddr::V4),
                ll_nexthop: None,
                med,
                local_pref,
                aggregator,
                atomic_aggregate,
                originator_id,
                cluster_list,
            },
            comm,
            ext_comm,
            extv6_comm,
            large_comm,
            unknown,
        })
    }

    pub(crate) fn length(&self) -> u16 {
        let mut length = 0;

        length += origin::length();
        length += self.base.as_path.length();
        if self.base.med.is_some() {
            length += med::length();
        }
        if self.base.local_pref.is_some() {
            length += local_pref::length();
        }
        if self.base.atomic_aggregate {
            length += atomic_aggregate::length();
        }
        if let Some(aggregator) = &self.base.aggregator {
            length += aggregator.length();
        }
        if let Some(comm) = &self.comm {
            length += comm.length();
        }
        if self.base.originator_id.is_some() {
            length += originator_id::length();
        }
        if let Some(cluster_list) = &self.base.cluster_list {
            length += cluster_list.length();
        }
        if let Some(ext_comm) = &self.ext_comm {
            length += ext_comm.length();
        }
        if let Some(extv6_comm) = &self.extv6_comm {
            length += extv6_comm.length();
        }
        if let Some(large_comm) = &self.large_comm {
            length += large_comm.length();
        }
        for attr in &self.unknown {
            length += attr.length();
        }

        length
    }
}

// RFC 4893 / RFC 6793 section 4.2.3 AS_PATH/AS4_PATH reconciliation.
//
// AS_SEQUENCE and AS_SET are reconciled independently, each against its own
// length count: the two ASN lists of the given segment type are flattened
// across all of that path's segments first, then merged by `merge_component`.
// A path carrying both AS_SET and AS_SEQUENCE segments must not lose either
// one in the process.
fn flatten_members(
    as_path: &AsPath,
    seg_type: AsPathSegmentType,
) -> VecDeque<u32> {
    as_path
        .segments
        .iter()
        .filter(|segment| segment.seg_type == seg_type)
        .flat_map(|segment| segment.members.iter().copied())
        .collect()
}

// If the old-style (2-byte ASN) list is shorter than the new-style list,
// keep the old-style list as-is and drop the new one. Otherwise keep the
// old-style list's leading `len2 - len4` entries and splice the new-style
// list in underneath them.
fn merge_component(two: VecDeque<u32>, four: VecDeque<u32>) -> VecDeque<u32> {
    let len2 = two.len();
    let len4 = four.len();

    if len2 < len4 {
        return two;
    }

    let mut merged: VecDeque<u32> =
        two.into_iter().take(len2 - len4).collect();
    merged.extend(four);
    merged
}

fn merge_as_path(as_path: AsPath, as4_path: AsPath) -> AsPath {
    let seq = merge_component(
        flatten_members(&as_path, AsPathSegmentType::Sequence),
        flatten_members(&as4_path, AsPathSegmentType::Sequence),
    );
    let set = merge_component(
        flatten_members(&as_path, AsPathSegmentType::Set),
        flatten_members(&as4_path, AsPathSegmentType::Set),
    );

    let mut segments = VecDeque::new();
    if !seq.is_empty() {
        segments.push_back(AsPathSegment {
            seg_type: AsPathSegmentType::Sequence,
            members: seq,
        });
    }
    if !set.is_empty() {
        segments.push_back(AsPathSegment {
            seg_type: AsPathSegmentType::Set,
            members: set,
        });
    }
    AsPath { segments }
}

// ===== ORIGIN attribute =====

mod origin {
    use super::*;
    const LEN: u8 = 1;

    pub(super) fn encode(origin: Origin, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::Origin as u8);
        buf.put_u8(LEN);
        buf.put_u8(origin as u8);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        origin: &mut Option<Origin>,
    ) -> Result<(), UpdateMessageError> {
        if buf.remaining() != LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        let value = buf.get_u8();
        match Origin::from_u8(value) {
            Some(value) => {
                *origin = Some(value);
                Ok(())
            }
            None => Err(UpdateMessageError::InvalidOriginAttribute(value)),
        }
    }

    pub(super) fn length() -> u16 {
        ATTR_MIN_LEN + LEN as u16
    }
}

// ===== impl AsPath =====

impl AsPath {
    fn encode(&self, buf: &mut BytesMut, four_byte_asns: bool) {
        let mut attr_flags = AttrFlags::TRANSITIVE;
        attr_flags.insert(AttrFlags::EXTENDED);
        buf.put_u8(attr_flags.bits());
        buf.put_u8(AttrType::AsPath as u8);

        let start_pos = buf.len();
        buf.put_u16(0);

        for segment in &self.segments {
            segment.encode(buf, four_byte_asns);
        }

        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        attr_type: AttrType,
        four_byte_asns: bool,
    ) -> Result<AsPath, UpdateMessageError> {
        let mut segments = VecDeque::new();
        while buf.remaining() > 0 {
            let segment = AsPathSegment::decode(buf, four_byte_asns)?;
            segments.push_back(segment);
        }
        let value = AsPath { segments };

        // First-AS enforcement for eBGP peers (RFC 4271 section 6.3),
        // applied only to the wire AS_PATH, not to AS4_PATH.
        if attr_type == AttrType::AsPath
            && cxt.peer_type == PeerType::External
            && value
                .segments
                .iter()
                .find(|segment| segment.seg_type == AsPathSegmentType::Sequence)
                .and_then(|segment| segment.members.front().copied())
                != Some(cxt.peer_as)
        {
            return Err(UpdateMessageError::MalformedAsPath);
        }

        Ok(value)
    }

    pub(super) fn length(&self) -> u16 {
        ATTR_MIN_LEN_EXT
            + self
                .segments
                .iter()
                .map(|segment| segment.length())
                .sum::<u16>()
    }

    pub(crate) fn first(&self) -> Option<u32> {
        self.segments
            .front()
            .filter(|segment| segment.seg_type == AsPathSegmentType::Sequence)
            .and_then(|segment| segment.members.front().copied())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| segment.members.iter().copied())
    }

    pub(crate) fn prepend(&mut self, asn: u32) {
        if let Some(segment) = self.segments.front_mut()
            && segment.seg_type == AsPathSegmentType::Sequence
            && segment.members.len() < 255
        {
            segment.members.push_front(asn);
        } else {
            self.segments.push_front(AsPathSegment {
                seg_type: AsPathSegmentType::Sequence,
                members: [asn].into(),
            });
        }
    }

    pub(crate) fn contains(&self, asn: u32) -> bool {
        self.segments.iter().any(|segment| segment.contains(asn))
    }
}

impl AsPathSegment {
    const MIN_LEN: u16 = 2;

    fn encode(&self, buf: &mut BytesMut, four_byte_asns: bool) {
        buf.put_u8(self.seg_type as u8);
        buf.put_u8(self.members.len() as u8);
        for member in &self.members {
            encode_asn(buf, *member, four_byte_asns);
        }
    }

    pub fn decode(
        buf: &mut Bytes,
        four_byte_asns: bool,
    ) -> Result<Self, UpdateMessageError> {
        if buf.remaining() < 2 {
            return Err(UpdateMessageError::MalformedAsPath);
        }

        let seg_type = buf.get_u8();
        let Some(seg_type) = AsPathSegmentType::from_u8(seg_type) else {
            return Err(UpdateMessageError::MalformedAsPath);
        };

        let seg_len = buf.get_u8();
        if seg_len == 0 {
            return Err(UpdateMessageError::MalformedAsPath);
        }

        let asn_len = if four_byte_asns { 4 } else { 2 };
        if buf.remaining() < seg_len as usize * asn_len {
            return Err(UpdateMessageError::MalformedAsPath);
        }

        let members: VecDeque<u32> = (0..seg_len as usize)
            .map(|_| decode_asn(buf, four_byte_asns))
            .collect();
        let segment = AsPathSegment { seg_type, members };

        // RFC 7607: AS 0 is never valid in the wire AS_PATH.
        if segment.contains(0) {
            return Err(UpdateMessageError::MalformedAsPath);
        }

        Ok(segment)
    }

    pub(super) fn length(&self) -> u16 {
        Self::MIN_LEN + self.members.len() as u16 * 4
    }

    fn contains(&self, asn: u32) -> bool {
        self.members.iter().any(|member| asn == *member)
    }
}

// ===== NEXT_HOP attribute =====

pub(crate) mod nexthop {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(addr: Ipv4Addr, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::Nexthop as u8);
        buf.put_u8(LEN);
        buf.put_ipv4(&addr);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        nexthop: &mut Option<Ipv4Addr>,
    ) -> Result<(), UpdateMessageError> {
        if buf.remaining() != LEN as usize {
            return Err(UpdateMessageError::InvalidNexthopAttribute);
        }

        let value = buf.get_ipv4();
        if value.is_unspecified() || value.is_multicast() {
            return Err(UpdateMessageError::InvalidNexthopAttribute);
        }
        *nexthop = Some(value);
        Ok(())
    }

    pub(crate) fn length() -> u16 {
        ATTR_MIN_LEN + LEN as u16
    }
}

// ===== MULTI_EXIT_DISC attribute =====

mod med {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(metric: u32, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::OPTIONAL.bits());
        buf.put_u8(AttrType::Med as u8);
        buf.put_u8(LEN);
        buf.put_u32(metric);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        med: &mut Option<u32>,
    ) -> Result<(), UpdateMessageError> {
        if buf.remaining() != LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        *med = Some(buf.get_u32());
        Ok(())
    }

    pub(super) fn length() -> u16 {
        ATTR_MIN_LEN + LEN as u16
    }
}

// ===== LOCAL_PREF attribute =====

mod local_pref {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(local_pref: u32, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::LocalPref as u8);
        buf.put_u8(LEN);
        buf.put_u32(local_pref);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        local_pref: &mut Option<u32>,
    ) -> Result<(), UpdateMessageError> {
        // RFC 4271 section 5.1.5: LOCAL_PREF from an eBGP peer is simply
        // ignored, not fatal.
        if cxt.peer_type == PeerType::External {
            return Ok(());
        }

        if buf.remaining() != LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        *local_pref = Some(buf.get_u32());
        Ok(())
    }

    pub(super) fn length() -> u16 {
        ATTR_MIN_LEN + LEN as u16
    }
}

// ===== ATOMIC_AGGREGATE attribute =====

mod atomic_aggregate {
    use super::*;
    const LEN: u8 = 0;

    pub(super) fn encode(buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::AtomicAggregate as u8);
        buf.put_u8(LEN);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        atomic_aggregate: &mut bool,
    ) -> Result<(), UpdateMessageError> {
        if buf.remaining() != LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        *atomic_aggregate = true;
        Ok(())
    }

    pub(super) fn length() -> u16 {
        ATTR_MIN_LEN + LEN as u16
    }
}

// ===== impl Aggregator =====

impl Aggregator {
    fn encode(
        &self,
        buf: &mut BytesMut,
        attr_type: AttrType,
        four_byte_asns: bool,
    ) {
        buf.put_u8((AttrFlags::TRANSITIVE | AttrFlags::OPTIONAL).bits());
        buf.put_u8(attr_type as u8);

        let start_pos = buf.len();
        buf.put_u8(0);

        encode_asn(buf, self.asn, four_byte_asns);
        buf.put_ipv4(&self.identifier);

        let attr_len = buf.len() - start_pos - 1;
        buf[start_pos] = attr_len as u8;
    }

    fn decode(
        buf: &mut Bytes,
        attr_type: AttrType,
        four_byte_asns: bool,
    ) -> Result<Self, UpdateMessageError> {
        let len = if four_byte_asns { 8 } else { 6 };
        if buf.remaining() != len {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        let asn = decode_asn(buf, four_byte_asns);
        let identifier = buf.get_ipv4();
        let _ = attr_type;

        Ok(Aggregator { asn, identifier })
    }

    pub(super) fn length(&self) -> u16 {
        ATTR_MIN_LEN + 4 + Ipv4Addr::LENGTH as u16
    }
}

// RFC 6793 section 4.2.3: AGGREGATOR/AS4_AGGREGATOR reconciliation. The
// four-byte AS4_AGGREGATOR always wins outright when present; there is no
// partial merge like AS_PATH/AS4_PATH, since AGGREGATOR only ever names a
// single originating speaker.
pub(crate) fn merge_aggregator(
    aggregator: Option<Aggregator>,
    as4_aggregator: Option<Aggregator>,
) -> Option<Aggregator> {
    as4_aggregator.or(aggregator)
}

// ===== ORIGINATOR_ID attribute =====

mod originator_id {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(originator_id: Ipv4Addr, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::OPTIONAL.bits());
        buf.put_u8(AttrType::OriginatorId as u8);
        buf.put_u8(LEN);
        buf.put_ipv4(&originator_id);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        originator_id: &mut Option<Ipv4Addr>,
    ) -> Result<(), UpdateMessageError> {
        if cxt.peer_type == PeerType::External {
            return Ok(());
        }

        if buf.remaining() != LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        *originator_id = Some(buf.get_ipv4());
        Ok(())
    }

    pub(super) fn length() -> u16 {
        ATTR_MIN_LEN + LEN as u16
    }
}

// ===== impl ClusterList =====

impl ClusterList {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8((AttrFlags::OPTIONAL | AttrFlags::EXTENDED).bits());
        buf.put_u8(AttrType::ClusterList as u8);

        let start_pos = buf.len();
        buf.put_u16(0);

        for cluster_id in &self.0 {
            buf.put_ipv4(cluster_id);
        }

        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    fn decode(buf: &mut Bytes) -> Result<Self, UpdateMessageError> {
        if buf.remaining() == 0 || buf.remaining() % 4 != 0 {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        let mut list = BTreeSet::new();
        while buf.remaining() > 0 {
            list.insert(buf.get_ipv4());
        }

        Ok(ClusterList(list))
    }

    fn length(&self) -> u16 {
        ATTR_MIN_LEN_EXT + (self.0.len() * Ipv4Addr::LENGTH) as u16
    }
}

// ===== impl MpReachNlri =====

impl MpReachNlri {
    pub const MIN_LEN: u16 = 5;

    fn encode(&self, buf: &mut BytesMut) {
        mp_reach_nlri::encode(self, buf)
    }

    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
    ) -> Result<Self, UpdateMessageError> {
        mp_reach_nlri::decode(buf, cxt)
    }
}

mod mp_reach_nlri {
    use super::*;
    use crate::packet::nlri::nexthop_wire_len;

    pub(super) fn encode(attr: &MpReachNlri, buf: &mut BytesMut) {
        buf.put_u8((AttrFlags::OPTIONAL | AttrFlags::EXTENDED).bits());
        buf.put_u8(AttrType::MpReachNlri as u8);

        let start_pos = buf.len();
        buf.put_u16(0);

        buf.put_u16(attr.afi as u16);
        buf.put_u8(attr.safi as u8);

        let len = nexthop_wire_len(attr.afi, attr.safi, attr.ll_nexthop.is_some());
        buf.put_u8(len as u8);
        let rd_zero = [0u8; 8];
        if attr.safi.has_rd() {
            buf.put_slice(&rd_zero);
        }
        match attr.nexthop {
            IpAddr::V4(addr) => buf.put_ipv4(&addr),
            IpAddr::V6(addr) => buf.put_ipv6(&addr),
        }
        if let Some(ll) = attr.ll_nexthop {
            buf.put_ipv6(&ll);
        }

        // Reserved.
        buf.put_u8(0);
        for nlri in &attr.nlri {
            nlri.encode(buf, attr.safi);
        }

        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
    ) -> Result<MpReachNlri, UpdateMessageError> {
        if buf.remaining() < MpReachNlri::MIN_LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        let afi = buf.get_u16();
        let Some(afi) = Afi::from_u16(afi) else {
            return Err(UpdateMessageError::OptionalAttributeError);
        };
        let safi = buf.get_u8();
        let Some(safi) = Safi::from_u8(safi) else {
            return Err(UpdateMessageError::OptionalAttributeError);
        };

        let nexthop_len = buf.get_u8() as usize;
        if nexthop_len > buf.remaining() {
            return Err(UpdateMessageError::InvalidNexthopAttribute);
        }
        let mut nexthop_buf = buf.copy_to_bytes(nexthop_len);

        let rd_len = if safi.has_rd() { 8 } else { 0 };
        if nexthop_buf.remaining() < rd_len {
            return Err(UpdateMessageError::InvalidNexthopAttribute);
        }
        nexthop_buf.advance(rd_len);

        let addr_len = afi.addr_len();
        let mut ll_nexthop = None;
        let nexthop = match afi {
            Afi::Ipv4 => {
                if nexthop_buf.remaining() != addr_len {
                    return Err(UpdateMessageError::InvalidNexthopAttribute);
                }
                IpAddr::V4(nexthop_buf.get_ipv4())
            }
            Afi::Ipv6 => {
                if nexthop_buf.remaining() != addr_len
                    && nexthop_buf.remaining() != addr_len * 2
                {
                    return Err(UpdateMessageError::InvalidNexthopAttribute);
                }
                let addr = nexthop_buf.get_ipv6();
                if nexthop_buf.remaining() == addr_len {
                    ll_nexthop = Some(nexthop_buf.get_ipv6());
                }
                IpAddr::V6(addr)
            }
        };

        // Reserved byte.
        if buf.remaining() == 0 {
            return Err(UpdateMessageError::InvalidNetworkField);
        }
        buf.advance(1);

        let addpath = cxt.addpath_receive(afi, safi);
        let mut nlri = Vec::new();
        while buf.remaining() > 0 {
            match Nlri::decode(buf, afi, safi, addpath)? {
                Some(entry) => nlri.push(entry),
                None => break,
            }
        }

        Ok(MpReachNlri { afi, safi, nexthop, ll_nexthop, nlri })
    }
}

// ===== impl MpUnreachNlri =====

impl MpUnreachNlri {
    pub const MIN_LEN: u16 = 3;

    fn encode(&self, buf: &mut BytesMut) {
        mp_unreach_nlri::encode(self, buf)
    }

    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
    ) -> Result<Self, UpdateMessageError> {
        mp_unreach_nlri::decode(buf, cxt)
    }
}

mod mp_unreach_nlri {
    use super::*;

    pub(super) fn encode(attr: &MpUnreachNlri, buf: &mut BytesMut) {
        buf.put_u8((AttrFlags::OPTIONAL | AttrFlags::EXTENDED).bits());
        buf.put_u8(AttrType::MpUnreachNlri as u8);

        let start_pos = buf.len();
        buf.put_u16(0);

        buf.put_u16(attr.afi as u16);
        buf.put_u8(attr.safi as u8);
        for nlri in &attr.nlri {
            nlri.encode(buf, attr.safi);
        }

        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
    ) -> Result<MpUnreachNlri, UpdateMessageError> {
        if buf.remaining() < MpUnreachNlri::MIN_LEN as usize {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        let afi = buf.get_u16();
        let Some(afi) = Afi::from_u16(afi) else {
            return Err(UpdateMessageError::OptionalAttributeError);
        };
        let safi = buf.get_u8();
        let Some(safi) = Safi::from_u8(safi) else {
            return Err(UpdateMessageError::OptionalAttributeError);
        };

        let addpath = cxt.addpath_receive(afi, safi);
        let mut nlri = Vec::new();
        while buf.remaining() > 0 {
            match Nlri::decode(buf, afi, safi, addpath)? {
                Some(entry) => nlri.push(entry),
                None => break,
            }
        }

        Ok(MpUnreachNlri { afi, safi, nlri })
    }
}

// ===== impl Comm =====

impl CommType for Comm {
    const TYPE: AttrType = AttrType::Communities;
    const LENGTH: usize = 4;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.0);
    }

    fn decode(buf: &mut Bytes) -> Self {
        Self(buf.get_u32())
    }
}

impl std::fmt::Display for Comm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            v if v == WellKnownCommunities::NoExport as u32 => {
                write!(f, "no-export")
            }
            v if v == WellKnownCommunities::NoAdvertise as u32 => {
                write!(f, "no-advertise")
            }
            v if v == WellKnownCommunities::NoExportSubconfed as u32 => {
                write!(f, "no-export-subconfed")
            }
            v if v == WellKnownCommunities::NoPeer as u32 => {
                write!(f, "no-peer")
            }
            v => write!(f, "{}:{}", v >> 16, v & 0xFFFF),
        }
    }
}

// ===== impl ExtComm =====

impl CommType for ExtComm {
    const TYPE: AttrType = AttrType::ExtCommunities;
    const LENGTH: usize = 8;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    fn decode(buf: &mut Bytes) -> Self {
        let mut value = [0; 8];
        buf.copy_to_slice(&mut value);
        Self(value)
    }
}

impl std::fmt::Display for ExtComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = self.0[0] & 0x0F;
        let subtype = self.0[1];
        match (kind, subtype) {
            // route-target, 2-byte-ASN:4-byte-value form.
            (0x00, 0x02) => {
                let asn = u16::from_be_bytes([self.0[2], self.0[3]]);
                let value =
                    u32::from_be_bytes([self.0[4], self.0[5], self.0[6], self.0[7]]);
                write!(f, "target:{asn}:{value}")
            }
            // route-target, IPv4-address:2-byte-value form.
            (0x01, 0x02) => {
                let ip = Ipv4Addr::new(self.0[2], self.0[3], self.0[4], self.0[5]);
                let value = u16::from_be_bytes([self.0[6], self.0[7]]);
                write!(f, "target:{ip}:{value}")
            }
            (0x00, 0x03) => {
                let asn = u16::from_be_bytes([self.0[2], self.0[3]]);
                let value =
                    u32::from_be_bytes([self.0[4], self.0[5], self.0[6], self.0[7]]);
                write!(f, "origin:{asn}:{value}")
            }
            (0x01, 0x03) => {
                let ip = Ipv4Addr::new(self.0[2], self.0[3], self.0[4], self.0[5]);
                let value = u16::from_be_bytes([self.0[6], self.0[7]]);
                write!(f, "origin:{ip}:{value}")
            }
            _ => {
                write!(f, "0x{:016X}", u64::from_be_bytes(self.0))
            }
        }
    }
}

// ===== impl Extv6Comm =====

impl CommType for Extv6Comm {
    const TYPE: AttrType = AttrType::Extv6Community;
    const LENGTH: usize = 20;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv6(&self.0);
        buf.put_u32(self.1);
    }

    fn decode(buf: &mut Bytes) -> Self {
        let addr = buf.get_ipv6();
        let local = buf.get_u32();
        Self(addr, local)
    }
}

impl std::fmt::Display for Extv6Comm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

// ===== impl LargeComm =====

impl CommType for LargeComm {
    const TYPE: AttrType = AttrType::LargeCommunity;
    const LENGTH: usize = 12;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    fn decode(buf: &mut Bytes) -> Self {
        let mut value = [0; 12];
        buf.copy_to_slice(&mut value);
        Self(value)
    }
}

impl std::fmt::Display for LargeComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let global = u32::from_be_bytes(self.0[0..4].try_into().unwrap());
        let local1 = u32::from_be_bytes(self.0[4..8].try_into().unwrap());
        let local2 = u32::from_be_bytes(self.0[8..12].try_into().unwrap());
        write!(f, "{global}:{local1}:{local2}")
    }
}

// ===== impl CommList =====

impl<T: CommType> CommList<T> {
    fn encode(&self, buf: &mut BytesMut) {
        let attr_flags =
            AttrFlags::TRANSITIVE | AttrFlags::OPTIONAL | AttrFlags::EXTENDED;
        buf.put_u8(attr_flags.bits());
        buf.put_u8(T::TYPE as u8);

        let start_pos = buf.len();
        buf.put_u16(0);

        for value in &self.0 {
            value.encode(buf);
        }

        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    fn decode(buf: &mut Bytes) -> Result<Self, UpdateMessageError> {
        if buf.remaining() == 0 || buf.remaining() % T::LENGTH != 0 {
            return Err(UpdateMessageError::AttributeLengthError(
                buf.remaining() as u16,
            ));
        }

        let mut list = BTreeSet::new();
        while buf.remaining() >= T::LENGTH {
            list.insert(T::decode(buf));
        }

        Ok(CommList(list))
    }

    fn length(&self) -> u16 {
        ATTR_MIN_LEN_EXT + (self.0.len() * T::LENGTH) as u16
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: CommType + std::fmt::Display> std::fmt::Display for CommList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> =
            self.0.iter().map(|c| c.to_string()).collect();
        match rendered.len() {
            0 => Ok(()),
            1 => write!(f, "{}", rendered[0]),
            _ => write!(f, "[ {} ]", rendered.join(" ")),
        }
    }
}

// ===== impl UnknownAttr =====

impl UnknownAttr {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.attr_type);
        if self.flags.contains(AttrFlags::EXTENDED) {
            buf.put_u16(self.value.len() as u16);
        } else {
            buf.put_u8(self.value.len() as u8);
        }
        buf.put_slice(&self.value);
    }

    fn length(&self) -> u16 {
        let len_field = if self.flags.contains(AttrFlags::EXTENDED) { 2 } else { 1 };
        2 + len_field + self.value.len() as u16
    }
}

// ===== helper functions =====

fn attribute_flags(attr_type: AttrType) -> AttrFlags {
    match attr_type {
        // Well-known.
        AttrType::Origin
        | AttrType::AsPath
        | AttrType::Nexthop
        | AttrType::LocalPref
        | AttrType::AtomicAggregate => AttrFlags::TRANSITIVE,

        // Optional non-transitive.
        AttrType::Med
        | AttrType::OriginatorId
        | AttrType::ClusterList
        | AttrType::MpReachNlri
        | AttrType::MpUnreachNlri => AttrFlags::OPTIONAL,

        // Optional transitive.
        AttrType::Aggregator
        | AttrType::Communities
        | AttrType::ExtCommunities
        | AttrType::As4Path
        | AttrType::As4Aggregator
        | AttrType::Extv6Community
        | AttrType::LargeCommunity
        | AttrType::Otc => AttrFlags::TRANSITIVE | AttrFlags::OPTIONAL,
    }
}

fn encode_asn(buf: &mut BytesMut, asn: u32, four_byte_asns: bool) {
    if four_byte_asns {
        buf.put_u32(asn)
    } else {
        buf.put_u16(asn as u16)
    }
}

fn decode_asn(buf: &mut Bytes, four_byte_asns: bool) -> u32 {
    if four_byte_asns {
        buf.get_u32()
    } else {
        buf.get_u16() as u32
    }
}
