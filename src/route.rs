//
// SPDX-License-Identifier: MIT
//

// Flattens a decoded UPDATE's four NLRI carriers (legacy withdrawn, legacy
// announced, MP_UNREACH_NLRI, MP_REACH_NLRI) into a single ordered list of
// routes, each carrying the attribute set that applied to it. Order
// matches the original implementation's `UpdateFactory`: legacy withdrawn,
// then legacy announced, then MP withdrawn, then MP announced.

use ipnetwork::IpNetwork;

use crate::packet::attribute::Attrs;
use crate::packet::consts::{Afi, Safi};
use crate::packet::message::UpdateMsg;
use crate::packet::nlri::{Nlri, RouteDistinguisher};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteAction {
    Announced,
    Withdrawn,
}

// One NLRI as carried by a `Route`: the legacy IPv4 carriers have no AddPath
// ID, label stack or route-distinguisher and no SAFI on the wire (see
// DESIGN.md's `unicast_multicast` resolution), so those fields are `None`/
// empty for them.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteNlri {
    pub afi: Afi,
    pub safi: Option<Safi>,
    pub prefix: IpNetwork,
    pub path_id: Option<u32>,
    pub labels: Vec<u32>,
    pub rd: Option<RouteDistinguisher>,
}

impl RouteNlri {
    fn legacy(prefix: IpNetwork) -> Self {
        RouteNlri {
            afi: Afi::Ipv4,
            safi: None,
            prefix,
            path_id: None,
            labels: Vec::new(),
            rd: None,
        }
    }

    fn from_nlri(afi: Afi, safi: Safi, nlri: &Nlri) -> Self {
        RouteNlri {
            afi,
            safi: Some(safi),
            prefix: nlri.prefix,
            path_id: nlri.path_id,
            labels: nlri.labels.clone(),
            rd: nlri.rd,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub nlri: RouteNlri,
    pub attrs: Option<Attrs>,
    pub action: RouteAction,
}

// Builds the ordered route list a decoded UPDATE carries. Every route in
// one UPDATE shares the same attribute set, including withdrawn routes
// (for which it's mostly irrelevant, but the original implementation
// attaches it all the same).
pub fn routes_from_update(update: &UpdateMsg) -> Vec<Route> {
    let mut routes = Vec::new();

    if let Some(unreach) = &update.unreach {
        routes.extend(unreach.prefixes.iter().map(|prefix| Route {
            nlri: RouteNlri::legacy(IpNetwork::V4(*prefix)),
            attrs: update.attrs.clone(),
            action: RouteAction::Withdrawn,
        }));
    }

    if let Some(reach) = &update.reach {
        routes.extend(reach.prefixes.iter().map(|prefix| Route {
            nlri: RouteNlri::legacy(IpNetwork::V4(*prefix)),
            attrs: update.attrs.clone(),
            action: RouteAction::Announced,
        }));
    }

    if let Some(mp_unreach) = &update.mp_unreach {
        routes.extend(mp_unreach.nlri.iter().map(|nlri| Route {
            nlri: RouteNlri::from_nlri(mp_unreach.afi, mp_unreach.safi, nlri),
            attrs: update.attrs.clone(),
            action: RouteAction::Withdrawn,
        }));
    }

    if let Some(mp_reach) = &update.mp_reach {
        routes.extend(mp_reach.nlri.iter().map(|nlri| Route {
            nlri: RouteNlri::from_nlri(mp_reach.afi, mp_reach.safi, nlri),
            attrs: update.attrs.clone(),
            action: RouteAction::Announced,
        }));
    }

    routes
}
