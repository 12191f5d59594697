//
// SPDX-License-Identifier: MIT
//

use bytes::Bytes;

use crate::config::AddPathDirections;
use crate::route::Route;

// The RIB-side collaborator for both directions of UPDATE traffic.
// Outbound content is drawn synchronously and pull-based: the session
// engine draws one encoded fragment at a time into its chunker, so no
// buffering or async state needs to live on this side of the seam.
// Inbound routes are pushed to `receive` in wire order as each UPDATE is
// decoded, only when `NeighborConfig::parse_routes` is set.
pub trait DeltaProducer {
    fn updates(
        &mut self,
        asn4: bool,
        local_as: u32,
        peer_as: u32,
        addpath: &AddPathDirections,
    ) -> Box<dyn Iterator<Item = Bytes> + '_>;

    fn receive(&mut self, routes: Vec<Route>);
}

#[cfg(any(test, feature = "testing"))]
pub mod test {
    use super::*;

    // Fixed-sequence producer for tests: yields each fragment once, then
    // signals end-of-stream. Received routes are buffered for assertions.
    #[derive(Default)]
    pub struct FixedDelta {
        pub fragments: Vec<Bytes>,
        pub received: Vec<Route>,
    }

    impl DeltaProducer for FixedDelta {
        fn updates(
            &mut self,
            _asn4: bool,
            _local_as: u32,
            _peer_as: u32,
            _addpath: &AddPathDirections,
        ) -> Box<dyn Iterator<Item = Bytes> + '_> {
            Box::new(self.fragments.drain(..))
        }

        fn receive(&mut self, routes: Vec<Route>) {
            self.received.extend(routes);
        }
    }
}
