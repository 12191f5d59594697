//
// SPDX-License-Identifier: MIT
//

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;

// The session engine's only view of the underlying transport. Socket setup
// (MD5, TTL, connect/accept) is entirely the caller's concern; by the time a
// `Connection` reaches the engine it is already established.
#[async_trait]
pub trait Connection: Send {
    // Checks for readable data without consuming it. `blocking` requests a
    // short wait rather than an immediate return; implementations backed by
    // a real socket may use this to avoid busy-polling.
    async fn pending(&mut self, blocking: bool) -> bool;
    async fn read(&mut self, n: usize) -> std::io::Result<Bytes>;
    // Returns `true` if `data` was fully written, `false` if nothing was
    // written (send buffer full). There is no partial-write outcome.
    async fn write(&mut self, data: &[u8]) -> std::io::Result<bool>;
    async fn close(&mut self);
    fn last_read(&self) -> Instant;
    fn last_write(&self) -> Instant;
}

#[cfg(any(test, feature = "testing"))]
pub mod test {
    use std::collections::VecDeque;
    use std::time::Instant;

    use bytes::{Bytes, BytesMut};

    use super::*;

    // In-memory `Connection` test double. `inbound` is drained by `read`;
    // `outbound` accumulates whatever has been accepted by `write`.
    // `accept_writes` toggles the "peer stopped reading" scenario.
    pub struct MemoryConnection {
        pub inbound: VecDeque<u8>,
        pub outbound: BytesMut,
        pub accept_writes: bool,
        pub last_read: Instant,
        pub last_write: Instant,
    }

    impl MemoryConnection {
        pub fn new() -> Self {
            let now = Instant::now();
            MemoryConnection {
                inbound: VecDeque::new(),
                outbound: BytesMut::new(),
                accept_writes: true,
                last_read: now,
                last_write: now,
            }
        }

        pub fn push_inbound(&mut self, data: &[u8]) {
            self.inbound.extend(data.iter().copied());
        }
    }

    #[async_trait]
    impl Connection for MemoryConnection {
        async fn pending(&mut self, _blocking: bool) -> bool {
            !self.inbound.is_empty()
        }

        async fn read(&mut self, n: usize) -> std::io::Result<Bytes> {
            let n = n.min(self.inbound.len());
            let data: Vec<u8> = self.inbound.drain(..n).collect();
            self.last_read = Instant::now();
            Ok(Bytes::from(data))
        }

        async fn write(&mut self, data: &[u8]) -> std::io::Result<bool> {
            if !self.accept_writes {
                return Ok(false);
            }
            self.outbound.extend_from_slice(data);
            self.last_write = Instant::now();
            Ok(true)
        }

        async fn close(&mut self) {}

        fn last_read(&self) -> Instant {
            self.last_read
        }

        fn last_write(&self) -> Instant {
            self.last_write
        }
    }
}
