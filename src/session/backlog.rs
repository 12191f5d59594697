//
// SPDX-License-Identifier: MIT
//

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::error::Failure;
use crate::packet::consts::MAX_BACKLOG;
use crate::packet::message::Message;

// Greedily concatenates consecutive fragments into chunks no larger than
// `cap`, never splitting a fragment across chunks. A single fragment
// exceeding `cap` is fatal, grounded on ExaBGP's `chunked()` generator.
pub fn chunk_fragments(
    fragments: impl Iterator<Item = Bytes>,
    cap: usize,
) -> Result<Vec<Bytes>, Failure> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut current_len = 0usize;

    for fragment in fragments {
        if fragment.len() > cap {
            return Err(Failure::FragmentTooLarge(fragment.len(), cap));
        }
        if current_len + fragment.len() > cap && !current.is_empty() {
            chunks.push(flatten(std::mem::take(&mut current)));
            current_len = 0;
        }
        current_len += fragment.len();
        current.push(fragment);
    }
    if !current.is_empty() {
        chunks.push(flatten(current));
    }
    Ok(chunks)
}

fn flatten(fragments: Vec<Bytes>) -> Bytes {
    if fragments.len() == 1 {
        return fragments.into_iter().next().unwrap();
    }
    let mut buf = Vec::with_capacity(fragments.iter().map(|f| f.len()).sum());
    for fragment in fragments {
        buf.extend_from_slice(&fragment);
    }
    Bytes::from(buf)
}

// Strictly FIFO queue of outbound message bytes awaiting a writable
// connection, plus the stall-detection clock. `frozen_since` is set the
// first time a write is rejected and cleared the moment anything drains.
pub struct Backlog {
    queue: VecDeque<Bytes>,
    frozen_since: Option<Instant>,
}

impl Backlog {
    pub fn new() -> Self {
        Backlog { queue: VecDeque::new(), frozen_since: None }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn push(&mut self, chunk: Bytes, now: Instant) {
        self.queue.push_back(chunk);
        self.frozen_since.get_or_insert(now);
    }

    pub fn peek_front(&self) -> Option<Bytes> {
        self.queue.front().cloned()
    }

    pub fn pop_front(&mut self) -> Option<Bytes> {
        let chunk = self.queue.pop_front();
        if chunk.is_some() {
            self.frozen_since = None;
        }
        chunk
    }

    // Two kill conditions per the write-path/backlog spec: the queue has
    // sat undrained for longer than hold_time, or it has grown past
    // MAX_BACKLOG entries.
    pub fn check_kill(
        &self,
        now: Instant,
        hold_time: Duration,
    ) -> Result<(), Failure> {
        if let Some(since) = self.frozen_since
            && !hold_time.is_zero()
            && now.duration_since(since) > hold_time
        {
            return Err(Failure::PeerNotReading);
        }
        if self.queue.len() > MAX_BACKLOG {
            return Err(Failure::PeerNotReading);
        }
        Ok(())
    }
}

impl Default for Backlog {
    fn default() -> Self {
        Self::new()
    }
}

// Per-family end-of-RIB marker. IPv4/unicast is a bare all-zero UPDATE;
// every other family is expressed as an MP_UNREACH_NLRI carrying only the
// AFI/SAFI pair with an empty withdrawn-routes list.
pub fn encode_eor(
    afi: crate::packet::consts::Afi,
    safi: crate::packet::consts::Safi,
    cxt: &crate::packet::message::EncodeCxt,
) -> Bytes {
    use crate::packet::attribute::MpUnreachNlri;
    use crate::packet::message::UpdateMsg;

    let msg = if afi == crate::packet::consts::Afi::Ipv4
        && safi == crate::packet::consts::Safi::Unicast
    {
        UpdateMsg {
            reach: None,
            unreach: None,
            mp_reach: None,
            mp_unreach: None,
            attrs: None,
        }
    } else {
        UpdateMsg {
            reach: None,
            unreach: None,
            mp_reach: None,
            mp_unreach: Some(MpUnreachNlri { afi, safi, nlri: Vec::new() }),
            attrs: Some(crate::packet::attribute::Attrs::empty()),
        }
    };
    Message::Update(msg).encode(cxt)
}
