//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tokio::time;

use crate::config::{AddPathDirections, NeighborConfig};
use crate::debug::Debug;
use crate::error::{Failure, Notify};
use crate::packet::consts::{
    AS_TRANS, Afi, AddPathMode, BGP_VERSION, ErrorCode, FsmErrorSubcode,
    OpenMessageErrorSubcode, Safi,
};
use crate::packet::error::SessionNotifyError;
use crate::packet::message::{
    AddPathTuple, Capability, DecodeCxt, EncodeCxt, KeepaliveMsg, Message,
    NegotiatedCapability, NotificationMsg, OpenMsg,
};
use crate::route::routes_from_update;
use crate::session::backlog::{chunk_fragments, encode_eor, Backlog};
use crate::session::connection::Connection;
use crate::session::delta::DeltaProducer;
use crate::session::fsm::State;
use crate::session::notifier::HelperProcessNotifier;

// Hold time used for the OPEN/KEEPALIVE exchange before a negotiated value
// exists, so a peer that never completes the handshake cannot wedge the
// session open forever.
const LARGE_HOLDTIME: u16 = 240;

// Drives one BGP session from TCP-established through the OPEN/KEEPALIVE
// handshake into steady-state UPDATE exchange. One instance per peer; no
// state is shared across sessions.
pub struct Session<C, D, N> {
    pub config: NeighborConfig,
    connection: C,
    delta: D,
    notifier: N,
    pub state: State,
    identifier: Option<Ipv4Addr>,
    negotiated_hold_time: Option<Duration>,
    negotiated_families: Vec<(Afi, Safi)>,
    asn4_enabled: bool,
    use_addpath: BTreeMap<(Afi, Safi), AddPathDirections>,
    message_size: usize,
    backlog: Backlog,
    capabilities_adv: BTreeSet<Capability>,
    capabilities_nego: BTreeSet<NegotiatedCapability>,
    read_buf: BytesMut,
}

impl<C, D, N> Session<C, D, N>
where
    C: Connection,
    D: DeltaProducer,
    N: HelperProcessNotifier,
{
    pub fn new(config: NeighborConfig, connection: C, delta: D, notifier: N) -> Self {
        let capabilities_adv = Self::local_capabilities(&config);
        Session {
            config,
            connection,
            delta,
            notifier,
            state: State::Idle,
            identifier: None,
            negotiated_hold_time: None,
            negotiated_families: Vec::new(),
            asn4_enabled: false,
            use_addpath: BTreeMap::new(),
            message_size: Message::MAX_LEN as usize,
            backlog: Backlog::new(),
            capabilities_adv,
            capabilities_nego: BTreeSet::new(),
            read_buf: BytesMut::new(),
        }
    }

    // Negotiated-state accessors, mirroring what a northbound state handler
    // would read off a live session for operational reporting.
    pub fn identifier(&self) -> Option<Ipv4Addr> {
        self.identifier
    }

    pub fn negotiated_hold_time(&self) -> Option<Duration> {
        self.negotiated_hold_time
    }

    pub fn negotiated_families(&self) -> &[(Afi, Safi)] {
        &self.negotiated_families
    }

    pub fn delta(&self) -> &D {
        &self.delta
    }

    fn transition(&mut self, new_state: State) {
        Debug::FsmTransition(&self.config.peer_address, &self.state, &new_state)
            .log();
        self.state = new_state;
    }

    fn local_capabilities(config: &NeighborConfig) -> BTreeSet<Capability> {
        let mut caps = BTreeSet::new();
        for &(afi, safi) in &config.families {
            caps.insert(Capability::MultiProtocol { afi, safi });
        }
        if config.four_byte_asn {
            caps.insert(Capability::FourOctetAsNumber { asn: config.local_as });
        }
        if config.extended_message {
            caps.insert(Capability::ExtendedMessage);
        }
        caps.insert(Capability::RouteRefresh);
        if config.add_path.send || config.add_path.receive {
            let mode = match (config.add_path.receive, config.add_path.send) {
                (true, true) => AddPathMode::ReceiveSend,
                (true, false) => AddPathMode::Receive,
                (false, true) => AddPathMode::Send,
                (false, false) => unreachable!(),
            };
            let tuples = config
                .families
                .iter()
                .map(|&(afi, safi)| AddPathTuple { afi, safi, mode })
                .collect();
            caps.insert(Capability::AddPath(tuples));
        }
        caps
    }

    fn local_open(&self) -> OpenMsg {
        let my_as = if self.config.local_as > u16::MAX as u32 {
            AS_TRANS as u16
        } else {
            self.config.local_as as u16
        };
        OpenMsg {
            version: BGP_VERSION,
            my_as,
            holdtime: self.config.hold_time,
            identifier: self.config.router_id,
            capabilities: self.capabilities_adv.clone(),
        }
    }

    fn encode_cxt(&self) -> EncodeCxt {
        EncodeCxt {
            capabilities: self.capabilities_nego.clone(),
            four_byte_asn: self.asn4_enabled,
        }
    }

    fn decode_cxt(&self) -> DecodeCxt {
        DecodeCxt {
            peer_type: self.config.peer_type,
            peer_as: self.config.peer_as,
            capabilities: self.capabilities_nego.clone(),
            four_byte_asn: self.asn4_enabled,
        }
    }

    // Runs the session to completion: OPEN/KEEPALIVE handshake, then
    // steady-state UPDATE exchange until a `Notify` or `Failure` ends it.
    // A `Notify` is written to the peer as a NOTIFICATION before the
    // connection is closed; a `Failure` closes it silently.
    pub async fn run(&mut self) -> Result<(), Failure> {
        self.transition(State::Connect);
        let result = self.drive().await;

        if let Err(Failure::NotifySent(notify)) = &result {
            let notif = NotificationMsg {
                error_code: notify.code as u8,
                error_subcode: notify.subcode,
                data: notify.data.clone(),
            };
            let cxt = self.encode_cxt();
            let bytes = Message::Notification(notif).encode(&cxt);
            let _ = self.connection.write(&bytes).await;
            notify.log(self.config.peer_address);
        } else if let Err(failure) = &result {
            failure.log(self.config.peer_address);
        }

        self.connection.close().await;
        self.transition(State::Closed);
        result
    }

    async fn drive(&mut self) -> Result<(), Failure> {
        self.connect_and_open().await?;
        self.open_confirm().await?;
        self.established_loop().await
    }

    async fn connect_and_open(&mut self) -> Result<(), Failure> {
        if self.config.peer_updates {
            self.notify_helpers().await?;
        }

        let open = self.local_open();
        let cxt = self.encode_cxt();
        self.send_message(&Message::Open(open), &cxt).await?;
        self.transition(State::OpenSent);

        let deadline = Instant::now() + Duration::from_secs(LARGE_HOLDTIME as u64);
        loop {
            if Instant::now() > deadline {
                return Err(SessionNotifyError::HoldTimerExpired.into());
            }
            match self.poll_message().await? {
                None => {
                    time::sleep(Duration::from_millis(50)).await;
                }
                Some(Message::Open(open)) => {
                    self.process_open(open)?;
                    break;
                }
                Some(Message::Notification(notif)) => {
                    return Err(self.peer_closed(notif));
                }
                Some(_) => {
                    return Err(Notify {
                        code: ErrorCode::FiniteStateMachineError,
                        subcode: FsmErrorSubcode::UnexpectedMessageInOpenSent
                            as u8,
                        data: vec![],
                    }
                    .into());
                }
            }
        }

        self.transition(State::OpenConfirm);
        let cxt = self.encode_cxt();
        self.send_message(&Message::Keepalive(KeepaliveMsg {}), &cxt).await
    }

    // Best-effort fan-out to whatever helper processes are registered for
    // this peer; a failure here is an operational `Failure`, never a
    // NOTIFICATION.
    async fn notify_helpers(&mut self) -> Result<(), Failure> {
        let peer_addr = self.config.peer_address;
        let names = self
            .notifier
            .notify(peer_addr)
            .await
            .map_err(Failure::HelperProcessError)?;
        for name in names {
            self.notifier
                .write(&name, "connected")
                .await
                .map_err(Failure::HelperProcessError)?;
        }
        Ok(())
    }

    fn process_open(&mut self, open: OpenMsg) -> Result<(), Failure> {
        let peer_asn4 = open
            .capabilities
            .iter()
            .any(|c| matches!(c, Capability::FourOctetAsNumber { .. }));
        if self.config.four_byte_asn && !peer_asn4 {
            return Err(Notify {
                code: ErrorCode::OpenMessageError,
                subcode: OpenMessageErrorSubcode::Unspecific as u8,
                data: vec![],
            }
            .into());
        }

        let peer_asn = open.real_as();
        if peer_asn != self.config.peer_as {
            return Err(Notify {
                code: ErrorCode::OpenMessageError,
                subcode: OpenMessageErrorSubcode::BadPeerAs as u8,
                data: vec![],
            }
            .into());
        }

        if open.identifier == self.config.router_id
            && self.config.peer_as == self.config.local_as
        {
            return Err(Notify {
                code: ErrorCode::OpenMessageError,
                subcode: OpenMessageErrorSubcode::BadBgpIdentifier as u8,
                data: vec![],
            }
            .into());
        }

        self.identifier = Some(open.identifier);
        self.negotiated_hold_time = Some(Duration::from_secs(
            self.config.hold_time.min(open.holdtime) as u64,
        ));
        self.asn4_enabled = self.config.four_byte_asn && peer_asn4;

        let local_families: BTreeSet<(Afi, Safi)> = self
            .capabilities_adv
            .iter()
            .filter_map(|c| match c {
                Capability::MultiProtocol { afi, safi } => Some((*afi, *safi)),
                _ => None,
            })
            .collect();
        let peer_families: BTreeSet<(Afi, Safi)> = open
            .capabilities
            .iter()
            .filter_map(|c| match c {
                Capability::MultiProtocol { afi, safi } => Some((*afi, *safi)),
                _ => None,
            })
            .collect();
        self.negotiated_families =
            local_families.intersection(&peer_families).copied().collect();

        self.use_addpath = self.negotiate_addpath(&open.capabilities);

        let extended_message_nego = self.config.extended_message
            && open.capabilities.contains(&Capability::ExtendedMessage);
        self.message_size = if extended_message_nego {
            u16::MAX as usize
        } else {
            Message::MAX_LEN as usize
        };

        let mut capabilities_nego = BTreeSet::new();
        if self.asn4_enabled {
            capabilities_nego.insert(NegotiatedCapability::FourOctetAsNumber);
        }
        for &(afi, safi) in &self.negotiated_families {
            capabilities_nego
                .insert(NegotiatedCapability::MultiProtocol { afi, safi });
        }
        for (&(afi, safi), dirs) in &self.use_addpath {
            let mode = match (dirs.receive, dirs.send) {
                (true, true) => AddPathMode::ReceiveSend,
                (true, false) => AddPathMode::Receive,
                (false, true) => AddPathMode::Send,
                (false, false) => continue,
            };
            capabilities_nego
                .insert(NegotiatedCapability::AddPath { afi, safi, mode });
        }
        if extended_message_nego {
            capabilities_nego.insert(NegotiatedCapability::ExtendedMessage);
        }
        self.capabilities_nego = capabilities_nego;

        Ok(())
    }

    // Send/receive directions follow RFC 7911: a peer's AddPath capability
    // value of `Send` means the peer will tag outbound routes with a
    // path-id, `Receive` means the peer is willing to accept them from us.
    fn negotiate_addpath(
        &self,
        peer_caps: &BTreeSet<Capability>,
    ) -> BTreeMap<(Afi, Safi), AddPathDirections> {
        let mut result = BTreeMap::new();
        let Some(peer_tuples) = peer_caps.iter().find_map(|c| match c {
            Capability::AddPath(tuples) => Some(tuples),
            _ => None,
        }) else {
            return result;
        };
        for tuple in peer_tuples {
            let peer_will_send =
                matches!(tuple.mode, AddPathMode::Send | AddPathMode::ReceiveSend);
            let peer_will_receive = matches!(
                tuple.mode,
                AddPathMode::Receive | AddPathMode::ReceiveSend
            );
            let receive = self.config.add_path.receive && peer_will_send;
            let send = self.config.add_path.send && peer_will_receive;
            if receive || send {
                result.insert(
                    (tuple.afi, tuple.safi),
                    AddPathDirections { send, receive },
                );
            }
        }
        result
    }

    async fn open_confirm(&mut self) -> Result<(), Failure> {
        let deadline = Instant::now() + Duration::from_secs(LARGE_HOLDTIME as u64);
        loop {
            if Instant::now() > deadline {
                return Err(SessionNotifyError::HoldTimerExpired.into());
            }
            match self.poll_message().await? {
                None => {
                    time::sleep(Duration::from_millis(50)).await;
                }
                Some(Message::Keepalive(_)) | Some(Message::Nop) => break,
                Some(Message::Notification(notif)) => {
                    return Err(self.peer_closed(notif));
                }
                Some(_) => {
                    return Err(Notify {
                        code: ErrorCode::FiniteStateMachineError,
                        subcode:
                            FsmErrorSubcode::UnexpectedMessageInOpenConfirm
                                as u8,
                        data: vec![],
                    }
                    .into());
                }
            }
        }
        self.transition(State::Established);
        Ok(())
    }

    async fn established_loop(&mut self) -> Result<(), Failure> {
        let hold = self.negotiated_hold_time.unwrap_or(Duration::ZERO);
        let keepalive_period =
            if hold.is_zero() { Duration::from_secs(3600) } else { (hold / 3).max(Duration::from_secs(1)) };

        let mut keepalive_tick = time::interval(keepalive_period);
        keepalive_tick.tick().await;
        let mut hold_check_tick = time::interval(Duration::from_secs(1));
        hold_check_tick.tick().await;
        let mut backlog_tick = time::interval(Duration::from_millis(200));
        backlog_tick.tick().await;
        let mut delta_tick = time::interval(Duration::from_millis(200));
        delta_tick.tick().await;

        loop {
            tokio::select! {
                ready = self.connection.pending(true) => {
                    if ready {
                        if let Some(msg) = self.poll_message().await? {
                            self.handle_established_message(msg).await?;
                        }
                    }
                }
                _ = keepalive_tick.tick(), if !hold.is_zero() => {
                    let cxt = self.encode_cxt();
                    self.send_message(&Message::Keepalive(KeepaliveMsg {}), &cxt).await?;
                }
                _ = hold_check_tick.tick(), if !hold.is_zero() => {
                    if self.connection.last_read().elapsed() > hold {
                        return Err(SessionNotifyError::HoldTimerExpired.into());
                    }
                }
                _ = backlog_tick.tick() => {
                    self.drain_backlog().await?;
                }
                _ = delta_tick.tick() => {
                    self.pull_updates().await?;
                }
            }
        }
    }

    async fn handle_established_message(
        &mut self,
        msg: Message,
    ) -> Result<(), Failure> {
        match msg {
            Message::Keepalive(_) | Message::Nop => Ok(()),
            // Route installation lives outside this engine; the routes
            // built here are handed to the delta producer in wire order
            // and it decides what to do with them.
            Message::Update(ref update) => {
                if self.config.parse_routes {
                    let routes = routes_from_update(update);
                    if !routes.is_empty() {
                        self.delta.receive(routes);
                    }
                }
                Ok(())
            }
            Message::Notification(notif) => Err(self.peer_closed(notif)),
            Message::Open(_) => Err(Notify {
                code: ErrorCode::FiniteStateMachineError,
                subcode: FsmErrorSubcode::UnexpectedMessageInEstablished as u8,
                data: vec![],
            }
            .into()),
        }
    }

    fn peer_closed(&self, notif: NotificationMsg) -> Failure {
        let _ = notif;
        Failure::ConnectionClosed
    }

    // Pulls whatever the delta producer has ready, chunks it to the
    // negotiated message size, and either writes it straight through or
    // appends it to the backlog.
    async fn pull_updates(&mut self) -> Result<(), Failure> {
        let asn4 = self.asn4_enabled;
        let local_as = self.config.local_as;
        let peer_as = self.config.peer_as;
        let addpath = self.config.add_path;
        let fragments: Vec<Bytes> = self
            .delta
            .updates(asn4, local_as, peer_as, &addpath)
            .collect();
        if fragments.is_empty() {
            return Ok(());
        }

        let cap = self.message_size - Message::MIN_LEN as usize;
        let chunks = chunk_fragments(fragments.into_iter(), cap)?;
        for chunk in chunks {
            self.enqueue_chunk(chunk).await?;
        }
        Ok(())
    }

    // Sends an end-of-RIB marker for `(afi, safi)`. Callers (the RIB-side
    // collaborator) decide when the initial table dump for a family has
    // finished; this engine has no visibility into that on its own.
    pub async fn send_eor(&mut self, afi: Afi, safi: Safi) -> Result<(), Failure> {
        let cxt = self.encode_cxt();
        let bytes = encode_eor(afi, safi, &cxt);
        self.enqueue_chunk(bytes).await
    }

    async fn send_message(
        &mut self,
        msg: &Message,
        cxt: &EncodeCxt,
    ) -> Result<(), Failure> {
        Debug::MsgTx(&self.config.peer_address, msg).log();
        let bytes = msg.encode(cxt);
        self.enqueue_chunk(bytes).await
    }

    async fn enqueue_chunk(&mut self, chunk: Bytes) -> Result<(), Failure> {
        if self.backlog.is_empty() {
            let now = Instant::now();
            let sent = self
                .connection
                .write(&chunk)
                .await
                .map_err(Failure::WriteError)?;
            if !sent {
                self.backlog.push(chunk, now);
                Debug::BacklogFrozen(
                    &self.config.peer_address,
                    self.backlog.len(),
                )
                .log();
            }
        } else {
            self.backlog.push(chunk, Instant::now());
        }
        self.check_backlog_kill()
    }

    async fn drain_backlog(&mut self) -> Result<(), Failure> {
        while let Some(front) = self.backlog.peek_front() {
            let sent = self
                .connection
                .write(&front)
                .await
                .map_err(Failure::WriteError)?;
            if sent {
                self.backlog.pop_front();
                Debug::BacklogDrained(&self.config.peer_address).log();
            } else {
                break;
            }
        }
        self.check_backlog_kill()
    }

    fn check_backlog_kill(&self) -> Result<(), Failure> {
        let hold = self.negotiated_hold_time.unwrap_or(Duration::ZERO);
        self.backlog.check_kill(Instant::now(), hold)
    }

    fn try_decode(&mut self) -> Result<Option<Message>, Failure> {
        let cxt = self.decode_cxt();
        let Some(len) =
            Message::get_message_len(&self.read_buf, cxt.message_len_ceiling())
        else {
            return Ok(None);
        };
        let data = self.read_buf.split_to(len);
        let msg = Message::decode(&data, &cxt)
            .map_err(|error| Failure::from(Notify::from(error)))?;
        Debug::MsgRx(&self.config.peer_address, &msg).log();
        Ok(Some(msg))
    }

    async fn poll_message(&mut self) -> Result<Option<Message>, Failure> {
        if let Some(msg) = self.try_decode()? {
            return Ok(Some(msg));
        }
        let chunk = self
            .connection
            .read(4096)
            .await
            .map_err(Failure::ReadError)?;
        if chunk.is_empty() {
            return Err(Failure::ConnectionClosed);
        }
        self.read_buf.extend_from_slice(&chunk);
        self.try_decode()
    }
}
