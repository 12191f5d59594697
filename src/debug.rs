//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use tracing::{debug, debug_span};

use crate::packet::message::Message;
use crate::session::fsm;

// BGP debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    FsmEvent(&'a IpAddr, &'a fsm::Event),
    FsmTransition(&'a IpAddr, &'a fsm::State, &'a fsm::State),
    MsgRx(&'a IpAddr, &'a Message),
    MsgTx(&'a IpAddr, &'a Message),
    BacklogFrozen(&'a IpAddr, usize),
    BacklogDrained(&'a IpAddr),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::FsmEvent(addr, event) => {
                debug_span!("neighbor", %addr).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?event, "{}", self);
                    })
                });
            }
            Debug::FsmTransition(addr, old_state, new_state) => {
                debug_span!("neighbor", %addr).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?old_state, ?new_state, "{}", self);
                    })
                });
            }
            Debug::MsgRx(addr, msg) => {
                debug_span!("neighbor", %addr).in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(%data, "{}", self);
                    })
                });
            }
            Debug::MsgTx(addr, msg) => {
                debug_span!("neighbor", %addr).in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(%data, "{}", self);
                    })
                });
            }
            Debug::BacklogFrozen(addr, len) => {
                debug_span!("neighbor", %addr).in_scope(|| {
                    debug!(%len, "{}", self);
                });
            }
            Debug::BacklogDrained(addr) => {
                debug_span!("neighbor", %addr).in_scope(|| {
                    debug!("{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::FsmEvent(..) => write!(f, "event"),
            Debug::FsmTransition(..) => write!(f, "state transition"),
            Debug::MsgRx(..) | Debug::MsgTx(..) => write!(f, "message"),
            Debug::BacklogFrozen(..) => write!(f, "backlog frozen"),
            Debug::BacklogDrained(..) => write!(f, "backlog drained"),
        }
    }
}
