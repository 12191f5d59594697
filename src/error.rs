//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use tracing::warn_span;

use crate::packet::consts::ErrorCode;
use crate::packet::error::{DecodeError, SessionNotifyError};

// A protocol-level rejection: code/subcode/data sent to the peer as a
// NOTIFICATION before the session closes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notify {
    pub code: ErrorCode,
    pub subcode: u8,
    pub data: Vec<u8>,
}

// A local, operational failure. The session closes without ever sending a
// NOTIFICATION to the peer.
#[derive(Debug)]
pub enum Failure {
    ConnectionClosed,
    ConnectError(std::io::Error),
    ReadError(std::io::Error),
    WriteError(std::io::Error),
    // A single outbound UPDATE fragment exceeds the negotiated message size.
    FragmentTooLarge(usize, usize),
    // The peer hasn't drained a single byte of the backlog within hold_time.
    PeerNotReading,
    HelperProcessError(std::io::Error),
    // A protocol violation was detected; `Session::run` sends this as a
    // NOTIFICATION to the peer before closing. Wrapped as a `Failure` so
    // the session loop has a single error type to propagate with `?`.
    NotifySent(Notify),
}

// ===== impl Notify =====

impl From<DecodeError> for Notify {
    fn from(error: DecodeError) -> Notify {
        let (code, subcode, data) = error.notification();
        Notify { code, subcode, data }
    }
}

impl From<SessionNotifyError> for Notify {
    fn from(error: SessionNotifyError) -> Notify {
        let (code, subcode, data) = error.notification();
        Notify { code, subcode, data }
    }
}

impl std::fmt::Display for Notify {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NOTIFICATION {}/{}", self.code as u8, self.subcode)
    }
}

impl std::error::Error for Notify {}

impl Notify {
    pub(crate) fn log(&self, peer: IpAddr) {
        warn_span!("neighbor", %peer).in_scope(|| {
            tracing::warn!(code = self.code as u8, subcode = self.subcode, "{}", self);
        });
    }
}

// ===== impl Failure =====

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::ConnectionClosed => {
                write!(f, "connection closed by remote end")
            }
            Failure::ConnectError(..) => {
                write!(f, "failed to establish TCP connection")
            }
            Failure::ReadError(..) => {
                write!(f, "failed to read from connection")
            }
            Failure::WriteError(..) => {
                write!(f, "failed to write to connection")
            }
            Failure::FragmentTooLarge(len, max) => {
                write!(f, "outbound fragment too large: {len} > {max}")
            }
            Failure::PeerNotReading => {
                write!(f, "peer not reading: backlog stalled past hold time")
            }
            Failure::HelperProcessError(..) => {
                write!(f, "helper process notification failed")
            }
            Failure::NotifySent(notify) => {
                write!(f, "sent {notify}")
            }
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::ConnectError(error)
            | Failure::ReadError(error)
            | Failure::WriteError(error)
            | Failure::HelperProcessError(error) => Some(error),
            Failure::NotifySent(notify) => Some(notify),
            _ => None,
        }
    }
}

impl From<Notify> for Failure {
    fn from(notify: Notify) -> Failure {
        Failure::NotifySent(notify)
    }
}

impl Failure {
    pub(crate) fn log(&self, peer: IpAddr) {
        warn_span!("neighbor", %peer).in_scope(|| {
            tracing::warn!(error = %with_source(self), "{}", self);
        });
    }
}

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
