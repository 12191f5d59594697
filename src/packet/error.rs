//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;
use serde::{Deserialize, Serialize};

use crate::packet::consts::{
    ErrorCode, FsmErrorSubcode, MessageHeaderErrorSubcode,
    OpenMessageErrorSubcode, UpdateMessageErrorSubcode,
};

// BGP message decoding errors. Every variant maps onto a NOTIFICATION
// code/subcode pair; there is no partial-recovery path, a malformed
// message always kills the session.
#[derive(Debug)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    ReadOutOfBounds,
    MessageHeader(MessageHeaderError),
    OpenMessage(OpenMessageError),
    UpdateMessage(UpdateMessageError),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum MessageHeaderError {
    ReadOutOfBounds,
    ConnectionNotSynchronized,
    BadMessageLength(u16),
    BadMessageType(u8),
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum OpenMessageError {
    ReadOutOfBounds,
    UnsupportedVersion(u8),
    BadPeerAs,
    BadBgpIdentifier,
    UnsupportedOptParam,
    UnacceptableHoldTime,
    UnsupportedCapability,
    MalformedOptParam,
}

// UPDATE message errors.
//
// Unlike RFC 7606's treat-as-withdraw regime, any one of these always
// terminates the session with a NOTIFICATION: there is no salvage path for
// a malformed attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum UpdateMessageError {
    ReadOutOfBounds,
    MalformedAttributeList,
    UnrecognizedWellKnownAttribute,
    MissingWellKnownAttribute,
    AttributeFlagsError,
    AttributeLengthError(u16),
    InvalidOriginAttribute(u8),
    InvalidNexthopAttribute,
    OptionalAttributeError,
    InvalidNetworkField,
    MalformedAsPath,
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            DecodeError::MessageHeader(error) => error.fmt(f),
            DecodeError::OpenMessage(error) => error.fmt(f),
            DecodeError::UpdateMessage(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}

impl From<MessageHeaderError> for DecodeError {
    fn from(error: MessageHeaderError) -> DecodeError {
        DecodeError::MessageHeader(error)
    }
}

impl From<OpenMessageError> for DecodeError {
    fn from(error: OpenMessageError) -> DecodeError {
        DecodeError::OpenMessage(error)
    }
}

impl From<UpdateMessageError> for DecodeError {
    fn from(error: UpdateMessageError) -> DecodeError {
        DecodeError::UpdateMessage(error)
    }
}

impl DecodeError {
    // The NOTIFICATION (code, subcode, data) triple a peer should be sent
    // in reaction to this decode failure.
    pub fn notification(&self) -> (ErrorCode, u8, Vec<u8>) {
        match self {
            DecodeError::ReadOutOfBounds => (
                ErrorCode::MessageHeaderError,
                MessageHeaderErrorSubcode::Unspecific as u8,
                vec![],
            ),
            DecodeError::MessageHeader(error) => error.notification(),
            DecodeError::OpenMessage(error) => error.notification(),
            DecodeError::UpdateMessage(error) => error.notification(),
        }
    }
}

// ===== impl MessageHeaderError =====

impl std::fmt::Display for MessageHeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageHeaderError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            MessageHeaderError::ConnectionNotSynchronized => {
                write!(f, "connection not synchronized")
            }
            MessageHeaderError::BadMessageLength(len) => {
                write!(f, "invalid message length: {len}")
            }
            MessageHeaderError::BadMessageType(msg_type) => {
                write!(f, "invalid message type: {msg_type}")
            }
        }
    }
}

impl From<TryGetError> for MessageHeaderError {
    fn from(_error: TryGetError) -> MessageHeaderError {
        MessageHeaderError::ReadOutOfBounds
    }
}

impl MessageHeaderError {
    pub fn notification(&self) -> (ErrorCode, u8, Vec<u8>) {
        let code = ErrorCode::MessageHeaderError;
        match self {
            MessageHeaderError::ReadOutOfBounds => {
                (code, MessageHeaderErrorSubcode::Unspecific as u8, vec![])
            }
            MessageHeaderError::ConnectionNotSynchronized => (
                code,
                MessageHeaderErrorSubcode::ConnectionNotSynchronized as u8,
                vec![],
            ),
            MessageHeaderError::BadMessageLength(len) => (
                code,
                MessageHeaderErrorSubcode::BadMessageLength as u8,
                len.to_be_bytes().to_vec(),
            ),
            MessageHeaderError::BadMessageType(msg_type) => (
                code,
                MessageHeaderErrorSubcode::BadMessageType as u8,
                vec![*msg_type],
            ),
        }
    }
}

// ===== impl OpenMessageError =====

impl std::fmt::Display for OpenMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OPEN message error: ")?;

        match self {
            OpenMessageError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            OpenMessageError::UnsupportedVersion(version) => {
                write!(f, "unsupported version number: {version}")
            }
            OpenMessageError::BadPeerAs => {
                write!(f, "bad peer AS")
            }
            OpenMessageError::BadBgpIdentifier => {
                write!(f, "bad BGP identifier")
            }
            OpenMessageError::UnsupportedOptParam => {
                write!(f, "unsupported optional parameter")
            }
            OpenMessageError::UnacceptableHoldTime => {
                write!(f, "unacceptable hold time")
            }
            OpenMessageError::UnsupportedCapability => {
                write!(f, "unsupported capability")
            }
            OpenMessageError::MalformedOptParam => {
                write!(f, "malformed optional parameter")
            }
        }
    }
}

impl From<TryGetError> for OpenMessageError {
    fn from(_error: TryGetError) -> OpenMessageError {
        OpenMessageError::ReadOutOfBounds
    }
}

impl OpenMessageError {
    pub fn notification(&self) -> (ErrorCode, u8, Vec<u8>) {
        let code = ErrorCode::OpenMessageError;
        match self {
            OpenMessageError::ReadOutOfBounds => {
                (code, OpenMessageErrorSubcode::Unspecific as u8, vec![])
            }
            OpenMessageError::UnsupportedVersion(version) => (
                code,
                OpenMessageErrorSubcode::UnsupportedVersionNumber as u8,
                vec![*version],
            ),
            OpenMessageError::BadPeerAs => {
                (code, OpenMessageErrorSubcode::BadPeerAs as u8, vec![])
            }
            OpenMessageError::BadBgpIdentifier => (
                code,
                OpenMessageErrorSubcode::BadBgpIdentifier as u8,
                vec![],
            ),
            OpenMessageError::UnsupportedOptParam => (
                code,
                OpenMessageErrorSubcode::UnsupportedOptParam as u8,
                vec![],
            ),
            OpenMessageError::UnacceptableHoldTime => (
                code,
                OpenMessageErrorSubcode::UnacceptableHoldTime as u8,
                vec![],
            ),
            OpenMessageError::UnsupportedCapability
            | OpenMessageError::MalformedOptParam => (
                code,
                OpenMessageErrorSubcode::UnsupportedCapability as u8,
                vec![],
            ),
        }
    }
}

// ===== impl UpdateMessageError =====

impl std::fmt::Display for UpdateMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UPDATE message error: ")?;

        match self {
            UpdateMessageError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            UpdateMessageError::MalformedAttributeList => {
                write!(f, "malformed attribute list")
            }
            UpdateMessageError::UnrecognizedWellKnownAttribute => {
                write!(f, "unrecognized well-known attribute")
            }
            UpdateMessageError::MissingWellKnownAttribute => {
                write!(f, "missing well-known attribute")
            }
            UpdateMessageError::AttributeFlagsError => {
                write!(f, "attribute flags error")
            }
            UpdateMessageError::AttributeLengthError(len) => {
                write!(f, "attribute length error: {len}")
            }
            UpdateMessageError::InvalidOriginAttribute(value) => {
                write!(f, "invalid ORIGIN attribute: {value}")
            }
            UpdateMessageError::InvalidNexthopAttribute => {
                write!(f, "invalid NEXT_HOP attribute")
            }
            UpdateMessageError::OptionalAttributeError => {
                write!(f, "optional attribute error")
            }
            UpdateMessageError::InvalidNetworkField => {
                write!(f, "invalid network field")
            }
            UpdateMessageError::MalformedAsPath => {
                write!(f, "malformed AS_PATH")
            }
        }
    }
}

impl From<TryGetError> for UpdateMessageError {
    fn from(_error: TryGetError) -> UpdateMessageError {
        UpdateMessageError::ReadOutOfBounds
    }
}

impl UpdateMessageError {
    pub fn notification(&self) -> (ErrorCode, u8, Vec<u8>) {
        let code = ErrorCode::UpdateMessageError;
        match self {
            UpdateMessageError::ReadOutOfBounds => {
                (code, UpdateMessageErrorSubcode::Unspecific as u8, vec![])
            }
            UpdateMessageError::MalformedAttributeList => (
                code,
                UpdateMessageErrorSubcode::MalformedAttributeList as u8,
                vec![],
            ),
            UpdateMessageError::UnrecognizedWellKnownAttribute => (
                code,
                UpdateMessageErrorSubcode::UnrecognizedWellKnownAttribute
                    as u8,
                vec![],
            ),
            UpdateMessageError::MissingWellKnownAttribute => (
                code,
                UpdateMessageErrorSubcode::MissingWellKnownAttribute as u8,
                vec![],
            ),
            UpdateMessageError::AttributeFlagsError => (
                code,
                UpdateMessageErrorSubcode::AttributeFlagsError as u8,
                vec![],
            ),
            UpdateMessageError::AttributeLengthError(len) => (
                code,
                UpdateMessageErrorSubcode::AttributeLengthError as u8,
                len.to_be_bytes().to_vec(),
            ),
            UpdateMessageError::InvalidOriginAttribute(value) => (
                code,
                UpdateMessageErrorSubcode::InvalidOriginAttribute as u8,
                vec![*value],
            ),
            UpdateMessageError::InvalidNexthopAttribute => (
                code,
                UpdateMessageErrorSubcode::InvalidNexthopAttribute as u8,
                vec![],
            ),
            UpdateMessageError::OptionalAttributeError => (
                code,
                UpdateMessageErrorSubcode::OptionalAttributeError as u8,
                vec![],
            ),
            UpdateMessageError::InvalidNetworkField => (
                code,
                UpdateMessageErrorSubcode::InvalidNetworkField as u8,
                vec![],
            ),
            UpdateMessageError::MalformedAsPath => (
                code,
                UpdateMessageErrorSubcode::MalformedAsPath as u8,
                vec![],
            ),
        }
    }
}

// NOTIFICATION raised by the session engine outside of message decoding:
// hold timer expiry and FSM sequencing errors. Both still carry a
// (code, subcode, data) triple even though no `DecodeError` is involved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionNotifyError {
    HoldTimerExpired,
    FsmError(FsmErrorSubcode),
}

impl std::fmt::Display for SessionNotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionNotifyError::HoldTimerExpired => {
                write!(f, "hold timer expired")
            }
            SessionNotifyError::FsmError(_) => {
                write!(f, "finite state machine error")
            }
        }
    }
}

impl SessionNotifyError {
    pub fn notification(&self) -> (ErrorCode, u8, Vec<u8>) {
        match self {
            SessionNotifyError::HoldTimerExpired => {
                (ErrorCode::HoldTimerExpired, 0, vec![])
            }
            SessionNotifyError::FsmError(subcode) => {
                (ErrorCode::FiniteStateMachineError, *subcode as u8, vec![])
            }
        }
    }
}
