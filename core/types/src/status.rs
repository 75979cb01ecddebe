// Copyright (c) 2018-2025 The Botho Foundation

//! Status codes returned across the protocol boundary

use displaydoc::Display;

/// Detail attached to [`Status::ProtoError`]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ProtoErrorKind {
    /// Unknown opcode
    UnknownOpcode = 1,
    /// Request length does not match the method schema
    LengthMismatch = 2,
    /// Field encoding is invalid
    BadEncoding = 3,
    /// Response buffer is too small for the method
    ResponseTooSmall = 4,
    /// Nonce slot index out of range
    SlotOutOfRange = 5,
    /// Nonce slot was already used by a completed signature
    SlotUsed = 6,
    /// Nonce slot is reserved by a different session
    SlotBusy = 7,
    /// Session state does not match the one agreed in the first round
    StaleSession = 8,
    /// Variable-length field exceeds its limit
    TooManyElements = 9,
}

impl ProtoErrorKind {
    /// Parse the wire detail byte
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Self::UnknownOpcode,
            2 => Self::LengthMismatch,
            3 => Self::BadEncoding,
            4 => Self::ResponseTooSmall,
            5 => Self::SlotOutOfRange,
            6 => Self::SlotUsed,
            7 => Self::SlotBusy,
            8 => Self::StaleSession,
            9 => Self::TooManyElements,
            _ => return None,
        })
    }
}

/// Outcome of a key keeper operation.
///
/// Every request yields exactly one status; only [`Status::Ok`] is followed
/// by a response payload.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Status {
    /// Ok
    Ok,
    /// Unspecified failure
    Unspecified,
    /// Rejected by the user
    UserAbort,
    /// Not implemented
    NotImplemented,
    /// Protocol error: {0}
    ProtoError(ProtoErrorKind),
}

impl Status {
    /// Wire code of [`Status::Ok`]
    pub const OK: u8 = 0;
    /// Wire code of [`Status::Unspecified`]
    pub const UNSPECIFIED: u8 = 1;
    /// Wire code of [`Status::UserAbort`]
    pub const USER_ABORT: u8 = 2;
    /// Wire code of [`Status::NotImplemented`]
    pub const NOT_IMPLEMENTED: u8 = 3;
    /// Wire code of [`Status::ProtoError`], followed by the detail byte
    pub const PROTO_ERROR: u8 = 10;

    /// Wire code
    pub const fn code(&self) -> u8 {
        match self {
            Self::Ok => Self::OK,
            Self::Unspecified => Self::UNSPECIFIED,
            Self::UserAbort => Self::USER_ABORT,
            Self::NotImplemented => Self::NOT_IMPLEMENTED,
            Self::ProtoError(_) => Self::PROTO_ERROR,
        }
    }

    /// Number of bytes the status occupies on the wire
    pub const fn wire_len(&self) -> usize {
        match self {
            Self::ProtoError(_) => 2,
            _ => 1,
        }
    }

    /// Parse a status from the head of a response
    pub fn from_wire(src: &[u8]) -> Option<Self> {
        Some(match *src.first()? {
            Self::OK => Self::Ok,
            Self::UNSPECIFIED => Self::Unspecified,
            Self::USER_ABORT => Self::UserAbort,
            Self::NOT_IMPLEMENTED => Self::NotImplemented,
            Self::PROTO_ERROR => Self::ProtoError(ProtoErrorKind::from_raw(*src.get(1)?)?),
            _ => return None,
        })
    }

    /// Whether this is [`Status::Ok`]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
