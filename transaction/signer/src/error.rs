// Copyright (c) 2018-2025 The Botho Foundation

//! Key keeper errors and their mapping onto wire status codes

use bth_keykeeper_core::Error as CoreError;
use bth_keykeeper_types::{ProtoErrorKind, Status};
use displaydoc::Display;

/// An error which can occur while serving a key keeper request
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Key derivation: {0}
    Derivation(CoreError),

    /// Value flow is not allowed for this operation
    ValuePolicy,

    /// Amount overflow
    Overflow,

    /// Kernel excess and offset do not balance the draft's commitments
    Unbalanced,

    /// Weak input rejected
    WeakInput,

    /// Weak output rejected
    WeakOutput,

    /// Invalid parameter: {0}
    InvalidParameter(&'static str),

    /// Counterparty partial signature failed to verify
    PeerSignature,

    /// Payment proof failed to verify
    PaymentProof,

    /// Voucher failed to verify
    InvalidVoucher,

    /// Assembled signature failed to verify
    SignatureCheck,

    /// Rejected by the user
    UserAbort,

    /// Protocol error: {0}
    Proto(ProtoErrorKind),
}

impl Error {
    /// Wire status reported for this error
    pub fn status(&self) -> Status {
        match self {
            Self::UserAbort => Status::UserAbort,
            Self::Proto(kind) => Status::ProtoError(*kind),
            _ => Status::Unspecified,
        }
    }
}

impl std::error::Error for Error {}

impl From<CoreError> for Error {
    fn from(src: CoreError) -> Self {
        match src {
            CoreError::InvalidCurvePoint | CoreError::NonCanonicalScalar => {
                Self::Proto(ProtoErrorKind::BadEncoding)
            }
            other => Self::Derivation(other),
        }
    }
}

impl From<ProtoErrorKind> for Error {
    fn from(src: ProtoErrorKind) -> Self {
        Self::Proto(src)
    }
}
