// Copyright (c) 2018-2025 The Botho Foundation

//! Botho key keeper.
//!
//! An isolated signer holding the wallet master secret. A host drives it
//! through a compact binary request/response protocol (see [`protocol`]) and
//! receives only public keys, signed transaction kernels and proof shares.
//! Every spend passes the value policy and is approved through
//! [`UserConfirmation`] before anything is signed.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod confirm;
pub mod keeper;
pub mod protocol;
pub mod slots;
pub mod tx;

mod aggregate;
mod error;
mod shielded;
mod sign;

pub use config::{HostConfig, KeyKeeperConfig, MAX_SLOTS};
pub use confirm::{AutoApprove, SpendKind, SpendRequest, UserConfirmation};
pub use error::Error;
pub use keeper::KeyKeeper;
pub use protocol::{Opcode, Request, Response, MIN_RESPONSE_LEN, PROTO_VERSION};
pub use shielded::{MAX_ANONYMITY_SET, MAX_SIGMA_M, MAX_VOUCHERS};
pub use slots::SlotState;
pub use tx::{
    payment_proof_message, CreateOutputRequest, CreateOutputResponse,
    CreateShieldedInputRequest, CreateShieldedInputResponse, ShieldedVoucher, TxCommon,
    TxMutualInfo, TxSendShieldedParams, TxSenderParams,
};
