// Copyright (c) 2018-2025 The Botho Foundation

//! Botho key keeper type definitions
//!
//! Plain data shared between the key keeper and its host: coin descriptors,
//! shielded descriptors, the packed range-proof fragment and the status codes
//! returned across the protocol boundary.

#![no_std]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod coin;

pub mod shielded;

pub mod status;

pub use coin::{
    Amount, AssetId, CoinId, Height, KeyScheme, WalletIdentity, KEY_TYPE_CHANGE,
    KEY_TYPE_REGULAR, NATIVE_ASSET,
};
pub use shielded::{RangeProofPacked, ShieldedInput, ShieldedTxoId, ShieldedTxoUser};
pub use status::{ProtoErrorKind, Status};

/// Opaque 256-bit value, used for digests, peer ids and serialized scalars.
pub type UintBig = [u8; 32];
