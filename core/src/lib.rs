// Copyright (c) 2018-2025 The Botho Foundation

//! Botho key keeper primitives.
//!
//! Everything the key keeper needs from the curve: fixed generators,
//! domain-separated hashing, Schnorr signatures, commitments, the
//! hierarchical key-derivation function and the transaction kernel.

#![no_std]
#![warn(missing_docs)]
#![deny(unsafe_code)]

extern crate alloc;

pub use bth_keykeeper_types as types;

pub mod consts;

pub mod encoding;

pub mod hash;

pub mod generators;

pub mod signature;

pub mod kdf;

pub mod kernel;

mod error;

pub use error::Error;
pub use generators::{
    asset_generator, blinding_generator, cofactor_generator, commit, value_generator,
    GeneratorCache,
};
pub use hash::Hasher;
pub use kdf::{coin_digest, Kdf, KdfPub, Path};
pub use kernel::TxKernel;
pub use signature::Signature;

#[cfg(feature = "bip39")]
pub use bip39::{Language, Mnemonic};
