// Copyright (c) 2018-2025 The Botho Foundation

//! Errors which can occur in the key keeper primitives

use displaydoc::Display;

/// An error which can occur while deriving keys or decoding primitives
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Error {
    /// Seed must be 32 to 64 bytes, provided `{0}`
    InvalidSeedLength(usize),

    /// Key derivation failed
    KeyDerivation,

    /// Invalid mnemonic phrase
    InvalidMnemonic,

    /// Unknown commitment scheme `{0}`
    UnknownScheme(u8),

    /// Malformed derivation path
    MalformedPath,

    /// Wallet identity zero does not name a key
    NoIdentity,

    /// Invalid curve point
    InvalidCurvePoint,

    /// Scalar is not canonically encoded
    NonCanonicalScalar,

    /// Incorrect length, provided `{0}`, required `{1}`
    LengthMismatch(usize, usize),
}
