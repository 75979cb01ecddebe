// Copyright (c) 2018-2025 The Botho Foundation

//! Coin descriptors

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value carried by a coin, in the smallest unit of its asset
pub type Amount = u64;

/// Asset identifier, [`NATIVE_ASSET`] is the chain's own coin
pub type AssetId = u32;

/// Block height
pub type Height = u64;

/// Index of a wallet identity key (zero means "none")
pub type WalletIdentity = u64;

/// The native asset, fees are always paid in it
pub const NATIVE_ASSET: AssetId = 0;

const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// Key type of a regular (received / mined) coin
pub const KEY_TYPE_REGULAR: u32 = fourcc(b"norm");

/// Key type of a change coin
pub const KEY_TYPE_CHANGE: u32 = fourcc(b"chng");

/// Mask selecting the child key-derivation index inside `sub_index`
const CHILD_MASK: u32 = 0x00ff_ffff;

/// Shift of the commitment scheme byte inside `sub_index`
const SCHEME_SHIFT: u32 = 24;

/// Commitment scheme used to derive a coin's blinding factor
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[repr(u8)]
pub enum KeyScheme {
    /// Plain blinding factor without the switch tweak. Accepted only as an
    /// input, and only when weak inputs are explicitly allowed.
    Legacy = 0,
    /// Switch commitment: the blinding factor is tweaked by a hash of the
    /// plain commitment and its image on the co-factor generator.
    Switch = 1,
}

impl KeyScheme {
    /// Parse the scheme byte, unknown schemes yield `None`
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Legacy),
            1 => Some(Self::Switch),
            _ => None,
        }
    }
}

/// Identifies one value-bearing input or output of the wallet.
///
/// The descriptor is supplied by the host. The key keeper re-derives the
/// blinding factor from it, so the host never sees the secret.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct CoinId {
    /// Wallet-wide key index
    pub key_index: u64,
    /// Key type tag, see [`KEY_TYPE_REGULAR`]
    pub key_type: u32,
    /// Child derivation index (low 24 bits) and scheme byte (high 8 bits)
    pub sub_index: u32,
    /// Value
    pub value: Amount,
    /// Asset
    pub asset_id: AssetId,
}

impl CoinId {
    /// Create a switch-scheme coin under the master key
    pub const fn new(key_index: u64, key_type: u32, value: Amount, asset_id: AssetId) -> Self {
        Self {
            key_index,
            key_type,
            sub_index: (KeyScheme::Switch as u32) << SCHEME_SHIFT,
            value,
            asset_id,
        }
    }

    /// Same coin, derived under child key `child`
    pub const fn with_child(mut self, child: u32) -> Self {
        self.sub_index = (self.sub_index & !CHILD_MASK) | (child & CHILD_MASK);
        self
    }

    /// Same coin, using `scheme`
    pub const fn with_scheme(mut self, scheme: KeyScheme) -> Self {
        self.sub_index = (self.sub_index & CHILD_MASK) | ((scheme as u32) << SCHEME_SHIFT);
        self
    }

    /// Child key-derivation index, zero selects the master key
    pub const fn child_index(&self) -> u32 {
        self.sub_index & CHILD_MASK
    }

    /// Raw scheme byte
    pub const fn scheme_raw(&self) -> u8 {
        (self.sub_index >> SCHEME_SHIFT) as u8
    }

    /// Commitment scheme, `None` if the scheme byte is unknown
    pub const fn scheme(&self) -> Option<KeyScheme> {
        KeyScheme::from_raw(self.scheme_raw())
    }
}
