// Copyright (c) 2018-2025 The Botho Foundation

//! Key keeper domain separators and limits

/// HKDF salt producing the generator secret of the master Kdf
pub const SEED_GENERATOR_SALT: &[u8] = b"bth-keykeeper-generator";

/// HKDF salt producing the co-factor of the master Kdf
pub const SEED_COFACTOR_SALT: &[u8] = b"bth-keykeeper-cofactor";

/// Accepted master seed lengths, in bytes
pub const SEED_LEN_RANGE: core::ops::RangeInclusive<usize> = 32..=64;

pub(crate) const KDF_KEY_DOMAIN_TAG: &[u8] = b"bth_kk_kdf_key";
pub(crate) const KDF_CHILD_DOMAIN_TAG: &[u8] = b"bth_kk_kdf_child";
pub(crate) const KDF_CHILD_COFACTOR_DOMAIN_TAG: &[u8] = b"bth_kk_kdf_child_cofactor";
pub(crate) const KDF_KEYED_DOMAIN_TAG: &[u8] = b"bth_kk_kdf_keyed";
pub(crate) const COIN_ID_DOMAIN_TAG: &[u8] = b"bth_kk_coin_id";
pub(crate) const SWITCH_DOMAIN_TAG: &[u8] = b"bth_kk_switch";
pub(crate) const IDENTITY_DOMAIN_TAG: &[u8] = b"bth_kk_identity";
pub(crate) const VALUE_GENERATOR_DOMAIN_TAG: &[u8] = b"bth_kk_value_generator";
pub(crate) const COFACTOR_GENERATOR_DOMAIN_TAG: &[u8] = b"bth_kk_cofactor_generator";
pub(crate) const ASSET_GENERATOR_DOMAIN_TAG: &[u8] = b"bth_kk_asset_generator";
pub(crate) const SIGNATURE_DOMAIN_TAG: &[u8] = b"bth_kk_schnorr";
pub(crate) const KERNEL_DOMAIN_TAG: &[u8] = b"bth_kk_kernel";

/// Highest child index a coin descriptor can select (24 bits)
pub const MAX_CHILD_INDEX: u32 = 0x00ff_ffff;
