// Copyright (c) 2018-2025 The Botho Foundation

//! Hierarchical key derivation.
//!
//! A [`Kdf`] is a pair of a generator secret and a secret co-factor. Keys are
//! derived as `Hs(generator_secret, hv) · cofactor`, so the public half
//! ([`KdfPub`]: the generator secret plus `cofactor·G` and `cofactor·J`) can
//! derive the matching public keys without learning any secret scalar.
//!
//! The master Kdf is produced from a seed with HKDF-SHA512, one salt per
//! field. A BIP39 mnemonic without passphrase is an accepted seed source.

use alloc::vec::Vec;
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use hkdf::Hkdf;
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    consts::{
        COIN_ID_DOMAIN_TAG, IDENTITY_DOMAIN_TAG, KDF_CHILD_COFACTOR_DOMAIN_TAG,
        KDF_CHILD_DOMAIN_TAG, KDF_KEYED_DOMAIN_TAG, KDF_KEY_DOMAIN_TAG, SEED_COFACTOR_SALT,
        SEED_GENERATOR_SALT, SEED_LEN_RANGE, SWITCH_DOMAIN_TAG,
    },
    encoding::decode_point,
    generators::{asset_generator, cofactor_generator, commit},
    hash::Hasher,
    types::{CoinId, KeyScheme, UintBig, WalletIdentity},
    Error,
};

#[cfg(feature = "bip39")]
use bip39::{Language, Mnemonic, Seed};

/// Secret key-derivation function
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Kdf {
    generator_secret: UintBig,
    cofactor: Scalar,
}

impl Kdf {
    /// Create the master Kdf from a 32 to 64 byte seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, Error> {
        if !SEED_LEN_RANGE.contains(&seed.len()) {
            return Err(Error::InvalidSeedLength(seed.len()));
        }

        let mut generator_secret = [0u8; 32];
        Hkdf::<Sha512>::new(Some(SEED_GENERATOR_SALT), seed)
            .expand(b"", &mut generator_secret)
            .map_err(|_| Error::KeyDerivation)?;

        let mut okm = [0u8; 64];
        Hkdf::<Sha512>::new(Some(SEED_COFACTOR_SALT), seed)
            .expand(b"", &mut okm)
            .map_err(|_| Error::KeyDerivation)?;
        let cofactor = Scalar::from_bytes_mod_order_wide(&okm);
        okm.zeroize();

        Ok(Self {
            generator_secret,
            cofactor,
        })
    }

    /// Create the master Kdf from a BIP39 mnemonic.
    ///
    /// Passphrases are not supported; the seed is always derived with an
    /// empty one.
    #[cfg(feature = "bip39")]
    pub fn from_mnemonic(mnemonic: &Mnemonic) -> Result<Self, Error> {
        let seed = Seed::new(mnemonic, "");
        Self::from_seed(seed.as_bytes())
    }

    /// Parse an English BIP39 phrase and create the master Kdf from it
    #[cfg(feature = "bip39")]
    pub fn from_phrase(phrase: &str) -> Result<Self, Error> {
        let mnemonic = Mnemonic::from_phrase(phrase.trim(), Language::English)
            .map_err(|_| Error::InvalidMnemonic)?;
        Self::from_mnemonic(&mnemonic)
    }

    /// Derive the secret scalar for hash value `hv`
    pub fn derive_key(&self, hv: &UintBig) -> Scalar {
        self.hash_key(hv) * self.cofactor
    }

    fn hash_key(&self, hv: &UintBig) -> Scalar {
        hash_key(&self.generator_secret, hv)
    }

    /// Child Kdf at `index`
    pub fn child(&self, index: u32) -> Self {
        let generator_secret = Hasher::new(KDF_CHILD_DOMAIN_TAG)
            .digest(&self.generator_secret)
            .u32(index)
            .to_digest();
        let cofactor = self.derive_key(
            &Hasher::new(KDF_CHILD_COFACTOR_DOMAIN_TAG)
                .u32(index)
                .to_digest(),
        );
        Self {
            generator_secret,
            cofactor,
        }
    }

    /// Public half of this Kdf
    pub fn public(&self) -> KdfPub {
        KdfPub {
            generator_secret: self.generator_secret,
            cofactor_g: RistrettoPoint::mul_base(&self.cofactor).compress(),
            cofactor_j: (self.cofactor * cofactor_generator()).compress(),
        }
    }

    /// Keyed digest of `msg` under `label`, unpredictable without the
    /// secret
    pub fn keyed_digest(&self, label: &[u8], msg: &UintBig) -> UintBig {
        self.keyed(label, msg).to_digest()
    }

    /// Keyed scalar of `msg` under `label`, unpredictable without the
    /// secret
    pub fn keyed_scalar(&self, label: &[u8], msg: &UintBig) -> Scalar {
        self.keyed(label, msg).to_scalar()
    }

    fn keyed(&self, label: &[u8], msg: &UintBig) -> Hasher {
        Hasher::new(KDF_KEYED_DOMAIN_TAG)
            .u8(label.len() as u8)
            .bytes(label)
            .digest(&self.generator_secret)
            .scalar(&self.cofactor)
            .digest(msg)
    }

    /// Secret key of a wallet identity
    pub fn identity_key(&self, id: WalletIdentity) -> Result<Scalar, Error> {
        if id == 0 {
            return Err(Error::NoIdentity);
        }
        Ok(self.derive_key(&Hasher::new(IDENTITY_DOMAIN_TAG).u64(id).to_digest()))
    }

    /// Blinding factor of a coin whose asset has value generator `h`.
    ///
    /// Switch-scheme coins tweak the plain key by a hash of the plain
    /// commitment and its image on J.
    pub fn coin_key(&self, cid: &CoinId, h: &RistrettoPoint) -> Result<Scalar, Error> {
        let scheme = cid
            .scheme()
            .ok_or_else(|| Error::UnknownScheme(cid.scheme_raw()))?;

        let hv = coin_digest(cid);
        let sk0 = match cid.child_index() {
            0 => self.derive_key(&hv),
            child => self.child(child).derive_key(&hv),
        };

        Ok(match scheme {
            KeyScheme::Legacy => sk0,
            KeyScheme::Switch => {
                let c0 = commit(&sk0, cid.value, h).compress();
                let image = (sk0 * cofactor_generator()).compress();
                sk0 + Hasher::new(SWITCH_DOMAIN_TAG)
                    .point(&c0)
                    .point(&image)
                    .to_scalar()
            }
        })
    }

    /// Secret scalar behind `path`
    pub fn derive_secret(&self, path: &Path) -> Result<Scalar, Error> {
        Ok(match path {
            Path::Root => self.cofactor,
            Path::Child(index) => self.child(*index).cofactor,
            Path::Coin(cid) => self.coin_key(cid, &asset_generator(cid.asset_id))?,
        })
    }

    /// Public key pair behind `path`.
    ///
    /// For the root and children this is the [`KdfPub`] of that Kdf. For a
    /// coin, the `generator_secret` field carries the coin digest and the
    /// points are the G and J images of the coin's blinding factor.
    pub fn derive_public(&self, path: &Path) -> Result<KdfPub, Error> {
        Ok(match path {
            Path::Root => self.public(),
            Path::Child(index) => self.child(*index).public(),
            Path::Coin(cid) => {
                let sk = Zeroizing::new(self.derive_secret(path)?);
                KdfPub {
                    generator_secret: coin_digest(cid),
                    cofactor_g: RistrettoPoint::mul_base(&sk).compress(),
                    cofactor_j: (*sk * cofactor_generator()).compress(),
                }
            }
        })
    }
}

fn hash_key(generator_secret: &UintBig, hv: &UintBig) -> Scalar {
    Hasher::new(KDF_KEY_DOMAIN_TAG)
        .digest(generator_secret)
        .digest(hv)
        .to_scalar()
}

/// Digest identifying a coin descriptor
pub fn coin_digest(cid: &CoinId) -> UintBig {
    Hasher::new(COIN_ID_DOMAIN_TAG)
        .u64(cid.key_index)
        .u32(cid.key_type)
        .u32(cid.sub_index)
        .u64(cid.value)
        .u32(cid.asset_id)
        .to_digest()
}

/// Public half of a [`Kdf`]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KdfPub {
    /// Generator secret, shared with watch-only parties
    pub generator_secret: UintBig,
    /// co-factor · G
    pub cofactor_g: CompressedRistretto,
    /// co-factor · J
    pub cofactor_j: CompressedRistretto,
}

impl KdfPub {
    /// Encoded size
    pub const SIZE: usize = 96;

    /// Public key `derive_key(hv)·G`
    pub fn derive_pk_g(&self, hv: &UintBig) -> Result<RistrettoPoint, Error> {
        Ok(hash_key(&self.generator_secret, hv) * decode_point(&self.cofactor_g)?)
    }

    /// Public key `derive_key(hv)·J`
    pub fn derive_pk_j(&self, hv: &UintBig) -> Result<RistrettoPoint, Error> {
        Ok(hash_key(&self.generator_secret, hv) * decode_point(&self.cofactor_j)?)
    }

    /// Encode as `secret || cofactor_g || cofactor_j`
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..32].copy_from_slice(&self.generator_secret);
        out[32..64].copy_from_slice(self.cofactor_g.as_bytes());
        out[64..].copy_from_slice(self.cofactor_j.as_bytes());
        out
    }
}

/// Derivation path of an owner key
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Path {
    /// The master Kdf
    Root,
    /// A child Kdf
    Child(u32),
    /// The blinding factor of a coin
    Coin(CoinId),
}

impl Path {
    const TAG_ROOT: u8 = 0;
    const TAG_CHILD: u8 = 1;
    const TAG_COIN: u8 = 2;
    const COIN_LEN: usize = 8 + 4 + 4 + 8 + 4;

    /// Longest encoding
    pub const MAX_LEN: usize = 1 + Self::COIN_LEN;

    /// Canonical encoding: a tag byte followed by fixed-width little-endian
    /// fields
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::MAX_LEN);
        match self {
            Self::Root => out.push(Self::TAG_ROOT),
            Self::Child(index) => {
                out.push(Self::TAG_CHILD);
                out.extend_from_slice(&index.to_le_bytes());
            }
            Self::Coin(cid) => {
                out.push(Self::TAG_COIN);
                out.extend_from_slice(&cid.key_index.to_le_bytes());
                out.extend_from_slice(&cid.key_type.to_le_bytes());
                out.extend_from_slice(&cid.sub_index.to_le_bytes());
                out.extend_from_slice(&cid.value.to_le_bytes());
                out.extend_from_slice(&cid.asset_id.to_le_bytes());
            }
        }
        out
    }

    /// Parse the canonical encoding. Trailing bytes are rejected.
    pub fn from_bytes(src: &[u8]) -> Result<Self, Error> {
        let (tag, body) = src.split_first().ok_or(Error::MalformedPath)?;
        match (*tag, body.len()) {
            (Self::TAG_ROOT, 0) => Ok(Self::Root),
            (Self::TAG_CHILD, 4) => Ok(Self::Child(le_u32(&body[..4]))),
            (Self::TAG_COIN, Self::COIN_LEN) => Ok(Self::Coin(CoinId {
                key_index: le_u64(&body[..8]),
                key_type: le_u32(&body[8..12]),
                sub_index: le_u32(&body[12..16]),
                value: le_u64(&body[16..24]),
                asset_id: le_u32(&body[24..28]),
            })),
            _ => Err(Error::MalformedPath),
        }
    }
}

fn le_u32(src: &[u8]) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(src);
    u32::from_le_bytes(b)
}

fn le_u64(src: &[u8]) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(src);
    u64::from_le_bytes(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KEY_TYPE_REGULAR, NATIVE_ASSET};

    fn test_kdf() -> Kdf {
        Kdf::from_seed(&[7u8; 32]).unwrap()
    }

    #[test]
    fn seed_length_is_checked() {
        assert!(matches!(
            Kdf::from_seed(&[0u8; 16]),
            Err(Error::InvalidSeedLength(16))
        ));
        assert!(matches!(
            Kdf::from_seed(&[0u8; 65]),
            Err(Error::InvalidSeedLength(65))
        ));
        assert!(Kdf::from_seed(&[0u8; 64]).is_ok());
    }

    #[test]
    fn different_seeds_give_different_keys() {
        let a = Kdf::from_seed(&[1u8; 32]).unwrap().public();
        let b = Kdf::from_seed(&[2u8; 32]).unwrap().public();
        assert_ne!(a, b);
    }

    #[test]
    fn public_derivation_matches_secret() {
        let kdf = test_kdf();
        let pkdf = kdf.public();
        let hv = [42u8; 32];
        let sk = kdf.derive_key(&hv);

        assert_eq!(pkdf.derive_pk_g(&hv).unwrap(), RistrettoPoint::mul_base(&sk));
        assert_eq!(pkdf.derive_pk_j(&hv).unwrap(), sk * cofactor_generator());
    }

    #[test]
    fn children_are_distinct() {
        let kdf = test_kdf();
        let root = kdf.derive_public(&Path::Root).unwrap();
        let c0 = kdf.derive_public(&Path::Child(0)).unwrap();
        let c1 = kdf.derive_public(&Path::Child(1)).unwrap();
        assert_ne!(root, c0);
        assert_ne!(c0, c1);
        assert_eq!(c1, kdf.child(1).public());
    }

    #[test]
    fn switch_tweak_changes_the_key() {
        let kdf = test_kdf();
        let h = asset_generator(NATIVE_ASSET);
        let cid = CoinId::new(3, KEY_TYPE_REGULAR, 500, NATIVE_ASSET);

        let switch = kdf.coin_key(&cid, &h).unwrap();
        let legacy = kdf
            .coin_key(&cid.with_scheme(KeyScheme::Legacy), &h)
            .unwrap();
        assert_ne!(switch, legacy);
        assert_eq!(switch, kdf.coin_key(&cid, &h).unwrap());
    }

    #[test]
    fn coin_child_index_selects_kdf() {
        let kdf = test_kdf();
        let h = asset_generator(NATIVE_ASSET);
        let cid = CoinId::new(3, KEY_TYPE_REGULAR, 500, NATIVE_ASSET);
        assert_ne!(
            kdf.coin_key(&cid, &h).unwrap(),
            kdf.coin_key(&cid.with_child(5), &h).unwrap()
        );
    }

    #[test]
    fn coin_public_images() {
        let kdf = test_kdf();
        let cid = CoinId::new(3, KEY_TYPE_REGULAR, 500, NATIVE_ASSET);
        let sk = kdf.derive_secret(&Path::Coin(cid)).unwrap();
        let pk = kdf.derive_public(&Path::Coin(cid)).unwrap();
        assert_eq!(pk.generator_secret, coin_digest(&cid));
        assert_eq!(pk.cofactor_g, RistrettoPoint::mul_base(&sk).compress());
        assert_eq!(pk.cofactor_j, (sk * cofactor_generator()).compress());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let kdf = test_kdf();
        let mut cid = CoinId::new(3, KEY_TYPE_REGULAR, 500, NATIVE_ASSET);
        cid.sub_index = 0x0500_0000;
        assert_eq!(
            kdf.derive_secret(&Path::Coin(cid)),
            Err(Error::UnknownScheme(5))
        );
    }

    #[test]
    fn identity_zero_is_not_a_key() {
        let kdf = test_kdf();
        assert_eq!(kdf.identity_key(0), Err(Error::NoIdentity));
        assert_ne!(kdf.identity_key(1).unwrap(), kdf.identity_key(2).unwrap());
    }

    #[test]
    fn keyed_outputs_depend_on_label() {
        let kdf = test_kdf();
        let msg = [5u8; 32];
        assert_ne!(kdf.keyed_digest(b"a", &msg), kdf.keyed_digest(b"b", &msg));
        assert_ne!(
            kdf.keyed_digest(b"a", &msg),
            Kdf::from_seed(&[8u8; 32]).unwrap().keyed_digest(b"a", &msg)
        );
    }

    #[test]
    fn path_encoding() {
        let cid = CoinId::new(u64::MAX, KEY_TYPE_REGULAR, 1, 9).with_child(4);
        for path in [Path::Root, Path::Child(0), Path::Child(u32::MAX), Path::Coin(cid)] {
            assert_eq!(Path::from_bytes(&path.to_bytes()), Ok(path));
        }
        assert_eq!(Path::Coin(cid).to_bytes().len(), Path::MAX_LEN);

        assert_eq!(Path::from_bytes(&[]), Err(Error::MalformedPath));
        assert_eq!(Path::from_bytes(&[0, 0]), Err(Error::MalformedPath));
        assert_eq!(Path::from_bytes(&[1, 0, 0, 0]), Err(Error::MalformedPath));
        assert_eq!(Path::from_bytes(&[3]), Err(Error::MalformedPath));
    }

    #[cfg(feature = "bip39")]
    #[test]
    fn mnemonic_import() {
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let a = Kdf::from_phrase(phrase).unwrap().public();
        let b = Kdf::from_phrase(&alloc::format!("  {}\n", phrase))
            .unwrap()
            .public();
        assert_eq!(a, b);
        assert!(matches!(
            Kdf::from_phrase("not a mnemonic"),
            Err(Error::InvalidMnemonic)
        ));
    }
}
