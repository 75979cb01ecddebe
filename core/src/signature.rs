// Copyright (c) 2018-2025 The Botho Foundation

//! Schnorr signatures over G.
//!
//! A signature `(R, k)` on message `m` under public key `P` satisfies
//! `k·G = R + e·P` with `e = Hs(R, m)`. The challenge does not commit to `P`,
//! so two parties sharing an aggregate nonce `R = R₁ + R₂` can each produce a
//! partial `kᵢ = rᵢ + e·xᵢ` and the sum verifies under `P₁ + P₂`.

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};

use crate::{
    consts::SIGNATURE_DOMAIN_TAG, encoding::decode_scalar, hash::Hasher, types::UintBig, Error,
};

/// A Schnorr signature
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Signature {
    /// Nonce commitment R
    pub nonce_pub: CompressedRistretto,
    /// Response k
    pub k: Scalar,
}

impl Signature {
    /// Encoded size
    pub const SIZE: usize = 64;

    /// Challenge for nonce commitment `nonce_pub` and message `msg`
    pub fn challenge(nonce_pub: &CompressedRistretto, msg: &UintBig) -> Scalar {
        Hasher::new(SIGNATURE_DOMAIN_TAG)
            .point(nonce_pub)
            .digest(msg)
            .to_scalar()
    }

    /// Sign `msg` with secret `sk` and nonce `nonce`
    pub fn sign(msg: &UintBig, sk: &Scalar, nonce: &Scalar) -> Self {
        let nonce_pub = RistrettoPoint::mul_base(nonce).compress();
        let k = Self::sign_partial(msg, &nonce_pub, sk, nonce);
        Self { nonce_pub, k }
    }

    /// Partial response of one signer against the aggregate nonce commitment
    pub fn sign_partial(
        msg: &UintBig,
        nonce_pub: &CompressedRistretto,
        sk: &Scalar,
        nonce: &Scalar,
    ) -> Scalar {
        nonce + Self::challenge(nonce_pub, msg) * sk
    }

    /// Verify against public key `pk`
    pub fn verify(&self, msg: &UintBig, pk: &RistrettoPoint) -> bool {
        let r = match self.nonce_pub.decompress() {
            Some(r) => r,
            None => return false,
        };
        let e = Self::challenge(&self.nonce_pub, msg);
        RistrettoPoint::mul_base(&self.k) == r + e * pk
    }

    /// Encode as `R || k`
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..32].copy_from_slice(self.nonce_pub.as_bytes());
        out[32..].copy_from_slice(self.k.as_bytes());
        out
    }

    /// Decode `R || k`, rejecting non-canonical scalars
    pub fn from_bytes(src: &[u8; Self::SIZE]) -> Result<Self, Error> {
        let mut r = [0u8; 32];
        r.copy_from_slice(&src[..32]);
        let mut k = [0u8; 32];
        k.copy_from_slice(&src[32..]);
        Ok(Self {
            nonce_pub: CompressedRistretto(r),
            k: decode_scalar(&k)?,
        })
    }
}
