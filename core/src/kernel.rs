// Copyright (c) 2018-2025 The Botho Foundation

//! Transaction kernel

use curve25519_dalek::ristretto::CompressedRistretto;

use crate::{
    consts::KERNEL_DOMAIN_TAG,
    hash::Hasher,
    signature::Signature,
    types::{Amount, Height, UintBig},
    Error,
};

/// The signed, fee and validity bound part of a transaction
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TxKernel {
    /// Fee, in the native asset
    pub fee: Amount,
    /// First height at which the kernel is valid
    pub h_min: Height,
    /// Last height at which the kernel is valid
    pub h_max: Height,
    /// Excess commitment, the public key the signature verifies under
    pub commitment: CompressedRistretto,
    /// Digest of nested content, zero for plain kernels
    pub nested: UintBig,
    /// Signature over [`TxKernel::id`]
    pub signature: Signature,
}

impl TxKernel {
    /// Encoded size
    pub const SIZE: usize = 8 * 3 + 32 + 32 + Signature::SIZE;

    /// Message the signature binds: fee, height bounds, commitment and
    /// nested digest
    pub fn id(&self) -> UintBig {
        Hasher::new(KERNEL_DOMAIN_TAG)
            .u64(self.fee)
            .u64(self.h_min)
            .u64(self.h_max)
            .point(&self.commitment)
            .digest(&self.nested)
            .to_digest()
    }

    /// Height window is well-formed and the signature verifies under the
    /// commitment
    pub fn is_valid(&self) -> bool {
        if self.h_min > self.h_max {
            return false;
        }
        match self.commitment.decompress() {
            Some(excess) => self.signature.verify(&self.id(), &excess),
            None => false,
        }
    }

    /// Encode in wire order
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..8].copy_from_slice(&self.fee.to_le_bytes());
        out[8..16].copy_from_slice(&self.h_min.to_le_bytes());
        out[16..24].copy_from_slice(&self.h_max.to_le_bytes());
        out[24..56].copy_from_slice(self.commitment.as_bytes());
        out[56..88].copy_from_slice(&self.nested);
        out[88..].copy_from_slice(&self.signature.to_bytes());
        out
    }

    /// Decode from wire order
    pub fn from_bytes(src: &[u8; Self::SIZE]) -> Result<Self, Error> {
        let u64_at = |pos: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&src[pos..pos + 8]);
            u64::from_le_bytes(b)
        };
        let mut commitment = [0u8; 32];
        commitment.copy_from_slice(&src[24..56]);
        let mut nested = [0u8; 32];
        nested.copy_from_slice(&src[56..88]);
        let mut sig = [0u8; Signature::SIZE];
        sig.copy_from_slice(&src[88..]);

        Ok(Self {
            fee: u64_at(0),
            h_min: u64_at(8),
            h_max: u64_at(16),
            commitment: CompressedRistretto(commitment),
            nested,
            signature: Signature::from_bytes(&sig)?,
        })
    }
}
