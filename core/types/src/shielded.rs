// Copyright (c) 2018-2025 The Botho Foundation

//! Shielded (privacy pool) descriptors

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Amount, AssetId, UintBig};

/// Sender-visible metadata attached to a shielded output
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ShieldedTxoUser {
    /// Sender tag, free-form for now
    pub sender: UintBig,
    /// Two message words
    pub message: [UintBig; 2],
}

/// Everything the owner needs to re-derive the keys of a shielded output
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ShieldedTxoId {
    /// Ticket source material
    pub k_ser_g: UintBig,
    /// Viewer key index that recognized the output
    pub viewer_index: u32,
    /// Whether the ticket was created by the viewer itself (voucher flow)
    pub created_by_viewer: bool,
    /// Sender metadata
    pub user: ShieldedTxoUser,
    /// Value
    pub amount: Amount,
    /// Asset
    pub asset_id: AssetId,
}

/// A shielded output being spent, with the fee of its spend kernel
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ShieldedInput {
    /// The output being spent
    pub txo: ShieldedTxoId,
    /// Fee paid by the spend kernel, in the native asset
    pub fee: Amount,
}

/// Range proof fragment in its packed wire form.
///
/// The key keeper fills in the blinding-dependent parts; the host completes
/// the remaining non-secret arithmetic. Packed into [`RangeProofPacked::SIZE`]
/// bytes, serialized field by field in declaration order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RangeProofPacked {
    /// x coordinate of A
    pub ax: UintBig,
    /// x coordinate of S
    pub sx: UintBig,
    /// x coordinate of T1
    pub t1x: UintBig,
    /// x coordinate of T2
    pub t2x: UintBig,
    /// Blinding response
    pub taux: UintBig,
    /// Aggregated blinding of A and S
    pub mu: UintBig,
    /// Inner product
    pub t_dot: UintBig,
    /// Inner-product rounds, (L, R) per round
    pub lr: [[UintBig; 2]; 6],
    /// Condensed final vectors
    pub condensed: [UintBig; 2],
    /// Parity bits of the compressed points
    pub ys: [u8; 2],
}

impl RangeProofPacked {
    /// Packed size in bytes
    pub const SIZE: usize = 32 * 7 + 32 * 12 + 32 * 2 + 2;

    /// Serialize to the packed form
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let mut pos = 0;
        let mut put = |src: &[u8]| {
            out[pos..pos + src.len()].copy_from_slice(src);
            pos += src.len();
        };
        for field in [
            &self.ax, &self.sx, &self.t1x, &self.t2x, &self.taux, &self.mu, &self.t_dot,
        ] {
            put(&field[..]);
        }
        for round in &self.lr {
            put(&round[0][..]);
            put(&round[1][..]);
        }
        put(&self.condensed[0][..]);
        put(&self.condensed[1][..]);
        put(&self.ys[..]);
        out
    }

    /// Parse the packed form
    pub fn from_bytes(src: &[u8; Self::SIZE]) -> Self {
        let mut pos = 0;
        let mut take = || {
            let mut v = [0u8; 32];
            v.copy_from_slice(&src[pos..pos + 32]);
            pos += 32;
            v
        };
        let ax = take();
        let sx = take();
        let t1x = take();
        let t2x = take();
        let taux = take();
        let mu = take();
        let t_dot = take();
        let mut lr = [[[0u8; 32]; 2]; 6];
        for round in lr.iter_mut() {
            round[0] = take();
            round[1] = take();
        }
        let condensed = [take(), take()];
        Self {
            ax,
            sx,
            t1x,
            t2x,
            taux,
            mu,
            t_dot,
            lr,
            condensed,
            ys: [src[Self::SIZE - 2], src[Self::SIZE - 1]],
        }
    }

    /// The parity bytes must each hold a single bit
    pub fn is_well_formed(&self) -> bool {
        self.ys.iter().all(|y| *y <= 1)
    }
}
