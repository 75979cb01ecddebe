// Copyright (c) 2018-2025 The Botho Foundation

//! Transaction drafts and the parameters of each signing flow

use bth_keykeeper_core::{cofactor_generator, Hasher, Signature, TxKernel};
use bth_keykeeper_types::{
    Amount, AssetId, CoinId, RangeProofPacked, ShieldedInput, ShieldedTxoId, UintBig,
    WalletIdentity,
};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};

const PAYMENT_PROOF_DOMAIN_TAG: &[u8] = b"bth_kk_payment_proof";
const VOUCHER_DOMAIN_TAG: &[u8] = b"bth_kk_voucher";
const TICKET_PROOF_DOMAIN_TAG: &[u8] = b"bth_kk_ticket_proof";

/// A transaction draft as seen by the key keeper.
///
/// The host fills in the coins and the kernel's fee and height window. The
/// signing operations write the kernel and the offset, and only on success.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TxCommon {
    /// Coins being spent
    pub ins: Vec<CoinId>,
    /// Coins being created
    pub outs: Vec<CoinId>,
    /// Shielded outputs being spent
    pub ins_shielded: Vec<ShieldedInput>,
    /// Kernel
    pub kernel: TxKernel,
    /// Blinding offset of this party
    pub offset: Scalar,
}

impl TxCommon {
    /// Absorb everything the host supplied, except the kernel commitment and
    /// signature
    pub(crate) fn hash_draft(&self, mut h: Hasher) -> Hasher {
        h = h
            .u32(self.ins.len() as u32)
            .u32(self.outs.len() as u32)
            .u32(self.ins_shielded.len() as u32);
        for cid in self.ins.iter().chain(self.outs.iter()) {
            h = hash_coin(h, cid);
        }
        for inp in &self.ins_shielded {
            h = hash_shielded_txo(h, &inp.txo).u64(inp.fee);
        }
        h.u64(self.kernel.fee)
            .u64(self.kernel.h_min)
            .u64(self.kernel.h_max)
    }

    /// Total fee: the kernel fee plus the fees of the shielded spends
    pub fn total_fee(&self) -> Option<Amount> {
        self.ins_shielded
            .iter()
            .try_fold(self.kernel.fee, |acc, inp| acc.checked_add(inp.fee))
    }
}

pub(crate) fn hash_coin(h: Hasher, cid: &CoinId) -> Hasher {
    h.u64(cid.key_index)
        .u32(cid.key_type)
        .u32(cid.sub_index)
        .u64(cid.value)
        .u32(cid.asset_id)
}

pub(crate) fn hash_shielded_txo(h: Hasher, txo: &ShieldedTxoId) -> Hasher {
    h.digest(&txo.k_ser_g)
        .u32(txo.viewer_index)
        .u8(txo.created_by_viewer as u8)
        .digest(&txo.user.sender)
        .digest(&txo.user.message[0])
        .digest(&txo.user.message[1])
        .u64(txo.amount)
        .u32(txo.asset_id)
}

/// Identity binding between the two parties of a transaction
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TxMutualInfo {
    /// Identity public key of the counterparty
    pub peer: UintBig,
    /// Our wallet identity
    pub my_id_key: WalletIdentity,
    /// Receiver's payment proof: written by Receive, checked by Send
    pub payment_proof: Signature,
}

/// Message a receiver signs to acknowledge a payment
pub fn payment_proof_message(
    kernel_id: &UintBig,
    sender: &UintBig,
    amount: Amount,
    asset_id: AssetId,
) -> UintBig {
    Hasher::new(PAYMENT_PROOF_DOMAIN_TAG)
        .digest(kernel_id)
        .digest(sender)
        .u64(amount)
        .u32(asset_id)
        .to_digest()
}

/// Sender side session of the two-round Send flow.
///
/// The host carries this value between the rounds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TxSenderParams {
    /// Nonce slot holding our signing nonce
    pub slot: u32,
    /// Zero for the first round. The first round returns the agreement
    /// token, which must be passed back unchanged in the second round.
    pub user_agreement: UintBig,
}

/// One-time capability to create a single shielded output for its issuer
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShieldedVoucher {
    /// Ticket serial public key `s·G + s'·J`
    pub serial_pub: CompressedRistretto,
    /// Nonce of the ticket ownership proof
    pub nonce_pub: CompressedRistretto,
    /// Responses of the ticket ownership proof
    pub pk: [Scalar; 2],
    /// Secret shared with whoever holds the voucher
    pub shared_secret: UintBig,
    /// Issuer identity signature over the rest
    pub signature: Signature,
}

impl ShieldedVoucher {
    /// Encoded size
    pub const SIZE: usize = 32 * 2 + 32 * 2 + 32 + Signature::SIZE;

    /// Challenge of the ticket ownership proof
    pub(crate) fn ticket_challenge(
        serial_pub: &CompressedRistretto,
        nonce_pub: &CompressedRistretto,
    ) -> Scalar {
        Hasher::new(TICKET_PROOF_DOMAIN_TAG)
            .point(serial_pub)
            .point(nonce_pub)
            .to_scalar()
    }

    /// Message signed by the issuer identity
    pub fn message(&self) -> UintBig {
        Hasher::new(VOUCHER_DOMAIN_TAG)
            .point(&self.serial_pub)
            .point(&self.nonce_pub)
            .scalar(&self.pk[0])
            .scalar(&self.pk[1])
            .digest(&self.shared_secret)
            .to_digest()
    }

    /// Check the ticket ownership proof and the issuer's signature
    pub fn verify(&self, issuer: &RistrettoPoint) -> bool {
        let (serial, nonce) = match (self.serial_pub.decompress(), self.nonce_pub.decompress()) {
            (Some(serial), Some(nonce)) => (serial, nonce),
            _ => return false,
        };
        let e = Self::ticket_challenge(&self.serial_pub, &self.nonce_pub);
        let lhs = RistrettoPoint::mul_base(&self.pk[0]) + self.pk[1] * cofactor_generator();
        lhs == nonce + e * serial && self.signature.verify(&self.message(), issuer)
    }
}

/// Parameters of a send to a shielded output
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TxSendShieldedParams {
    /// Voucher issued by the receiver
    pub voucher: ShieldedVoucher,
    /// Receiver identity public key, the voucher issuer
    pub receiver: UintBig,
    /// Our wallet identity, used to detect sends to ourselves
    pub my_id_key: WalletIdentity,
    /// Blind the asset generator even for the native asset
    pub hide_asset_always: bool,
    /// Range proof fragment of the shielded output
    pub range_proof: RangeProofPacked,
    /// Sender tag carried to the receiver
    pub sender: UintBig,
    /// Message words carried to the receiver
    pub message: [UintBig; 2],
}

/// Request of CreateOutput
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CreateOutputRequest {
    /// Output coin
    pub cid: CoinId,
    /// Extra transcript scalars supplied by the host
    pub k_extra: [Scalar; 2],
    /// Host's share of T1 and T2
    pub t: [CompressedRistretto; 2],
}

/// Response of CreateOutput
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CreateOutputResponse {
    /// T1 and T2 including our blinding share
    pub t: [CompressedRistretto; 2],
    /// Blinding response
    pub tau_x: Scalar,
}

/// Request of CreateShieldedInput
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreateShieldedInputRequest {
    /// Shielded output being spent
    pub input: ShieldedInput,
    /// Height window of the spend kernel
    pub h_min: u64,
    /// Height window of the spend kernel
    pub h_max: u64,
    /// End of the anonymity set window
    pub window_end: u64,
    /// Anonymity set exponent M
    pub sigma_m: u32,
    /// Anonymity set base n
    pub sigma_n: u32,
    /// Asset blinding secret
    pub asset_sk: Scalar,
    /// Blinding factor of the output commitment in the proof
    pub outp_sk: Scalar,
    /// Membership proof commitments A, B, C, D
    pub abcd: [CompressedRistretto; 4],
    /// Membership proof G points, `sigma_m` of them
    pub g: Vec<CompressedRistretto>,
}

/// Response of CreateShieldedInput
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CreateShieldedInputResponse {
    /// First G point including our blinding
    pub g0: CompressedRistretto,
    /// Nonce of the spend signature
    pub nonce_pub: CompressedRistretto,
    /// Responses of the spend signature
    pub sig: [Scalar; 2],
    /// Blinding remainder
    pub z_r: Scalar,
}
