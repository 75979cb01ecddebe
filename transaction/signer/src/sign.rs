// Copyright (c) 2018-2025 The Botho Foundation

//! Kernel signing flows.
//!
//! Every flow aggregates and checks the draft first, asks the user where
//! value leaves the wallet, and writes the kernel and offset back only once
//! the result is complete. Offsets and single-party nonces are keyed hashes
//! of the draft, so an identical request always yields an identical answer.

use bth_keykeeper_core::{
    asset_generator, commit, encoding::decode_point, GeneratorCache, Hasher, Kdf, Signature,
    TxKernel,
};
use bth_keykeeper_types::{Amount, AssetId, ProtoErrorKind, UintBig, WalletIdentity, NATIVE_ASSET};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::{
    aggregate::TxAggregate,
    config::KeyKeeperConfig,
    confirm::{SpendKind, SpendRequest, UserConfirmation},
    slots::{SlotPool, SlotState},
    tx::{payment_proof_message, TxCommon, TxMutualInfo, TxSendShieldedParams, TxSenderParams},
    Error,
};

const SPLIT_DOMAIN_TAG: &[u8] = b"bth_kk_sign_split";
const RECEIVE_DOMAIN_TAG: &[u8] = b"bth_kk_sign_receive";
const SEND_DOMAIN_TAG: &[u8] = b"bth_kk_sign_send";
const SEND_SHIELDED_DOMAIN_TAG: &[u8] = b"bth_kk_sign_send_shielded";
const SHIELDED_OUTPUT_DOMAIN_TAG: &[u8] = b"bth_kk_shielded_output";
const SHIELDED_ASSET_DOMAIN_TAG: &[u8] = b"bth_kk_shielded_asset";
const SHIELDED_NESTED_DOMAIN_TAG: &[u8] = b"bth_kk_shielded_nested";

/// Shared inputs of every signing flow
pub(crate) struct SignContext<'a, C> {
    pub kdf: &'a Kdf,
    pub config: &'a KeyKeeperConfig,
    pub confirm: &'a C,
}

/// Public key of wallet identity `id`
pub(crate) fn identity_public(kdf: &Kdf, id: WalletIdentity) -> Result<RistrettoPoint, Error> {
    let sk = Zeroizing::new(kdf.identity_key(id)?);
    Ok(RistrettoPoint::mul_base(&sk))
}

impl<C: UserConfirmation> SignContext<'_, C> {
    fn aggregate(&self, tx: &TxCommon) -> Result<TxAggregate, Error> {
        if tx.kernel.h_min > tx.kernel.h_max {
            return Err(Error::InvalidParameter("h_max"));
        }
        TxAggregate::new(
            self.kdf,
            tx,
            self.config.allow_weak_inputs,
            &mut GeneratorCache::default(),
        )
    }

    fn ask(&self, request: SpendRequest) -> Result<(), Error> {
        if self.confirm.confirm_spend(&request) {
            return Ok(());
        }
        warn!(kind = ?request.kind, "Spend rejected by the user");
        Err(Error::UserAbort)
    }

    /// Fee-only transaction: nothing leaves the wallet except the fee.
    pub fn split(&self, tx: &mut TxCommon) -> Result<(), Error> {
        let agg = self.aggregate(tx)?;
        let paid = agg.check_split()?;
        self.ask(SpendRequest {
            kind: SpendKind::Split,
            amount: 0,
            asset_id: NATIVE_ASSET,
            peer: None,
            fee: agg.fee(),
        })?;

        let digest = tx.hash_draft(Hasher::new(SPLIT_DOMAIN_TAG)).to_digest();
        let offset = self.kdf.keyed_scalar(b"offset", &digest);
        let x = Zeroizing::new(agg.sk() - offset);
        let nonce = Zeroizing::new(self.kdf.keyed_scalar(b"nonce", &digest));

        let mut kernel = plain_kernel(&tx.kernel, &x);
        kernel.signature = Signature::sign(&kernel.id(), &x, &nonce);
        finish(tx, &agg, kernel, offset, &on_generator(paid, NATIVE_ASSET))
    }

    /// Receiver side of a two-party transaction.
    ///
    /// The incoming kernel carries the sender's excess and nonce. Our halves
    /// are added to both, our partial signature is written, and a payment
    /// proof over the final kernel id is signed with our identity key.
    pub fn receive(&self, tx: &mut TxCommon, mutual: &mut TxMutualInfo) -> Result<(), Error> {
        let agg = self.aggregate(tx)?;
        let (amount, asset_id) = agg.check_receive()?;
        let id_sk = Zeroizing::new(self.kdf.identity_key(mutual.my_id_key)?);
        decode_point(&CompressedRistretto(mutual.peer))?;

        let x_sender = decode_point(&tx.kernel.commitment)?;
        let r_sender = decode_point(&tx.kernel.signature.nonce_pub)?;

        let digest = tx
            .hash_draft(Hasher::new(RECEIVE_DOMAIN_TAG))
            .digest(&mutual.peer)
            .u64(mutual.my_id_key)
            .point(&tx.kernel.commitment)
            .point(&tx.kernel.signature.nonce_pub)
            .to_digest();
        let offset = self.kdf.keyed_scalar(b"offset", &digest);
        let x = Zeroizing::new(agg.sk() - offset);
        let nonce = Zeroizing::new(self.kdf.keyed_scalar(b"nonce", &digest));
        let own_excess = RistrettoPoint::mul_base(&x);
        agg.check_balance(&own_excess, &offset, &-on_generator(amount, asset_id))?;

        let mut kernel = tx.kernel;
        kernel.nested = [0u8; 32];
        kernel.commitment = (x_sender + own_excess).compress();
        kernel.signature.nonce_pub = (r_sender + RistrettoPoint::mul_base(&nonce)).compress();
        let id = kernel.id();
        kernel.signature.k = Signature::sign_partial(&id, &kernel.signature.nonce_pub, &x, &nonce);

        let msg = payment_proof_message(&id, &mutual.peer, amount, asset_id);
        let proof_nonce = Zeroizing::new(self.kdf.keyed_scalar(b"payment-proof", &msg));
        let payment_proof = Signature::sign(&msg, &id_sk, &proof_nonce);

        debug!(amount, asset_id, "Signed receive");
        tx.kernel = kernel;
        tx.offset = offset;
        mutual.payment_proof = payment_proof;
        Ok(())
    }

    /// Sender side of a two-party transaction, in two rounds.
    ///
    /// Round 1 (`user_agreement` zero) reserves the slot and returns our
    /// excess and nonce together with the agreement token. Repeating it
    /// returns the same answer. Round 2 takes the receiver's kernel and
    /// payment proof back with the token, checks both, and completes the
    /// signature with the slot nonce, which is then used up.
    pub fn send(
        &self,
        slots: &mut SlotPool,
        tx: &mut TxCommon,
        mutual: &TxMutualInfo,
        sender: &mut TxSenderParams,
    ) -> Result<(), Error> {
        let agg = self.aggregate(tx)?;
        let (amount, asset_id) = agg.check_send()?;
        let my_pub = identity_public(self.kdf, mutual.my_id_key)?;
        let peer_pk = decode_point(&CompressedRistretto(mutual.peer))?;

        let session = tx
            .hash_draft(Hasher::new(SEND_DOMAIN_TAG))
            .u32(sender.slot)
            .digest(&mutual.peer)
            .u64(mutual.my_id_key)
            .to_digest();
        let offset = self.kdf.keyed_scalar(b"offset", &session);
        let x = Zeroizing::new(agg.sk() - offset);
        let token = self.kdf.keyed_digest(b"agreement", &session);
        let own_excess = RistrettoPoint::mul_base(&x);
        let settled = on_generator(agg.fee(), NATIVE_ASSET) + on_generator(amount, asset_id);
        agg.check_balance(&own_excess, &offset, &settled)?;

        if sender.user_agreement == UintBig::default() {
            // a replay of round 1 was approved already
            if slots.state(sender.slot)? == SlotState::Fresh {
                self.ask(SpendRequest {
                    kind: SpendKind::Send,
                    amount,
                    asset_id,
                    peer: Some(mutual.peer),
                    fee: agg.fee(),
                })?;
            }
            slots.reserve(sender.slot, &session)?;

            let mut kernel = plain_kernel(&tx.kernel, &x);
            kernel.signature = Signature {
                nonce_pub: slots.read(sender.slot)?,
                k: Scalar::ZERO,
            };
            debug!(slot = sender.slot, "Send round 1");
            tx.kernel = kernel;
            tx.offset = offset;
            sender.user_agreement = token;
            return Ok(());
        }

        if !bool::from(sender.user_agreement[..].ct_eq(&token[..])) {
            return Err(Error::Proto(ProtoErrorKind::StaleSession));
        }
        let nonce = Zeroizing::new(slots.nonce(sender.slot, &session)?);
        let r_own = decode_point(&slots.read(sender.slot)?)?;

        let mut kernel = tx.kernel;
        kernel.nested = [0u8; 32];
        let x_peer = decode_point(&kernel.commitment)? - own_excess;
        let r_peer = decode_point(&kernel.signature.nonce_pub)? - r_own;
        let id = kernel.id();

        let e = Signature::challenge(&kernel.signature.nonce_pub, &id);
        if RistrettoPoint::mul_base(&kernel.signature.k) != r_peer + e * x_peer {
            return Err(Error::PeerSignature);
        }

        let msg = payment_proof_message(&id, &my_pub.compress().to_bytes(), amount, asset_id);
        if !mutual.payment_proof.verify(&msg, &peer_pk) {
            return Err(Error::PaymentProof);
        }

        kernel.signature.k += Signature::sign_partial(&id, &kernel.signature.nonce_pub, &x, &nonce);
        if !kernel.is_valid() {
            return Err(Error::SignatureCheck);
        }
        slots.consume(sender.slot, &session)?;

        debug!(slot = sender.slot, amount, asset_id, "Send round 2");
        tx.kernel = kernel;
        tx.offset = offset;
        Ok(())
    }

    /// Single-party send to a shielded output described by a voucher.
    ///
    /// The output commitment is derived from the voucher's shared secret and
    /// bound into the kernel's nested digest. Returns the output commitment.
    pub fn send_shielded(
        &self,
        tx: &mut TxCommon,
        params: &TxSendShieldedParams,
    ) -> Result<CompressedRistretto, Error> {
        if !params.range_proof.is_well_formed() {
            return Err(Error::InvalidParameter("range_proof"));
        }
        let receiver = decode_point(&CompressedRistretto(params.receiver))?;
        if !params.voucher.verify(&receiver) {
            return Err(Error::InvalidVoucher);
        }

        let agg = self.aggregate(tx)?;
        let (amount, asset_id) = agg.check_send()?;

        let to_self = params.my_id_key != 0
            && identity_public(self.kdf, params.my_id_key)? == receiver;
        self.ask(if to_self {
            SpendRequest {
                kind: SpendKind::SelfShielded,
                amount: 0,
                asset_id,
                peer: None,
                fee: agg.fee(),
            }
        } else {
            SpendRequest {
                kind: SpendKind::SendShielded,
                amount,
                asset_id,
                peer: Some(params.receiver),
                fee: agg.fee(),
            }
        })?;

        let shared = &params.voucher.shared_secret;
        let mut b_out = Zeroizing::new(
            Hasher::new(SHIELDED_OUTPUT_DOMAIN_TAG)
                .digest(shared)
                .point(&params.voucher.serial_pub)
                .to_scalar(),
        );
        if params.hide_asset_always || asset_id != NATIVE_ASSET {
            let asset_sk = Zeroizing::new(
                Hasher::new(SHIELDED_ASSET_DOMAIN_TAG)
                    .digest(shared)
                    .to_scalar(),
            );
            *b_out += Scalar::from(amount) * *asset_sk;
        }
        let h = GeneratorCache::default().get(asset_id);
        let output_point = commit(&b_out, amount, &h);
        let output = output_point.compress();

        let nested = Hasher::new(SHIELDED_NESTED_DOMAIN_TAG)
            .point(&params.voucher.serial_pub)
            .point(&output)
            .bytes(&params.range_proof.to_bytes())
            .digest(&params.sender)
            .digest(&params.message[0])
            .digest(&params.message[1])
            .u8(params.hide_asset_always as u8)
            .digest(&params.receiver)
            .to_digest();

        let digest = tx
            .hash_draft(Hasher::new(SEND_SHIELDED_DOMAIN_TAG))
            .digest(&nested)
            .to_digest();
        let offset = self.kdf.keyed_scalar(b"offset", &digest);
        let x = Zeroizing::new(agg.sk() + *b_out - offset);
        let nonce = Zeroizing::new(self.kdf.keyed_scalar(b"nonce", &digest));

        let mut kernel = plain_kernel(&tx.kernel, &x);
        kernel.nested = nested;
        kernel.signature = Signature::sign(&kernel.id(), &x, &nonce);
        let settled = on_generator(agg.fee(), NATIVE_ASSET) + output_point;
        finish(tx, &agg, kernel, offset, &settled)?;

        debug!(amount, asset_id, to_self, "Signed shielded send");
        Ok(output)
    }
}

fn plain_kernel(draft: &TxKernel, x: &Scalar) -> TxKernel {
    TxKernel {
        commitment: RistrettoPoint::mul_base(x).compress(),
        nested: [0u8; 32],
        ..*draft
    }
}

fn on_generator(value: Amount, asset_id: AssetId) -> RistrettoPoint {
    Scalar::from(value) * asset_generator(asset_id)
}

// Nothing is written back unless the kernel balances the draft and its
// signature verifies.
fn finish(
    tx: &mut TxCommon,
    agg: &TxAggregate,
    kernel: TxKernel,
    offset: Scalar,
    settled: &RistrettoPoint,
) -> Result<(), Error> {
    agg.check_balance(&decode_point(&kernel.commitment)?, &offset, settled)?;
    if !kernel.is_valid() {
        return Err(Error::SignatureCheck);
    }
    tx.kernel = kernel;
    tx.offset = offset;
    Ok(())
}
