// Copyright (c) 2018-2025 The Botho Foundation

//! The key keeper: owns the master Kdf and the nonce slots, and exposes the
//! typed operations behind the binary protocol.

use bth_keykeeper_core::{GeneratorCache, Kdf, KdfPub, Path};
use bth_keykeeper_types::{UintBig, WalletIdentity};
use curve25519_dalek::ristretto::CompressedRistretto;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, info};

use crate::{
    config::KeyKeeperConfig,
    confirm::UserConfirmation,
    protocol::PROTO_VERSION,
    shielded,
    sign::{identity_public, SignContext},
    slots::{SlotPool, SlotState},
    tx::{
        CreateOutputRequest, CreateOutputResponse, CreateShieldedInputRequest,
        CreateShieldedInputResponse, ShieldedVoucher, TxCommon, TxMutualInfo,
        TxSendShieldedParams, TxSenderParams,
    },
    Error,
};

/// An isolated signer.
///
/// The master secret never leaves it; the host only sees public keys,
/// signed kernels and proof shares.
pub struct KeyKeeper<C, R> {
    kdf: Kdf,
    slots: SlotPool,
    config: KeyKeeperConfig,
    confirm: C,
    rng: R,
}

impl<C: UserConfirmation, R: RngCore + CryptoRng> KeyKeeper<C, R> {
    /// Create a key keeper over `kdf`, generating its nonce slots from `rng`
    pub fn new(kdf: Kdf, config: KeyKeeperConfig, confirm: C, mut rng: R) -> Result<Self, Error> {
        config.validate()?;
        let slots = SlotPool::new(config.num_slots, &mut rng);
        info!(
            num_slots = config.num_slots,
            allow_weak_inputs = config.allow_weak_inputs,
            "Key keeper ready"
        );
        Ok(Self {
            kdf,
            slots,
            config,
            confirm,
            rng,
        })
    }

    fn context(&self) -> SignContext<'_, C> {
        SignContext {
            kdf: &self.kdf,
            config: &self.config,
            confirm: &self.confirm,
        }
    }

    /// The spend confirmation policy
    pub fn confirmation(&self) -> &C {
        &self.confirm
    }

    /// Protocol version
    pub fn version(&self) -> u32 {
        PROTO_VERSION
    }

    /// Public key pair behind `path`
    pub fn derive_public(&self, path: &Path) -> Result<KdfPub, Error> {
        Ok(self.kdf.derive_public(path)?)
    }

    /// Public key of wallet identity `id`
    pub fn identity_public(&self, id: WalletIdentity) -> Result<CompressedRistretto, Error> {
        Ok(identity_public(&self.kdf, id)?.compress())
    }

    /// Number of nonce slots
    pub fn num_slots(&self) -> u32 {
        self.slots.len()
    }

    /// Public projection of slot `index`
    pub fn read_slot(&self, index: u32) -> Result<CompressedRistretto, Error> {
        self.slots.read(index)
    }

    /// State of slot `index`
    pub fn slot_state(&self, index: u32) -> Result<SlotState, Error> {
        self.slots.state(index)
    }

    /// Replace slot `index` with a fresh nonce
    pub fn regenerate_slot(&mut self, index: u32) -> Result<CompressedRistretto, Error> {
        debug!(slot = index, "Regenerating slot");
        self.slots.regenerate(index, &mut self.rng)
    }

    /// Range proof blinding share of an output
    pub fn create_output(&self, req: &CreateOutputRequest) -> Result<CreateOutputResponse, Error> {
        shielded::create_output(&self.kdf, req, &mut GeneratorCache::default())
    }

    /// Spend proof share of a shielded input
    pub fn create_shielded_input(
        &self,
        req: &CreateShieldedInputRequest,
    ) -> Result<CreateShieldedInputResponse, Error> {
        shielded::create_shielded_input(&self.kdf, req, &mut GeneratorCache::default())
    }

    /// `count` vouchers for identity `id` derived from `nonce0`
    pub fn create_shielded_vouchers(
        &self,
        id: WalletIdentity,
        nonce0: &UintBig,
        count: u32,
    ) -> Result<Vec<ShieldedVoucher>, Error> {
        shielded::create_vouchers(&self.kdf, id, nonce0, count)
    }

    /// Sign a fee-only transaction
    pub fn sign_split(&self, tx: &mut TxCommon) -> Result<(), Error> {
        self.context().split(tx)
    }

    /// Sign the receiver side of a two-party transaction
    pub fn sign_receive(&self, tx: &mut TxCommon, mutual: &mut TxMutualInfo) -> Result<(), Error> {
        self.context().receive(tx, mutual)
    }

    /// Run one round of the sender side of a two-party transaction
    pub fn sign_send(
        &mut self,
        tx: &mut TxCommon,
        mutual: &TxMutualInfo,
        sender: &mut TxSenderParams,
    ) -> Result<(), Error> {
        let ctx = SignContext {
            kdf: &self.kdf,
            config: &self.config,
            confirm: &self.confirm,
        };
        ctx.send(&mut self.slots, tx, mutual, sender)
    }

    /// Sign a send to a shielded output. Returns the output commitment.
    pub fn sign_send_shielded(
        &self,
        tx: &mut TxCommon,
        params: &TxSendShieldedParams,
    ) -> Result<CompressedRistretto, Error> {
        self.context().send_shielded(tx, params)
    }
}
