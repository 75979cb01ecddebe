//! Helpers shared by the key keeper integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use bth_keykeeper::{
    KeyKeeper, KeyKeeperConfig, SpendRequest, TxCommon, UserConfirmation,
};
use bth_keykeeper_core::{asset_generator, commit, Kdf};
use bth_keykeeper_types::{Amount, CoinId, KEY_TYPE_CHANGE, KEY_TYPE_REGULAR, NATIVE_ASSET};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};
use rand_core::SeedableRng;
use rand_hc::Hc128Rng;

/// Records every spend it is asked about and answers with a fixed verdict
#[derive(Default)]
pub struct Recorder {
    pub reject: bool,
    pub seen: RefCell<Vec<SpendRequest>>,
}

impl Recorder {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }
}

impl UserConfirmation for Recorder {
    fn confirm_spend(&self, request: &SpendRequest) -> bool {
        self.seen.borrow_mut().push(*request);
        !self.reject
    }
}

pub type TestKeeper<C> = KeyKeeper<C, Hc128Rng>;

pub fn kdf(seed: u8) -> Kdf {
    Kdf::from_seed(&[seed; 32]).unwrap()
}

pub fn keeper_with<C: UserConfirmation>(seed: u8, num_slots: u32, confirm: C) -> TestKeeper<C> {
    KeyKeeper::new(
        kdf(seed),
        KeyKeeperConfig {
            num_slots,
            ..Default::default()
        },
        confirm,
        Hc128Rng::from_seed([seed.wrapping_add(100); 32]),
    )
    .unwrap()
}

pub fn coin(key_index: u64, value: Amount) -> CoinId {
    CoinId::new(key_index, KEY_TYPE_REGULAR, value, NATIVE_ASSET)
}

pub fn change(key_index: u64, value: Amount) -> CoinId {
    CoinId::new(key_index, KEY_TYPE_CHANGE, value, NATIVE_ASSET)
}

/// Commitment of `cid` as the chain would see it
pub fn coin_commitment(kdf: &Kdf, cid: &CoinId) -> RistrettoPoint {
    let h = asset_generator(cid.asset_id);
    commit(&kdf.coin_key(cid, &h).unwrap(), cid.value, &h)
}

/// Outputs minus inputs of `tx`, all coins owned by `kdf`
pub fn net_commitment(kdf: &Kdf, tx: &TxCommon) -> RistrettoPoint {
    let mut sum = RistrettoPoint::identity();
    for cid in &tx.outs {
        sum += coin_commitment(kdf, cid);
    }
    for cid in &tx.ins {
        sum -= coin_commitment(kdf, cid);
    }
    sum
}

/// Check the balance equation of a finished transaction: outputs minus
/// inputs plus the fee equals the kernel excess plus the offsets
pub fn assert_balanced(net: RistrettoPoint, tx: &TxCommon, offsets: Scalar) {
    let excess = tx.kernel.commitment.decompress().unwrap();
    let fee = Scalar::from(tx.kernel.fee) * asset_generator(NATIVE_ASSET);
    assert_eq!(net + fee, excess + RistrettoPoint::mul_base(&offsets));
}

pub fn draft(ins: Vec<CoinId>, outs: Vec<CoinId>, fee: Amount) -> TxCommon {
    let mut tx = TxCommon {
        ins,
        outs,
        ..Default::default()
    };
    tx.kernel.fee = fee;
    tx.kernel.h_min = 10;
    tx.kernel.h_max = 100;
    tx
}
