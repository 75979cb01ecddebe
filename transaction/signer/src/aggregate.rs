// Copyright (c) 2018-2025 The Botho Foundation

//! Transaction balance aggregation.
//!
//! Sums the blinding factors and commitments of a draft (outputs minus
//! inputs minus shielded inputs) and tracks how much of each asset leaves or
//! enters the wallet. The value checks run before anything is signed, the
//! balance check once the kernel excess and offset are known.

use std::collections::BTreeMap;

use bth_keykeeper_core::{commit, GeneratorCache, Kdf};
use bth_keykeeper_types::{Amount, AssetId, CoinId, KeyScheme, NATIVE_ASSET};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};
use zeroize::Zeroize;

use crate::{shielded::shielded_input_key, tx::TxCommon, Error};

#[derive(Clone, Copy, Debug, Default)]
struct AssetFlow {
    spent: Amount,
    received: Amount,
}

/// Aggregated blinding factor and value flow of a draft
pub(crate) struct TxAggregate {
    sk: Scalar,
    commitments: RistrettoPoint,
    flows: BTreeMap<AssetId, AssetFlow>,
    fee: Amount,
}

impl Drop for TxAggregate {
    fn drop(&mut self) {
        self.sk.zeroize();
    }
}

impl TxAggregate {
    /// Aggregate `tx`. Legacy-scheme inputs are refused unless
    /// `allow_weak_inputs` is set; legacy-scheme outputs are always refused.
    pub fn new(
        kdf: &Kdf,
        tx: &TxCommon,
        allow_weak_inputs: bool,
        gens: &mut GeneratorCache,
    ) -> Result<Self, Error> {
        let mut agg = Self {
            sk: Scalar::ZERO,
            commitments: RistrettoPoint::identity(),
            flows: BTreeMap::new(),
            fee: tx.total_fee().ok_or(Error::Overflow)?,
        };

        for cid in &tx.outs {
            if cid.scheme() == Some(KeyScheme::Legacy) {
                return Err(Error::WeakOutput);
            }
            let (mut sk, c) = coin(kdf, cid, gens)?;
            agg.sk += sk;
            sk.zeroize();
            agg.commitments += c;
            agg.receive(cid.asset_id, cid.value)?;
        }

        for cid in &tx.ins {
            if cid.scheme() == Some(KeyScheme::Legacy) && !allow_weak_inputs {
                return Err(Error::WeakInput);
            }
            let (mut sk, c) = coin(kdf, cid, gens)?;
            agg.sk -= sk;
            sk.zeroize();
            agg.commitments -= c;
            agg.spend(cid.asset_id, cid.value)?;
        }

        for inp in &tx.ins_shielded {
            let h = gens.get(inp.txo.asset_id);
            let mut sk = shielded_input_key(kdf, &inp.txo);
            agg.sk -= sk;
            agg.commitments -= commit(&sk, inp.txo.amount, &h);
            sk.zeroize();
            agg.spend(inp.txo.asset_id, inp.txo.amount)?;
        }

        Ok(agg)
    }

    /// Aggregated blinding factor
    pub fn sk(&self) -> &Scalar {
        &self.sk
    }

    /// Total fee of the draft
    pub fn fee(&self) -> Amount {
        self.fee
    }

    fn spend(&mut self, asset_id: AssetId, value: Amount) -> Result<(), Error> {
        let flow = self.flows.entry(asset_id).or_default();
        flow.spent = flow.spent.checked_add(value).ok_or(Error::Overflow)?;
        Ok(())
    }

    fn receive(&mut self, asset_id: AssetId, value: Amount) -> Result<(), Error> {
        let flow = self.flows.entry(asset_id).or_default();
        flow.received = flow.received.checked_add(value).ok_or(Error::Overflow)?;
        Ok(())
    }

    /// Balance of a signed draft: the commitments of its coins plus `extra`
    /// must equal `excess + offset·G`. `extra` is whatever the signer
    /// settles beyond the draft's own coins, such as the fee it pays.
    pub fn check_balance(
        &self,
        excess: &RistrettoPoint,
        offset: &Scalar,
        extra: &RistrettoPoint,
    ) -> Result<(), Error> {
        if self.commitments + extra != excess + RistrettoPoint::mul_base(offset) {
            return Err(Error::Unbalanced);
        }
        Ok(())
    }

    /// Net amount leaving the wallet per asset, the native asset included
    /// even when the draft does not touch it. With `with_fee` the total fee
    /// is deducted from the native asset.
    fn nets(&self, with_fee: bool) -> impl Iterator<Item = (AssetId, i128)> + '_ {
        let native = (!self.flows.contains_key(&NATIVE_ASSET))
            .then_some((NATIVE_ASSET, AssetFlow::default()));
        self.flows
            .iter()
            .map(|(asset_id, flow)| (*asset_id, *flow))
            .chain(native)
            .map(move |(asset_id, flow)| {
                let mut net = flow.spent as i128 - flow.received as i128;
                if with_fee && asset_id == NATIVE_ASSET {
                    net -= self.fee as i128;
                }
                (asset_id, net)
            })
    }

    /// Split: no asset moves, except that the native asset pays either the
    /// whole fee or nothing. Returns the fee paid.
    pub fn check_split(&self) -> Result<Amount, Error> {
        let mut paid = 0;
        for (asset_id, net) in self.nets(false) {
            match net {
                0 => {}
                net if asset_id == NATIVE_ASSET && net == self.fee as i128 => paid = self.fee,
                _ => return Err(Error::ValuePolicy),
            }
        }
        Ok(paid)
    }

    /// Receive: nothing leaves and exactly one asset comes in. Returns the
    /// received amount and asset.
    pub fn check_receive(&self) -> Result<(Amount, AssetId), Error> {
        let mut received = None;
        for (asset_id, net) in self.nets(false) {
            if net > 0 {
                return Err(Error::ValuePolicy);
            }
            if net < 0 {
                if received.is_some() {
                    return Err(Error::ValuePolicy);
                }
                received = Some(((-net) as Amount, asset_id));
            }
        }
        received.ok_or(Error::ValuePolicy)
    }

    /// Send: the fee is covered and exactly one asset leaves beyond it.
    /// Returns the sent amount and asset.
    pub fn check_send(&self) -> Result<(Amount, AssetId), Error> {
        let mut sent = None;
        for (asset_id, net) in self.nets(true) {
            if net < 0 {
                return Err(Error::ValuePolicy);
            }
            if net > 0 {
                if sent.is_some() {
                    return Err(Error::ValuePolicy);
                }
                sent = Some((net as Amount, asset_id));
            }
        }
        sent.ok_or(Error::ValuePolicy)
    }
}

fn coin(
    kdf: &Kdf,
    cid: &CoinId,
    gens: &mut GeneratorCache,
) -> Result<(Scalar, RistrettoPoint), Error> {
    let h = gens.get(cid.asset_id);
    let sk = kdf.coin_key(cid, &h)?;
    let c = commit(&sk, cid.value, &h);
    Ok((sk, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bth_keykeeper_types::{ShieldedInput, ShieldedTxoId, KEY_TYPE_CHANGE, KEY_TYPE_REGULAR};

    fn kdf() -> Kdf {
        Kdf::from_seed(&[3u8; 32]).unwrap()
    }

    fn coin_of(key_index: u64, value: Amount, asset_id: AssetId) -> CoinId {
        CoinId::new(key_index, KEY_TYPE_REGULAR, value, asset_id)
    }

    fn draft(ins: &[CoinId], outs: &[CoinId], fee: Amount) -> TxCommon {
        let mut tx = TxCommon {
            ins: ins.to_vec(),
            outs: outs.to_vec(),
            ..Default::default()
        };
        tx.kernel.fee = fee;
        tx
    }

    fn aggregate(tx: &TxCommon) -> Result<TxAggregate, Error> {
        TxAggregate::new(&kdf(), tx, false, &mut GeneratorCache::default())
    }

    #[test]
    fn blinding_sum_is_outputs_minus_inputs() {
        let kdf = kdf();
        let mut gens = GeneratorCache::default();
        let a = coin_of(1, 70, 0);
        let b = coin_of(2, 60, 0);
        let tx = draft(&[a], &[b], 10);

        let agg = TxAggregate::new(&kdf, &tx, false, &mut gens).unwrap();
        let h = gens.get(0);
        let expected = kdf.coin_key(&b, &h).unwrap() - kdf.coin_key(&a, &h).unwrap();
        assert_eq!(*agg.sk(), expected);
    }

    #[test]
    fn split_pays_the_whole_fee_or_none() {
        assert_eq!(aggregate(&draft(&[], &[], 100)).unwrap().check_split(), Ok(0));

        let balanced = draft(&[coin_of(1, 500, 0)], &[coin_of(2, 400, 0)], 100);
        assert_eq!(aggregate(&balanced).unwrap().check_split(), Ok(100));

        let moved = draft(&[coin_of(1, 500, 0)], &[coin_of(2, 500, 0)], 100);
        assert_eq!(aggregate(&moved).unwrap().check_split(), Ok(0));

        for out in [399, 401, 501] {
            let off = draft(&[coin_of(1, 500, 0)], &[coin_of(2, out, 0)], 100);
            assert_eq!(
                aggregate(&off).unwrap().check_split(),
                Err(Error::ValuePolicy),
                "{}",
                out
            );
        }

        let other_asset = draft(&[coin_of(1, 5, 7)], &[], 0);
        assert_eq!(
            aggregate(&other_asset).unwrap().check_split(),
            Err(Error::ValuePolicy)
        );
    }

    #[test]
    fn balance_against_the_kernel() {
        let kdf = kdf();
        let mut gens = GeneratorCache::default();
        let tx = draft(&[coin_of(1, 500, 0)], &[coin_of(2, 400, 0)], 100);
        let agg = TxAggregate::new(&kdf, &tx, false, &mut gens).unwrap();

        let offset = Scalar::from(77u64);
        let excess = RistrettoPoint::mul_base(&(agg.sk() - offset));
        let fee = Scalar::from(100u64) * gens.get(0);
        assert_eq!(agg.check_balance(&excess, &offset, &fee), Ok(()));

        assert_eq!(
            agg.check_balance(&excess, &Scalar::from(78u64), &fee),
            Err(Error::Unbalanced)
        );
        let short_fee = Scalar::from(99u64) * gens.get(0);
        assert_eq!(
            agg.check_balance(&excess, &offset, &short_fee),
            Err(Error::Unbalanced)
        );
        // same value under another asset's generator
        let wrong_asset = Scalar::from(100u64) * gens.get(5);
        assert_eq!(
            agg.check_balance(&excess, &offset, &wrong_asset),
            Err(Error::Unbalanced)
        );
    }

    #[test]
    fn receive_needs_exactly_one_incoming_asset() {
        let single = draft(&[coin_of(1, 10, 3)], &[coin_of(2, 15, 3)], 100);
        assert_eq!(aggregate(&single).unwrap().check_receive(), Ok((5, 3)));

        let nothing = draft(&[], &[], 100);
        assert_eq!(
            aggregate(&nothing).unwrap().check_receive(),
            Err(Error::ValuePolicy)
        );

        let two = draft(&[], &[coin_of(1, 1, 0), coin_of(2, 1, 4)], 0);
        assert_eq!(
            aggregate(&two).unwrap().check_receive(),
            Err(Error::ValuePolicy)
        );

        let leaking = draft(&[coin_of(1, 10, 0)], &[coin_of(2, 5, 3)], 0);
        assert_eq!(
            aggregate(&leaking).unwrap().check_receive(),
            Err(Error::ValuePolicy)
        );
    }

    #[test]
    fn send_derives_amount_and_asset() {
        let native = draft(
            &[coin_of(1, 1000, 0)],
            &[CoinId::new(2, KEY_TYPE_CHANGE, 300, 0)],
            100,
        );
        assert_eq!(aggregate(&native).unwrap().check_send(), Ok((600, 0)));

        let token = draft(
            &[coin_of(1, 50, 9), coin_of(2, 100, 0)],
            &[coin_of(3, 20, 9)],
            100,
        );
        assert_eq!(aggregate(&token).unwrap().check_send(), Ok((30, 9)));

        // fee not covered
        let short = draft(&[coin_of(1, 50, 9)], &[], 100);
        assert_eq!(
            aggregate(&short).unwrap().check_send(),
            Err(Error::ValuePolicy)
        );

        // nothing sent beyond the fee
        let fee_only = draft(&[coin_of(1, 100, 0)], &[], 100);
        assert_eq!(
            aggregate(&fee_only).unwrap().check_send(),
            Err(Error::ValuePolicy)
        );
    }

    #[test]
    fn shielded_inputs_count_as_spent_and_pay_their_fee() {
        let mut tx = draft(&[], &[coin_of(1, 90, 0)], 0);
        tx.ins_shielded.push(ShieldedInput {
            txo: ShieldedTxoId {
                k_ser_g: [4u8; 32],
                amount: 100,
                ..Default::default()
            },
            fee: 10,
        });
        let agg = aggregate(&tx).unwrap();
        assert_eq!(agg.check_split(), Ok(10));
        assert_eq!(agg.check_send(), Err(Error::ValuePolicy));
    }

    #[test]
    fn weak_coins() {
        let legacy = coin_of(1, 10, 0).with_scheme(KeyScheme::Legacy);
        assert!(matches!(
            aggregate(&draft(&[legacy], &[], 10)),
            Err(Error::WeakInput)
        ));
        assert!(TxAggregate::new(
            &kdf(),
            &draft(&[legacy], &[], 10),
            true,
            &mut GeneratorCache::default()
        )
        .is_ok());
        assert!(matches!(
            aggregate(&draft(&[], &[legacy], 0)),
            Err(Error::WeakOutput)
        ));
    }

    #[test]
    fn overflow_is_detected() {
        let tx = draft(&[], &[coin_of(1, u64::MAX, 0), coin_of(2, 1, 0)], 0);
        assert!(matches!(aggregate(&tx), Err(Error::Overflow)));

        let mut tx = draft(&[], &[], u64::MAX);
        tx.ins_shielded.push(ShieldedInput {
            fee: 1,
            ..Default::default()
        });
        assert!(matches!(aggregate(&tx), Err(Error::Overflow)));
    }
}
