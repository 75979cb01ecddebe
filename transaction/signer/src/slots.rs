// Copyright (c) 2018-2025 The Botho Foundation

//! Nonce slot pool.
//!
//! Each slot holds one secret nonce for a two-round signing session. A slot
//! moves `Fresh -> Reserved(session) -> Used`; only [`SlotPool::regenerate`]
//! brings it back to `Fresh`. A reserved slot can only be finished by the
//! session that reserved it, and a used slot never signs again, so a nonce
//! never ends up in two completed signatures.

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use bth_keykeeper_types::{ProtoErrorKind, UintBig};

use crate::Error;

/// Observable state of a slot
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotState {
    /// Not yet bound to a session
    Fresh,
    /// Bound to the session with this digest
    Reserved(UintBig),
    /// Consumed by a completed signature
    Used,
}

#[derive(Zeroize)]
#[zeroize(drop)]
struct Slot {
    nonce: Scalar,
    #[zeroize(skip)]
    nonce_pub: CompressedRistretto,
    #[zeroize(skip)]
    state: SlotState,
}

impl Slot {
    fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let nonce = Scalar::random(rng);
        Self {
            nonce_pub: RistrettoPoint::mul_base(&nonce).compress(),
            nonce,
            state: SlotState::Fresh,
        }
    }

    fn is_reserved_by(&self, session: &UintBig) -> bool {
        match &self.state {
            SlotState::Reserved(owner) => bool::from(owner[..].ct_eq(&session[..])),
            _ => false,
        }
    }
}

/// Fixed-size pool of single-use signing nonces
pub struct SlotPool {
    slots: Vec<Slot>,
}

impl SlotPool {
    /// Generate `count` fresh slots
    pub fn new<R: RngCore + CryptoRng>(count: u32, rng: &mut R) -> Self {
        Self {
            slots: (0..count).map(|_| Slot::generate(rng)).collect(),
        }
    }

    /// Number of slots
    pub fn len(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Whether the pool has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, index: u32) -> Result<&Slot, Error> {
        self.slots
            .get(index as usize)
            .ok_or(Error::Proto(ProtoErrorKind::SlotOutOfRange))
    }

    fn slot_mut(&mut self, index: u32) -> Result<&mut Slot, Error> {
        self.slots
            .get_mut(index as usize)
            .ok_or(Error::Proto(ProtoErrorKind::SlotOutOfRange))
    }

    /// Public projection `nonce·G` of slot `index`. Stable until the slot is
    /// regenerated, whatever its state.
    pub fn read(&self, index: u32) -> Result<CompressedRistretto, Error> {
        Ok(self.slot(index)?.nonce_pub)
    }

    /// Observable state of slot `index`
    pub fn state(&self, index: u32) -> Result<SlotState, Error> {
        Ok(self.slot(index)?.state)
    }

    /// Replace slot `index` with a fresh nonce, abandoning any session bound
    /// to the old one. Returns the new projection.
    pub fn regenerate<R: RngCore + CryptoRng>(
        &mut self,
        index: u32,
        rng: &mut R,
    ) -> Result<CompressedRistretto, Error> {
        let slot = self.slot_mut(index)?;
        // the old slot is zeroized on drop
        *slot = Slot::generate(rng);
        Ok(slot.nonce_pub)
    }

    /// Bind slot `index` to `session`. Reserving again for the same session
    /// is a no-op.
    pub fn reserve(&mut self, index: u32, session: &UintBig) -> Result<(), Error> {
        let slot = self.slot_mut(index)?;
        match slot.state {
            SlotState::Fresh => {
                slot.state = SlotState::Reserved(*session);
                Ok(())
            }
            SlotState::Reserved(_) if slot.is_reserved_by(session) => Ok(()),
            SlotState::Reserved(_) => Err(Error::Proto(ProtoErrorKind::SlotBusy)),
            SlotState::Used => Err(Error::Proto(ProtoErrorKind::SlotUsed)),
        }
    }

    /// Secret nonce of slot `index`, available only to the session that
    /// reserved it
    pub(crate) fn nonce(&self, index: u32, session: &UintBig) -> Result<Scalar, Error> {
        let slot = self.slot(index)?;
        match slot.state {
            SlotState::Reserved(_) if slot.is_reserved_by(session) => Ok(slot.nonce),
            SlotState::Reserved(_) => Err(Error::Proto(ProtoErrorKind::SlotBusy)),
            SlotState::Used => Err(Error::Proto(ProtoErrorKind::SlotUsed)),
            // regenerated after the first round
            SlotState::Fresh => Err(Error::Proto(ProtoErrorKind::StaleSession)),
        }
    }

    /// Mark slot `index` used by the completed signature of `session`
    pub(crate) fn consume(&mut self, index: u32, session: &UintBig) -> Result<(), Error> {
        self.nonce(index, session)?;
        let slot = self.slot_mut(index)?;
        slot.nonce.zeroize();
        slot.state = SlotState::Used;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::SeedableRng;
    use rand_hc::Hc128Rng;

    fn pool(count: u32) -> (SlotPool, Hc128Rng) {
        let mut rng = Hc128Rng::from_seed([7u8; 32]);
        (SlotPool::new(count, &mut rng), rng)
    }

    #[test]
    fn read_is_stable_until_regenerated() {
        let (mut pool, mut rng) = pool(4);
        let first = pool.read(2).unwrap();
        assert_eq!(pool.read(2).unwrap(), first);

        let fresh = pool.regenerate(2, &mut rng).unwrap();
        assert_ne!(fresh, first);
        assert_eq!(pool.read(2).unwrap(), fresh);
    }

    #[test]
    fn slots_are_independent() {
        let (pool, _) = pool(8);
        for i in 0..8 {
            for j in (i + 1)..8 {
                assert_ne!(pool.read(i).unwrap(), pool.read(j).unwrap());
            }
        }
    }

    #[test]
    fn out_of_range() {
        let (mut pool, mut rng) = pool(2);
        let err = Err(Error::Proto(ProtoErrorKind::SlotOutOfRange));
        assert_eq!(pool.read(2), err);
        assert_eq!(pool.regenerate(2, &mut rng), err);
        assert_eq!(pool.reserve(2, &[0u8; 32]), Err(Error::Proto(ProtoErrorKind::SlotOutOfRange)));
    }

    #[test]
    fn reservation_lifecycle() {
        let (mut pool, mut rng) = pool(1);
        let a = [1u8; 32];
        let b = [2u8; 32];

        pool.reserve(0, &a).unwrap();
        // replay of the same session
        pool.reserve(0, &a).unwrap();
        assert_eq!(pool.state(0).unwrap(), SlotState::Reserved(a));
        assert_eq!(
            pool.reserve(0, &b),
            Err(Error::Proto(ProtoErrorKind::SlotBusy))
        );
        assert_eq!(
            pool.nonce(0, &b),
            Err(Error::Proto(ProtoErrorKind::SlotBusy))
        );

        let projection = pool.read(0).unwrap();
        assert_eq!(
            RistrettoPoint::mul_base(&pool.nonce(0, &a).unwrap()).compress(),
            projection
        );

        pool.consume(0, &a).unwrap();
        assert_eq!(pool.state(0).unwrap(), SlotState::Used);
        assert_eq!(pool.read(0).unwrap(), projection);
        assert_eq!(
            pool.reserve(0, &a),
            Err(Error::Proto(ProtoErrorKind::SlotUsed))
        );
        assert_eq!(
            pool.consume(0, &a),
            Err(Error::Proto(ProtoErrorKind::SlotUsed))
        );

        pool.regenerate(0, &mut rng).unwrap();
        assert_eq!(pool.state(0).unwrap(), SlotState::Fresh);
        pool.reserve(0, &b).unwrap();
    }

    #[test]
    fn regenerate_abandons_a_session() {
        let (mut pool, mut rng) = pool(1);
        let a = [1u8; 32];
        pool.reserve(0, &a).unwrap();
        pool.regenerate(0, &mut rng).unwrap();
        assert_eq!(
            pool.nonce(0, &a),
            Err(Error::Proto(ProtoErrorKind::StaleSession))
        );
    }
}
