// Copyright (c) 2018-2025 The Botho Foundation

//! Fixed generators and Pedersen commitments

use alloc::collections::BTreeMap;
use curve25519_dalek::{constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint, scalar::Scalar};

use crate::{
    consts::{ASSET_GENERATOR_DOMAIN_TAG, COFACTOR_GENERATOR_DOMAIN_TAG, VALUE_GENERATOR_DOMAIN_TAG},
    hash::Hasher,
    types::{Amount, AssetId, NATIVE_ASSET},
};

/// G, the blinding generator
pub fn blinding_generator() -> RistrettoPoint {
    RISTRETTO_BASEPOINT_POINT
}

/// H, the value generator of the native asset
pub fn value_generator() -> RistrettoPoint {
    Hasher::new(VALUE_GENERATOR_DOMAIN_TAG).to_point()
}

/// J, the co-factor generator used by switch commitments and ticket serials
pub fn cofactor_generator() -> RistrettoPoint {
    Hasher::new(COFACTOR_GENERATOR_DOMAIN_TAG).to_point()
}

/// Value generator of `asset_id`, H itself for the native asset
pub fn asset_generator(asset_id: AssetId) -> RistrettoPoint {
    if asset_id == NATIVE_ASSET {
        return value_generator();
    }
    Hasher::new(ASSET_GENERATOR_DOMAIN_TAG)
        .u32(asset_id)
        .to_point()
}

/// Pedersen commitment `blinding·G + value·h`
pub fn commit(blinding: &Scalar, value: Amount, h: &RistrettoPoint) -> RistrettoPoint {
    RistrettoPoint::mul_base(blinding) + Scalar::from(value) * h
}

/// Caches the value generator of each asset seen while processing a single
/// request. Not constant-time; asset ids are public.
#[derive(Default, Clone)]
pub struct GeneratorCache {
    cache: BTreeMap<AssetId, RistrettoPoint>,
}

impl GeneratorCache {
    /// Get (and if necessary, cache) the value generator of `asset_id`
    pub fn get(&mut self, asset_id: AssetId) -> RistrettoPoint {
        *self
            .cache
            .entry(asset_id)
            .or_insert_with(|| asset_generator(asset_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn generators_are_independent() {
        let g = blinding_generator();
        let h = value_generator();
        let j = cofactor_generator();
        assert_ne!(g, h);
        assert_ne!(g, j);
        assert_ne!(h, j);
        assert_ne!(asset_generator(1), asset_generator(2));
        assert_ne!(asset_generator(1), h);
        assert_eq!(asset_generator(NATIVE_ASSET), h);
    }

    #[test]
    fn cache_matches_direct_derivation() {
        let mut cache = GeneratorCache::default();
        for asset in [0u32, 7, 7, 99] {
            assert_eq!(cache.get(asset), asset_generator(asset));
        }
    }

    #[test]
    fn commitments_are_homomorphic() {
        let h = asset_generator(3);
        let a = Scalar::random(&mut OsRng);
        let b = Scalar::random(&mut OsRng);
        assert_eq!(
            commit(&a, 40, &h) + commit(&b, 2, &h),
            commit(&(a + b), 42, &h)
        );
    }
}
