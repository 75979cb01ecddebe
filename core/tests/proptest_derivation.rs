//! Property-based tests for owner key derivation.
//!
//! Derivation must be a pure function of (master seed, path), and the path
//! encoding must be injective: distinct paths never yield the same key.

use bth_keykeeper_core::{types::CoinId, Kdf, Path};
use proptest::prelude::*;
use std::collections::HashSet;

fn path_strategy() -> impl Strategy<Value = Path> {
    let coin = (
        any::<u64>(),
        any::<u32>(),
        0u32..=0x00ff_ffff,
        0u32..2,
        any::<u64>(),
        0u32..4,
    )
        .prop_map(|(key_index, key_type, child, scheme, value, asset_id)| {
            Path::Coin(CoinId {
                key_index,
                key_type,
                sub_index: child | (scheme << 24),
                value,
                asset_id,
            })
        });

    prop_oneof![
        Just(Path::Root),
        any::<u32>().prop_map(Path::Child),
        coin,
    ]
}

proptest! {
    /// Property: the same path always yields the same public keys.
    #[test]
    fn prop_derivation_deterministic(
        seed in prop::array::uniform32(any::<u8>()),
        path in path_strategy(),
    ) {
        let kdf = Kdf::from_seed(&seed).unwrap();
        let again = Kdf::from_seed(&seed).unwrap();

        prop_assert_eq!(
            kdf.derive_public(&path).unwrap(),
            again.derive_public(&path).unwrap(),
            "same seed and path must give identical keys"
        );
    }

    /// Property: the canonical path encoding parses back to the same path.
    #[test]
    fn prop_path_encoding_parses_back(path in path_strategy()) {
        prop_assert_eq!(Path::from_bytes(&path.to_bytes()).unwrap(), path);
    }

    /// Property: two distinct paths never collide.
    #[test]
    fn prop_distinct_paths_distinct_keys(
        p1 in path_strategy(),
        p2 in path_strategy(),
    ) {
        prop_assume!(p1 != p2);
        let kdf = Kdf::from_seed(&[0x5a; 32]).unwrap();

        prop_assert_ne!(p1.to_bytes(), p2.to_bytes());
        prop_assert_ne!(
            kdf.derive_public(&p1).unwrap(),
            kdf.derive_public(&p2).unwrap()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Property: a batch of at least 100 random paths yields as many distinct
    /// keys as it has distinct paths, and re-deriving the batch reproduces it.
    #[test]
    fn prop_batch_of_paths(
        seed in prop::array::uniform32(any::<u8>()),
        paths in prop::collection::vec(path_strategy(), 100..128),
    ) {
        let kdf = Kdf::from_seed(&seed).unwrap();

        let first: Vec<_> = paths.iter().map(|p| kdf.derive_public(p).unwrap()).collect();
        let second: Vec<_> = paths.iter().map(|p| kdf.derive_public(p).unwrap()).collect();
        prop_assert_eq!(&first, &second);

        let distinct_paths: HashSet<_> = paths.iter().map(Path::to_bytes).collect();
        let distinct_keys: HashSet<_> = first.iter().map(|k| k.to_bytes().to_vec()).collect();
        prop_assert_eq!(distinct_paths.len(), distinct_keys.len());
    }
}
