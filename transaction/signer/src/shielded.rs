// Copyright (c) 2018-2025 The Botho Foundation

//! Shielded engine.
//!
//! Produces the blinding-dependent shares of range proofs and of
//! one-of-many spend proofs, and batches of one-time vouchers. The host does
//! all remaining non-secret arithmetic.

use bth_keykeeper_core::{
    coin_digest, cofactor_generator, commit, encoding::decode_point, GeneratorCache, Hasher, Kdf,
    Signature,
};
use bth_keykeeper_types::{KeyScheme, ProtoErrorKind, ShieldedTxoId, UintBig, WalletIdentity};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    tx::{
        hash_shielded_txo, CreateOutputRequest, CreateOutputResponse,
        CreateShieldedInputRequest, CreateShieldedInputResponse, ShieldedVoucher,
    },
    Error,
};

const SHIELDED_INPUT_DOMAIN_TAG: &[u8] = b"bth_kk_shielded_input";
const TICKET_DOMAIN_TAG: &[u8] = b"bth_kk_ticket";
const OUTPUT_SEED_DOMAIN_TAG: &[u8] = b"bth_kk_output_seed";
const OUTPUT_Z_DOMAIN_TAG: &[u8] = b"bth_kk_output_z";
const OUTPUT_X_DOMAIN_TAG: &[u8] = b"bth_kk_output_x";
const SPEND_SEED_DOMAIN_TAG: &[u8] = b"bth_kk_spend_seed";
const SPEND_CHALLENGE_DOMAIN_TAG: &[u8] = b"bth_kk_spend_challenge";
const VOUCHER_SEED_DOMAIN_TAG: &[u8] = b"bth_kk_voucher_seed";
const VOUCHER_TICKET_DOMAIN_TAG: &[u8] = b"bth_kk_voucher_ticket";

/// Largest voucher batch
pub const MAX_VOUCHERS: u32 = 30;

/// Largest anonymity set, `n^M`
pub const MAX_ANONYMITY_SET: u32 = 1 << 20;

/// Largest membership proof exponent M
pub const MAX_SIGMA_M: u32 = 20;

/// Blinding factor of a shielded output we can spend
pub(crate) fn shielded_input_key(kdf: &Kdf, txo: &ShieldedTxoId) -> Scalar {
    let hv = hash_shielded_txo(Hasher::new(SHIELDED_INPUT_DOMAIN_TAG), txo).to_digest();
    kdf.derive_key(&hv)
}

/// Serial key pair `(s, s')` of a ticket
pub(crate) fn ticket_keys(
    kdf: &Kdf,
    k_ser_g: &UintBig,
    viewer_index: u32,
    created_by_viewer: bool,
) -> [Zeroizing<Scalar>; 2] {
    let base = Hasher::new(TICKET_DOMAIN_TAG)
        .digest(k_ser_g)
        .u32(viewer_index)
        .u8(created_by_viewer as u8);
    [0u8, 1].map(|i| Zeroizing::new(kdf.derive_key(&base.clone().u8(i).to_digest())))
}

/// Blinding share of a range proof for output `cid`.
///
/// Returns `T1 + τ1·G`, `T2 + τ2·G` and `τx = τ1·x + τ2·x² + z²·sk`, where
/// `z` binds the commitment and the host's extra scalars and `x` binds the
/// final T points.
pub(crate) fn create_output(
    kdf: &Kdf,
    req: &CreateOutputRequest,
    gens: &mut GeneratorCache,
) -> Result<CreateOutputResponse, Error> {
    if req.cid.scheme() == Some(KeyScheme::Legacy) {
        return Err(Error::WeakOutput);
    }
    let t_host = [decode_point(&req.t[0])?, decode_point(&req.t[1])?];

    let h = gens.get(req.cid.asset_id);
    let sk = Zeroizing::new(kdf.coin_key(&req.cid, &h)?);
    let commitment = commit(&sk, req.cid.value, &h).compress();

    let seed = Hasher::new(OUTPUT_SEED_DOMAIN_TAG)
        .digest(&coin_digest(&req.cid))
        .scalar(&req.k_extra[0])
        .scalar(&req.k_extra[1])
        .point(&req.t[0])
        .point(&req.t[1])
        .to_digest();
    let tau1 = Zeroizing::new(kdf.keyed_scalar(b"output-tau1", &seed));
    let tau2 = Zeroizing::new(kdf.keyed_scalar(b"output-tau2", &seed));

    let t = [
        (t_host[0] + RistrettoPoint::mul_base(&tau1)).compress(),
        (t_host[1] + RistrettoPoint::mul_base(&tau2)).compress(),
    ];

    let z = Hasher::new(OUTPUT_Z_DOMAIN_TAG)
        .point(&commitment)
        .scalar(&req.k_extra[0])
        .scalar(&req.k_extra[1])
        .to_scalar();
    let x = Hasher::new(OUTPUT_X_DOMAIN_TAG)
        .scalar(&z)
        .point(&t[0])
        .point(&t[1])
        .to_scalar();

    let tau_x = *tau1 * x + *tau2 * x * x + z * z * *sk;
    Ok(CreateOutputResponse { t, tau_x })
}

/// Signer share of a one-of-many spend proof for a shielded input.
pub(crate) fn create_shielded_input(
    kdf: &Kdf,
    req: &CreateShieldedInputRequest,
    gens: &mut GeneratorCache,
) -> Result<CreateShieldedInputResponse, Error> {
    validate_sigma(req)?;
    let g0_host = decode_point(&req.g[0])?;
    for p in &req.abcd {
        decode_point(p)?;
    }

    let txo = &req.input.txo;
    let v = Scalar::from(txo.amount);
    let h_asset = gens.get(txo.asset_id);
    // H' = H_a - assetSk·G
    let h_blinded = h_asset - RistrettoPoint::mul_base(&req.asset_sk);

    let sk_in = Zeroizing::new(shielded_input_key(kdf, txo));
    let b = Zeroizing::new(*sk_in + v * req.asset_sk);
    let r = Zeroizing::new(req.outp_sk - *b);
    let [s, _] = ticket_keys(kdf, &txo.k_ser_g, txo.viewer_index, txo.created_by_viewer);
    let spend_pk = RistrettoPoint::mul_base(&s).compress();

    let seed = spend_seed(req);
    let tau = Zeroizing::new(kdf.keyed_scalar(b"spend-tau", &seed));
    let ka = Zeroizing::new(kdf.keyed_scalar(b"spend-ka", &seed));
    let kb = Zeroizing::new(kdf.keyed_scalar(b"spend-kb", &seed));

    let g0 = (g0_host + RistrettoPoint::mul_base(&tau)).compress();
    let nonce_pub = (RistrettoPoint::mul_base(&ka) + *kb * h_blinded).compress();

    let x = spend_challenge(req, &g0, &spend_pk, &nonce_pub);

    let x_m = (0..req.sigma_m).fold(Scalar::ONE, |acc, _| acc * x);
    Ok(CreateShieldedInputResponse {
        g0,
        nonce_pub,
        sig: [*ka + x * (*s + *b), *kb + x * v],
        z_r: *r * x_m - *tau,
    })
}

fn validate_sigma(req: &CreateShieldedInputRequest) -> Result<(), Error> {
    if req.h_min > req.h_max {
        return Err(Error::InvalidParameter("h_max"));
    }
    if req.sigma_m == 0 || req.sigma_m > MAX_SIGMA_M {
        return Err(Error::InvalidParameter("sigma_m"));
    }
    if req.sigma_n < 2 {
        return Err(Error::InvalidParameter("sigma_n"));
    }
    match req.sigma_n.checked_pow(req.sigma_m) {
        Some(size) if size <= MAX_ANONYMITY_SET => {}
        _ => return Err(Error::InvalidParameter("sigma_n")),
    }
    if req.g.len() != req.sigma_m as usize {
        return Err(Error::Proto(ProtoErrorKind::LengthMismatch));
    }
    Ok(())
}

fn spend_seed(req: &CreateShieldedInputRequest) -> UintBig {
    let mut h = hash_shielded_txo(Hasher::new(SPEND_SEED_DOMAIN_TAG), &req.input.txo)
        .u64(req.input.fee)
        .u64(req.h_min)
        .u64(req.h_max)
        .u64(req.window_end)
        .u32(req.sigma_m)
        .u32(req.sigma_n)
        .scalar(&req.asset_sk)
        .scalar(&req.outp_sk);
    for p in req.abcd.iter().chain(req.g.iter()) {
        h = h.point(p);
    }
    h.to_digest()
}

fn spend_challenge(
    req: &CreateShieldedInputRequest,
    g0: &CompressedRistretto,
    spend_pk: &CompressedRistretto,
    nonce_pub: &CompressedRistretto,
) -> Scalar {
    let mut h = Hasher::new(SPEND_CHALLENGE_DOMAIN_TAG)
        .u64(req.h_min)
        .u64(req.h_max)
        .u64(req.window_end)
        .u32(req.sigma_m)
        .u32(req.sigma_n);
    for p in &req.abcd {
        h = h.point(p);
    }
    h = h.point(g0);
    for p in &req.g[1..] {
        h = h.point(p);
    }
    h.point(spend_pk)
        .point(nonce_pub)
        .u64(req.input.fee)
        .to_scalar()
}

/// `count` vouchers for identity `id`, derived from `nonce0`.
///
/// Every voucher carries a fresh ticket, a proof of its ownership, and a
/// signature by the identity key.
pub(crate) fn create_vouchers(
    kdf: &Kdf,
    id: WalletIdentity,
    nonce0: &UintBig,
    count: u32,
) -> Result<Vec<ShieldedVoucher>, Error> {
    if count > MAX_VOUCHERS {
        return Err(Error::Proto(ProtoErrorKind::TooManyElements));
    }
    let id_sk = Zeroizing::new(kdf.identity_key(id)?);
    let j = cofactor_generator();

    let vouchers = (0..count)
        .map(|i| {
            let mut nonce = kdf.keyed_digest(
                b"voucher-nonce",
                &Hasher::new(VOUCHER_SEED_DOMAIN_TAG)
                    .digest(nonce0)
                    .u64(id)
                    .u32(i)
                    .to_digest(),
            );
            let k_ser_g = Hasher::new(VOUCHER_TICKET_DOMAIN_TAG)
                .digest(&nonce)
                .to_digest();
            let [s, s_prime] = ticket_keys(kdf, &k_ser_g, 0, true);
            let serial_pub = (RistrettoPoint::mul_base(&s) + *s_prime * j).compress();

            let u = Zeroizing::new(kdf.keyed_scalar(b"voucher-u", &nonce));
            let w = Zeroizing::new(kdf.keyed_scalar(b"voucher-w", &nonce));
            nonce.zeroize();
            let nonce_pub = (RistrettoPoint::mul_base(&u) + *w * j).compress();
            let e = ShieldedVoucher::ticket_challenge(&serial_pub, &nonce_pub);

            let mut voucher = ShieldedVoucher {
                serial_pub,
                nonce_pub,
                pk: [*u + e * *s, *w + e * *s_prime],
                shared_secret: kdf.keyed_digest(b"voucher-shared", &k_ser_g),
                signature: Signature::default(),
            };
            let msg = voucher.message();
            let sig_nonce = Zeroizing::new(kdf.keyed_scalar(b"voucher-sig", &msg));
            voucher.signature = Signature::sign(&msg, &id_sk, &sig_nonce);
            voucher
        })
        .collect();
    Ok(vouchers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bth_keykeeper_core::asset_generator;
    use bth_keykeeper_types::{CoinId, ShieldedInput, KEY_TYPE_REGULAR};

    fn kdf() -> Kdf {
        Kdf::from_seed(&[9u8; 32]).unwrap()
    }

    fn point(n: u64) -> CompressedRistretto {
        RistrettoPoint::mul_base(&Scalar::from(n)).compress()
    }

    #[test]
    fn output_share_satisfies_the_blinding_equation() {
        let kdf = kdf();
        let mut gens = GeneratorCache::default();
        let req = CreateOutputRequest {
            cid: CoinId::new(5, KEY_TYPE_REGULAR, 1234, 2),
            k_extra: [Scalar::from(11u64), Scalar::from(12u64)],
            t: [point(3), point(4)],
        };
        let resp = create_output(&kdf, &req, &mut gens).unwrap();

        let h = asset_generator(2);
        let sk = kdf.coin_key(&req.cid, &h).unwrap();
        let c = commit(&sk, 1234, &h).compress();
        let z = Hasher::new(OUTPUT_Z_DOMAIN_TAG)
            .point(&c)
            .scalar(&req.k_extra[0])
            .scalar(&req.k_extra[1])
            .to_scalar();
        let x = Hasher::new(OUTPUT_X_DOMAIN_TAG)
            .scalar(&z)
            .point(&resp.t[0])
            .point(&resp.t[1])
            .to_scalar();

        let d1 = resp.t[0].decompress().unwrap() - req.t[0].decompress().unwrap();
        let d2 = resp.t[1].decompress().unwrap() - req.t[1].decompress().unwrap();
        let lhs = RistrettoPoint::mul_base(&resp.tau_x);
        let rhs = x * d1 + x * x * d2 + z * z * RistrettoPoint::mul_base(&sk);
        assert_eq!(lhs, rhs);

        // deterministic
        assert_eq!(create_output(&kdf, &req, &mut gens).unwrap(), resp);
    }

    #[test]
    fn output_rejects_weak_scheme_and_bad_points() {
        let mut gens = GeneratorCache::default();
        let mut req = CreateOutputRequest {
            cid: CoinId::new(5, KEY_TYPE_REGULAR, 1, 0).with_scheme(KeyScheme::Legacy),
            t: [point(1), point(2)],
            ..Default::default()
        };
        assert_eq!(
            create_output(&kdf(), &req, &mut gens),
            Err(Error::WeakOutput)
        );

        req.cid = req.cid.with_scheme(KeyScheme::Switch);
        req.t[1] = CompressedRistretto([0xff; 32]);
        assert_eq!(
            create_output(&kdf(), &req, &mut gens),
            Err(Error::Proto(ProtoErrorKind::BadEncoding))
        );
    }

    fn spend_request() -> CreateShieldedInputRequest {
        CreateShieldedInputRequest {
            input: ShieldedInput {
                txo: ShieldedTxoId {
                    k_ser_g: [5u8; 32],
                    viewer_index: 1,
                    created_by_viewer: false,
                    amount: 777,
                    asset_id: 3,
                    ..Default::default()
                },
                fee: 100,
            },
            h_min: 10,
            h_max: 20,
            window_end: 5000,
            sigma_m: 3,
            sigma_n: 4,
            asset_sk: Scalar::from(41u64),
            outp_sk: Scalar::from(43u64),
            abcd: [point(1), point(2), point(3), point(4)],
            g: vec![point(5), point(6), point(7)],
        }
    }

    #[test]
    fn spend_signature_opens_spend_key_plus_input_commitment() {
        let kdf = kdf();
        let req = spend_request();
        let resp = create_shielded_input(&kdf, &req, &mut GeneratorCache::default()).unwrap();

        let txo = &req.input.txo;
        let h_blinded = asset_generator(3) - RistrettoPoint::mul_base(&req.asset_sk);
        let sk_in = shielded_input_key(&kdf, txo);
        let c_in = commit(&sk_in, txo.amount, &asset_generator(3));
        let [s, _] = ticket_keys(&kdf, &txo.k_ser_g, txo.viewer_index, txo.created_by_viewer);
        let spend_pk = RistrettoPoint::mul_base(&s);

        let x = spend_challenge(&req, &resp.g0, &spend_pk.compress(), &resp.nonce_pub);
        let lhs = RistrettoPoint::mul_base(&resp.sig[0]) + resp.sig[1] * h_blinded;
        let rhs = resp.nonce_pub.decompress().unwrap() + x * (spend_pk + c_in);
        assert_eq!(lhs, rhs);

        // zR + τ = r·x^M, with τ·G = G0 - pG[0]
        let b = sk_in + Scalar::from(txo.amount) * req.asset_sk;
        let r = req.outp_sk - b;
        let tau_g = resp.g0.decompress().unwrap() - req.g[0].decompress().unwrap();
        assert_eq!(
            RistrettoPoint::mul_base(&resp.z_r) + tau_g,
            RistrettoPoint::mul_base(&(r * x * x * x))
        );
    }

    #[test]
    fn spend_parameters_are_validated() {
        let kdf = kdf();
        let mut gens = GeneratorCache::default();
        let check = |req: &CreateShieldedInputRequest, gens: &mut GeneratorCache| {
            create_shielded_input(&kdf, req, gens).unwrap_err()
        };

        let mut req = spend_request();
        req.sigma_n = 1;
        assert_eq!(check(&req, &mut gens), Error::InvalidParameter("sigma_n"));

        let mut req = spend_request();
        req.sigma_m = 0;
        req.g.clear();
        assert_eq!(check(&req, &mut gens), Error::InvalidParameter("sigma_m"));

        // 2^21 members
        let mut req = spend_request();
        req.sigma_n = 2;
        req.sigma_m = 21;
        assert_eq!(check(&req, &mut gens), Error::InvalidParameter("sigma_m"));
        req.sigma_n = 1 << 10;
        req.sigma_m = 3;
        assert_eq!(check(&req, &mut gens), Error::InvalidParameter("sigma_n"));

        let mut req = spend_request();
        req.g.pop();
        assert_eq!(
            check(&req, &mut gens),
            Error::Proto(ProtoErrorKind::LengthMismatch)
        );

        let mut req = spend_request();
        req.h_min = 30;
        assert_eq!(check(&req, &mut gens), Error::InvalidParameter("h_max"));
    }

    #[test]
    fn voucher_batch() {
        let kdf = kdf();
        let issuer = RistrettoPoint::mul_base(&kdf.identity_key(7).unwrap());
        let vouchers = create_vouchers(&kdf, 7, &[1u8; 32], 16).unwrap();
        assert_eq!(vouchers.len(), 16);
        for (i, a) in vouchers.iter().enumerate() {
            assert!(a.verify(&issuer));
            for b in &vouchers[i + 1..] {
                assert_ne!(a.nonce_pub, b.nonce_pub);
                assert_ne!(a.serial_pub, b.serial_pub);
            }
        }
        assert_eq!(create_vouchers(&kdf, 7, &[1u8; 32], 16).unwrap(), vouchers);

        let other = create_vouchers(&kdf, 7, &[2u8; 32], 1).unwrap();
        assert_ne!(other[0], vouchers[0]);
    }

    #[test]
    fn voucher_limits() {
        let kdf = kdf();
        assert_eq!(
            create_vouchers(&kdf, 7, &[0u8; 32], MAX_VOUCHERS + 1),
            Err(Error::Proto(ProtoErrorKind::TooManyElements))
        );
        assert_eq!(
            create_vouchers(&kdf, 0, &[0u8; 32], 1),
            Err(Error::Derivation(bth_keykeeper_core::Error::NoIdentity))
        );
        assert!(create_vouchers(&kdf, 7, &[0u8; 32], 0).unwrap().is_empty());
    }

    #[test]
    fn tampered_voucher_fails() {
        let kdf = kdf();
        let issuer = RistrettoPoint::mul_base(&kdf.identity_key(7).unwrap());
        let mut v = create_vouchers(&kdf, 7, &[1u8; 32], 1).unwrap().remove(0);
        v.shared_secret[0] ^= 1;
        assert!(!v.verify(&issuer));

        let mut v = create_vouchers(&kdf, 7, &[1u8; 32], 1).unwrap().remove(0);
        v.pk[0] += Scalar::ONE;
        assert!(!v.verify(&issuer));

        let v = create_vouchers(&kdf, 7, &[1u8; 32], 1).unwrap().remove(0);
        let stranger = RistrettoPoint::mul_base(&kdf.identity_key(8).unwrap());
        assert!(!v.verify(&stranger));
    }
}
