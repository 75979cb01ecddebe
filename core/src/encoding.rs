// Copyright (c) 2018-2025 The Botho Foundation

//! Strict decoding of wire scalars and points

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};

use crate::{types::UintBig, Error};

/// Decode a canonical little-endian scalar
pub fn decode_scalar(src: &UintBig) -> Result<Scalar, Error> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(*src)).ok_or(Error::NonCanonicalScalar)
}

/// Decode a compressed point
pub fn decode_point(src: &CompressedRistretto) -> Result<RistrettoPoint, Error> {
    src.decompress().ok_or(Error::InvalidCurvePoint)
}
