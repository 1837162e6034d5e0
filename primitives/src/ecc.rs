//! Ristretto255 helpers: hashing to the group and exponent blinding.

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

/// Size in bytes of a compressed group element.
pub const POINT_BYTES: usize = 32;

/// Hash `input` to a group element, binding the result to `domain`.
pub fn hash_to_point(domain: &[u8], input: &[u8]) -> RistrettoPoint {
    let mut hasher = Sha512::new();
    hasher.update((domain.len() as u64).to_le_bytes());
    hasher.update(domain);
    hasher.update(input);
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    RistrettoPoint::from_uniform_bytes(&wide)
}

/// Sample a uniformly random scalar.
pub fn random_scalar<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Scalar {
    let mut wide = [0u8; 64];
    rng.fill_bytes(&mut wide);
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// A secret exponent used to blind group elements, `P ↦ a·P`.
pub struct EcCipher {
    secret: Scalar,
    inverse: Scalar,
}

impl EcCipher {
    /// Sample a fresh non-zero exponent.
    pub fn new<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Self {
        loop {
            let secret = random_scalar(rng);
            if secret != Scalar::zero() {
                let inverse = secret.invert();
                return Self { secret, inverse };
            }
        }
    }

    /// Blind `pt` with the secret exponent.
    #[inline]
    pub fn encrypt(&self, pt: &RistrettoPoint) -> RistrettoPoint {
        pt * self.secret
    }

    /// Remove one layer of blinding with the secret exponent.
    #[inline]
    pub fn decrypt(&self, pt: &RistrettoPoint) -> RistrettoPoint {
        pt * self.inverse
    }
}

/// Compress a point to its canonical byte encoding.
#[inline]
pub fn compress(pt: &RistrettoPoint) -> [u8; POINT_BYTES] {
    pt.compress().to_bytes()
}

/// Decompress a canonical encoding, returning `None` for invalid bytes.
#[inline]
pub fn decompress(bytes: [u8; POINT_BYTES]) -> Option<RistrettoPoint> {
    CompressedRistretto(bytes).decompress()
}
