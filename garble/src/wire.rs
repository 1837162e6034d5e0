//! Low-level operations on wire labels, the basic building block of garbled circuits.

use rand::{CryptoRng, Rng};
use setops_primitives::{Block, AES_HASH};
use subtle::{Choice, ConditionallySelectable};

/// Representation of a binary wire label.
///
/// The least significant bit of the label is its *color*, used for
/// point-and-permute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WireMod2 {
    val: Block,
}

impl WireMod2 {
    /// Wrap a raw block as a label.
    #[inline]
    pub fn from_block(block: Block) -> Self {
        Self { val: block }
    }

    /// The raw block of this label.
    #[inline]
    pub fn as_block(&self) -> Block {
        self.val
    }

    /// The point-and-permute bit.
    #[inline]
    pub fn color(&self) -> bool {
        self.val.lsb()
    }

    /// Free-XOR of two labels.
    #[inline]
    pub fn plus(&self, other: &Self) -> Self {
        Self {
            val: self.val ^ other.val,
        }
    }

    /// In-place free-XOR.
    #[inline]
    pub fn plus_eq(&mut self, other: &Self) -> &mut Self {
        self.val ^= other.val;
        self
    }

    /// `self` if `b` is set, the all-zero label otherwise.
    #[inline]
    pub fn cmul(&self, b: bool) -> Self {
        Self {
            val: self.val.select(b),
        }
    }

    /// A uniformly random label.
    #[inline]
    pub fn rand<R: CryptoRng + Rng + ?Sized>(rng: &mut R) -> Self {
        Self { val: rng.gen() }
    }

    /// A random global offset. Its color is always set so that the two labels
    /// of every wire have different colors.
    #[inline]
    pub fn rand_delta<R: CryptoRng + Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            val: rng.gen::<Block>().set_lsb(),
        }
    }

    /// Hash the label under `tweak`.
    #[inline]
    pub fn hash(&self, tweak: Block) -> Block {
        AES_HASH.tccr_hash(tweak, self.val)
    }
}

impl ConditionallySelectable for WireMod2 {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            val: Block(u128::conditional_select(&a.val.0, &b.val.0, choice)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setops_primitives::AesRng;

    #[test]
    fn test_delta_flips_color() {
        let mut rng = AesRng::new();
        for _ in 0..64 {
            let delta = WireMod2::rand_delta(&mut rng);
            let zero = WireMod2::rand(&mut rng);
            assert_ne!(zero.color(), zero.plus(&delta).color());
            assert_eq!(zero.plus(&delta).plus(&delta), zero);
        }
    }

    #[test]
    fn test_conditional_select() {
        let mut rng = AesRng::new();
        let a = WireMod2::rand(&mut rng);
        let b = WireMod2::rand(&mut rng);
        assert_eq!(WireMod2::conditional_select(&a, &b, Choice::from(0)), a);
        assert_eq!(WireMod2::conditional_select(&a, &b, Choice::from(1)), b);
        assert_eq!(a.cmul(false), WireMod2::default());
        assert_eq!(a.cmul(true), a);
    }
}
