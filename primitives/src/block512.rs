// -*- mode: rust; -*-
//
// This file is part of `setops-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Defines a 512-bit value.

use crate::Block;
use rand::distributions::{Distribution, Standard};
use rand::Rng;

/// A 512-bit value, stored as four blocks.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Block512(pub [Block; 4]);

impl Block512 {
    /// Return the first `n` bytes, where `n` must be `<= 64`.
    #[inline]
    pub fn prefix(&self, n: usize) -> &[u8] {
        &self.as_ref()[0..n]
    }

    /// Return the first `n` bytes as a mutable slice, where `n` must be `<= 64`.
    #[inline]
    pub fn prefix_mut(&mut self, n: usize) -> &mut [u8] {
        &mut self.as_mut()[0..n]
    }

    /// Return the `i`-th bit, counting from the least significant bit of the first block.
    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        self.0[i / 128].bit(i % 128)
    }
}

impl std::fmt::Debug for Block512 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}{:?}{:?}{:?}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl AsRef<[u8]> for Block512 {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl AsMut<[u8]> for Block512 {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        bytemuck::bytes_of_mut(self)
    }
}

impl std::ops::BitXor for Block512 {
    type Output = Block512;
    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        let mut out = self;
        out ^= rhs;
        out
    }
}

impl std::ops::BitXorAssign for Block512 {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a ^= *b;
        }
    }
}

impl std::ops::BitAnd for Block512 {
    type Output = Block512;
    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(rhs.0.iter()) {
            *a &= *b;
        }
        out
    }
}

impl Distribution<Block512> for Standard {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Block512 {
        Block512([rng.gen(), rng.gen(), rng.gen(), rng.gen()])
    }
}

impl From<[u8; 64]> for Block512 {
    #[inline]
    fn from(bytes: [u8; 64]) -> Self {
        let mut out = Block512::default();
        out.as_mut().copy_from_slice(&bytes);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_and() {
        let x = rand::random::<Block512>();
        let y = rand::random::<Block512>();
        assert_eq!((x ^ y) ^ y, x);
        let ones = Block512([Block(u128::MAX); 4]);
        assert_eq!(x & ones, x);
        assert_eq!(x & Block512::default(), Block512::default());
    }

    #[test]
    fn test_prefix_and_bits() {
        let mut bytes = [0u8; 64];
        bytes[16] = 0b10;
        let x = Block512::from(bytes);
        assert_eq!(x.prefix(17)[16], 0b10);
        assert!(x.bit(129));
        assert!(!x.bit(128));
    }
}
