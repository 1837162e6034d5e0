//! Tweaks and bit-decomposition helpers.

use setops_primitives::Block;

/// Tweak function for two items: `i` in the high word, `j` in the low word.
#[inline]
pub fn tweak2(i: u64, j: u64) -> Block {
    Block(((i as u128) << 64) | j as u128)
}

/// Little-endian bit decomposition of the lowest `n` bits of `x`.
pub fn u128_to_bits(x: u128, n: usize) -> Vec<bool> {
    (0..n).map(|i| i < 128 && (x >> i) & 1 == 1).collect()
}

/// Inverse of `u128_to_bits`. Bits beyond the 128th are ignored.
pub fn u128_from_bits(bs: &[bool]) -> u128 {
    bs.iter()
        .take(128)
        .enumerate()
        .fold(0, |acc, (i, b)| acc | ((*b as u128) << i))
}
