// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use rayon::prelude::*;
use setops_primitives::{AesHash, Block};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Inputs shorter than this are used as they are, without hashing.
const SHORT_INPUT: usize = 15;

// Compress an arbitrary vector into a 128-bit chunk, leaving the final 8-bits
// as zero. We need to leave 8 bits free in order to add in the hash index when
// running the OPRF (cf. <https://eprint.iacr.org/2016/799>, §5.2).
//
// Inputs of up to 15 bytes are stored verbatim with `len + 1` in the top byte;
// longer inputs take the first 15 bytes of their SHA-256 digest and a zero top
// byte. Distinct inputs therefore never share a digest, trailing zero bytes
// included.
pub(crate) fn compress_and_hash_inputs<T: AsRef<[u8]> + Sync>(
    inputs: &[T],
    key: Block,
) -> Vec<Block> {
    let aes = AesHash::new(key);
    let mask = Block::from(0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FF00);
    inputs
        .par_iter()
        .map(|input| {
            let input = input.as_ref();
            let mut digest = [0u8; 16];
            if input.len() < SHORT_INPUT {
                digest[0..input.len()].copy_from_slice(input);
                digest[SHORT_INPUT] = input.len() as u8 + 1;
            } else {
                let h = Sha256::digest(input);
                digest[0..SHORT_INPUT].copy_from_slice(&h[0..SHORT_INPUT]);
            }
            aes.cr_hash(Block::default(), Block::from(digest)) & mask
        })
        .collect()
}

/// Drop repeated elements, keeping the first occurrence of each.
pub(crate) fn dedup<T: AsRef<[u8]>>(inputs: &[T]) -> Vec<&T> {
    let mut seen = HashSet::with_capacity(inputs.len());
    inputs.iter().filter(|x| seen.insert((*x).as_ref())).collect()
}

/// Index of the first repeated element, if any.
pub(crate) fn first_duplicate<T: AsRef<[u8]>>(inputs: &[T]) -> Option<usize> {
    let mut seen = HashSet::with_capacity(inputs.len());
    inputs.iter().position(|x| !seen.insert(x.as_ref()))
}

/// `⌈log2(n)⌉`, with `log2(0) = log2(1) = 0`.
pub(crate) fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}
