// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::Error;
use setops_primitives::{Aes128, Block};
use std::fmt::Debug;

/// Smallest table we ever build.
const MIN_BINS: usize = 32;
/// Below this many items the table gets two bins per item.
const SMALL_SET: usize = 1 << 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CuckooItem {
    // The actual value.
    pub(crate) entry: Block,
    // The input index associated with the entry.
    pub(crate) input_index: usize,
    // The hash index used.
    pub(crate) hash_index: usize,
}

impl CuckooItem {
    /// The entry with its hash index folded into the low byte.
    #[inline]
    pub(crate) fn tagged(&self) -> Block {
        tag(self.entry, self.hash_index)
    }
}

/// `entry ⊕ hidx`, the value both sides feed to the OPRF for bin placement `hidx`.
#[inline]
pub(crate) fn tag(entry: Block, hidx: usize) -> Block {
    entry ^ Block::from(hidx as u128)
}

#[derive(Clone)]
pub(crate) struct CuckooHash {
    pub(crate) items: Vec<Option<CuckooItem>>,
    pub(crate) nbins: usize,
    pub(crate) nhashes: usize,
}

/// Number of bins for `n` items at expansion `epsilon`:
/// `max(⌈ε·n⌉, 32, 2n if n < 2^10)`.
pub(crate) fn compute_nbins(n: usize, epsilon: f64) -> usize {
    let scaled = (epsilon * (n as f64)).ceil() as usize;
    let small = if n < SMALL_SET { 2 * n } else { 0 };
    scaled.max(MIN_BINS).max(small)
}

pub(crate) fn compute_masksize(n: usize) -> Result<usize, Error> {
    // Numbers taken from <https://eprint.iacr.org/2016/799>, Table 2 (the `v`
    // column).
    let masksize = if n <= 1 << 8 {
        7
    } else if n <= 1 << 12 {
        8
    } else if n <= 1 << 16 {
        9
    } else if n <= 1 << 20 {
        10
    } else if n <= 1 << 24 {
        11
    } else if n <= 1 << 28 {
        12
    } else {
        return Err(Error::InvalidCuckooSetSize(n));
    };
    Ok(masksize)
}

fn check_parameters(nitems: usize, nhashes: usize, nbins: usize) -> Result<(), Error> {
    if !(3..=5).contains(&nhashes) || nbins == 0 {
        return Err(Error::InvalidCuckooParameters { nitems, nhashes });
    }
    Ok(())
}

impl CuckooHash {
    /// Build a new cuckoo hash table of `nbins` bins, hashing `inputs` in.
    /// Each insertion may evict at most `max_evictions` times.
    ///
    /// When used for the OPRF the low byte of every input must be zero, as it
    /// receives the hash index.
    pub(crate) fn new(
        inputs: &[Block],
        nhashes: usize,
        nbins: usize,
        max_evictions: usize,
    ) -> Result<CuckooHash, Error> {
        check_parameters(inputs.len(), nhashes, nbins)?;
        let mut tbl = CuckooHash {
            items: vec![None; nbins],
            nbins,
            nhashes,
        };
        for (j, input) in inputs.iter().enumerate() {
            tbl.hash(*input, j, max_evictions)?;
        }
        Ok(tbl)
    }

    /// Place `input`, alongside the input index `idx` it corresponds to, in the
    /// hash table.
    fn hash(&mut self, input: Block, idx: usize, max_evictions: usize) -> Result<(), Error> {
        let mut item = CuckooItem {
            entry: input,
            input_index: idx,
            hash_index: 0,
        };
        for _ in 0..max_evictions {
            let i = CuckooHash::bin(item.entry, item.hash_index, self.nbins);
            match self.items[i].replace(item) {
                Some(x) => {
                    item = x;
                    item.hash_index = (item.hash_index + 1) % self.nhashes;
                }
                None => return Ok(()),
            }
        }
        Err(Error::CuckooHashFull)
    }

    /// Output the bin number for a given hash output `hash` and hash index `hidx`.
    pub(crate) fn bin(hash: Block, hidx: usize, nbins: usize) -> usize {
        // Byte 0 of `hash` carries the hash index and is zero here; bytes
        // 1..16 are uniformly(-ish) random, so the `hidx`th 32 bits after byte
        // 0 are used directly for the first three hashes. The remaining ones go
        // through AES keyed by `hash`.
        if hidx < 3 {
            let mut array = [0u8; 4];
            let bytes: [u8; 16] = hash.into();
            array.copy_from_slice(&bytes[1 + 4 * hidx..1 + 4 * (hidx + 1)]);
            let value = u32::from_le_bytes(array);
            (value as usize) % nbins
        } else {
            let aes = Aes128::new(hash);
            let h = aes.encrypt(Block::from(hidx as u128));
            (u128::from(h) % (nbins as u128)) as usize
        }
    }

    /// Bin contents as OPRF inputs; empty bins read as the zero block.
    pub(crate) fn tagged_entries(&self) -> Vec<Block> {
        self.items
            .iter()
            .map(|item| item.as_ref().map_or(Block::default(), CuckooItem::tagged))
            .collect()
    }
}

/// Simple hashing: every input lands in all of its `nhashes` bins, tagged
/// with the hash index that put it there. Returns `(tagged entry, input index)`
/// pairs per bin.
pub(crate) fn simple_hash(
    inputs: &[Block],
    nhashes: usize,
    nbins: usize,
) -> Result<Vec<Vec<(Block, usize)>>, Error> {
    check_parameters(inputs.len(), nhashes, nbins)?;
    let mut bins = vec![Vec::new(); nbins];
    for (j, x) in inputs.iter().enumerate() {
        for h in 0..nhashes {
            bins[CuckooHash::bin(*x, h, nbins)].push((tag(*x, h), j));
        }
    }
    Ok(bins)
}

impl Debug for CuckooHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for i in 0..self.nbins {
            writeln!(f, "{}: {:?}", i, self.items[i])?;
        }
        Ok(())
    }
}
