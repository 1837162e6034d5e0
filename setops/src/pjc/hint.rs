// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The hint table.
//!
//! The responder holds many entries per bin and the requester one, so the
//! responder cannot simply give each bin's data to the circuit. Instead it
//! stores, for every entry `e` of bin `b`, the bin's tag and the entry's
//! masked features in a cuckoo table keyed by `hint_key(b, e)`, padded with
//! randomness derived from `F_b(e)`. A requester holding `e` in bin `b` knows
//! both the key and `F_b(e)`, so exactly one of the slots it looks at
//! unpads to the stored content. Every other slot unpads to noise.

use crate::{cuckoo::CuckooHash, psi::kkrt, Error};
use rand::{CryptoRng, Rng, SeedableRng};
use setops_primitives::{AbstractChannel, AesRng, Block, AES_HASH};

/// One slot: a tag and `width` feature words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) tag: Block,
    pub(crate) values: Vec<u64>,
}

impl Slot {
    fn random<RNG: CryptoRng + Rng>(width: usize, rng: &mut RNG) -> Self {
        Slot {
            tag: rng.gen(),
            values: (0..width).map(|_| rng.gen()).collect(),
        }
    }

    fn xor(&self, other: &Slot) -> Slot {
        Slot {
            tag: self.tag ^ other.tag,
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(x, y)| x ^ y)
                .collect(),
        }
    }

    fn write<C: AbstractChannel>(&self, channel: &mut C) -> std::io::Result<()> {
        channel.write_block(&self.tag)?;
        for v in self.values.iter() {
            channel.write_u64(*v)?;
        }
        Ok(())
    }

    fn read<C: AbstractChannel>(channel: &mut C, width: usize) -> std::io::Result<Self> {
        let tag = channel.read_block()?;
        let values = (0..width)
            .map(|_| channel.read_u64())
            .collect::<std::io::Result<Vec<u64>>>()?;
        Ok(Slot { tag, values })
    }
}

/// Where entry `entry` of bin `bin` lives in the hint table.
#[inline]
pub(crate) fn hint_key(key: Block, bin: usize, entry: Block) -> Block {
    AES_HASH.tccr_hash(key ^ Block::from(bin as u128), entry)
}

/// Pads for the slot reached through each of the `nhints` hint hashes,
/// expanded from the OPRF output `output`.
pub(crate) fn pads(output: Block, nhints: usize, width: usize) -> Vec<Slot> {
    let mut rng = AesRng::from_seed(output);
    (0..nhints).map(|_| Slot::random(width, &mut rng)).collect()
}

/// One responder entry to be stored in the hint table.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    /// Its [`hint_key`].
    pub(crate) key: Block,
    /// Bin tag and masked features, before padding.
    pub(crate) content: Slot,
    /// `F_b(e)` for the entry `e` of bin `b`.
    pub(crate) output: Block,
}

/// Lay out the padded slots of a built table; unused slots get random content.
fn fill<RNG: CryptoRng + Rng>(
    tbl: &CuckooHash,
    entries: &[Entry],
    width: usize,
    rng: &mut RNG,
) -> Vec<Slot> {
    tbl.items
        .iter()
        .map(|item| match item {
            Some(item) => {
                let entry = &entries[item.input_index];
                let pad = pads(entry.output, item.hash_index + 1, width)
                    .swap_remove(item.hash_index);
                entry.content.xor(&pad)
            }
            None => Slot::random(width, rng),
        })
        .collect()
}

/// Build the hint table over `entries` and send it.
pub(crate) fn send<C: AbstractChannel, RNG: CryptoRng + Rng>(
    channel: &mut C,
    entries: &[Entry],
    nhints: usize,
    nslots: usize,
    max_evictions: usize,
    width: usize,
    rng: &mut RNG,
) -> Result<(), Error> {
    let keys = entries.iter().map(|e| e.key).collect::<Vec<Block>>();
    let tbl = kkrt::build_table(channel, &keys, nhints, nslots, max_evictions)?;
    for slot in fill(&tbl, entries, width, rng).iter() {
        slot.write(channel)?;
    }
    channel.flush()?;
    Ok(())
}

/// Receive a hint table of `nslots` slots of `width` feature words.
pub(crate) fn receive<C: AbstractChannel>(
    channel: &mut C,
    nslots: usize,
    width: usize,
) -> Result<Vec<Slot>, Error> {
    kkrt::read_table_size(channel, nslots)?;
    (0..nslots)
        .map(|_| Slot::read(channel, width).map_err(Error::from))
        .collect()
}

/// Unpadded content of the slot each hint hash points `key` to.
pub(crate) fn lookup(slots: &[Slot], key: Block, output: Block, nhints: usize) -> Vec<Slot> {
    let width = slots.first().map_or(0, |s| s.values.len());
    pads(output, nhints, width)
        .iter()
        .enumerate()
        .map(|(j, pad)| slots[CuckooHash::bin(key, j, slots.len())].xor(pad))
        .collect()
}
