// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The circuit evaluated once per bin.
//!
//! The garbler brings the candidate tags and masked features it decoded
//! from the hint table, its own features for the bin and one output mask per
//! column. The evaluator brings the bin's true tag and feature masks. The
//! bin is a match when exactly one candidate tag equals the true tag; every
//! output column is then `value + mask` and `0 + mask` otherwise.

use crate::utils;
use setops_garble::{util::u128_to_bits, BinaryBundle, BinaryGadgets, FancyBinary};

/// Width of every feature and share.
pub(crate) const VALUE_BITS: usize = 64;

/// Shape of the per-bin circuit. Both parties must derive the same layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) nhints: usize,
    pub(crate) tag_bits: usize,
    pub(crate) nrequester: usize,
    pub(crate) nresponder: usize,
}

impl Layout {
    pub(crate) fn new(nbins: usize, nhints: usize, nrequester: usize, nresponder: usize) -> Self {
        Layout {
            nhints,
            tag_bits: (40 + utils::ceil_log2(nbins * nhints)).min(128),
            nrequester,
            nresponder,
        }
    }

    /// Output columns: membership, requester features, responder features.
    pub(crate) fn ncols(&self) -> usize {
        1 + self.nrequester + self.nresponder
    }

    pub(crate) fn garbler_bits(&self) -> usize {
        self.nhints * (self.tag_bits + VALUE_BITS * self.nresponder)
            + VALUE_BITS * (self.nrequester + self.ncols())
    }

    pub(crate) fn evaluator_bits(&self) -> usize {
        self.tag_bits + VALUE_BITS * self.nresponder
    }

    /// Exact number of ciphertexts in one garbled bin.
    pub(crate) fn ngates(&self) -> usize {
        let n = VALUE_BITS;
        let ands = self.nhints * (self.tag_bits - 1)
            + (n - 1)
            + self.nrequester * (n + n - 1)
            + self.nresponder * (self.nhints * n + n + n - 1);
        2 * ands
    }

    pub(crate) fn tag_mask(&self) -> u128 {
        if self.tag_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << self.tag_bits) - 1
        }
    }
}

/// The garbler's plaintext inputs for one bin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GarblerInputs {
    /// Candidate tag per hint hash.
    pub(crate) candidates: Vec<u128>,
    /// Candidate masked responder features per hint hash.
    pub(crate) values: Vec<Vec<u64>>,
    /// Requester features of the key in the bin, zero for an empty bin.
    pub(crate) features: Vec<u64>,
    /// Output masks, one per column.
    pub(crate) masks: Vec<u64>,
}

/// The evaluator's plaintext inputs for one bin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EvaluatorInputs {
    pub(crate) tag: u128,
    pub(crate) masks: Vec<u64>,
}

fn push_value(bits: &mut Vec<bool>, x: u64) {
    bits.extend(u128_to_bits(x as u128, VALUE_BITS));
}

impl GarblerInputs {
    pub(crate) fn to_bits(&self, layout: &Layout) -> Vec<bool> {
        let mut bits = Vec::with_capacity(layout.garbler_bits());
        for c in self.candidates.iter() {
            bits.extend(u128_to_bits(*c, layout.tag_bits));
        }
        for v in self.values.iter().flatten() {
            push_value(&mut bits, *v);
        }
        for x in self.features.iter().chain(self.masks.iter()) {
            push_value(&mut bits, *x);
        }
        bits
    }
}

impl EvaluatorInputs {
    pub(crate) fn to_bits(&self, layout: &Layout) -> Vec<bool> {
        let mut bits = Vec::with_capacity(layout.evaluator_bits());
        bits.extend(u128_to_bits(self.tag, layout.tag_bits));
        for w in self.masks.iter() {
            push_value(&mut bits, *w);
        }
        bits
    }
}

struct Wires<'a, W> {
    rest: &'a [W],
}

impl<'a, W: Clone> Wires<'a, W> {
    fn take(&mut self, n: usize) -> BinaryBundle<W> {
        let (head, tail) = self.rest.split_at(n.min(self.rest.len()));
        self.rest = tail;
        BinaryBundle::new(head.to_vec())
    }

    fn take_many(&mut self, count: usize, n: usize) -> Vec<BinaryBundle<W>> {
        (0..count).map(|_| self.take(n)).collect()
    }
}

/// Build the bin circuit over the garbler wires `gb` and evaluator wires
/// `ev`, laid out as by [`GarblerInputs::to_bits`] and
/// [`EvaluatorInputs::to_bits`]. Returns the masked column values to the
/// party that can decode them.
pub(crate) fn bin_circuit<F: FancyBinary>(
    f: &mut F,
    layout: &Layout,
    gb: &[F::Item],
    ev: &[F::Item],
) -> Result<Option<Vec<u64>>, F::Error> {
    let mut gb = Wires { rest: gb };
    let mut ev = Wires { rest: ev };
    let candidates = gb.take_many(layout.nhints, layout.tag_bits);
    let values = (0..layout.nhints)
        .map(|_| gb.take_many(layout.nresponder, VALUE_BITS))
        .collect::<Vec<_>>();
    let features = gb.take_many(layout.nrequester, VALUE_BITS);
    let masks = gb.take_many(layout.ncols(), VALUE_BITS);
    let tag = ev.take(layout.tag_bits);
    let weights = ev.take_many(layout.nresponder, VALUE_BITS);

    let eqs = candidates
        .iter()
        .map(|c| f.bin_eq_bundles(c, &tag))
        .collect::<Result<Vec<F::Item>, F::Error>>()?;
    let member = f.xor_many(&eqs)?;

    let mut cols = Vec::with_capacity(layout.ncols());
    cols.push(f.bin_add_bit(&masks[0], &member)?);
    for (x, r) in features.iter().zip(masks[1..].iter()) {
        let x = f.bin_and_bit(x, &member)?;
        cols.push(f.bin_addition_no_carry(&x, r)?);
    }
    for (c, (w, r)) in weights
        .iter()
        .zip(masks[1 + layout.nrequester..].iter())
        .enumerate()
    {
        // Unmask with the one candidate whose tag matched, if any.
        let mut x = w.clone();
        for (eq, v) in eqs.iter().zip(values.iter()) {
            let y = f.bin_and_bit(&v[c], eq)?;
            x = f.bin_xor(&x, &y)?;
        }
        let x = f.bin_and_bit(&x, &member)?;
        cols.push(f.bin_addition_no_carry(&x, r)?);
    }
    Ok(f
        .bin_outputs(&cols)?
        .map(|zs| zs.into_iter().map(|z| z as u64).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use setops_garble::{dummy::Dummy, Evaluator, FancyInput, Garbler, WireMod2};
    use setops_primitives::AesRng;

    fn random_inputs(
        layout: &Layout,
        hit: Option<usize>,
        rng: &mut AesRng,
    ) -> (GarblerInputs, EvaluatorInputs) {
        let tag = rng.gen::<u128>() & layout.tag_mask();
        let ev = EvaluatorInputs {
            tag,
            masks: (0..layout.nresponder).map(|_| rng.gen()).collect(),
        };
        let mut candidates = (0..layout.nhints)
            .map(|_| rng.gen::<u128>() & layout.tag_mask())
            .collect::<Vec<u128>>();
        if let Some(j) = hit {
            candidates[j] = tag;
        }
        let gb = GarblerInputs {
            candidates,
            values: (0..layout.nhints)
                .map(|_| (0..layout.nresponder).map(|_| rng.gen()).collect())
                .collect(),
            features: (0..layout.nrequester).map(|_| rng.gen()).collect(),
            masks: (0..layout.ncols()).map(|_| rng.gen()).collect(),
        };
        (gb, ev)
    }

    fn expected(layout: &Layout, gb: &GarblerInputs, ev: &EvaluatorInputs) -> Vec<u64> {
        let hit = gb.candidates.iter().position(|c| *c == ev.tag);
        let mut cols = vec![hit.is_some() as u64];
        for x in gb.features.iter() {
            cols.push(if hit.is_some() { *x } else { 0 });
        }
        for c in 0..layout.nresponder {
            cols.push(hit.map_or(0, |j| gb.values[j][c] ^ ev.masks[c]));
        }
        cols.iter()
            .zip(gb.masks.iter())
            .map(|(x, r)| x.wrapping_add(*r))
            .collect()
    }

    fn plaintext(layout: &Layout, gb: &GarblerInputs, ev: &EvaluatorInputs) -> Vec<u64> {
        let mut d = Dummy::new();
        let gw = d.encode_many(&gb.to_bits(layout)).unwrap();
        let ew = d.encode_many(&ev.to_bits(layout)).unwrap();
        bin_circuit(&mut d, layout, &gw, &ew).unwrap().unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]
        #[test]
        fn test_plaintext_matches_formula(
            seed in any::<u128>(),
            nhints in 3usize..=5,
            nrequester in 0usize..3,
            nresponder in 0usize..3,
            hit in proptest::option::of(0usize..3),
        ) {
            let layout = Layout::new(1 << 10, nhints, nrequester, nresponder);
            let mut rng = AesRng::from_seed(seed.into());
            let (gb, ev) = random_inputs(&layout, hit, &mut rng);
            prop_assert_eq!(plaintext(&layout, &gb, &ev), expected(&layout, &gb, &ev));
        }
    }

    #[test]
    fn test_garbled_bin_matches_plaintext() {
        let layout = Layout::new(300, 3, 2, 1);
        let mut rng = AesRng::new();
        for (id, hit) in [None, Some(0), Some(2)].into_iter().enumerate() {
            let (gbi, evi) = random_inputs(&layout, hit, &mut rng);
            let delta = WireMod2::rand_delta(&mut rng);
            let mut gb = Garbler::new(delta, id as u64, AesRng::new());
            let encode = |gb: &mut Garbler<AesRng>, bits: Vec<bool>| -> (Vec<_>, Vec<_>) {
                bits.into_iter().map(|b| gb.encode_wire(b)).unzip()
            };
            let (g0, g1) = encode(&mut gb, gbi.to_bits(&layout));
            let (e0, e1) = encode(&mut gb, evi.to_bits(&layout));
            assert_eq!(bin_circuit(&mut gb, &layout, &g0, &e0).unwrap(), None);
            let gc = gb.finish();
            assert_eq!(gc.ngates(), layout.ngates());
            assert_eq!(gc.noutputs(), VALUE_BITS * layout.ncols());

            let mut ev = Evaluator::new(&gc, id as u64);
            let out = bin_circuit(&mut ev, &layout, &g1, &e1).unwrap().unwrap();
            ev.finish().unwrap();
            assert_eq!(out, expected(&layout, &gbi, &evi));
        }
    }

    #[test]
    fn test_tag_width() {
        assert_eq!(Layout::new(1024, 4, 0, 0).tag_bits, 52);
        assert_eq!(Layout::new(1 << 20, 4, 0, 0).tag_bits, 62);
        assert_eq!(Layout::new(1 << 40, 4, 0, 0).tag_bits, 82);
    }
}
