// -*- mode: rust; -*-
//
// This file is part of `setops-garble`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Structs and functions for creating and evaluating garbled circuits.
//!
//! Garbling writes into an in-memory table instead of a channel. Every
//! circuit carries an identifier that is mixed into all gate tweaks, so
//! circuits sharing one `delta` can be garbled on different threads and
//! evaluated in any order.

mod evaluator;
mod garbler;

pub use crate::garble::{evaluator::Evaluator, garbler::Garbler};

use setops_primitives::{utils, AbstractChannel, Block};

/// The material the evaluator needs for one circuit: ciphertexts in gate
/// order (constants and AND gates) and one decoding bit per output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GarbledCircuit {
    gates: Vec<Block>,
    decoding: Vec<bool>,
}

impl GarbledCircuit {
    /// Number of ciphertexts in the table.
    pub fn ngates(&self) -> usize {
        self.gates.len()
    }

    /// Number of output decoding bits.
    pub fn noutputs(&self) -> usize {
        self.decoding.len()
    }

    /// Write the circuit as `usize n | n blocks | usize m | ⌈m/8⌉ bytes`.
    pub fn write<C: AbstractChannel>(&self, channel: &mut C) -> std::io::Result<()> {
        channel.write_usize(self.gates.len())?;
        channel.write_blocks(&self.gates)?;
        channel.write_usize(self.decoding.len())?;
        channel.write_bytes(&utils::pack_bits(&self.decoding))
    }

    /// Read a circuit written by `write`, refusing tables of more than `max`
    /// ciphertexts or outputs.
    pub fn read<C: AbstractChannel>(channel: &mut C, max: usize) -> std::io::Result<Self> {
        let ngates = channel.read_usize_bounded(max)?;
        let gates = channel.read_blocks(ngates)?;
        let noutputs = channel.read_usize_bounded(max)?;
        let bytes = channel.read_vec((noutputs + 7) / 8)?;
        let decoding = utils::unpack_bits(&bytes, noutputs);
        Ok(Self { gates, decoding })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dummy::Dummy, BinaryBundle, BinaryGadgets, Fancy, FancyBinary, WireMod2};
    use proptest::prelude::*;
    use setops_primitives::{unix_channel_pair, AesRng};

    // x * [x == y] + z (mod 2^64)
    fn gadget<F: Fancy + FancyBinary>(
        f: &mut F,
        x: &BinaryBundle<F::Item>,
        y: &BinaryBundle<F::Item>,
        z: &BinaryBundle<F::Item>,
    ) -> Result<Option<u128>, F::Error> {
        let eq = f.bin_eq_bundles(x, y)?;
        let xm = f.bin_and_bit(x, &eq)?;
        let s = f.bin_addition_no_carry(&xm, z)?;
        let s = f.bin_add_bit(&s, &eq)?;
        let k = f.bin_constant_bundle(0xff, 64)?;
        let s = f.bin_xor(&s, &k)?;
        f.bin_output(&s)
    }

    fn garble_and_eval(x: u64, y: u64, z: u64, circuit_id: u64) -> u128 {
        let mut rng = AesRng::new();
        let delta = WireMod2::rand_delta(&mut rng);
        let mut gb = Garbler::new(delta, circuit_id, AesRng::new());
        let encode = |gb: &mut Garbler<AesRng>, v: u64| {
            let (zeros, actual): (Vec<_>, Vec<_>) = crate::util::u128_to_bits(v as u128, 64)
                .into_iter()
                .map(|b| gb.encode_wire(b))
                .unzip();
            (BinaryBundle::new(zeros), BinaryBundle::new(actual))
        };
        let (x0, x1) = encode(&mut gb, x);
        let (y0, y1) = encode(&mut gb, y);
        let (z0, z1) = encode(&mut gb, z);
        assert_eq!(gadget(&mut gb, &x0, &y0, &z0).unwrap(), None);
        let gc = gb.finish();

        let mut ev = Evaluator::new(&gc, circuit_id);
        let out = gadget(&mut ev, &x1, &y1, &z1).unwrap().unwrap();
        ev.finish().unwrap();
        out
    }

    fn expected(x: u64, y: u64, z: u64) -> u128 {
        let mut d = Dummy::new();
        let xs = d.bin_constant_bundle(x as u128, 64).unwrap();
        let ys = d.bin_constant_bundle(y as u128, 64).unwrap();
        let zs = d.bin_constant_bundle(z as u128, 64).unwrap();
        gadget(&mut d, &xs, &ys, &zs).unwrap().unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn test_garbling_matches_plaintext(x in any::<u64>(), y in any::<u64>(), z in any::<u64>(), id in any::<u64>()) {
            prop_assert_eq!(garble_and_eval(x, y, z, id), expected(x, y, z));
            prop_assert_eq!(garble_and_eval(x, x, z, id), expected(x, x, z));
        }
    }

    #[test]
    fn test_truncated_table_is_rejected() {
        let mut rng = AesRng::new();
        let delta = WireMod2::rand_delta(&mut rng);
        let mut gb = Garbler::new(delta, 0, AesRng::new());
        let (a0, a1) = gb.encode_wire(true);
        let (b0, b1) = gb.encode_wire(true);
        let c = gb.and(&a0, &b0).unwrap();
        gb.output(&c).unwrap();
        let mut gc = gb.finish();
        assert_eq!(gc.ngates(), 2);

        let mut longer = gc.clone();
        longer.gates.push(Block::default());
        let mut ev = Evaluator::new(&longer, 0);
        let c = ev.and(&a1, &b1).unwrap();
        assert_eq!(ev.output(&c).unwrap(), Some(true));
        assert!(ev.finish().is_err());

        gc.gates.pop();
        let mut ev = Evaluator::new(&gc, 0);
        assert!(ev.and(&a1, &b1).is_err());
    }

    #[test]
    fn test_channel_transfer() {
        let mut rng = AesRng::new();
        let delta = WireMod2::rand_delta(&mut rng);
        let mut gb = Garbler::new(delta, 3, AesRng::new());
        let x = gb.bin_constant_bundle(12345, 16).unwrap();
        let y = gb.bin_constant_bundle(54321, 16).unwrap();
        let s = gb.bin_addition_no_carry(&x, &y).unwrap();
        gb.bin_output(&s).unwrap();
        let gc = gb.finish();
        let gc_ = gc.clone();

        let (mut sender, mut receiver) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            gc_.write(&mut sender).unwrap();
            sender.flush().unwrap();
        });
        let received = GarbledCircuit::read(&mut receiver, 1 << 10).unwrap();
        handle.join().unwrap();
        assert_eq!(received, gc);

        let mut ev = Evaluator::new(&received, 3);
        let x = ev.bin_constant_bundle(0, 16).unwrap();
        let y = ev.bin_constant_bundle(0, 16).unwrap();
        let s = ev.bin_addition_no_carry(&x, &y).unwrap();
        assert_eq!(ev.bin_output(&s).unwrap(), Some((12345 + 54321) % (1 << 16)));
        ev.finish().unwrap();
    }
}
