//! Implementation of the batched, related-key oblivious pseudorandom function
//! (BaRK-OPRF) protocol of Kolesnikov, Kumaresan, Rosulek, and Trieu (cf.
//! <https://eprint.iacr.org/2016/799>, Figure 2).
//!
//! The raw 512-bit correlation `q_j ⊕ (C(x) ∧ s)` is hashed down to a
//! 128-bit output, so revealing (a prefix of) one output says nothing about
//! the others.

#![allow(non_upper_case_globals)]

use super::prc::PseudorandomCode;
use super::{Output, Seed};
use crate::{
    errors::Error,
    ot::{Receiver as OtReceiver, Sender as OtSender},
};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use setops_primitives::{cointoss, utils, AbstractChannel, AesRng, Block, Block512, SemiHonest};
use std::marker::PhantomData;

// Width of the pseudorandom code, i.e. the number of base OTs.
const ncols: usize = 512;

// Round up if necessary so that `m mod 16 ≡ 0`.
#[inline]
fn padded(m: usize) -> usize {
    if m % 16 != 0 {
        m + (16 - m % 16)
    } else {
        m
    }
}

#[inline]
fn hash_output(t: &[u8]) -> Block {
    let h = blake3::hash(t);
    let mut out = [0u8; 16];
    out.copy_from_slice(&h.as_bytes()[..16]);
    Block::from(out)
}

fn coins<RNG: CryptoRng + Rng>(rng: &mut RNG) -> [Block; 4] {
    [rng.gen(), rng.gen(), rng.gen(), rng.gen()]
}

fn pseudorandom_code(keys: Vec<Block>) -> PseudorandomCode {
    PseudorandomCode::new(keys[0], keys[1], keys[2], keys[3])
}

#[inline]
fn to_block512(bytes: &[u8]) -> Block512 {
    let mut b = Block512::default();
    b.as_mut().copy_from_slice(bytes);
    b
}

/// KKRT oblivious PRF sender, generic over the OT extension receiver that
/// carries the column keys.
pub struct Sender<OT> {
    _ot: PhantomData<OT>,
    s: Vec<bool>,
    s_: Block512,
    code: PseudorandomCode,
    rngs: Vec<AesRng>,
}

impl<OT: OtReceiver<Msg = Block> + SemiHonest> Sender<OT> {
    /// Agree on the pseudorandom code and receive one column key per bit of
    /// the secret `s`.
    pub fn init<C, RNG>(channel: &mut C, rng: &mut RNG) -> Result<Self, Error>
    where
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let mut ot = OT::init(channel, rng)?;
        let s_ = rng.gen::<Block512>();
        let s = utils::unpack_bits(s_.as_ref(), ncols);
        let code = pseudorandom_code(cointoss::send(channel, &coins(rng))?);
        let rngs = ot
            .receive(channel, &s, rng)?
            .into_iter()
            .map(AesRng::from_seed)
            .collect();
        Ok(Self {
            _ot: PhantomData,
            s,
            s_,
            code,
            rngs,
        })
    }
}

impl<OT> Sender<OT> {
    /// Run `m` instances and return their seeds. Reads one masked column
    /// per bit of `s`.
    pub fn send<C: AbstractChannel>(
        &mut self,
        channel: &mut C,
        m: usize,
    ) -> Result<Vec<Seed>, Error> {
        let nrows = padded(m);
        let mut u = vec![0u8; nrows / 8];
        let mut qs = vec![0u8; nrows * ncols / 8];
        for (j, (b, rng)) in self.s.iter().zip(self.rngs.iter_mut()).enumerate() {
            let q = &mut qs[j * nrows / 8..(j + 1) * nrows / 8];
            rng.fill_bytes(q);
            channel.read_bytes(&mut u)?;
            if *b {
                utils::xor_inplace(q, &u);
            }
        }
        let qs = utils::transpose(&qs, ncols, nrows);
        Ok(qs.chunks(ncols / 8).take(m).map(to_block512).collect())
    }

    /// The PRF under `seed` at `input`.
    pub fn compute(&self, seed: &Seed, input: Block) -> Output {
        let t = *seed ^ (self.code.encode(input) & self.s_);
        hash_output(t.as_ref())
    }
}

/// KKRT oblivious PRF receiver, generic over the OT extension sender that
/// carries the column keys.
pub struct Receiver<OT> {
    _ot: PhantomData<OT>,
    code: PseudorandomCode,
    rngs: Vec<(AesRng, AesRng)>,
}

impl<OT: OtSender<Msg = Block> + SemiHonest> Receiver<OT> {
    /// Agree on the pseudorandom code and send a pair of keys per column.
    pub fn init<C, RNG>(channel: &mut C, rng: &mut RNG) -> Result<Self, Error>
    where
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let mut ot = OT::init(channel, rng)?;
        let code = pseudorandom_code(cointoss::receive(channel, &coins(rng))?);
        let ks = (0..ncols)
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect::<Vec<(Block, Block)>>();
        ot.send(channel, &ks, rng)?;
        let rngs = ks
            .into_iter()
            .map(|(k0, k1)| (AesRng::from_seed(k0), AesRng::from_seed(k1)))
            .collect();
        Ok(Self {
            _ot: PhantomData,
            code,
            rngs,
        })
    }
}

impl<OT> Receiver<OT> {
    /// Run one instance per input and return the outputs in input order.
    pub fn receive<C: AbstractChannel>(
        &mut self,
        channel: &mut C,
        inputs: &[Block],
    ) -> Result<Vec<Output>, Error> {
        let m = inputs.len();
        let nrows = padded(m);
        // Row `i` of `cs` is `C(inputs[i])`; padding rows stay zero.
        let mut cs = vec![0u8; nrows * ncols / 8];
        cs.par_chunks_mut(ncols / 8)
            .zip(inputs.par_iter())
            .for_each(|(row, x)| row.copy_from_slice(self.code.encode(*x).as_ref()));
        let cs = utils::transpose(&cs, nrows, ncols);
        let mut ts = vec![0u8; nrows * ncols / 8];
        let mut u = vec![0u8; nrows / 8];
        for (j, (rng0, rng1)) in self.rngs.iter_mut().enumerate() {
            let column = j * nrows / 8..(j + 1) * nrows / 8;
            let t = &mut ts[column.clone()];
            rng0.fill_bytes(t);
            rng1.fill_bytes(&mut u);
            utils::xor_inplace(&mut u, t);
            utils::xor_inplace(&mut u, &cs[column]);
            channel.write_bytes(&u)?;
        }
        channel.flush()?;
        let ts = utils::transpose(&ts, ncols, nrows);
        Ok(ts
            .par_chunks(ncols / 8)
            .take(m)
            .map(hash_output)
            .collect())
    }
}

impl<OT> SemiHonest for Sender<OT> {}
impl<OT> SemiHonest for Receiver<OT> {}

#[cfg(test)]
mod tests {
    use crate::oprf::{KkrtReceiver, KkrtSender};
    use setops_primitives::{unix_channel_pair, AesRng, Block};

    fn rand_block_vec(size: usize) -> Vec<Block> {
        (0..size).map(|_| rand::random::<Block>()).collect()
    }

    fn _test_oprf(n: usize) {
        let selections = rand_block_vec(n);
        let selections_ = selections.clone();
        let (mut sender, mut receiver) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let mut oprf = KkrtSender::init(&mut sender, &mut rng).unwrap();
            let seeds = oprf.send(&mut sender, n).unwrap();
            let matching = selections_
                .iter()
                .zip(seeds.iter())
                .map(|(inp, seed)| oprf.compute(seed, *inp))
                .collect::<Vec<Block>>();
            let other = seeds
                .iter()
                .map(|seed| oprf.compute(seed, rand::random::<Block>()))
                .collect::<Vec<Block>>();
            (matching, other)
        });
        let mut rng = AesRng::new();
        let mut oprf = KkrtReceiver::init(&mut receiver, &mut rng).unwrap();
        let outputs = oprf.receive(&mut receiver, &selections).unwrap();
        let (matching, other) = handle.join().unwrap();
        assert_eq!(outputs.len(), n);
        for j in 0..n {
            assert_eq!(matching[j], outputs[j]);
            assert_ne!(other[j], outputs[j]);
        }
    }

    #[test]
    fn test_oprf() {
        _test_oprf(1);
        _test_oprf(8);
        _test_oprf(11);
        _test_oprf(64);
    }

    #[test]
    fn test_batches_share_setup() {
        let (mut sender, mut receiver) = unix_channel_pair().unwrap();
        let inputs = rand_block_vec(5);
        let inputs_ = inputs.clone();
        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let mut oprf = KkrtSender::init(&mut sender, &mut rng).unwrap();
            let mut outs = Vec::new();
            for _ in 0..2 {
                let seeds = oprf.send(&mut sender, inputs_.len()).unwrap();
                outs.push(
                    seeds
                        .iter()
                        .zip(inputs_.iter())
                        .map(|(seed, x)| oprf.compute(seed, *x))
                        .collect::<Vec<Block>>(),
                );
            }
            outs
        });
        let mut rng = AesRng::new();
        let mut oprf = KkrtReceiver::init(&mut receiver, &mut rng).unwrap();
        let first = oprf.receive(&mut receiver, &inputs).unwrap();
        let second = oprf.receive(&mut receiver, &inputs).unwrap();
        let outs = handle.join().unwrap();
        assert_eq!(outs[0], first);
        assert_eq!(outs[1], second);
        // Fresh seeds per batch.
        assert_ne!(first, second);
    }
}
