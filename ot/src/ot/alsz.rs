//! Implementation of the Asharov-Lindell-Schneider-Zohner oblivious transfer
//! extension protocol (cf. <https://eprint.iacr.org/2016/602>, Protocol 4).

#![allow(non_upper_case_globals)]

use crate::{
    errors::Error,
    ot::{Receiver as OtReceiver, Sender as OtSender},
};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use setops_primitives::{
    utils, AbstractChannel, AesHash, AesRng, Block, SemiHonest, AES_HASH,
};
use std::marker::PhantomData;

// Number of base OTs, i.e. the security parameter.
const nrows: usize = 128;

/// Oblivious transfer sender.
pub struct Sender<OT: OtReceiver<Msg = Block> + SemiHonest> {
    _ot: PhantomData<OT>,
    hash: AesHash,
    s: Vec<bool>,
    s_: Block,
    rngs: Vec<AesRng>,
    counter: u128,
}
/// Oblivious transfer receiver.
pub struct Receiver<OT: OtSender<Msg = Block> + SemiHonest> {
    _ot: PhantomData<OT>,
    hash: AesHash,
    rngs: Vec<(AesRng, AesRng)>,
    counter: u128,
}

// Round `m` up to a multiple of 8 so the matrix columns fill whole bytes.
#[inline]
fn padded(m: usize) -> usize {
    if m % 8 != 0 {
        m + (8 - m % 8)
    } else {
        m
    }
}

#[inline]
fn row(m: &[u8], j: usize) -> Block {
    let mut b = Block::default();
    b.as_mut().copy_from_slice(&m[j * 16..(j + 1) * 16]);
    b
}

impl<OT: OtReceiver<Msg = Block> + SemiHonest> Sender<OT> {
    fn send_setup<C: AbstractChannel>(
        &mut self,
        channel: &mut C,
        m: usize,
    ) -> Result<Vec<u8>, Error> {
        let ncols = padded(m);
        let mut qs = vec![0u8; nrows * ncols / 8];
        let mut u = vec![0u8; ncols / 8];
        let zero = vec![0u8; ncols / 8];
        for (j, (b, rng)) in self.s.iter().zip(self.rngs.iter_mut()).enumerate() {
            let range = j * ncols / 8..(j + 1) * ncols / 8;
            let q = &mut qs[range];
            channel.read_bytes(&mut u)?;
            rng.fill_bytes(q);
            utils::xor_inplace(q, if *b { &u } else { &zero });
        }
        Ok(utils::transpose(&qs, nrows, ncols))
    }
}

impl<OT: OtReceiver<Msg = Block> + SemiHonest> OtSender for Sender<OT> {
    type Msg = Block;

    fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let mut ot = OT::init(channel, rng)?;
        let s_ = rng.gen::<Block>();
        let s = utils::unpack_bits(s_.as_ref(), nrows);
        let ks = ot.receive(channel, &s, rng)?;
        let rngs = ks
            .into_iter()
            .map(AesRng::from_seed)
            .collect::<Vec<AesRng>>();
        Ok(Self {
            _ot: PhantomData::<OT>,
            hash: AES_HASH.clone(),
            s,
            s_,
            rngs,
            counter: 0,
        })
    }

    fn send<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        inputs: &[(Self::Msg, Self::Msg)],
        _: &mut RNG,
    ) -> Result<(), Error> {
        let m = inputs.len();
        let qs = self.send_setup(channel, m)?;
        for (j, input) in inputs.iter().enumerate() {
            let tweak = Block(self.counter + j as u128);
            let q = row(&qs, j);
            let y0 = self.hash.tccr_hash(tweak, q) ^ input.0;
            let y1 = self.hash.tccr_hash(tweak, q ^ self.s_) ^ input.1;
            channel.write_block(&y0)?;
            channel.write_block(&y1)?;
        }
        channel.flush()?;
        self.counter += m as u128;
        Ok(())
    }
}

impl<OT: OtSender<Msg = Block> + SemiHonest> Receiver<OT> {
    fn receive_setup<C: AbstractChannel>(
        &mut self,
        channel: &mut C,
        r: &[u8],
        m: usize,
    ) -> Result<Vec<u8>, Error> {
        let ncols = padded(m);
        let mut ts = vec![0u8; nrows * ncols / 8];
        let mut g = vec![0u8; ncols / 8];
        for (j, (rng0, rng1)) in self.rngs.iter_mut().enumerate() {
            let range = j * ncols / 8..(j + 1) * ncols / 8;
            let t = &mut ts[range];
            rng0.fill_bytes(t);
            rng1.fill_bytes(&mut g);
            utils::xor_inplace(&mut g, t);
            utils::xor_inplace(&mut g, r);
            channel.write_bytes(&g)?;
        }
        channel.flush()?;
        Ok(utils::transpose(&ts, nrows, ncols))
    }
}

impl<OT: OtSender<Msg = Block> + SemiHonest> OtReceiver for Receiver<OT> {
    type Msg = Block;

    fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let mut ot = OT::init(channel, rng)?;
        let ks = (0..nrows)
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect::<Vec<(Block, Block)>>();
        ot.send(channel, &ks, rng)?;
        let rngs = ks
            .into_iter()
            .map(|(k0, k1)| (AesRng::from_seed(k0), AesRng::from_seed(k1)))
            .collect::<Vec<(AesRng, AesRng)>>();
        Ok(Self {
            _ot: PhantomData::<OT>,
            hash: AES_HASH.clone(),
            rngs,
            counter: 0,
        })
    }

    fn receive<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        inputs: &[bool],
        _: &mut RNG,
    ) -> Result<Vec<Self::Msg>, Error> {
        let mut r = utils::pack_bits(inputs);
        r.resize(padded(inputs.len()) / 8, 0);
        let ts = self.receive_setup(channel, &r, inputs.len())?;
        let mut out = Vec::with_capacity(inputs.len());
        for (j, b) in inputs.iter().enumerate() {
            let tweak = Block(self.counter + j as u128);
            let y0 = channel.read_block()?;
            let y1 = channel.read_block()?;
            let y = if *b { y1 } else { y0 };
            out.push(y ^ self.hash.tccr_hash(tweak, row(&ts, j)));
        }
        self.counter += inputs.len() as u128;
        Ok(out)
    }
}

impl<OT: OtReceiver<Msg = Block> + SemiHonest> SemiHonest for Sender<OT> {}
impl<OT: OtSender<Msg = Block> + SemiHonest> SemiHonest for Receiver<OT> {}
