//! Chou-Orlandi "simplest" oblivious transfer over Ristretto255 (cf.
//! <https://eprint.iacr.org/2015/267>).
//!
//! Only used to seed the OT extension, so every message is a single block.
//! Keys are `H(tweak, point)`, where the tweak counts transfers across calls
//! on the same instance.

use crate::{
    errors::Error,
    ot::{Receiver as OtReceiver, Sender as OtSender},
};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint, scalar::Scalar,
};
use rand::{CryptoRng, Rng};
use setops_primitives::{ecc, AbstractChannel, Block, SemiHonest};
use std::ops::Range;

/// Reserve `n` tweaks starting at `*next`.
fn tweaks(next: &mut u128, n: usize) -> Range<u128> {
    let start = *next;
    *next += n as u128;
    start..*next
}

/// Oblivious transfer sender. Publishes `S = yG` once.
pub struct Sender {
    y: Scalar,
    // `yS`, the offset between the two keys of every transfer.
    ys: RistrettoPoint,
    next_tweak: u128,
}

impl OtSender for Sender {
    type Msg = Block;

    fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let y = ecc::random_scalar(rng);
        let s = RISTRETTO_BASEPOINT_POINT * y;
        channel.write_pt(&s)?;
        channel.flush()?;
        Ok(Self {
            y,
            ys: s * y,
            next_tweak: 0,
        })
    }

    fn send<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        inputs: &[(Block, Block)],
        _: &mut RNG,
    ) -> Result<(), Error> {
        let rs = (0..inputs.len())
            .map(|_| channel.read_pt())
            .collect::<Result<Vec<RistrettoPoint>, _>>()?;
        let tweaks = tweaks(&mut self.next_tweak, inputs.len());
        for ((m0, m1), (r, tweak)) in inputs.iter().zip(rs.into_iter().zip(tweaks)) {
            let yr = r * self.y;
            channel.write_block(&(*m0 ^ Block::hash_pt(tweak, &yr)))?;
            channel.write_block(&(*m1 ^ Block::hash_pt(tweak, &(yr - self.ys))))?;
        }
        channel.flush()?;
        Ok(())
    }
}

/// Oblivious transfer receiver.
pub struct Receiver {
    s: RistrettoPoint,
    next_tweak: u128,
}

impl OtReceiver for Receiver {
    type Msg = Block;

    fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        _: &mut RNG,
    ) -> Result<Self, Error> {
        let s = channel.read_pt()?;
        Ok(Self { s, next_tweak: 0 })
    }

    fn receive<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        inputs: &[bool],
        rng: &mut RNG,
    ) -> Result<Vec<Block>, Error> {
        let tweaks = tweaks(&mut self.next_tweak, inputs.len());
        let mut keys = Vec::with_capacity(inputs.len());
        for (b, tweak) in inputs.iter().zip(tweaks) {
            // `R = xG`, shifted by `S` to choose the second message.
            let x = ecc::random_scalar(rng);
            let r = RISTRETTO_BASEPOINT_POINT * x;
            channel.write_pt(&if *b { r + self.s } else { r })?;
            keys.push(Block::hash_pt(tweak, &(self.s * x)));
        }
        channel.flush()?;
        inputs
            .iter()
            .zip(keys)
            .map(|(b, k)| {
                let c0 = channel.read_block()?;
                let c1 = channel.read_block()?;
                Ok(k ^ if *b { c1 } else { c0 })
            })
            .collect()
    }
}

impl SemiHonest for Sender {}
impl SemiHonest for Receiver {}

#[cfg(test)]
mod tests {
    use super::*;
    use setops_primitives::{unix_channel_pair, AesRng};

    #[test]
    fn test_tweaks_advance() {
        let mut next = 0;
        assert_eq!(tweaks(&mut next, 3), 0..3);
        assert_eq!(tweaks(&mut next, 0), 3..3);
        assert_eq!(tweaks(&mut next, 2), 3..5);
    }

    #[test]
    fn test_repeated_message_gets_fresh_keys() {
        // The same pair sent twice must not produce identical ciphertexts.
        let (mut tx, mut rx) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let mut ot = Sender::init(&mut tx, &mut rng).unwrap();
            let m = (Block::from(1u128), Block::from(2u128));
            ot.send(&mut tx, &[m, m], &mut rng).unwrap();
        });
        let mut rng = AesRng::new();
        let s = rx.read_pt().unwrap();
        let mut cts = Vec::new();
        // Choose 0 twice with the same `x`.
        let x = ecc::random_scalar(&mut rng);
        for _ in 0..2 {
            rx.write_pt(&(RISTRETTO_BASEPOINT_POINT * x)).unwrap();
        }
        rx.flush().unwrap();
        for _ in 0..2 {
            cts.push((rx.read_block().unwrap(), rx.read_block().unwrap()));
        }
        handle.join().unwrap();
        assert_ne!(cts[0], cts[1]);
        assert_eq!(cts[0].0 ^ Block::hash_pt(0, &(s * x)), Block::from(1u128));
        assert_eq!(cts[1].0 ^ Block::hash_pt(1, &(s * x)), Block::from(1u128));
    }
}
