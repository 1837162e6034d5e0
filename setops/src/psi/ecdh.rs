// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Diffie-Hellman private set intersection over Ristretto255
//! (cf. Huberman-Franklin-Hogg, and Meadows '86).
//!
//! The receiver sends `H(y)·a`; the sender answers with `H(y)·a·b` in the
//! same order, followed by short tags of `H(x)·b` for its own elements in a
//! random order. Removing `a` leaves `H(y)·b`, whose tag is in the sender's
//! list exactly when `y` is a common element.

use crate::Error;
use curve25519_dalek::ristretto::RistrettoPoint;
use rand::{seq::SliceRandom, CryptoRng, RngCore};
use rayon::prelude::*;
use setops_primitives::{
    ecc::{self, EcCipher},
    AbstractChannel,
};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const DOMAIN: &[u8] = b"setops/ecdh-psi";
/// Bytes of each comparison tag.
pub const TAG_SIZE: usize = 12;

type Tag = [u8; TAG_SIZE];

fn tag(pt: &RistrettoPoint) -> Tag {
    let digest = Sha256::digest(ecc::compress(pt));
    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(&digest[..TAG_SIZE]);
    out
}

fn hash_all<T: AsRef<[u8]> + Sync>(inputs: &[T], cipher: &EcCipher) -> Vec<RistrettoPoint> {
    inputs
        .par_iter()
        .map(|x| cipher.encrypt(&ecc::hash_to_point(DOMAIN, x.as_ref())))
        .collect()
}

/// ECDH-PSI sender.
pub struct Sender {
    cipher: EcCipher,
}

/// ECDH-PSI receiver.
pub struct Receiver {
    cipher: EcCipher,
}

impl Sender {
    /// Sample the sender's secret exponent.
    pub fn init<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Self {
        Self {
            cipher: EcCipher::new(rng),
        }
    }

    /// Run the PSI protocol over `inputs` against a receiver holding
    /// `nreceiver` elements.
    pub fn send<T, C, RNG>(
        &mut self,
        inputs: &[T],
        nreceiver: usize,
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<(), Error>
    where
        T: AsRef<[u8]> + Sync,
        C: AbstractChannel,
        RNG: CryptoRng + RngCore,
    {
        let blinded = (0..nreceiver)
            .map(|_| channel.read_pt())
            .collect::<Result<Vec<RistrettoPoint>, _>>()?;
        let reblinded = blinded
            .par_iter()
            .map(|pt| self.cipher.encrypt(pt))
            .collect::<Vec<RistrettoPoint>>();
        for pt in reblinded.iter() {
            channel.write_pt(pt)?;
        }

        let mut tags = hash_all(inputs, &self.cipher)
            .par_iter()
            .map(tag)
            .collect::<Vec<Tag>>();
        tags.shuffle(rng);
        for t in tags.iter() {
            channel.write_bytes(t)?;
        }
        channel.flush()?;
        Ok(())
    }
}

impl Receiver {
    /// Sample the receiver's secret exponent.
    pub fn init<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Self {
        Self {
            cipher: EcCipher::new(rng),
        }
    }

    /// Run the PSI protocol over `inputs` against a sender holding `nsender`
    /// elements. Returns the positions in `inputs` of the common elements, in
    /// increasing order.
    pub fn receive<T, C>(
        &mut self,
        inputs: &[T],
        nsender: usize,
        channel: &mut C,
    ) -> Result<Vec<usize>, Error>
    where
        T: AsRef<[u8]> + Sync,
        C: AbstractChannel,
    {
        for pt in hash_all(inputs, &self.cipher).iter() {
            channel.write_pt(pt)?;
        }
        channel.flush()?;

        let reblinded = (0..inputs.len())
            .map(|_| channel.read_pt())
            .collect::<Result<Vec<RistrettoPoint>, _>>()?;
        let mut tags = HashSet::with_capacity(nsender);
        for _ in 0..nsender {
            let mut t = [0u8; TAG_SIZE];
            channel.read_bytes(&mut t)?;
            tags.insert(t);
        }

        let mine = reblinded
            .par_iter()
            .map(|pt| tag(&self.cipher.decrypt(pt)))
            .collect::<Vec<Tag>>();
        Ok(mine
            .iter()
            .enumerate()
            .filter(|(_, t)| tags.contains(*t))
            .map(|(i, _)| i)
            .collect())
    }
}
