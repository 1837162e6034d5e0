// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Implementation of the Pinkas-Schneider-Zohner private set intersection
//! protocol (cf. <https://eprint.iacr.org/2014/447>) as specified by
//! Kolesnikov-Kumaresan-Rosulek-Trieu (cf. <https://eprint.iacr.org/2016/799>).
//!
//! The receiver cuckoo-hashes its elements and runs one OPRF per bin. The
//! sender evaluates the PRF of every bin each of its elements could occupy
//! and sends truncated outputs, one shuffled set per hash function.

use crate::{
    config::KkrtParams,
    cuckoo::{compute_masksize, compute_nbins, tag, CuckooHash},
    utils, Error,
};
use itertools::Itertools;
use log::warn;
use rand::{seq::SliceRandom, CryptoRng, Rng};
use rayon::prelude::*;
use setops_ot::oprf;
use setops_primitives::{cointoss, AbstractChannel, Block};
use std::collections::HashSet;

/// Status byte announcing a usable cuckoo table.
pub(crate) const CUCKOO_OK: u8 = 0;
/// Status byte announcing a failed cuckoo construction.
pub(crate) const CUCKOO_FAILED: u8 = 1;

/// Read the peer's cuckoo status and table size, which must be `expected`.
pub(crate) fn read_table_size<C: AbstractChannel>(
    channel: &mut C,
    expected: usize,
) -> Result<usize, Error> {
    match channel.read_u8()? {
        CUCKOO_OK => {}
        CUCKOO_FAILED => return Err(Error::PeerCuckooFailure),
        s => {
            return Err(Error::ProtocolViolation(format!(
                "unknown cuckoo status {}",
                s
            )))
        }
    }
    let nbins = channel.read_usize()?;
    if nbins != expected {
        return Err(Error::ProtocolViolation(format!(
            "peer announced {} bins, expected {}",
            nbins, expected
        )));
    }
    Ok(nbins)
}

/// Build a cuckoo table and announce its size, or announce the failure.
pub(crate) fn build_table<C: AbstractChannel>(
    channel: &mut C,
    inputs: &[Block],
    nhashes: usize,
    nbins: usize,
    max_evictions: usize,
) -> Result<CuckooHash, Error> {
    match CuckooHash::new(inputs, nhashes, nbins, max_evictions) {
        Ok(tbl) => {
            channel.write_u8(CUCKOO_OK)?;
            channel.write_usize(nbins)?;
            Ok(tbl)
        }
        Err(e) => {
            warn!("cuckoo hashing of {} items failed: {}", inputs.len(), e);
            channel.write_u8(CUCKOO_FAILED)?;
            channel.flush()?;
            Err(e)
        }
    }
}

/// KKRT-PSI sender.
pub struct Sender {
    oprf: oprf::KkrtSender,
}

/// KKRT-PSI receiver.
pub struct Receiver {
    oprf: oprf::KkrtReceiver,
}

impl Sender {
    /// Initialize the PSI sender.
    pub fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let oprf = oprf::KkrtSender::init(channel, rng)?;
        Ok(Self { oprf })
    }

    /// Run the PSI protocol over `inputs` against a receiver holding
    /// `nreceiver` elements.
    pub fn send<T, C, RNG>(
        &mut self,
        inputs: &[T],
        nreceiver: usize,
        params: &KkrtParams,
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<(), Error>
    where
        T: AsRef<[u8]> + Sync,
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let key = cointoss::send(channel, &[rng.gen()])?[0];
        let inputs = utils::compress_and_hash_inputs(inputs, key);
        let masksize = compute_masksize(nreceiver.max(inputs.len()))?;
        let nbins = read_table_size(channel, compute_nbins(nreceiver, params.epsilon))?;
        let seeds = self.oprf.send(channel, nbins)?;

        // For each hash function `hᵢ`, construct set `Hᵢ = {F(k_{hᵢ(x)}, x ||
        // i) | x ∈ X)}`, randomly permute it, and send it to the receiver.
        let mut indices = (0..inputs.len()).collect_vec();
        for i in 0..params.fun_num {
            indices.shuffle(rng);
            let outputs = indices
                .par_iter()
                .map(|&j| {
                    let bin = CuckooHash::bin(inputs[j], i, nbins);
                    self.oprf.compute(&seeds[bin], tag(inputs[j], i))
                })
                .collect::<Vec<Block>>();
            for out in outputs.iter() {
                channel.write_bytes(&out.as_ref()[..masksize])?;
            }
        }
        channel.flush()?;
        Ok(())
    }
}

impl Receiver {
    /// Initialize the PSI receiver.
    pub fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let oprf = oprf::KkrtReceiver::init(channel, rng)?;
        Ok(Self { oprf })
    }

    /// Run the PSI protocol over `inputs` against a sender holding `nsender`
    /// elements. Returns the positions in `inputs` of the common elements, in
    /// increasing order.
    pub fn receive<T, C, RNG>(
        &mut self,
        inputs: &[T],
        nsender: usize,
        params: &KkrtParams,
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Vec<usize>, Error>
    where
        T: AsRef<[u8]> + Sync,
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let key = cointoss::receive(channel, &[rng.gen()])?[0];
        let inputs = utils::compress_and_hash_inputs(inputs, key);
        let masksize = compute_masksize(nsender.max(inputs.len()))?;
        let nbins = compute_nbins(inputs.len(), params.epsilon);
        let tbl = build_table(
            channel,
            &inputs,
            params.fun_num,
            nbins,
            params.max_evictions,
        )?;
        let outputs = self.oprf.receive(channel, &tbl.tagged_entries())?;

        let mut hs = vec![HashSet::with_capacity(nsender); params.fun_num];
        for h in hs.iter_mut() {
            for _ in 0..nsender {
                h.insert(channel.read_vec(masksize)?);
            }
        }

        let mut intersection = tbl
            .items
            .iter()
            .zip(outputs.iter())
            .filter_map(|(opt_item, output)| {
                opt_item.as_ref().and_then(|item| {
                    hs[item.hash_index]
                        .contains(&output.as_ref()[..masksize])
                        .then_some(item.input_index)
                })
            })
            .collect::<Vec<usize>>();
        intersection.sort_unstable();
        Ok(intersection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use setops_primitives::{unix_channel_pair, AesRng};

    fn run(
        sender_set: Vec<String>,
        receiver_set: Vec<String>,
        params: KkrtParams,
    ) -> Result<Vec<usize>, Error> {
        let (mut tx, mut rx) = unix_channel_pair().unwrap();
        let nreceiver = receiver_set.len();
        let nsender = sender_set.len();
        let sender_params = params.clone();
        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let mut sender = Sender::init(&mut tx, &mut rng)?;
            sender.send(&sender_set, nreceiver, &sender_params, &mut tx, &mut rng)
        });
        let mut rng = AesRng::new();
        let mut receiver = Receiver::init(&mut rx, &mut rng)?;
        let out = receiver.receive(&receiver_set, nsender, &params, &mut rx, &mut rng);
        let sent = handle.join().unwrap();
        let out = out?;
        sent?;
        Ok(out)
    }

    #[test]
    fn test_intersection() {
        let sender_set = vec!["2".to_string(), "3".to_string()];
        let receiver_set = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let out = run(sender_set, receiver_set, KkrtParams::default()).unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_many_hashes_and_long_elements() {
        for fun_num in 3..=5 {
            let params = KkrtParams {
                fun_num,
                ..KkrtParams::default()
            };
            let long = |i: usize| format!("a rather long element that needs hashing #{}", i);
            let sender_set = (0..500).map(long).collect::<Vec<_>>();
            let receiver_set = (250..1000).map(long).collect::<Vec<_>>();
            let out = run(sender_set, receiver_set, params).unwrap();
            assert_eq!(out, (0..250).collect::<Vec<usize>>());
        }
    }

    #[test]
    fn test_cuckoo_failure_is_reported() {
        let params = KkrtParams {
            max_evictions: 1,
            ..KkrtParams::default()
        };
        let sender_set = (0..10).map(|i| i.to_string()).collect::<Vec<_>>();
        let receiver_set = (0..2000).map(|i| i.to_string()).collect::<Vec<_>>();
        let (mut tx, mut rx) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let mut sender = Sender::init(&mut tx, &mut rng).unwrap();
            sender.send(&sender_set, 2000, &params, &mut tx, &mut rng)
        });
        let mut rng = AesRng::new();
        let mut receiver = Receiver::init(&mut rx, &mut rng).unwrap();
        let params = KkrtParams {
            max_evictions: 1,
            ..KkrtParams::default()
        };
        let err = receiver
            .receive(&receiver_set, 10, &params, &mut rx, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::CuckooHashFull));
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, Error::PeerCuckooFailure));
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }
}
