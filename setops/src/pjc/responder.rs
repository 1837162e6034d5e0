// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The responder: simple-hashing side, OPRF sender, evaluator and vector
//! holder of the permutation.

use super::{
    circuit::{bin_circuit, EvaluatorInputs, Layout},
    hint::{self, Slot},
    Shape,
};
use crate::{
    config::CircuitParams,
    cuckoo::{compute_nbins, simple_hash},
    psi::kkrt,
    utils, Error,
};
use log::{log, Level};
use rand::{CryptoRng, Rng, SeedableRng};
use rayon::prelude::*;
use setops_garble::{twopac::semihonest, Evaluator, FancyInput};
use setops_ot::{oprf::KkrtSender, osn::OsnSender, ot::AlszReceiver};
use setops_primitives::{cointoss, AbstractChannel, AesRng, Block};

/// Run the responder side. `features` holds one row per key.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run<C, RNG>(
    channel: &mut C,
    params: &CircuitParams,
    keys: &[String],
    features: &[Vec<u64>],
    shape: &Shape,
    level: Level,
    rng: &mut RNG,
) -> Result<Vec<Vec<u64>>, Error>
where
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    let mut oprf = KkrtSender::init(channel, rng)?;
    let seeds = cointoss::send(channel, &[rng.gen(), rng.gen()])?;
    let (item_key, hint_seed) = (seeds[0], seeds[1]);
    log!(level, "OPRF initialized");

    let inputs = utils::compress_and_hash_inputs(keys, item_key);
    let nbins = kkrt::read_table_size(
        channel,
        compute_nbins(shape.nrequester_keys, params.epsilon),
    )?;
    let prf_seeds = oprf.send(channel, nbins)?;

    let layout = Layout::new(
        nbins,
        params.hint_fun_num,
        shape.nrequester_features,
        shape.nresponder_features,
    );
    let tags = (0..nbins)
        .map(|_| rng.gen::<u128>() & layout.tag_mask())
        .collect::<Vec<u128>>();
    let weights = (0..nbins)
        .map(|_| (0..layout.nresponder).map(|_| rng.gen()).collect())
        .collect::<Vec<Vec<u64>>>();

    let bins = simple_hash(&inputs, params.fun_num, nbins)?;
    let entries = bins
        .par_iter()
        .enumerate()
        .flat_map_iter(|(b, bin)| {
            let (oprf, prf_seeds, tags, weights) = (&oprf, &prf_seeds, &tags, &weights);
            bin.iter().map(move |&(entry, idx)| hint::Entry {
                key: hint::hint_key(hint_seed, b, entry),
                content: Slot {
                    tag: Block::from(tags[b]),
                    values: features[idx]
                        .iter()
                        .zip(weights[b].iter())
                        .map(|(f, w)| f ^ w)
                        .collect(),
                },
                output: oprf.compute(&prf_seeds[b], entry),
            })
        })
        .collect::<Vec<hint::Entry>>();
    let nslots = compute_nbins(params.fun_num * inputs.len(), params.fun_epsilon);
    hint::send(
        channel,
        &entries,
        layout.nhints,
        nslots,
        params.max_evictions,
        layout.nresponder,
        rng,
    )?;
    log!(level, "sent hint table of {} slots", nslots);

    let mut ev = semihonest::Evaluator::<C, AesRng, AlszReceiver>::new(
        channel.clone(),
        AesRng::from_seed(rng.gen::<Block>()),
    )?;
    let gb_wires = ev.receive_many(nbins * layout.garbler_bits())?;
    let bits = (0..nbins)
        .flat_map(|b| {
            EvaluatorInputs {
                tag: tags[b],
                masks: weights[b].clone(),
            }
            .to_bits(&layout)
        })
        .collect::<Vec<bool>>();
    let ev_wires = ev.encode_many(&bits)?;
    let circuits = (0..nbins)
        .map(|_| ev.receive_circuit(layout.ngates()))
        .collect::<Result<Vec<_>, _>>()?;
    *channel = ev.into_channel();

    let masked = circuits
        .par_iter()
        .enumerate()
        .zip(gb_wires.par_chunks(layout.garbler_bits()))
        .zip(ev_wires.par_chunks(layout.evaluator_bits()))
        .map(|(((b, gc), gw), ew)| -> Result<Vec<u64>, Error> {
            let mut e = Evaluator::new(gc, b as u64);
            let z = bin_circuit(&mut e, &layout, gw, ew)?.ok_or_else(|| {
                Error::ProtocolViolation(format!("bin {} produced no output", b))
            })?;
            e.finish()?;
            Ok(z)
        })
        .collect::<Result<Vec<Vec<u64>>, Error>>()?;
    log!(level, "evaluated {} bins", nbins);

    let n = nbins.next_power_of_two();
    let mut rows = masked;
    rows.resize(n, vec![0; layout.ncols()]);
    let mut osn = OsnSender::init(channel, rng)?;
    let mut shares = osn.send(channel, rows, layout.ncols(), rng)?;
    shares.truncate(shape.nrequester_keys);
    log!(level, "permuted shares into the requester's key order");
    Ok(shares)
}
