// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The requester: cuckoo side, OPRF receiver, garbler and permutation holder.

use super::{
    circuit::{bin_circuit, GarblerInputs, Layout},
    hint, Shape,
};
use crate::{
    config::CircuitParams,
    cuckoo::{compute_nbins, CuckooHash},
    psi::kkrt,
    utils, Error,
};
use log::{log, Level};
use rand::{CryptoRng, Rng, SeedableRng};
use rayon::prelude::*;
use setops_garble::{twopac::semihonest::Garbler, FancyInput, GarbledCircuit};
use setops_ot::{
    oprf::KkrtReceiver,
    osn::OsnReceiver,
    ot::AlszSender,
};
use setops_primitives::{cointoss, AbstractChannel, AesRng, Block};

/// Output row `j` takes the bin of key `j`; the unused bins and the padding
/// up to `n` follow in order.
pub(crate) fn permutation(tbl: &CuckooHash, nkeys: usize, n: usize) -> Vec<usize> {
    let mut perm = vec![0; nkeys];
    let mut used = vec![false; n];
    for (bin, item) in tbl.items.iter().enumerate() {
        if let Some(item) = item {
            perm[item.input_index] = bin;
            used[bin] = true;
        }
    }
    perm.extend((0..n).filter(|&i| !used[i]));
    perm
}

/// Run the requester side. `features` holds one row per key.
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
    let mut oprf = KkrtReceiver::init(channel, rng)?;
    let seeds = cointoss::receive(channel, &[rng.gen(), rng.gen()])?;
    let (item_key, hint_seed) = (seeds[0], seeds[1]);
    log!(level, "OPRF initialized");

    let inputs = utils::compress_and_hash_inputs(keys, item_key);
    let nbins = compute_nbins(inputs.len(), params.epsilon);
    let tbl = kkrt::build_table(
        channel,
        &inputs,
        params.fun_num,
        nbins,
        params.max_evictions,
    )?;
    let entries = tbl.tagged_entries();
    let outputs = oprf.receive(channel, &entries)?;

    let nslots = compute_nbins(params.fun_num * shape.nresponder_keys, params.fun_epsilon);
    let slots = hint::receive(channel, nslots, shape.nresponder_features)?;
    log!(level, "received hint table of {} slots", nslots);

    let layout = Layout::new(
        nbins,
        params.hint_fun_num,
        shape.nrequester_features,
        shape.nresponder_features,
    );
    let masks = (0..nbins)
        .map(|_| (0..layout.ncols()).map(|_| rng.gen()).collect())
        .collect::<Vec<Vec<u64>>>();
    let bits = (0..nbins)
        .into_par_iter()
        .flat_map_iter(|b| {
            let candidates = hint::lookup(
                &slots,
                hint::hint_key(hint_seed, b, entries[b]),
                outputs[b],
                layout.nhints,
            );
            let own = tbl.items[b].as_ref().map_or_else(
                || vec![0; layout.nrequester],
                |item| features[item.input_index].clone(),
            );
            GarblerInputs {
                candidates: candidates
                    .iter()
                    .map(|s| u128::from(s.tag) & layout.tag_mask())
                    .collect(),
                values: candidates.into_iter().map(|s| s.values).collect(),
                features: own,
                masks: masks[b].clone(),
            }
            .to_bits(&layout)
        })
        .collect::<Vec<bool>>();

    let mut gb = Garbler::<C, AesRng, AlszSender>::new(
        channel.clone(),
        AesRng::from_seed(rng.gen::<Block>()),
    )?;
    let gb_wires = gb.encode_many(&bits)?;
    let ev_wires = gb.receive_many(nbins * layout.evaluator_bits())?;
    let garblers = (0..nbins)
        .map(|b| gb.garbler(b as u64))
        .collect::<Vec<_>>();
    let circuits = garblers
        .into_par_iter()
        .zip(gb_wires.par_chunks(layout.garbler_bits()))
        .zip(ev_wires.par_chunks(layout.evaluator_bits()))
        .map(|((mut g, gw), ew)| -> Result<GarbledCircuit, Error> {
            bin_circuit(&mut g, &layout, gw, ew)?;
            Ok(g.finish())
        })
        .collect::<Result<Vec<GarbledCircuit>, Error>>()?;
    for gc in circuits.iter() {
        gb.send_circuit(gc)?;
    }
    gb.get_channel().flush()?;
    *channel = gb.into_channel();
    log!(level, "garbled {} bins", nbins);

    let n = nbins.next_power_of_two();
    let perm = permutation(&tbl, keys.len(), n);
    let mut osn = OsnReceiver::init(channel, rng)?;
    let shares = osn.receive(channel, &perm, layout.ncols(), rng)?;
    log!(level, "permuted shares into key order");

    Ok(shares
        .into_iter()
        .zip(perm.iter())
        .take(keys.len())
        .map(|(share, &bin)| {
            share
                .iter()
                .zip(masks[bin].iter())
                .map(|(s, r)| s.wrapping_sub(*r))
                .collect()
        })
        .collect())
}
