// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Private join-and-compute over a garbled circuit.
//!
//! One party, the *requester*, indexes the result by its keys. For every
//! requester key both parties end up with additive shares modulo `2^64` of a
//! row `[membership, requester features, responder features]`; the row
//! reconstructs to the true values when the key is in the intersection and to
//! zeros otherwise. Neither party learns which keys matched.
//!
//! The requester cuckoo-hashes its keys and obtains one OPRF output per bin.
//! The responder hashes each of its keys into every bin it could land in,
//! tags each bin and masks its features, and publishes a hint table that
//! lets the requester recover a bin's tag and masked features only when it
//! holds the same key. A garbled circuit per bin compares tags and emits
//! masked sums, and an oblivious switching network moves the bins into the
//! requester's key order.

mod circuit;
mod hint;
mod requester;
mod responder;

use crate::{
    config::{PjcScheme, SessionConfig},
    handshake::{Handshake, Scheme},
    session::{progress_level, Session},
    transport::{self, CancelHandle, TcpChannel},
    utils, Error,
};
use log::log;
use serde::{Deserialize, Serialize};
use setops_primitives::{AbstractChannel, AesRng};

/// Sizes both parties agree on after the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Shape {
    pub(crate) nrequester_keys: usize,
    pub(crate) nresponder_keys: usize,
    pub(crate) nrequester_features: usize,
    pub(crate) nresponder_features: usize,
}

impl Shape {
    fn ncols(&self) -> usize {
        1 + self.nrequester_features + self.nresponder_features
    }
}

/// One party's additive shares: one row per requester key, in the
/// requester's input order, and columns
/// `[membership, requester features…, responder features…]`.
///
/// Shares live in `Z_{2^64}` and are reported as two's complement `i64`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMatrix {
    nrows: usize,
    ncols: usize,
    data: Vec<i64>,
}

impl ShareMatrix {
    /// An all-zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        ShareMatrix {
            nrows,
            ncols,
            data: vec![0; nrows * ncols],
        }
    }

    /// Build a matrix from rows of `ncols` entries each.
    pub fn from_rows(rows: Vec<Vec<i64>>, ncols: usize) -> Result<Self, Error> {
        if let Some(i) = rows.iter().position(|r| r.len() != ncols) {
            return Err(Error::Configuration(format!(
                "row {} has {} entries, expected {}",
                i,
                rows[i].len(),
                ncols
            )));
        }
        Ok(ShareMatrix {
            nrows: rows.len(),
            ncols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    fn from_words(rows: Vec<Vec<u64>>, ncols: usize) -> Self {
        ShareMatrix {
            nrows: rows.len(),
            ncols,
            data: rows.into_iter().flatten().map(|x| x as i64).collect(),
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row `i`. Panics if `i >= nrows()`.
    pub fn row(&self, i: usize) -> &[i64] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// Column `j`. Panics if `j >= ncols()`.
    pub fn column(&self, j: usize) -> Vec<i64> {
        assert!(j < self.ncols, "column {} out of {}", j, self.ncols);
        (0..self.nrows).map(|i| self.data[i * self.ncols + j]).collect()
    }

    /// All rows.
    pub fn to_rows(&self) -> Vec<Vec<i64>> {
        (0..self.nrows).map(|i| self.row(i).to_vec()).collect()
    }

    /// All columns.
    pub fn to_columns(&self) -> Vec<Vec<i64>> {
        (0..self.ncols).map(|j| self.column(j)).collect()
    }

    /// Add the peer's shares to ours, revealing the values.
    pub fn reconstruct(&self, other: &ShareMatrix) -> Result<ShareMatrix, Error> {
        if (self.nrows, self.ncols) != (other.nrows, other.ncols) {
            return Err(Error::Configuration(format!(
                "cannot add a {}x{} share matrix to a {}x{} one",
                other.nrows, other.ncols, self.nrows, self.ncols
            )));
        }
        Ok(ShareMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(x, y)| x.wrapping_add(*y))
                .collect(),
        })
    }
}

/// Check the caller's input: unique keys and `features[c][i]` defined for
/// every feature `c` and key `i`. Returns the features as one row per key.
fn key_rows(keys: &[String], features: &[Vec<i64>]) -> Result<Vec<Vec<u64>>, Error> {
    if let Some(i) = utils::first_duplicate(keys) {
        return Err(Error::Configuration(format!(
            "key {:?} appears more than once",
            keys[i]
        )));
    }
    if let Some(c) = features.iter().position(|col| col.len() != keys.len()) {
        return Err(Error::Configuration(format!(
            "feature {} has {} values for {} keys",
            c,
            features[c].len(),
            keys.len()
        )));
    }
    Ok((0..keys.len())
        .map(|i| features.iter().map(|col| col[i] as u64).collect())
        .collect())
}

/// Private join-and-compute coordinator.
pub struct Pjc {
    config: SessionConfig,
}

impl Pjc {
    /// Validate `config` and build a coordinator.
    pub fn new(config: SessionConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Pjc { config })
    }

    /// The configuration this coordinator runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Connect to the peer and compute shares over `keys` and their
    /// `features`, given column by column: `features[c][i]` is feature `c`
    /// of `keys[i]`.
    pub fn process(
        &self,
        keys: &[String],
        features: &[Vec<i64>],
        verbose: bool,
    ) -> Result<ShareMatrix, Error> {
        let rows = key_rows(keys, features)?;
        let (mut session, _) = self.connect(verbose)?;
        self.execute(&mut session, keys, features.len(), &rows)
    }

    /// Connect to the peer without running anything yet.
    ///
    /// The returned handle aborts a later [`run`](Pjc::run) on the session
    /// from another thread.
    pub fn connect(&self, verbose: bool) -> Result<(Session<TcpChannel>, CancelHandle), Error> {
        let (channel, cancel) = transport::connect(&self.config.net_params)?;
        let mut session = Session::new(verbose);
        session.connect(channel)?;
        Ok((session, cancel))
    }

    /// Run over an already connected session.
    pub fn run<C: AbstractChannel + Send>(
        &self,
        session: &mut Session<C>,
        keys: &[String],
        features: &[Vec<i64>],
    ) -> Result<ShareMatrix, Error> {
        let rows = key_rows(keys, features)?;
        self.execute(session, keys, features.len(), &rows)
    }

    fn execute<C: AbstractChannel + Send>(
        &self,
        session: &mut Session<C>,
        keys: &[String],
        nfeatures: usize,
        rows: &[Vec<u64>],
    ) -> Result<ShareMatrix, Error> {
        let pool = self.config.thread_pool()?;
        let name = match self.config.pjc_scheme {
            PjcScheme::CircuitPsi => "CIRCUIT-PSI",
        };
        pool.install(|| {
            session.exchange(name, |channel, verbose| {
                self.protocol(channel, verbose, keys, nfeatures, rows)
            })
        })
    }

    fn protocol<C: AbstractChannel>(
        &self,
        channel: &mut C,
        verbose: bool,
        keys: &[String],
        nfeatures: usize,
        rows: &[Vec<u64>],
    ) -> Result<ShareMatrix, Error> {
        let level = progress_level(verbose);
        let params = &self.config.circuit;
        let party_id = self.config.party_id;
        let peer = Handshake {
            party_id,
            scheme: Scheme::Circuit,
            params: vec![
                ("epsilon", params.epsilon.to_bits()),
                ("fun_num", params.fun_num as u64),
                ("fun_epsilon", params.fun_epsilon.to_bits()),
                ("hint_fun_num", params.hint_fun_num as u64),
                ("max_evictions", params.max_evictions as u64),
                ("requester", params.requester as u64),
            ],
            obtain_result: true,
            set_size: keys.len(),
            nfeatures,
        }
        .exchange(channel)?;

        let is_requester = party_id == params.requester;
        let shape = if is_requester {
            Shape {
                nrequester_keys: keys.len(),
                nresponder_keys: peer.set_size,
                nrequester_features: nfeatures,
                nresponder_features: peer.nfeatures,
            }
        } else {
            Shape {
                nrequester_keys: peer.set_size,
                nresponder_keys: keys.len(),
                nrequester_features: peer.nfeatures,
                nresponder_features: nfeatures,
            }
        };
        log!(
            level,
            "party {} ({}): {} keys, peer has {}; {} output columns",
            party_id,
            if is_requester { "requester" } else { "responder" },
            keys.len(),
            peer.set_size,
            shape.ncols()
        );
        if shape.nrequester_keys == 0 || shape.nresponder_keys == 0 {
            return Ok(ShareMatrix::zeros(shape.nrequester_keys, shape.ncols()));
        }

        let mut rng = AesRng::new();
        let shares = if is_requester {
            requester::run(channel, params, keys, rows, &shape, level, &mut rng)?
        } else {
            responder::run(channel, params, keys, rows, &shape, level, &mut rng)?
        };
        Ok(ShareMatrix::from_words(shares, shape.ncols()))
    }
}
