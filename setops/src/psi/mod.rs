// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Private set intersection.
//!
//! [`Psi`] resolves who learns the result, runs the configured scheme with
//! that party as the receiver and, when both parties asked for the result,
//! echoes it back to the sender.

pub mod ecdh;
pub mod kkrt;

use crate::{
    config::{PsiScheme, SessionConfig},
    handshake::{Handshake, Peer, Scheme},
    session::{progress_level, Session},
    transport::{self, CancelHandle, TcpChannel},
    utils, Error,
};
use log::log;
use setops_primitives::{AbstractChannel, AesRng};
use std::collections::{HashMap, HashSet};

/// What a run reveals to the result holders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reveal {
    Elements,
    Cardinality,
}

/// What a run produced for this party.
#[derive(Debug, PartialEq, Eq)]
enum Intersection {
    Elements(Vec<String>),
    Cardinality(usize),
}

impl Intersection {
    fn empty(reveal: Reveal) -> Self {
        match reveal {
            Reveal::Elements => Intersection::Elements(Vec::new()),
            Reveal::Cardinality => Intersection::Cardinality(0),
        }
    }

    fn len(&self) -> usize {
        match self {
            Intersection::Elements(xs) => xs.len(),
            Intersection::Cardinality(n) => *n,
        }
    }

    fn into_elements(self) -> Vec<String> {
        match self {
            Intersection::Elements(xs) => xs,
            Intersection::Cardinality(_) => Vec::new(),
        }
    }
}

/// Which party receives the protocol output, if any: party 0 when it asked
/// for the result, otherwise party 1 when it asked.
pub(crate) fn result_holder(obtain: [bool; 2]) -> Option<u8> {
    if obtain[0] {
        Some(0)
    } else if obtain[1] {
        Some(1)
    } else {
        None
    }
}

/// Private set intersection coordinator.
pub struct Psi {
    config: SessionConfig,
}

impl Psi {
    /// Validate `config` and build a coordinator.
    pub fn new(config: SessionConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Psi { config })
    }

    /// The configuration this coordinator runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Connect to the peer and compute the intersection of `keys` with the
    /// peer's set. Returns the common elements in `keys` order when this party
    /// obtains the result, and nothing otherwise.
    pub fn process(
        &self,
        keys: &[String],
        obtain_result: bool,
        verbose: bool,
    ) -> Result<Vec<String>, Error> {
        let (mut session, _) = self.connect(verbose)?;
        self.run(&mut session, keys, obtain_result)
    }

    /// Like [`process`](Psi::process), but only the size of the intersection
    /// is revealed.
    pub fn process_cardinality_only(
        &self,
        keys: &[String],
        obtain_result: bool,
        verbose: bool,
    ) -> Result<usize, Error> {
        let (mut session, _) = self.connect(verbose)?;
        self.run_cardinality_only(&mut session, keys, obtain_result)
    }

    /// Run over an already connected session.
    pub fn run<C: AbstractChannel + Send>(
        &self,
        session: &mut Session<C>,
        keys: &[String],
        obtain_result: bool,
    ) -> Result<Vec<String>, Error> {
        self.execute(session, keys, obtain_result, Reveal::Elements)
            .map(Intersection::into_elements)
    }

    /// Run over an already connected session, revealing only the cardinality.
    pub fn run_cardinality_only<C: AbstractChannel + Send>(
        &self,
        session: &mut Session<C>,
        keys: &[String],
        obtain_result: bool,
    ) -> Result<usize, Error> {
        self.execute(session, keys, obtain_result, Reveal::Cardinality)
            .map(|out| out.len())
    }

    /// Connect to the peer without running anything yet.
    ///
    /// The returned handle aborts a later [`run`](Psi::run) on the session
    /// from another thread.
    pub fn connect(&self, verbose: bool) -> Result<(Session<TcpChannel>, CancelHandle), Error> {
        let (channel, cancel) = transport::connect(&self.config.net_params)?;
        let mut session = Session::new(verbose);
        session.connect(channel)?;
        Ok((session, cancel))
    }

    fn scheme(&self) -> (Scheme, Vec<(&'static str, u64)>) {
        match self.config.psi_scheme {
            PsiScheme::Ecdh => (Scheme::Ecdh, Vec::new()),
            PsiScheme::Kkrt => {
                let p = &self.config.kkrt;
                (
                    Scheme::Kkrt,
                    vec![
                        ("epsilon", p.epsilon.to_bits()),
                        ("fun_num", p.fun_num as u64),
                        ("max_evictions", p.max_evictions as u64),
                    ],
                )
            }
        }
    }

    fn execute<C: AbstractChannel + Send>(
        &self,
        session: &mut Session<C>,
        keys: &[String],
        obtain_result: bool,
        reveal: Reveal,
    ) -> Result<Intersection, Error> {
        let pool = self.config.thread_pool()?;
        let name = match self.config.psi_scheme {
            PsiScheme::Ecdh => "ECDH-PSI",
            PsiScheme::Kkrt => "KKRT-PSI",
        };
        pool.install(|| {
            session.exchange(name, |channel, verbose| {
                self.protocol(channel, verbose, keys, obtain_result, reveal)
            })
        })
    }

    fn protocol<C: AbstractChannel>(
        &self,
        channel: &mut C,
        verbose: bool,
        keys: &[String],
        obtain_result: bool,
        reveal: Reveal,
    ) -> Result<Intersection, Error> {
        let level = progress_level(verbose);
        let party_id = self.config.party_id;
        let inputs = utils::dedup(keys);
        if inputs.len() < keys.len() {
            log!(
                level,
                "dropped {} repeated elements",
                keys.len() - inputs.len()
            );
        }

        let (scheme, params) = self.scheme();
        let peer = Handshake {
            party_id,
            scheme,
            params,
            obtain_result,
            set_size: inputs.len(),
            nfeatures: 0,
        }
        .exchange(channel)?;
        log!(
            level,
            "party {}: {} elements, peer has {}",
            party_id,
            inputs.len(),
            peer.set_size
        );

        let mut obtain = [false; 2];
        obtain[party_id as usize] = obtain_result;
        obtain[peer.party_id as usize] = peer.obtain_result;
        let holder = match result_holder(obtain) {
            Some(holder) => holder,
            None => {
                log!(level, "neither party obtains the result");
                return Ok(Intersection::empty(reveal));
            }
        };
        if inputs.is_empty() || peer.set_size == 0 {
            return Ok(Intersection::empty(reveal));
        }
        let echo = obtain[0] && obtain[1];

        let mut rng = AesRng::new();
        if holder == party_id {
            let found = match scheme {
                Scheme::Kkrt => {
                    let mut receiver = kkrt::Receiver::init(channel, &mut rng)?;
                    log!(level, "OPRF initialized");
                    receiver.receive(
                        &inputs,
                        peer.set_size,
                        &self.config.kkrt,
                        channel,
                        &mut rng,
                    )?
                }
                _ => ecdh::Receiver::init(&mut rng).receive(&inputs, peer.set_size, channel)?,
            };
            log!(level, "intersection has {} elements", found.len());
            if echo {
                send_echo(channel, &inputs, &found, reveal)?;
            }
            Ok(match reveal {
                Reveal::Elements => {
                    Intersection::Elements(found.iter().map(|&i| inputs[i].to_string()).collect())
                }
                Reveal::Cardinality => Intersection::Cardinality(found.len()),
            })
        } else {
            match scheme {
                Scheme::Kkrt => {
                    let mut sender = kkrt::Sender::init(channel, &mut rng)?;
                    log!(level, "OPRF initialized");
                    sender.send(
                        &inputs,
                        peer.set_size,
                        &self.config.kkrt,
                        channel,
                        &mut rng,
                    )?;
                }
                _ => ecdh::Sender::init(&mut rng).send(&inputs, peer.set_size, channel, &mut rng)?,
            }
            log!(level, "sent masked elements");
            if !echo {
                return Ok(Intersection::empty(reveal));
            }
            receive_echo(channel, &inputs, &peer, reveal)
        }
    }
}

fn send_echo<C: AbstractChannel>(
    channel: &mut C,
    inputs: &[&String],
    found: &[usize],
    reveal: Reveal,
) -> Result<(), Error> {
    channel.write_usize(found.len())?;
    if reveal == Reveal::Elements {
        for &i in found.iter() {
            channel.write_bytes_prefixed(inputs[i].as_bytes())?;
        }
    }
    channel.flush()?;
    Ok(())
}

fn receive_echo<C: AbstractChannel>(
    channel: &mut C,
    inputs: &[&String],
    peer: &Peer,
    reveal: Reveal,
) -> Result<Intersection, Error> {
    let count = channel.read_usize_bounded(inputs.len().min(peer.set_size))?;
    if reveal == Reveal::Cardinality {
        return Ok(Intersection::Cardinality(count));
    }
    let positions = inputs
        .iter()
        .enumerate()
        .map(|(i, x)| (x.as_bytes(), i))
        .collect::<HashMap<&[u8], usize>>();
    let maxlen = inputs.iter().map(|x| x.len()).max().unwrap_or(0);
    let mut found = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    for _ in 0..count {
        let bytes = channel.read_bytes_prefixed(maxlen)?;
        let i = *positions.get(bytes.as_slice()).ok_or_else(|| {
            Error::ProtocolViolation("echoed an element outside the local set".into())
        })?;
        if !seen.insert(i) {
            return Err(Error::ProtocolViolation(
                "echoed the same element twice".into(),
            ));
        }
        found.push(i);
    }
    found.sort_unstable();
    Ok(Intersection::Elements(
        found.into_iter().map(|i| inputs[i].to_string()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{KkrtParams, NetParams},
        ErrorKind, SessionState,
    };
    use setops_primitives::{unix_channel_pair, UnixChannel};

    fn config(party_id: u8, scheme: PsiScheme) -> SessionConfig {
        let mut cfg = SessionConfig::new(
            party_id,
            NetParams {
                remote_addr: "127.0.0.1".into(),
                remote_port: 7000 + (1 - party_id as u16),
                local_port: 7000 + party_id as u16,
                timeout_secs: 10,
            },
        );
        cfg.psi_scheme = scheme;
        cfg.threads = Some(2);
        cfg
    }

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    type Outcome<T> = (Result<T, Error>, Result<T, Error>);

    fn run_with<T, F>(cfg0: SessionConfig, cfg1: SessionConfig, f: F) -> Outcome<T>
    where
        T: Send + 'static,
        F: Fn(&Psi, &mut Session<UnixChannel>, u8) -> Result<T, Error> + Send + Sync + 'static,
    {
        let (c0, c1) = unix_channel_pair().unwrap();
        let f = std::sync::Arc::new(f);
        let g = f.clone();
        let handle = std::thread::spawn(move || {
            let psi = Psi::new(cfg1).unwrap();
            let mut session = Session::new(false);
            session.connect(c1).unwrap();
            g(&psi, &mut session, 1)
        });
        let psi = Psi::new(cfg0).unwrap();
        let mut session = Session::new(false);
        session.connect(c0).unwrap();
        let r0 = f(&psi, &mut session, 0);
        (r0, handle.join().unwrap())
    }

    fn intersect(
        scheme: PsiScheme,
        sets: [Vec<String>; 2],
        obtain: [bool; 2],
    ) -> (Vec<String>, Vec<String>) {
        let (r0, r1) = run_with(config(0, scheme), config(1, scheme), move |psi, s, id| {
            psi.run(s, &sets[id as usize], obtain[id as usize])
        });
        (r0.unwrap(), r1.unwrap())
    }

    #[test]
    fn test_scenario_party0_obtains() {
        for scheme in [PsiScheme::Ecdh, PsiScheme::Kkrt] {
            let (r0, r1) = intersect(
                scheme,
                [strings(&["1", "2", "3"]), strings(&["2", "3"])],
                [true, false],
            );
            assert_eq!(r0, strings(&["2", "3"]));
            assert!(r1.is_empty());
        }
    }

    #[test]
    fn test_party1_obtains() {
        for scheme in [PsiScheme::Ecdh, PsiScheme::Kkrt] {
            let (r0, r1) = intersect(
                scheme,
                [strings(&["1", "2", "3"]), strings(&["3", "4", "2"])],
                [false, true],
            );
            assert!(r0.is_empty());
            assert_eq!(r1, strings(&["3", "2"]));
        }
    }

    #[test]
    fn test_both_obtain_in_own_order() {
        for scheme in [PsiScheme::Ecdh, PsiScheme::Kkrt] {
            let (r0, r1) = intersect(
                scheme,
                [strings(&["a", "b", "c", "d"]), strings(&["d", "x", "b", "b"])],
                [true, true],
            );
            assert_eq!(r0, strings(&["b", "d"]));
            assert_eq!(r1, strings(&["d", "b"]));
        }
    }

    #[test]
    fn test_nobody_obtains() {
        let (r0, r1) = intersect(
            PsiScheme::Kkrt,
            [strings(&["1", "2"]), strings(&["1", "2"])],
            [false, false],
        );
        assert!(r0.is_empty());
        assert!(r1.is_empty());
    }

    #[test]
    fn test_empty_sets() {
        for scheme in [PsiScheme::Ecdh, PsiScheme::Kkrt] {
            let (r0, r1) = intersect(scheme, [Vec::new(), strings(&["1"])], [true, true]);
            assert!(r0.is_empty());
            assert!(r1.is_empty());
            let (r0, _) = intersect(scheme, [strings(&["1"]), Vec::new()], [true, false]);
            assert!(r0.is_empty());
        }
    }

    #[test]
    fn test_schemes_agree() {
        let a = (0..300).map(|i| format!("{}", i * 3)).collect::<Vec<_>>();
        let b = (0..300).map(|i| format!("{}", i * 5)).collect::<Vec<_>>();
        let (ecdh, _) = intersect(PsiScheme::Ecdh, [a.clone(), b.clone()], [true, false]);
        let (kkrt, _) = intersect(PsiScheme::Kkrt, [a, b], [true, false]);
        assert_eq!(ecdh.len(), 60);
        assert_eq!(ecdh, kkrt);
    }

    #[test]
    fn test_trailing_zero_bytes_are_significant() {
        for scheme in [PsiScheme::Ecdh, PsiScheme::Kkrt] {
            let (r0, _) = intersect(
                scheme,
                [
                    strings(&["x", "y", "long element 0123"]),
                    strings(&["x\0", "z", "long element 0123\0"]),
                ],
                [true, false],
            );
            assert!(r0.is_empty(), "{:?}: {:?}", scheme, r0);
            let (r0, _) = intersect(
                scheme,
                [strings(&["x\0", "y"]), strings(&["x\0", "x"])],
                [true, false],
            );
            assert_eq!(r0, strings(&["x\0"]));
        }
    }

    #[test]
    fn test_cancel_aborts_blocked_run() {
        let tcp = |party_id: u8| {
            let mut cfg = config(party_id, PsiScheme::Ecdh);
            cfg.net_params.local_port = 47561 + party_id as u16;
            cfg.net_params.remote_port = 47562 - party_id as u16;
            cfg
        };
        let (done, wait) = std::sync::mpsc::channel::<()>();
        let silent = std::thread::spawn(move || {
            // Connects but never answers the handshake.
            let _peer = transport::connect(&tcp(1).net_params).unwrap();
            let _ = wait.recv();
        });
        let psi = Psi::new(tcp(0)).unwrap();
        let (mut session, cancel) = psi.connect(false).unwrap();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(100));
            cancel.cancel();
        });
        let err = psi.run(&mut session, &strings(&["a"]), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(matches!(session.state(), SessionState::Aborted { .. }));
        canceller.join().unwrap();
        done.send(()).unwrap();
        silent.join().unwrap();
    }

    #[test]
    fn test_cardinality_only() {
        for scheme in [PsiScheme::Ecdh, PsiScheme::Kkrt] {
            let sets = [strings(&["1", "2", "3", "4"]), strings(&["2", "4", "6"])];
            let (r0, r1) = run_with(config(0, scheme), config(1, scheme), move |psi, s, id| {
                psi.run_cardinality_only(s, &sets[id as usize], true)
            });
            assert_eq!(r0.unwrap(), 2);
            assert_eq!(r1.unwrap(), 2);
        }
    }

    #[test]
    fn test_mismatched_schemes() {
        let (r0, r1) = run_with(
            config(0, PsiScheme::Ecdh),
            config(1, PsiScheme::Kkrt),
            |psi, s, _| {
                let out = psi.run(s, &strings(&["1"]), true);
                assert!(matches!(s.state(), SessionState::Aborted { .. }));
                out
            },
        );
        assert_eq!(r0.unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(r1.unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_mismatched_parameters() {
        let mut cfg1 = config(1, PsiScheme::Kkrt);
        cfg1.kkrt = KkrtParams {
            fun_num: 4,
            ..KkrtParams::default()
        };
        let (r0, r1) = run_with(config(0, PsiScheme::Kkrt), cfg1, |psi, s, _| {
            psi.run(s, &strings(&["1"]), true)
        });
        let e0 = r0.unwrap_err();
        assert_eq!(e0.kind(), ErrorKind::Configuration);
        assert!(e0.to_string().contains("fun_num"));
        assert_eq!(r1.unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_same_party_ids() {
        let (r0, r1) = run_with(
            config(0, PsiScheme::Ecdh),
            config(0, PsiScheme::Ecdh),
            |psi, s, _| psi.run(s, &strings(&["1"]), true),
        );
        assert_eq!(r0.unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(r1.unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_forged_echo_is_a_violation() {
        let (mut c0, c1) = unix_channel_pair().unwrap();
        let keys = strings(&["1", "2"]);
        let inputs = keys.iter().collect::<Vec<&String>>();
        let peer = Peer {
            party_id: 1,
            obtain_result: true,
            set_size: 2,
            nfeatures: 0,
        };
        let handle = std::thread::spawn(move || {
            let mut c1 = c1;
            c1.write_usize(1).unwrap();
            c1.write_bytes_prefixed(b"9").unwrap();
            c1.flush().unwrap();
        });
        let err = receive_echo(&mut c0, &inputs, &peer, Reveal::Elements).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        handle.join().unwrap();
    }

    #[test]
    fn test_result_holder() {
        assert_eq!(result_holder([true, true]), Some(0));
        assert_eq!(result_holder([true, false]), Some(0));
        assert_eq!(result_holder([false, true]), Some(1));
        assert_eq!(result_holder([false, false]), None);
    }
}
