// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The opening message of every session.
//!
//! Both parties write `u8 version | u8 party_id | u8 scheme | usize nparams |
//! nparams × u64 | bool obtain_result | usize set_size | usize nfeatures`,
//! flush, and then read the peer's copy. Disagreement on anything both sides
//! must share is a configuration error, reported before protocol traffic.

use crate::Error;
use setops_primitives::AbstractChannel;

const VERSION: u8 = 1;
/// Largest set either party may bring.
pub(crate) const MAX_SET_SIZE: usize = 1 << 28;
const MAX_FEATURES: usize = 1 << 16;
const MAX_PARAMS: usize = 64;

/// Protocol selector sent in the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Scheme {
    Ecdh = 1,
    Kkrt = 2,
    Circuit = 3,
}

/// This party's view of the session.
#[derive(Clone, Debug)]
pub(crate) struct Handshake {
    pub(crate) party_id: u8,
    pub(crate) scheme: Scheme,
    pub(crate) params: Vec<(&'static str, u64)>,
    pub(crate) obtain_result: bool,
    pub(crate) set_size: usize,
    pub(crate) nfeatures: usize,
}

/// What the peer announced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Peer {
    pub(crate) party_id: u8,
    pub(crate) obtain_result: bool,
    pub(crate) set_size: usize,
    pub(crate) nfeatures: usize,
}

impl Handshake {
    /// Send our announcement, read the peer's and check they are compatible.
    pub(crate) fn exchange<C: AbstractChannel>(&self, channel: &mut C) -> Result<Peer, Error> {
        if self.set_size > MAX_SET_SIZE {
            return Err(Error::Configuration(format!(
                "set size {} exceeds the maximum of {}",
                self.set_size, MAX_SET_SIZE
            )));
        }
        if self.nfeatures > MAX_FEATURES {
            return Err(Error::Configuration(format!(
                "{} features exceed the maximum of {}",
                self.nfeatures, MAX_FEATURES
            )));
        }
        channel.write_u8(VERSION)?;
        channel.write_u8(self.party_id)?;
        channel.write_u8(self.scheme as u8)?;
        channel.write_usize(self.params.len())?;
        for (_, value) in self.params.iter() {
            channel.write_u64(*value)?;
        }
        channel.write_bool(self.obtain_result)?;
        channel.write_usize(self.set_size)?;
        channel.write_usize(self.nfeatures)?;
        channel.flush()?;

        let version = channel.read_u8()?;
        if version != VERSION {
            return Err(Error::ProtocolViolation(format!(
                "peer speaks version {}, expected {}",
                version, VERSION
            )));
        }
        let party_id = channel.read_u8()?;
        let scheme = channel.read_u8()?;
        let nparams = channel.read_usize_bounded(MAX_PARAMS)?;
        let params = (0..nparams)
            .map(|_| channel.read_u64())
            .collect::<Result<Vec<u64>, _>>()?;
        let obtain_result = channel.read_bool()?;
        let set_size = channel.read_usize_bounded(MAX_SET_SIZE)?;
        let nfeatures = channel.read_usize_bounded(MAX_FEATURES)?;

        if party_id > 1 || party_id == self.party_id {
            return Err(Error::Configuration(format!(
                "peer announced party id {}, expected {}",
                party_id,
                1 - self.party_id
            )));
        }
        if scheme != self.scheme as u8 {
            return Err(Error::Configuration(format!(
                "peer runs scheme {}, expected {} ({:?})",
                scheme, self.scheme as u8, self.scheme
            )));
        }
        if nparams != self.params.len() {
            return Err(Error::Configuration(format!(
                "peer sent {} parameters, expected {}",
                nparams,
                self.params.len()
            )));
        }
        for ((name, ours), theirs) in self.params.iter().zip(params.iter()) {
            if ours != theirs {
                return Err(Error::Configuration(format!(
                    "parameter `{}` differs from the peer's ({:#x} vs {:#x})",
                    name, ours, theirs
                )));
            }
        }
        Ok(Peer {
            party_id,
            obtain_result,
            set_size,
            nfeatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use setops_primitives::unix_channel_pair;

    fn hello(party_id: u8, scheme: Scheme, eps: f64, set_size: usize) -> Handshake {
        Handshake {
            party_id,
            scheme,
            params: vec![("epsilon", eps.to_bits()), ("fun_num", 3)],
            obtain_result: party_id == 0,
            set_size,
            nfeatures: 0,
        }
    }

    fn run(a: Handshake, b: Handshake) -> (Result<Peer, Error>, Result<Peer, Error>) {
        let (mut ca, mut cb) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || b.exchange(&mut cb));
        let ra = a.exchange(&mut ca);
        (ra, handle.join().unwrap())
    }

    #[test]
    fn test_agreement() {
        let (a, b) = run(
            hello(0, Scheme::Kkrt, 1.27, 10),
            hello(1, Scheme::Kkrt, 1.27, 20),
        );
        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.party_id, 1);
        assert_eq!(a.set_size, 20);
        assert!(!a.obtain_result);
        assert_eq!(b.party_id, 0);
        assert_eq!(b.set_size, 10);
        assert!(b.obtain_result);
    }

    #[test]
    fn test_mismatches() {
        let (a, b) = run(
            hello(0, Scheme::Kkrt, 1.27, 1),
            hello(0, Scheme::Kkrt, 1.27, 1),
        );
        assert_eq!(a.unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(b.unwrap_err().kind(), ErrorKind::Configuration);

        let (a, b) = run(
            hello(0, Scheme::Ecdh, 1.27, 1),
            hello(1, Scheme::Kkrt, 1.27, 1),
        );
        assert_eq!(a.unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(b.unwrap_err().kind(), ErrorKind::Configuration);

        let (a, _) = run(
            hello(0, Scheme::Kkrt, 1.27, 1),
            hello(1, Scheme::Kkrt, 1.5, 1),
        );
        let err = a.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("epsilon"));
    }

    #[test]
    fn test_oversized_set_is_rejected_locally() {
        let (mut ca, _cb) = unix_channel_pair().unwrap();
        let err = hello(0, Scheme::Ecdh, 1.27, MAX_SET_SIZE + 1)
            .exchange(&mut ca)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
