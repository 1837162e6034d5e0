// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use setops_garble::errors::{EvaluatorError, FancyError, GarblerError, TwopacError};
use setops_primitives::cointoss;

/// The three ways a session can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad local configuration or input, or a peer configured incompatibly.
    /// Detected before or during the handshake.
    Configuration,
    /// The connection failed: refused, reset, timed out or closed early.
    Transport,
    /// The peer sent something the protocol does not allow.
    ProtocolViolation,
}

/// Errors produced by the set-operation protocols.
#[derive(Debug)]
pub enum Error {
    /// Invalid configuration or caller input.
    Configuration(String),
    /// An input/output error occurred.
    IoError(std::io::Error),
    /// Coin tossing failed.
    CoinTossError(cointoss::Error),
    /// The underlying oblivious transfer, OPRF or switching network failed.
    OtError(setops_ot::Error),
    /// The underlying garbled-circuit protocol failed.
    TwopacError(TwopacError),
    /// The cuckoo hash is full.
    CuckooHashFull,
    /// The provided cuckoo hash set size is invalid.
    InvalidCuckooSetSize(usize),
    /// The provided cuckoo hash parameters are invalid.
    InvalidCuckooParameters {
        /// Number of items.
        nitems: usize,
        /// Number of hashes.
        nhashes: usize,
    },
    /// The peer reported that it could not build its cuckoo table.
    PeerCuckooFailure,
    /// A message did not follow the protocol.
    ProtocolViolation(String),
    /// The worker pool could not be created.
    ThreadPool(rayon::ThreadPoolBuildError),
}

fn io_kind(e: &std::io::Error) -> ErrorKind {
    match e.kind() {
        std::io::ErrorKind::InvalidData => ErrorKind::ProtocolViolation,
        _ => ErrorKind::Transport,
    }
}

fn ot_kind(e: &setops_ot::Error) -> ErrorKind {
    match e {
        setops_ot::Error::IoError(e) => io_kind(e),
        setops_ot::Error::CoinTossError(e) => cointoss_kind(e),
        setops_ot::Error::InvalidInputLength | setops_ot::Error::InvalidPermutation => {
            ErrorKind::ProtocolViolation
        }
    }
}

fn cointoss_kind(e: &cointoss::Error) -> ErrorKind {
    match e {
        cointoss::Error::IoError(e) => io_kind(e),
        cointoss::Error::CommitmentCheckFailed => ErrorKind::ProtocolViolation,
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_)
            | Error::InvalidCuckooSetSize(_)
            | Error::InvalidCuckooParameters { .. }
            | Error::ThreadPool(_) => ErrorKind::Configuration,
            Error::IoError(e) => io_kind(e),
            Error::CoinTossError(e) => cointoss_kind(e),
            Error::OtError(e) => ot_kind(e),
            Error::TwopacError(TwopacError::IoError(e)) => io_kind(e),
            Error::TwopacError(TwopacError::OtError(e)) => ot_kind(e),
            Error::TwopacError(_)
            | Error::CuckooHashFull
            | Error::PeerCuckooFailure
            | Error::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::CoinTossError(e) => Some(e),
            Error::OtError(e) => Some(e),
            Error::TwopacError(e) => Some(e),
            Error::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    #[inline]
    fn from(e: std::io::Error) -> Error {
        Error::IoError(e)
    }
}

impl From<setops_ot::Error> for Error {
    #[inline]
    fn from(e: setops_ot::Error) -> Error {
        Error::OtError(e)
    }
}

impl From<cointoss::Error> for Error {
    #[inline]
    fn from(e: cointoss::Error) -> Error {
        Error::CoinTossError(e)
    }
}

impl From<TwopacError> for Error {
    #[inline]
    fn from(e: TwopacError) -> Error {
        Error::TwopacError(e)
    }
}

impl From<GarblerError> for Error {
    #[inline]
    fn from(e: GarblerError) -> Error {
        Error::TwopacError(TwopacError::GarblerError(e))
    }
}

impl From<EvaluatorError> for Error {
    #[inline]
    fn from(e: EvaluatorError) -> Error {
        Error::TwopacError(TwopacError::EvaluatorError(e))
    }
}

impl From<FancyError> for Error {
    #[inline]
    fn from(e: FancyError) -> Error {
        Error::TwopacError(TwopacError::FancyError(e))
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    #[inline]
    fn from(e: rayon::ThreadPoolBuildError) -> Error {
        Error::ThreadPool(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Configuration(s) => write!(f, "configuration error: {}", s),
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::CoinTossError(e) => write!(f, "coin toss error: {}", e),
            Error::OtError(e) => write!(f, "oblivious transfer error: {}", e),
            Error::TwopacError(e) => write!(f, "2PC protocol error: {}", e),
            Error::CuckooHashFull => write!(f, "cuckoo hash error: table is full"),
            Error::InvalidCuckooSetSize(n) => {
                write!(f, "cuckoo hash error: invalid set size {}", n)
            }
            Error::InvalidCuckooParameters { nitems, nhashes } => write!(
                f,
                "cuckoo hash error: no parameters set for {} items and {} hashes",
                nitems, nhashes
            ),
            Error::PeerCuckooFailure => write!(f, "peer failed to build its cuckoo table"),
            Error::ProtocolViolation(s) => write!(f, "protocol violation: {}", s),
            Error::ThreadPool(e) => write!(f, "worker pool error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_kinds() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(Error::from(eof).kind(), ErrorKind::Transport);
        let bad = io::Error::new(io::ErrorKind::InvalidData, "bad point");
        assert_eq!(Error::from(bad).kind(), ErrorKind::ProtocolViolation);
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let nested = Error::from(setops_ot::Error::from(cointoss::Error::from(reset)));
        assert_eq!(nested.kind(), ErrorKind::Transport);
        assert_eq!(
            Error::from(cointoss::Error::CommitmentCheckFailed).kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(Error::CuckooHashFull.kind(), ErrorKind::ProtocolViolation);
        assert_eq!(
            Error::Configuration("x".into()).kind(),
            ErrorKind::Configuration
        );
        let gc = Error::from(EvaluatorError::DecodingFailed);
        assert_eq!(gc.kind(), ErrorKind::ProtocolViolation);
    }
}
