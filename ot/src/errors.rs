// -*- mode: rust; -*-
//
// This file is part of `setops-ot`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use setops_primitives::cointoss;

/// Errors produced by `setops-ot`.
#[derive(Debug)]
pub enum Error {
    /// The input length is invalid.
    InvalidInputLength,
    /// The input does not describe a permutation.
    InvalidPermutation,
    /// An I/O error has occurred.
    IoError(std::io::Error),
    /// Coin tossing failed.
    CoinTossError(cointoss::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::CoinTossError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IoError(e)
    }
}

impl From<cointoss::Error> for Error {
    fn from(e: cointoss::Error) -> Error {
        Error::CoinTossError(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidInputLength => "invalid input length".fmt(f),
            Error::InvalidPermutation => "input is not a permutation".fmt(f),
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::CoinTossError(e) => write!(f, "coin toss error: {}", e),
        }
    }
}
