// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! `setops` implements two-party set operations between semi-honest parties.
//!
//! * [`Psi`]: private set intersection, by Diffie-Hellman blinding
//!   ([`psi::ecdh`]) or by a batched OPRF ([`psi::kkrt`]), revealing the
//!   intersection or only its size to one or both parties.
//! * [`Pjc`]: private join-and-compute, giving both parties additive shares
//!   of the features of the common keys without revealing the intersection.
//!
//! Every run starts with a handshake checking that both parties agree on the
//! protocol and its parameters, and is driven by a single-use [`Session`].

#![deny(missing_docs)]
#![allow(clippy::many_single_char_names)]

pub mod config;
mod cuckoo;
mod errors;
mod handshake;
pub mod pjc;
pub mod psi;
pub mod session;
pub mod transport;
mod utils;

pub use crate::{
    config::{CircuitParams, KkrtParams, NetParams, NetScheme, PjcScheme, PsiScheme, SessionConfig},
    errors::{Error, ErrorKind},
    pjc::{Pjc, ShareMatrix},
    psi::Psi,
    session::{Session, SessionState},
    transport::{connect, CancelHandle, TcpChannel},
};
