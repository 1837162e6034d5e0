// -*- mode: rust; -*-
//
// This file is part of `setops-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

#![allow(clippy::many_single_char_names)]
#![deny(missing_docs)]

//! Low-level primitives used by the set-operation protocols.

#[cfg(not(target_endian = "little"))]
compile_error!("`setops-primitives` encodes blocks in little-endian byte order");

mod aes;
mod block;
mod block512;
/// Module for encapsulating communication channels.
pub mod channel;
pub mod cointoss;
pub mod ecc;
mod hash_aes;
mod rand_aes;
pub mod utils;

pub use crate::{
    aes::{Aes128, Aes256},
    block::Block,
    block512::Block512,
    channel::{AbstractChannel, SyncChannel, TrackChannel},
    hash_aes::{AesHash, AES_HASH},
    rand_aes::AesRng,
};

#[cfg(unix)]
pub use crate::channel::{unix_channel_pair, UnixChannel};

/// A marker trait denoting that the given scheme is semi-honest secure.
pub trait SemiHonest {}
