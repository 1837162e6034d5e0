// -*- mode: rust; -*-
//
// This file is part of `setops-ot`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

#![doc = include_str!("../README.md")]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]

mod errors;

pub use crate::errors::Error;
pub mod oprf;
pub mod osn;
pub mod ot;
