// -*- mode: rust; -*-
//
// This file is part of `setops-garble`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! `setops-garble` provides boolean garbling capabilities.

#![deny(clippy::all)]
#![allow(clippy::many_single_char_names, clippy::needless_range_loop)]
#![allow(non_snake_case)]
#![deny(missing_docs)]

pub mod dummy;
pub mod errors;
mod fancy;
mod garble;
pub mod twopac;
pub mod util;
mod wire;

pub use crate::{errors::FancyError, fancy::*, garble::*, wire::*};
