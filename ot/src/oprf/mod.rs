//! Batched oblivious PRF.
//!
//! One run evaluates `m` independent PRF instances. The sender ends up with
//! a [`Seed`] per instance and may evaluate it on any input; the receiver
//! learns the output of instance `i` on its `i`-th input only.

pub mod kkrt;
mod prc;

use crate::ot;
use setops_primitives::{Block, Block512};

/// Per-instance key held by the sender.
pub type Seed = Block512;
/// PRF output.
pub type Output = Block;

/// KKRT sender over ALSZ OT extension with Chou-Orlandi base OTs.
pub type KkrtSender = kkrt::Sender<ot::AlszReceiver>;
/// KKRT receiver over ALSZ OT extension with Chou-Orlandi base OTs.
pub type KkrtReceiver = kkrt::Receiver<ot::AlszSender>;
