//! Implementation of a simple two-party coin tossing protocol using a PRG as a
//! commitment.
//!
//! On input `seed`, the sender computes `r := PRG(seed)` and sends `r` to the
//! receiver. It then receives `seed_` from the receiver and outputs `seed ⊕
//! seed_`. Likewise, on input `seed`, the receiver gets `r`, sends `seed` to
//! the sender, and then receives `seed_`, checking that `PRG(seed_) = r`.

use crate::{AbstractChannel, AesRng, Block};
use rand_core::{RngCore, SeedableRng};
use subtle::ConstantTimeEq;

/// Errors produced by the coin tossing protocol.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred.
    IoError(std::io::Error),
    /// The commitment check failed.
    CommitmentCheckFailed,
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::CommitmentCheckFailed => "commitment check failed".fmt(f),
        }
    }
}

fn commit(seed: Block) -> Block {
    let mut rng = AesRng::from_seed(seed);
    let mut com = Block::default();
    rng.fill_bytes(com.as_mut());
    com
}

/// Coin tossing sender.
#[inline]
pub fn send<C: AbstractChannel>(channel: &mut C, seeds: &[Block]) -> Result<Vec<Block>, Error> {
    for seed in seeds.iter() {
        channel.write_block(&commit(*seed))?;
    }
    channel.flush()?;
    let mut out = Vec::with_capacity(seeds.len());
    for seed in seeds.iter() {
        let seed_ = channel.read_block()?;
        out.push(*seed ^ seed_);
    }
    for seed in seeds.iter() {
        channel.write_block(seed)?;
    }
    channel.flush()?;
    Ok(out)
}

/// Coin tossing receiver.
#[inline]
pub fn receive<C: AbstractChannel>(channel: &mut C, seeds: &[Block]) -> Result<Vec<Block>, Error> {
    let coms = channel.read_blocks(seeds.len())?;
    for seed in seeds.iter() {
        channel.write_block(seed)?;
    }
    channel.flush()?;
    let mut out = Vec::with_capacity(seeds.len());
    for (seed, com) in seeds.iter().zip(coms.into_iter()) {
        let seed_ = channel.read_block()?;
        if !bool::from(commit(seed_).ct_eq(&com)) {
            return Err(Error::CommitmentCheckFailed);
        }
        out.push(*seed ^ seed_)
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unix_channel_pair;

    #[test]
    fn test() {
        let (mut sender, mut receiver) = unix_channel_pair().unwrap();
        let seed = rand::random::<Block>();
        let seed_ = rand::random::<Block>();
        let handle = std::thread::spawn(move || {
            let output = send(&mut sender, &[seed]).unwrap();
            assert_eq!(output[0], seed ^ seed_);
        });
        let output_ = receive(&mut receiver, &[seed_]).unwrap();
        assert_eq!(output_[0], seed ^ seed_);
        handle.join().unwrap();
    }

    #[test]
    fn test_equivocation_is_caught() {
        let (mut sender, mut receiver) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            sender.write_block(&commit(Block(1))).unwrap();
            sender.flush().unwrap();
            let _ = sender.read_block().unwrap();
            sender.write_block(&Block(2)).unwrap();
            sender.flush().unwrap();
        });
        let result = receive(&mut receiver, &[Block(3)]);
        assert!(matches!(result, Err(Error::CommitmentCheckFailed)));
        handle.join().unwrap();
    }
}
