// -*- mode: rust; -*-
//
// This file is part of `setops-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::AbstractChannel;
use std::io::Result;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Idle,
    Reading,
    Writing,
}

/// A channel for tracking the number of bytes read/written and the number of
/// communication rounds.
///
/// A round starts with the first write that follows a read (or the very first
/// write), so a protocol that alternates "send everything, then receive
/// everything" advances by one round per send.
pub struct TrackChannel<C> {
    channel: C,
    nbytes_read: usize,
    nbytes_written: usize,
    rounds: usize,
    direction: Direction,
}

impl<C: AbstractChannel> TrackChannel<C> {
    /// Make a new `TrackChannel` wrapping `channel`.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            nbytes_read: 0,
            nbytes_written: 0,
            rounds: 0,
            direction: Direction::Idle,
        }
    }

    /// Clear the counters.
    pub fn clear(&mut self) {
        self.nbytes_read = 0;
        self.nbytes_written = 0;
        self.rounds = 0;
        self.direction = Direction::Idle;
    }

    /// Return the number of bytes written to the channel.
    pub fn bytes_written(&self) -> usize {
        self.nbytes_written
    }

    /// Return the number of bytes read from the channel.
    pub fn bytes_read(&self) -> usize {
        self.nbytes_read
    }

    /// Return the number of rounds observed so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Return the number of kilobytes written to the channel.
    pub fn kilobytes_written(&self) -> f64 {
        self.nbytes_written as f64 / 1024.0
    }

    /// Return the number of kilobytes read from the channel.
    pub fn kilobytes_read(&self) -> f64 {
        self.nbytes_read as f64 / 1024.0
    }

    /// Return the total amount of communication on the channel as kilobytes.
    pub fn total_kilobytes(&self) -> f64 {
        self.kilobytes_written() + self.kilobytes_read()
    }

    /// Return the wrapped channel.
    pub fn into_inner(self) -> C {
        self.channel
    }
}

impl<C: AbstractChannel> AbstractChannel for TrackChannel<C> {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.direction != Direction::Writing {
            self.rounds += 1;
            self.direction = Direction::Writing;
        }
        self.nbytes_written += bytes.len();
        self.channel.write_bytes(bytes)
    }

    #[inline]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.direction = Direction::Reading;
        self.nbytes_read += bytes.len();
        self.channel.read_bytes(bytes)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        self.channel.flush()
    }

    #[inline]
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            nbytes_written: self.nbytes_written,
            nbytes_read: self.nbytes_read,
            rounds: self.rounds,
            direction: self.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unix_channel_pair;

    #[test]
    fn test_counts_bytes_and_rounds() {
        let (a, b) = unix_channel_pair().unwrap();
        let mut a = TrackChannel::new(a);
        let mut b = TrackChannel::new(b);
        let handle = std::thread::spawn(move || {
            b.write_u64(1).unwrap();
            b.write_u8(2).unwrap();
            b.flush().unwrap();
            b.read_u32().unwrap();
            b.write_u8(3).unwrap();
            b.flush().unwrap();
            (b.bytes_written(), b.bytes_read(), b.rounds())
        });
        assert_eq!(a.read_u64().unwrap(), 1);
        assert_eq!(a.read_u8().unwrap(), 2);
        a.write_u32(9).unwrap();
        a.flush().unwrap();
        assert_eq!(a.read_u8().unwrap(), 3);
        assert_eq!(a.bytes_read(), 10);
        assert_eq!(a.bytes_written(), 4);
        assert_eq!(a.rounds(), 1);
        assert_eq!(handle.join().unwrap(), (10, 4, 2));
    }
}
