// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! One protocol run over one connection.

use crate::Error;
use log::{error, log, Level};
use setops_primitives::{AbstractChannel, TrackChannel};

/// Lifecycle of a [`Session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no channel yet.
    Configured,
    /// A channel is attached; no protocol traffic yet.
    Connected,
    /// A protocol is running; `round` counts the exchanges so far.
    Exchanging {
        /// Current round, starting from 1.
        round: usize,
    },
    /// The protocol completed and produced a result.
    Finalized,
    /// The protocol failed in `round`. Terminal.
    Aborted {
        /// Round in which the failure occurred.
        round: usize,
    },
}

/// A single-use protocol session over a channel `C`.
///
/// Traffic is counted; a *round* is one switch from reading to writing.
pub struct Session<C> {
    state: SessionState,
    channel: Option<TrackChannel<C>>,
    verbose: bool,
    nbytes_written: usize,
    nbytes_read: usize,
    rounds: usize,
}

impl<C: AbstractChannel> Session<C> {
    /// A new session. `verbose` raises progress messages from `debug` to `info`.
    pub fn new(verbose: bool) -> Self {
        Session {
            state: SessionState::Configured,
            channel: None,
            verbose,
            nbytes_written: 0,
            nbytes_read: 0,
            rounds: 0,
        }
    }

    /// Attach the connected channel.
    pub fn connect(&mut self, channel: C) -> Result<(), Error> {
        if self.state != SessionState::Configured {
            return Err(Error::Configuration(format!(
                "cannot connect a session in state {:?}",
                self.state
            )));
        }
        self.channel = Some(TrackChannel::new(channel));
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether progress is logged at `info`.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.channel
            .as_ref()
            .map_or(self.nbytes_written, TrackChannel::bytes_written)
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> usize {
        self.channel
            .as_ref()
            .map_or(self.nbytes_read, TrackChannel::bytes_read)
    }

    /// Rounds so far.
    pub fn rounds(&self) -> usize {
        self.channel.as_ref().map_or(self.rounds, TrackChannel::rounds)
    }

    /// Run `protocol` as this session's only exchange.
    ///
    /// The channel is released when the exchange ends, whatever the outcome.
    pub(crate) fn exchange<T, F>(&mut self, name: &str, protocol: F) -> Result<T, Error>
    where
        F: FnOnce(&mut TrackChannel<C>, bool) -> Result<T, Error>,
    {
        let mut channel = match (self.state, self.channel.take()) {
            (SessionState::Connected, Some(channel)) => channel,
            (state, channel) => {
                self.channel = channel;
                return Err(Error::Configuration(format!(
                    "cannot run {} on a session in state {:?}",
                    name, state
                )));
            }
        };
        self.state = SessionState::Exchanging { round: 1 };
        let result = protocol(&mut channel, self.verbose);
        self.nbytes_written = channel.bytes_written();
        self.nbytes_read = channel.bytes_read();
        self.rounds = channel.rounds();
        match result {
            Ok(out) => {
                self.state = SessionState::Finalized;
                log!(
                    progress_level(self.verbose),
                    "{} finished: {} bytes sent, {} bytes received, {} rounds",
                    name,
                    self.nbytes_written,
                    self.nbytes_read,
                    self.rounds
                );
                Ok(out)
            }
            Err(e) => {
                let round = self.rounds.max(1);
                self.state = SessionState::Aborted { round };
                error!("{} aborted in round {}: {}", name, round, e);
                Err(e)
            }
        }
    }
}

/// Level of per-phase progress messages.
#[inline]
pub(crate) fn progress_level(verbose: bool) -> Level {
    if verbose {
        Level::Info
    } else {
        Level::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use setops_primitives::{unix_channel_pair, UnixChannel};

    #[test]
    fn test_lifecycle() {
        let (a, b) = unix_channel_pair().unwrap();
        let mut session = Session::<UnixChannel>::new(false);
        assert_eq!(session.state(), SessionState::Configured);
        let err = session.exchange("test", |_, _| Ok(())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        session.connect(a).unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        let handle = std::thread::spawn(move || {
            let mut b = b;
            b.read_u64().unwrap()
        });
        let out = session
            .exchange("test", |channel, _| {
                channel.write_u64(5)?;
                channel.flush()?;
                Ok(3)
            })
            .unwrap();
        assert_eq!(out, 3);
        assert_eq!(handle.join().unwrap(), 5);
        assert_eq!(session.state(), SessionState::Finalized);
        assert_eq!(session.bytes_written(), 8);
        assert_eq!(session.bytes_read(), 0);
        assert_eq!(session.rounds(), 1);

        let err = session.exchange("again", |_, _| Ok(())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(session.state(), SessionState::Finalized);
    }

    #[test]
    fn test_abort_records_round() {
        let (a, b) = unix_channel_pair().unwrap();
        drop(b);
        let mut session = Session::new(true);
        session.connect(a).unwrap();
        let err = session
            .exchange("test", |channel, _| Ok(channel.read_u64()?))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(session.state(), SessionState::Aborted { round: 1 });
        let (c, _d) = unix_channel_pair().unwrap();
        assert!(session.connect(c).is_err());
    }
}
