use crate::SyncChannel;
use std::{
    io::{BufReader, BufWriter, Result},
    os::unix::net::UnixStream,
};

/// A SyncChannel which uses UnixStreams.
pub type UnixChannel = SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>;

/// Convenience function to create a pair of UnixChannels for local tests.
pub fn unix_channel_pair() -> Result<(UnixChannel, UnixChannel)> {
    let (tx, rx) = UnixStream::pair()?;
    let sender = SyncChannel::new(BufReader::new(tx.try_clone()?), BufWriter::new(tx));
    let receiver = SyncChannel::new(BufReader::new(rx.try_clone()?), BufWriter::new(rx));
    Ok((sender, receiver))
}
