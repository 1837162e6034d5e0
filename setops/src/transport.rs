// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! TCP transport between the two parties.
//!
//! Each party listens on `local_port` and dials `remote_addr:remote_port`.
//! Reads go through the accepted stream and writes through the dialled one,
//! so the setup is symmetric and neither party needs to know who starts first.

use crate::{config::NetParams, Error};
use log::{debug, info};
use setops_primitives::SyncChannel;
use std::{
    io::{BufReader, BufWriter, ErrorKind},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    time::{Duration, Instant},
};

/// A buffered channel over TCP.
pub type TcpChannel = SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>;

const RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Closes a `TcpChannel` from another thread.
///
/// A party blocked on the channel wakes up with a transport error, and so does
/// its peer.
#[derive(Debug)]
pub struct CancelHandle {
    streams: Vec<TcpStream>,
}

impl CancelHandle {
    /// Shut both directions of the connection down.
    pub fn cancel(&self) {
        for stream in self.streams.iter() {
            // The stream may already be closed.
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

fn resolve(params: &NetParams) -> Result<SocketAddr, Error> {
    (params.remote_addr.as_str(), params.remote_port)
        .to_socket_addrs()
        .map_err(|e| {
            Error::Configuration(format!("cannot resolve {}: {}", params.remote_addr, e))
        })?
        .next()
        .ok_or_else(|| Error::Configuration(format!("no address for {}", params.remote_addr)))
}

/// The wildcard address of `remote`'s family, so that a peer reached over
/// IPv6 can dial back over IPv6.
fn listen_addr(remote: &SocketAddr, local_port: u16) -> SocketAddr {
    let ip: IpAddr = match remote {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    };
    SocketAddr::new(ip, local_port)
}

fn timed_out(what: &str) -> Error {
    Error::IoError(std::io::Error::new(
        ErrorKind::TimedOut,
        format!("timed out while {}", what),
    ))
}

fn dial(addr: SocketAddr, deadline: Instant) -> Result<TcpStream, Error> {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(timed_out("connecting to the peer"));
        }
        match TcpStream::connect_timeout(&addr, deadline - now) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("connecting to {} failed: {}", addr, e);
                std::thread::sleep(RETRY_INTERVAL);
            }
        }
    }
}

fn accept(listener: &TcpListener, deadline: Instant) -> Result<TcpStream, Error> {
    listener.set_nonblocking(true)?;
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                debug!("accepted connection from {}", addr);
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(timed_out("waiting for the peer"));
                }
                std::thread::sleep(RETRY_INTERVAL);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Connect to the peer described by `params`.
///
/// Connection setup is retried until `timeout_secs` have passed. Once
/// connected, every read or write that blocks longer than `timeout_secs` fails.
pub fn connect(params: &NetParams) -> Result<(TcpChannel, CancelHandle), Error> {
    params.validate()?;
    let addr = resolve(params)?;
    let timeout = Duration::from_secs(params.timeout_secs);
    let deadline = Instant::now() + timeout;

    let listener = TcpListener::bind(listen_addr(&addr, params.local_port))?;
    let outgoing = dial(addr, deadline)?;
    let incoming = accept(&listener, deadline)?;
    info!(
        "connected to {} (listening on port {})",
        addr, params.local_port
    );

    for stream in [&outgoing, &incoming] {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
    }
    let handle = CancelHandle {
        streams: vec![outgoing.try_clone()?, incoming.try_clone()?],
    };
    let channel = SyncChannel::new(BufReader::new(incoming), BufWriter::new(outgoing));
    Ok((channel, handle))
}
