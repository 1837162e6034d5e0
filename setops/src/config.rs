// -*- mode: rust; -*-
//
// This file is part of `setops`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Session configuration.
//!
//! A `SessionConfig` is read once (usually from JSON), validated before any
//! network I/O, and then owned immutably by a `Psi` or `Pjc` coordinator.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, path::Path};

/// Default read/write timeout of the TCP transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Where this party listens and where its peer listens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetParams {
    /// Host name or address of the peer.
    pub remote_addr: String,
    /// Port the peer listens on.
    pub remote_port: u16,
    /// Port this party listens on.
    pub local_port: u16,
    /// Timeout in seconds for connecting and for every blocking read or write.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl NetParams {
    /// Check the parameters in isolation.
    pub fn validate(&self) -> Result<(), Error> {
        if self.remote_addr.is_empty() || self.remote_addr.chars().any(char::is_whitespace) {
            return Err(Error::Configuration(format!(
                "invalid remote address {:?}",
                self.remote_addr
            )));
        }
        if self.remote_port == 0 || self.local_port == 0 {
            return Err(Error::Configuration("ports must be non-zero".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration("timeout must be non-zero".into()));
        }
        if self.is_loopback() && self.remote_port == self.local_port {
            return Err(Error::Configuration(format!(
                "both parties would listen on port {} of {}",
                self.local_port, self.remote_addr
            )));
        }
        Ok(())
    }

    fn is_loopback(&self) -> bool {
        self.remote_addr == "localhost"
            || self
                .remote_addr
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
    }
}

/// Transport used to reach the peer.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetScheme {
    /// Plain TCP sockets.
    #[default]
    #[serde(rename = "SOCKET")]
    Socket,
}

/// Private set intersection protocols.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PsiScheme {
    /// Diffie-Hellman blind-and-compare over Ristretto255.
    #[default]
    #[serde(rename = "ECDH_PSI")]
    Ecdh,
    /// OPRF-based PSI on top of OT extension.
    #[serde(rename = "KKRT_PSI")]
    Kkrt,
}

/// Private join-and-compute protocols.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PjcScheme {
    /// Garbled-circuit PSI with secret-shared payloads.
    #[default]
    #[serde(rename = "CIRCUIT_PSI")]
    CircuitPsi,
}

/// Cuckoo hashing parameters of KKRT-PSI.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KkrtParams {
    /// Ratio of bins to receiver items.
    pub epsilon: f64,
    /// Number of cuckoo hash functions.
    pub fun_num: usize,
    /// Bound on the eviction walk when inserting one item.
    pub max_evictions: usize,
}

impl Default for KkrtParams {
    fn default() -> Self {
        KkrtParams {
            epsilon: 1.27,
            fun_num: 3,
            max_evictions: 1000,
        }
    }
}

/// Parameters of Circuit-PSI.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CircuitParams {
    /// Ratio of bins to requester keys.
    pub epsilon: f64,
    /// Number of cuckoo hash functions.
    pub fun_num: usize,
    /// Expansion of the hint table over the other party's simple-hashed entries.
    pub fun_epsilon: f64,
    /// Number of hash functions of the hint table.
    pub hint_fun_num: usize,
    /// Bound on the eviction walk when inserting one item.
    pub max_evictions: usize,
    /// The party whose keys index the output rows.
    pub requester: u8,
}

impl Default for CircuitParams {
    fn default() -> Self {
        CircuitParams {
            epsilon: 1.27,
            fun_num: 3,
            fun_epsilon: 1.27,
            hint_fun_num: 3,
            max_evictions: 1000,
            requester: 0,
        }
    }
}

/// Everything a party needs to run one session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// This party's role, 0 or 1.
    pub party_id: u8,
    /// Addressing of both parties.
    pub net_params: NetParams,
    /// Transport.
    #[serde(default)]
    pub net_scheme: NetScheme,
    /// Protocol used by `Psi`.
    #[serde(default)]
    pub psi_scheme: PsiScheme,
    /// Protocol used by `Pjc`.
    #[serde(default)]
    pub pjc_scheme: PjcScheme,
    /// KKRT-PSI parameters.
    #[serde(default)]
    pub kkrt: KkrtParams,
    /// Circuit-PSI parameters.
    #[serde(default)]
    pub circuit: CircuitParams,
    /// Number of worker threads; all cores when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

fn check_epsilon(name: &str, eps: f64) -> Result<(), Error> {
    if !eps.is_finite() || eps < 1.0 {
        return Err(Error::Configuration(format!(
            "{} must be a finite number >= 1, got {}",
            name, eps
        )));
    }
    Ok(())
}

fn check_nhashes(name: &str, n: usize) -> Result<(), Error> {
    if !(3..=5).contains(&n) {
        return Err(Error::Configuration(format!(
            "{} must be 3, 4 or 5, got {}",
            name, n
        )));
    }
    Ok(())
}

impl SessionConfig {
    /// A configuration with default protocol parameters.
    pub fn new(party_id: u8, net_params: NetParams) -> Self {
        SessionConfig {
            party_id,
            net_params,
            net_scheme: NetScheme::default(),
            psi_scheme: PsiScheme::default(),
            pjc_scheme: PjcScheme::default(),
            kkrt: KkrtParams::default(),
            circuit: CircuitParams::default(),
            threads: None,
        }
    }

    /// Parse a JSON configuration.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Read a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&s)
    }

    /// Check every field. Runs before any network I/O.
    pub fn validate(&self) -> Result<(), Error> {
        if self.party_id > 1 {
            return Err(Error::Configuration(format!(
                "party id must be 0 or 1, got {}",
                self.party_id
            )));
        }
        self.net_params.validate()?;
        check_epsilon("kkrt.epsilon", self.kkrt.epsilon)?;
        check_nhashes("kkrt.fun_num", self.kkrt.fun_num)?;
        if self.kkrt.max_evictions == 0 {
            return Err(Error::Configuration(
                "kkrt.max_evictions must be non-zero".into(),
            ));
        }
        check_epsilon("circuit.epsilon", self.circuit.epsilon)?;
        check_epsilon("circuit.fun_epsilon", self.circuit.fun_epsilon)?;
        check_nhashes("circuit.fun_num", self.circuit.fun_num)?;
        check_nhashes("circuit.hint_fun_num", self.circuit.hint_fun_num)?;
        if self.circuit.max_evictions == 0 {
            return Err(Error::Configuration(
                "circuit.max_evictions must be non-zero".into(),
            ));
        }
        if self.circuit.requester > 1 {
            return Err(Error::Configuration(format!(
                "circuit.requester must be 0 or 1, got {}",
                self.circuit.requester
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::Configuration("threads must be non-zero".into()));
        }
        Ok(())
    }

    /// Number of worker threads to use.
    pub fn nthreads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    /// A worker pool sized by `nthreads`.
    pub(crate) fn thread_pool(&self) -> Result<rayon::ThreadPool, Error> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.nthreads())
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn net() -> NetParams {
        NetParams {
            remote_addr: "127.0.0.1".into(),
            remote_port: 9001,
            local_port: 9002,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    fn rejected(cfg: &SessionConfig) -> bool {
        matches!(cfg.validate(), Err(e) if e.kind() == ErrorKind::Configuration)
    }

    #[test]
    fn test_parse_defaults() {
        let cfg = SessionConfig::from_json(
            r#"{
                "party_id": 1,
                "net_params": {"remote_addr": "127.0.0.1", "remote_port": 9001, "local_port": 9002},
                "psi_scheme": "KKRT_PSI"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.party_id, 1);
        assert_eq!(cfg.net_params.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.net_scheme, NetScheme::Socket);
        assert_eq!(cfg.psi_scheme, PsiScheme::Kkrt);
        assert_eq!(cfg.pjc_scheme, PjcScheme::CircuitPsi);
        assert_eq!(cfg.kkrt, KkrtParams::default());
        assert_eq!(cfg.circuit, CircuitParams::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_scheme() {
        let err = SessionConfig::from_json(
            r#"{
                "party_id": 0,
                "net_params": {"remote_addr": "127.0.0.1", "remote_port": 1, "local_port": 2},
                "psi_scheme": "RSA_PSI"
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_validate() {
        let good = SessionConfig::new(0, net());
        assert!(good.validate().is_ok());

        let mut cfg = good.clone();
        cfg.party_id = 2;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.net_params.local_port = cfg.net_params.remote_port;
        assert!(rejected(&cfg));
        cfg.net_params.remote_addr = "10.0.0.7".into();
        assert!(cfg.validate().is_ok());

        let mut cfg = good.clone();
        cfg.net_params.remote_addr = "my host".into();
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.net_params.remote_port = 0;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.net_params.timeout_secs = 0;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.kkrt.epsilon = 0.5;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.circuit.fun_epsilon = f64::NAN;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.circuit.hint_fun_num = 2;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.kkrt.max_evictions = 0;
        assert!(rejected(&cfg));

        let mut cfg = good.clone();
        cfg.circuit.requester = 3;
        assert!(rejected(&cfg));

        let mut cfg = good;
        cfg.threads = Some(0);
        assert!(rejected(&cfg));
    }
}
