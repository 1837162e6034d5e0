//! Errors that may be output by this library.

use std::fmt::{self, Display, Formatter};

/// Errors that may occur when using the `Fancy` trait. These errors are
/// API-usage errors, such as xoring two bundles of different widths.
#[derive(Debug)]
pub enum FancyError {
    /// Invalid argument.
    InvalidArg(String),
    /// Invalid number of arguments.
    InvalidArgNum {
        /// Received number of arguments.
        got: usize,
        /// Expected number of arguments.
        needed: usize,
    },
    /// Bundles of different widths.
    UnequalBundleLengths {
        /// Width of the left bundle.
        left: usize,
        /// Width of the right bundle.
        right: usize,
    },
}

/// Errors from the dummy fancy object.
#[derive(Debug)]
pub enum DummyError {
    /// A fancy error has occurred.
    FancyError(FancyError),
}

/// Errors from the evaluator.
#[derive(Debug)]
pub enum EvaluatorError {
    /// The garbled table ran out before the circuit did.
    TableExhausted {
        /// Number of ciphertexts in the table.
        len: usize,
    },
    /// The circuit finished with ciphertexts left over.
    TrailingTable {
        /// Number of ciphertexts consumed.
        used: usize,
        /// Number of ciphertexts in the table.
        len: usize,
    },
    /// The circuit has more outputs than decoding bits were provided.
    DecodingFailed,
    /// A communication error has occurred.
    CommunicationError(String),
    /// A fancy error has occurred.
    FancyError(FancyError),
}

/// Errors from the garbler.
#[derive(Debug)]
pub enum GarblerError {
    /// An error occurred while processing a message.
    CommunicationError(String),
    /// A fancy error has occurred.
    FancyError(FancyError),
}

////////////////////////////////////////////////////////////////////////////////
// fancy error
//

impl Display for FancyError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FancyError::InvalidArg(s) => write!(f, "invalid argument: {}", s),
            FancyError::InvalidArgNum { got, needed } => write!(
                f,
                "invalid number of arguments: needed {} but got {}",
                needed, got
            ),
            FancyError::UnequalBundleLengths { left, right } => write!(
                f,
                "bundles have different widths: {} and {}",
                left, right
            ),
        }
    }
}

impl std::error::Error for FancyError {}

////////////////////////////////////////////////////////////////////////////////
// Dummy error

impl Display for DummyError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DummyError::FancyError(e) => write!(f, "fancy error: {}", e),
        }
    }
}

impl From<FancyError> for DummyError {
    fn from(e: FancyError) -> DummyError {
        DummyError::FancyError(e)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Evaluator error

impl Display for EvaluatorError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            EvaluatorError::TableExhausted { len } => {
                write!(f, "garbled table exhausted after {} ciphertexts", len)
            }
            EvaluatorError::TrailingTable { used, len } => write!(
                f,
                "garbled table has {} ciphertexts but the circuit used {}",
                len, used
            ),
            EvaluatorError::DecodingFailed => "decoding failed".fmt(f),
            EvaluatorError::CommunicationError(s) => write!(f, "communication error: {}", s),
            EvaluatorError::FancyError(e) => write!(f, "fancy error: {}", e),
        }
    }
}

impl std::error::Error for EvaluatorError {}

impl From<FancyError> for EvaluatorError {
    fn from(e: FancyError) -> Self {
        EvaluatorError::FancyError(e)
    }
}

impl From<std::io::Error> for EvaluatorError {
    fn from(e: std::io::Error) -> Self {
        EvaluatorError::CommunicationError(e.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Garbler error

impl Display for GarblerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            GarblerError::CommunicationError(s) => write!(f, "{}", s),
            GarblerError::FancyError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GarblerError {}

impl From<FancyError> for GarblerError {
    fn from(e: FancyError) -> Self {
        GarblerError::FancyError(e)
    }
}

impl From<std::io::Error> for GarblerError {
    fn from(e: std::io::Error) -> Self {
        GarblerError::CommunicationError(e.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////
// 2PC errors

/// Errors produced by `twopac`.
#[derive(Debug)]
pub enum TwopacError {
    /// An I/O error has occurred.
    IoError(std::io::Error),
    /// An oblivious transfer error has occurred.
    OtError(setops_ot::Error),
    /// The garbler produced an error.
    GarblerError(GarblerError),
    /// The evaluator produced an error.
    EvaluatorError(EvaluatorError),
    /// Processing the garbled circuit produced an error.
    FancyError(FancyError),
}

impl std::error::Error for TwopacError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TwopacError::IoError(e) => Some(e),
            TwopacError::OtError(e) => Some(e),
            TwopacError::GarblerError(e) => Some(e),
            TwopacError::EvaluatorError(e) => Some(e),
            TwopacError::FancyError(e) => Some(e),
        }
    }
}

impl From<setops_ot::Error> for TwopacError {
    fn from(e: setops_ot::Error) -> TwopacError {
        TwopacError::OtError(e)
    }
}

impl From<std::io::Error> for TwopacError {
    fn from(e: std::io::Error) -> TwopacError {
        TwopacError::IoError(e)
    }
}

impl From<EvaluatorError> for TwopacError {
    fn from(e: EvaluatorError) -> TwopacError {
        TwopacError::EvaluatorError(e)
    }
}

impl From<GarblerError> for TwopacError {
    fn from(e: GarblerError) -> TwopacError {
        TwopacError::GarblerError(e)
    }
}

impl From<FancyError> for TwopacError {
    fn from(e: FancyError) -> TwopacError {
        TwopacError::FancyError(e)
    }
}

impl std::fmt::Display for TwopacError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TwopacError::IoError(e) => write!(f, "IO error: {}", e),
            TwopacError::OtError(e) => write!(f, "oblivious transfer error: {}", e),
            TwopacError::EvaluatorError(e) => write!(f, "evaluator error: {}", e),
            TwopacError::GarblerError(e) => write!(f, "garbler error: {}", e),
            TwopacError::FancyError(e) => write!(f, "fancy error: {}", e),
        }
    }
}
