//! Error types for the puppet engine

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Core puppet errors
///
/// Only setup and transport failures are expected to reach the caller.
/// Parse and decode problems are handled where they happen.
#[derive(Error, Debug)]
pub enum PuppetError {
    // Transport errors
    #[error("Failed to bind capture socket on {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Receiver is not running")]
    ReceiverStopped,

    // Corpus errors
    #[error("Sprite corpus directory not found under {0}")]
    CorpusNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Failed to decode sprite {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for PuppetError {
    fn from(e: std::io::Error) -> Self {
        PuppetError::Io(e.to_string())
    }
}

/// Result type for puppet operations
pub type PuppetResult<T> = Result<T, PuppetError>;
