//! Puppet Core - Fundamental types shared by every layer
//!
//! This crate defines the vocabulary of the motion-to-sprite engine:
//! - Grid keys (the 8-axis quantized pose coordinate)
//! - Signal snapshots (smoothed capture values)
//! - Match results and their diagnostic tags
//! - Error types and the log rate limiter

pub mod error;
pub mod key;
pub mod matching;
pub mod rate;
pub mod signal;

pub use error::*;
pub use key::*;
pub use matching::*;
pub use rate::*;
pub use signal::*;
