//! Puppet Runtime - Turns live capture into sprite frames
//!
//! Each tick reads the latest capture snapshot, quantizes it, matches it
//! against the sprite index and returns the decoded frame. The runtime
//! never blocks on the network; it always acts on whatever snapshot is
//! current.

pub mod config;
pub mod driver;
pub mod engine;
pub mod logging;

pub use config::*;
pub use driver::*;
pub use engine::*;
pub use logging::*;
