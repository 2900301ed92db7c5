//! Puppet Transport Layer - capture ingestion
//!
//! This crate provides:
//! - UDP capture receiver running as a background task
//! - Short-window signal smoothing
//! - Lock-protected publication of immutable snapshots

pub mod receiver;
pub mod smoothing;

pub use receiver::*;
pub use smoothing::*;
