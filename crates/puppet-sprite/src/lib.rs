//! Puppet Sprite - From a quantized pose to a decoded sprite
//!
//! - Sprite file name grammar and the corpus index
//! - Quantizer: smoothed capture signals to a grid key
//! - Sequential matcher: nearest indexed key, eyes before mouth before head
//! - Bounded LRU decode cache

pub mod cache;
pub mod grammar;
pub mod index;
pub mod matcher;
pub mod quantize;

pub use cache::*;
pub use grammar::*;
pub use index::*;
pub use matcher::*;
pub use quantize::*;
