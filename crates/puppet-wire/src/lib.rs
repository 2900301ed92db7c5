//! Puppet Wire Format - capture packet codec
//!
//! Capture devices stream UDP datagrams of `|`-delimited text segments:
//! - `name-value` blendshape percentages
//! - `=head#rx,ry,rz,tx,ty,tz` head rotation (degrees) and position
//! - `rightEye#rx,ry,rz` / `leftEye#rx,ry,rz` eye rotation (degrees)

pub mod packet;

pub use packet::*;
