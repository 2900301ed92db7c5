//! Signal snapshots - the smoothed capture state handed to each tick
//!
//! A snapshot is a value: the receiver builds a fresh one and publishes it,
//! consumers only ever read. Values are blendshape intensities in [0, 1] or
//! rotations in radians.

use std::collections::HashMap;

/// Well-known signal names produced by the capture codec
pub mod names {
    /// Head rotation about X, radians
    pub const HEAD_RX: &str = "head_rx";
    /// Head rotation about Y, radians
    pub const HEAD_RY: &str = "head_ry";
    /// Head rotation about Z, radians
    pub const HEAD_RZ: &str = "head_rz";

    pub const RIGHT_EYE_RX: &str = "rightEye_rx";
    pub const RIGHT_EYE_RY: &str = "rightEye_ry";
    pub const RIGHT_EYE_RZ: &str = "rightEye_rz";

    pub const LEFT_EYE_RX: &str = "leftEye_rx";
    pub const LEFT_EYE_RY: &str = "leftEye_ry";
    pub const LEFT_EYE_RZ: &str = "leftEye_rz";

    /// Head rotation signals, X/Y/Z order
    pub const HEAD: [&str; 3] = [HEAD_RX, HEAD_RY, HEAD_RZ];
    pub const RIGHT_EYE: [&str; 3] = [RIGHT_EYE_RX, RIGHT_EYE_RY, RIGHT_EYE_RZ];
    pub const LEFT_EYE: [&str; 3] = [LEFT_EYE_RX, LEFT_EYE_RY, LEFT_EYE_RZ];
}

/// Immutable map of signal name to smoothed value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSnapshot {
    values: HashMap<String, f64>,
}

impl SignalSnapshot {
    /// Empty snapshot (nothing captured yet)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from an owned map
    pub fn from_map(values: HashMap<String, f64>) -> Self {
        Self { values }
    }

    /// Copy of this snapshot with one signal set
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Value of a signal, if it has been seen
    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of a signal, or `default` if absent
    #[inline]
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Largest value among the named signals, or 0.0 if none are present
    ///
    /// Non-finite values are ignored.
    pub fn max_of(&self, names: &[&str]) -> f64 {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all signals (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for SignalSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
