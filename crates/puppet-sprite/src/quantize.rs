//! Pose quantizer - smoothed signals to a grid key
//!
//! Expression axes are bucketed against ordered thresholds. Head axes are
//! centered: a neutral band maps to level 5 and rotation moves the level
//! outward in either direction. A single sensitivity scalar biases every
//! threshold.

use puppet_core::{names, Axis, GridKey, SignalSnapshot, AXIS_COUNT};

/// Default sensitivity
pub const DEFAULT_SENSITIVITY: f64 = 0.5;

/// Accepted sensitivity range
pub const SENSITIVITY_RANGE: (f64, f64) = (0.2, 0.8);

/// Eye closure thresholds (5 levels)
pub const EYE_THRESHOLDS: [f64; 4] = [0.02, 0.25, 0.5, 0.75];

/// Eyebrow thresholds (5 levels)
pub const BROW_THRESHOLDS: [f64; 4] = [0.05, 0.3, 0.6, 0.8];

/// Jaw thresholds (4 levels)
pub const JAW_THRESHOLDS: [f64; 3] = [0.15, 0.45, 0.75];

/// Head yaw/pitch full-scale angle, radians (about 40 degrees)
pub const HEAD_MAX_ANGLE: f64 = 0.6981;

/// Head tilt full-scale angle, radians (about 25 degrees)
pub const TILT_MAX_ANGLE: f64 = 0.4363;

/// Head thresholds over |normalized angle| below 0.5 sensitivity
pub const HEAD_THRESHOLDS_WIDE: [f64; 10] = [
    0.18, 0.32, 0.44, 0.55, 0.65, 0.74, 0.82, 0.88, 0.93, 0.97,
];

/// Head thresholds over |normalized angle| at or above 0.5 sensitivity
pub const HEAD_THRESHOLDS_NARROW: [f64; 10] = [
    0.12, 0.24, 0.35, 0.45, 0.55, 0.65, 0.74, 0.82, 0.89, 0.95,
];

/// Head angles under this on all three axes are treated as exactly zero
pub const HEAD_DEADZONE: f64 = 0.05;

/// Center level of head axes
pub const HEAD_CENTER: u8 = 5;

const HEAD_MAX_OFFSET: usize = 5;

/// Where an expression axis reads its value from
#[derive(Debug, Clone, Copy)]
pub struct AxisSources {
    pub axis: Axis,
    /// Signal names, max-reduced
    pub signals: &'static [&'static str],
    pub thresholds: &'static [f64],
}

/// Expression axis table. New capture dialects add names here.
pub const EXPRESSION_SOURCES: [AxisSources; 5] = [
    AxisSources {
        axis: Axis::BrowLeft,
        signals: &["eyeWide_L", "browInnerUp", "browOuterUp_L", "browDown_L"],
        thresholds: &BROW_THRESHOLDS,
    },
    AxisSources {
        axis: Axis::BrowRight,
        signals: &["eyeWide_R", "browInnerUp", "browOuterUp_R", "browDown_R"],
        thresholds: &BROW_THRESHOLDS,
    },
    AxisSources {
        axis: Axis::EyeLeft,
        signals: &["eyeBlink_L", "eyeBlinkLeft", "EyeBlinkLeft", "eyeblink_L"],
        thresholds: &EYE_THRESHOLDS,
    },
    AxisSources {
        axis: Axis::EyeRight,
        signals: &["eyeBlink_R", "eyeBlinkRight", "EyeBlinkRight", "eyeblink_R"],
        thresholds: &EYE_THRESHOLDS,
    },
    AxisSources {
        axis: Axis::Jaw,
        signals: &["jawOpen", "JawOpen", "mouthOpen"],
        thresholds: &JAW_THRESHOLDS,
    },
];

/// Head rotation in radians after the deadzone
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadPose {
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl HeadPose {
    /// Read the head signals; missing or non-finite values are zero
    pub fn from_snapshot(snapshot: &SignalSnapshot) -> Self {
        let read = |name| finite_or_zero(snapshot.get_or(name, 0.0));
        HeadPose {
            rx: read(names::HEAD_RX),
            ry: read(names::HEAD_RY),
            rz: read(names::HEAD_RZ),
        }
    }

    /// Zero all three angles if each is inside the deadzone
    pub fn deadzoned(self) -> Self {
        if self.rx.abs() < HEAD_DEADZONE
            && self.ry.abs() < HEAD_DEADZONE
            && self.rz.abs() < HEAD_DEADZONE
        {
            HeadPose::default()
        } else {
            self
        }
    }
}

/// Maps signal snapshots to grid keys at a fixed sensitivity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    sensitivity: f64,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl Quantizer {
    /// Create a quantizer; sensitivity is clamped into [0.2, 0.8]
    pub fn new(sensitivity: f64) -> Self {
        Quantizer {
            sensitivity: clamp_sensitivity(sensitivity),
        }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.sensitivity = clamp_sensitivity(sensitivity);
    }

    /// Quantize a snapshot
    pub fn quantize(&self, snapshot: &SignalSnapshot) -> GridKey {
        let mut levels = [0i64; AXIS_COUNT];

        for source in &EXPRESSION_SOURCES {
            let value = snapshot.max_of(source.signals);
            levels[source.axis.index()] = self.bucket(value, source.thresholds) as i64;
        }

        let head = HeadPose::from_snapshot(snapshot).deadzoned();
        let head_thresholds = self.head_thresholds();
        let tilt_thresholds = self.tilt_thresholds();

        // Pitch is read with the device sign flipped and its level direction
        // inverted; both cancel, so positive rx moves toward level 10
        levels[Axis::HeadPitch.index()] =
            centered_level(head.rx / HEAD_MAX_ANGLE, &head_thresholds) as i64;
        levels[Axis::HeadYaw.index()] =
            centered_level(head.ry / HEAD_MAX_ANGLE, &head_thresholds) as i64;
        levels[Axis::HeadTilt.index()] =
            centered_level(head.rz / TILT_MAX_ANGLE, &tilt_thresholds) as i64;

        GridKey::clamped(levels)
    }

    /// Bucket a [0, 1] value against sensitivity-adjusted thresholds
    ///
    /// Returns the index of the first threshold the value is below, or the
    /// threshold count if it is below none.
    pub fn bucket(&self, value: f64, thresholds: &[f64]) -> u8 {
        let value = finite_or_zero(value);
        thresholds
            .iter()
            .position(|&t| value < adjust_threshold(t, self.sensitivity))
            .unwrap_or(thresholds.len()) as u8
    }

    fn head_thresholds(&self) -> [f64; 10] {
        if self.sensitivity < 0.5 {
            HEAD_THRESHOLDS_WIDE
        } else {
            HEAD_THRESHOLDS_NARROW
        }
    }

    fn tilt_thresholds(&self) -> [f64; 10] {
        let scale = 1.5 - 0.5 * self.sensitivity;
        HEAD_THRESHOLDS_NARROW.map(|t| t * scale)
    }
}

/// Quantize with a one-off sensitivity
pub fn quantize(snapshot: &SignalSnapshot, sensitivity: f64) -> GridKey {
    Quantizer::new(sensitivity).quantize(snapshot)
}

/// Scale a base threshold by sensitivity
///
/// Below 0.5 thresholds grow (harder to leave level 0), above 0.5 they
/// shrink. The result stays within [0.01, 0.95].
pub fn adjust_threshold(threshold: f64, sensitivity: f64) -> f64 {
    let adjusted = if sensitivity < 0.5 {
        threshold * (1.0 + (0.5 - sensitivity))
    } else {
        threshold * (1.0 - (sensitivity - 0.5) * 0.8)
    };
    adjusted.clamp(0.01, 0.95)
}

/// Map a normalized angle onto a 0..=10 centered axis
///
/// Inside the first threshold the level is the center. Past it the level
/// jumps out by at least two steps and saturates at 0 or 10.
pub fn centered_level(normalized: f64, thresholds: &[f64]) -> u8 {
    let normalized = finite_or_zero(normalized).clamp(-1.0, 1.0);
    let magnitude = normalized.abs();

    let passed = thresholds.iter().take_while(|&&t| magnitude >= t).count();
    if passed == 0 {
        return HEAD_CENTER;
    }

    let offset = (passed + 1).min(HEAD_MAX_OFFSET) as u8;
    if normalized > 0.0 {
        HEAD_CENTER + offset
    } else {
        HEAD_CENTER - offset
    }
}

fn clamp_sensitivity(sensitivity: f64) -> f64 {
    if sensitivity.is_finite() {
        sensitivity.clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1)
    } else {
        DEFAULT_SENSITIVITY
    }
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(rx: f64, ry: f64, rz: f64) -> SignalSnapshot {
        SignalSnapshot::empty()
            .with(names::HEAD_RX, rx)
            .with(names::HEAD_RY, ry)
            .with(names::HEAD_RZ, rz)
    }

    #[test]
    fn test_empty_snapshot_is_neutral() {
        assert_eq!(quantize(&SignalSnapshot::empty(), 0.5), GridKey::NEUTRAL);
    }

    #[test]
    fn test_deadzone_centers_head() {
        for sign in [1.0, -1.0] {
            let key = quantize(&head(0.01 * sign, 0.01 * sign, 0.01 * sign), 0.5);
            assert_eq!(
                [key.get(Axis::HeadPitch), key.get(Axis::HeadYaw), key.get(Axis::HeadTilt)],
                [5, 5, 5]
            );
        }
    }

    #[test]
    fn test_deadzone_needs_all_three_axes() {
        // Yaw past the deadzone keeps small pitch/tilt as-is (still center here)
        let key = quantize(&head(0.01, 0.3, 0.01), 0.5);
        assert_eq!(key.get(Axis::HeadYaw), 9);
        assert_eq!(key.get(Axis::HeadPitch), 5);
    }

    #[test]
    fn test_expression_buckets_at_default_sensitivity() {
        let snap = SignalSnapshot::empty()
            .with("eyeBlink_L", 0.3)
            .with("eyeBlink_R", 1.0)
            .with("jawOpen", 0.5)
            .with("browInnerUp", 0.1);
        let key = quantize(&snap, 0.5);
        assert_eq!(key.get(Axis::EyeLeft), 2);
        assert_eq!(key.get(Axis::EyeRight), 4);
        assert_eq!(key.get(Axis::Jaw), 2);
        assert_eq!(key.get(Axis::BrowLeft), 1);
        assert_eq!(key.get(Axis::BrowRight), 1);
    }

    #[test]
    fn test_aliases_are_max_reduced() {
        let snap = SignalSnapshot::empty()
            .with("eyeBlink_L", 0.1)
            .with("EyeBlinkLeft", 0.9)
            .with("mouthOpen", 0.2);
        let key = quantize(&snap, 0.5);
        assert_eq!(key.get(Axis::EyeLeft), 4);
        assert_eq!(key.get(Axis::Jaw), 1);
    }

    #[test]
    fn test_sensitivity_biases_thresholds() {
        let snap = SignalSnapshot::empty().with("jawOpen", 0.16);
        // 0.15 * 1.3 = 0.195 at low sensitivity, 0.15 * 0.76 = 0.114 at high
        assert_eq!(quantize(&snap, 0.2).get(Axis::Jaw), 0);
        assert_eq!(quantize(&snap, 0.5).get(Axis::Jaw), 1);
        assert_eq!(quantize(&snap, 0.8).get(Axis::Jaw), 1);
        assert!((adjust_threshold(0.15, 0.2) - 0.195).abs() < 1e-12);
        assert!((adjust_threshold(0.15, 0.8) - 0.114).abs() < 1e-12);
        assert_eq!(adjust_threshold(0.001, 0.8), 0.01);
    }

    #[test]
    fn test_head_directions() {
        // 0.3 rad / 0.6981 = 0.43, past 3 narrow thresholds, offset 4
        let up = quantize(&head(0.3, 0.0, 0.0), 0.5);
        let down = quantize(&head(-0.3, 0.0, 0.0), 0.5);
        assert_eq!(up.get(Axis::HeadPitch), 9);
        assert_eq!(down.get(Axis::HeadPitch), 1);

        let right = quantize(&head(0.0, 0.3, 0.0), 0.5);
        let left = quantize(&head(0.0, -0.3, 0.0), 0.5);
        assert_eq!(right.get(Axis::HeadYaw), 9);
        assert_eq!(left.get(Axis::HeadYaw), 1);
    }

    #[test]
    fn test_head_saturates() {
        let key = quantize(&head(3.0, -3.0, 3.0), 0.5);
        assert_eq!(key.get(Axis::HeadPitch), 10);
        assert_eq!(key.get(Axis::HeadYaw), 0);
        assert_eq!(key.get(Axis::HeadTilt), 10);
    }

    #[test]
    fn test_centered_level_steps() {
        let t = HEAD_THRESHOLDS_NARROW;
        assert_eq!(centered_level(0.0, &t), 5);
        assert_eq!(centered_level(0.11, &t), 5);
        assert_eq!(centered_level(0.12, &t), 7);
        assert_eq!(centered_level(-0.25, &t), 2);
        assert_eq!(centered_level(1.0, &t), 10);
        assert_eq!(centered_level(f64::NAN, &t), 5);
    }

    #[test]
    fn test_non_finite_signals_ignored() {
        let snap = head(f64::NAN, f64::INFINITY, 0.0).with("jawOpen", f64::NAN);
        assert_eq!(quantize(&snap, 0.5), GridKey::NEUTRAL);
    }

    #[test]
    fn test_sensitivity_clamped() {
        assert_eq!(Quantizer::new(0.0).sensitivity(), 0.2);
        assert_eq!(Quantizer::new(5.0).sensitivity(), 0.8);
        assert_eq!(Quantizer::new(f64::NAN).sensitivity(), DEFAULT_SENSITIVITY);
    }

    proptest::proptest! {
        #[test]
        fn prop_expression_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, s in 0.2f64..=0.8) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for source in &EXPRESSION_SOURCES {
                let name = source.signals[0];
                let k_lo = quantize(&SignalSnapshot::empty().with(name, lo), s);
                let k_hi = quantize(&SignalSnapshot::empty().with(name, hi), s);
                proptest::prop_assert!(k_lo.get(source.axis) <= k_hi.get(source.axis));
            }
        }

        #[test]
        fn prop_head_magnitude_monotonic(a in 0.0f64..=2.0, b in 0.0f64..=2.0, s in 0.2f64..=0.8) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let q = Quantizer::new(s);
            let dist = |k: GridKey, axis| (k.get(axis) as i32 - 5).abs();
            // Hold one axis outside the deadzone so it never kicks in
            let k_lo = q.quantize(&head(lo, 1.0, lo));
            let k_hi = q.quantize(&head(hi, 1.0, hi));
            proptest::prop_assert!(dist(k_lo, Axis::HeadPitch) <= dist(k_hi, Axis::HeadPitch));
            proptest::prop_assert!(dist(k_lo, Axis::HeadTilt) <= dist(k_hi, Axis::HeadTilt));
            let k_lo = q.quantize(&head(1.0, lo, 0.0));
            let k_hi = q.quantize(&head(1.0, hi, 0.0));
            proptest::prop_assert!(dist(k_lo, Axis::HeadYaw) <= dist(k_hi, Axis::HeadYaw));
        }
    }
}
