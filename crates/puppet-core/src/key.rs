//! Grid keys - the quantized pose coordinate
//!
//! A sprite corpus covers a 5×5×5×5×4×11×11×11 grid. Every sprite sits on
//! exactly one point of that grid, and every tick the live capture signal is
//! snapped onto it as well. The same key type indexes the corpus and the
//! decode cache.

use std::fmt;

/// Number of axes in a grid key
pub const AXIS_COUNT: usize = 8;

/// One axis of the pose grid, in key order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left eyebrow level (EBL)
    BrowLeft,
    /// Right eyebrow level (EBR)
    BrowRight,
    /// Left eye closure (EWL)
    EyeLeft,
    /// Right eye closure (EWR)
    EyeRight,
    /// Jaw opening (JO)
    Jaw,
    /// Head rotation about X (HX)
    HeadPitch,
    /// Head rotation about Y (HY)
    HeadYaw,
    /// Head tilt about Z (BL)
    HeadTilt,
}

impl Axis {
    /// All axes in key order
    pub const ALL: [Axis; AXIS_COUNT] = [
        Axis::BrowLeft,
        Axis::BrowRight,
        Axis::EyeLeft,
        Axis::EyeRight,
        Axis::Jaw,
        Axis::HeadPitch,
        Axis::HeadYaw,
        Axis::HeadTilt,
    ];

    /// Eye-expression group: both brows and both lids
    pub const EYES: [Axis; 4] = [Axis::BrowLeft, Axis::BrowRight, Axis::EyeLeft, Axis::EyeRight];

    /// Mouth group
    pub const MOUTH: [Axis; 1] = [Axis::Jaw];

    /// Head-orientation group
    pub const HEAD: [Axis; 3] = [Axis::HeadPitch, Axis::HeadYaw, Axis::HeadTilt];

    /// Position of this axis inside a key
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Highest level this axis can take
    #[inline]
    pub fn max_level(self) -> u8 {
        match self {
            Axis::BrowLeft | Axis::BrowRight | Axis::EyeLeft | Axis::EyeRight => 4,
            Axis::Jaw => 3,
            Axis::HeadPitch | Axis::HeadYaw | Axis::HeadTilt => 10,
        }
    }

    /// Resting level: closed/relaxed for expressions, centered for the head
    #[inline]
    pub fn rest_level(self) -> u8 {
        match self {
            Axis::HeadPitch | Axis::HeadYaw | Axis::HeadTilt => 5,
            _ => 0,
        }
    }

    /// Short label used in file names and diagnostics
    pub fn label(self) -> &'static str {
        match self {
            Axis::BrowLeft => "EBL",
            Axis::BrowRight => "EBR",
            Axis::EyeLeft => "EWL",
            Axis::EyeRight => "EWR",
            Axis::Jaw => "JO",
            Axis::HeadPitch => "HX",
            Axis::HeadYaw => "HY",
            Axis::HeadTilt => "NZ",
        }
    }
}

/// Quantized pose coordinate `(EBL, EBR, EWL, EWR, JO, HX, HY, BL)`
///
/// Every level is within its axis bound. Ordering is lexicographic over the
/// axes, which gives the corpus its deterministic scan order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey([u8; AXIS_COUNT]);

impl GridKey {
    /// Neutral pose: relaxed face, head centered
    pub const NEUTRAL: GridKey = GridKey([0, 0, 0, 0, 0, 5, 5, 5]);

    /// Build a key from arbitrary levels, clamping each into its axis range
    pub fn clamped(levels: [i64; AXIS_COUNT]) -> Self {
        let mut out = [0u8; AXIS_COUNT];
        for axis in Axis::ALL {
            let i = axis.index();
            out[i] = levels[i].clamp(0, axis.max_level() as i64) as u8;
        }
        GridKey(out)
    }

    /// Build a key from levels that are already in range
    ///
    /// Returns `None` if any level exceeds its axis bound.
    pub fn new(levels: [u8; AXIS_COUNT]) -> Option<Self> {
        Axis::ALL
            .iter()
            .all(|axis| levels[axis.index()] <= axis.max_level())
            .then_some(GridKey(levels))
    }

    /// Level on one axis
    #[inline]
    pub fn get(self, axis: Axis) -> u8 {
        self.0[axis.index()]
    }

    /// All levels in key order
    #[inline]
    pub fn levels(self) -> [u8; AXIS_COUNT] {
        self.0
    }

    /// Copy of this key with one axis replaced (clamped)
    pub fn with(self, axis: Axis, level: u8) -> Self {
        let mut levels = self.0;
        levels[axis.index()] = level.min(axis.max_level());
        GridKey(levels)
    }

    /// Squared Euclidean distance over all 8 axes
    pub fn distance_sq(self, other: GridKey) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(&a, &b)| {
                let d = a.abs_diff(b) as u32;
                d * d
            })
            .sum()
    }

    /// True if every listed axis differs from `other` by at most `tolerance`
    pub fn within(self, other: GridKey, axes: &[Axis], tolerance: u8) -> bool {
        axes.iter()
            .all(|&axis| self.get(axis).abs_diff(other.get(axis)) <= tolerance)
    }
}

impl Default for GridKey {
    fn default() -> Self {
        GridKey::NEUTRAL
    }
}

impl fmt::Debug for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = self.0;
        write!(
            f,
            "GridKey({},{},{},{},{},{},{},{})",
            l[0], l[1], l[2], l[3], l[4], l[5], l[6], l[7]
        )
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = self.0;
        write!(
            f,
            "EBL{}_EBR{}_EWL{}_EWR{}_JO{}_HX{:02}_HY{:02}_NZ{:02}",
            l[0], l[1], l[2], l[3], l[4], l[5], l[6], l[7]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_respects_axis_bounds() {
        let key = GridKey::clamped([9, -3, 4, 5, 7, 11, -1, 42]);
        assert_eq!(key.levels(), [4, 0, 4, 4, 3, 10, 0, 10]);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(GridKey::new([0, 0, 0, 0, 0, 5, 5, 5]).is_some());
        assert!(GridKey::new([5, 0, 0, 0, 0, 5, 5, 5]).is_none());
        assert!(GridKey::new([0, 0, 0, 0, 4, 5, 5, 5]).is_none());
    }

    #[test]
    fn test_distance_sq() {
        let a = GridKey::NEUTRAL;
        let b = GridKey::new([0, 0, 1, 1, 0, 5, 5, 5]).unwrap();
        assert_eq!(a.distance_sq(b), 2);
        assert_eq!(b.distance_sq(a), 2);
        assert_eq!(a.distance_sq(a), 0);
    }

    #[test]
    fn test_within_only_checks_listed_axes() {
        let a = GridKey::NEUTRAL;
        let b = GridKey::new([1, 1, 1, 1, 3, 0, 10, 5]).unwrap();
        assert!(a.within(b, &Axis::EYES, 1));
        assert!(!a.within(b, &Axis::MOUTH, 1));
        assert!(!a.within(b, &Axis::HEAD, 2));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = GridKey::new([0, 0, 0, 0, 0, 5, 5, 5]).unwrap();
        let b = GridKey::new([0, 0, 0, 0, 1, 0, 0, 0]).unwrap();
        let c = GridKey::new([1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let mut keys = vec![c, b, a];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }

    proptest::proptest! {
        #[test]
        fn prop_clamped_always_in_bounds(levels in proptest::array::uniform8(-100i64..100)) {
            let key = GridKey::clamped(levels);
            for axis in Axis::ALL {
                proptest::prop_assert!(key.get(axis) <= axis.max_level());
            }
            proptest::prop_assert_eq!(GridKey::new(key.levels()), Some(key));
        }
    }

    #[test]
    fn test_display_format() {
        let key = GridKey::new([1, 2, 3, 4, 2, 5, 10, 0]).unwrap();
        assert_eq!(key.to_string(), "EBL1_EBR2_EWL3_EWR4_JO2_HX05_HY10_NZ00");
    }
}
