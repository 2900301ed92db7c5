//! Sprite file name grammar
//!
//! A sprite name is a fixed prefix, then `_`-separated `<PREFIX><DIGITS>`
//! tokens in any order, then `.png`:
//!
//! ```text
//! eye_face_EBL0_EBR1_EWL0_EWR0_JO2_HX05_HY05_NZ05.png
//! opt_LEB0_REB1_LEW0_REW0_MAA2_HX5_HY5_BL5.png
//! ```
//!
//! The token table below is data; adding a new alias is one line.

use puppet_core::{Axis, GridKey, AXIS_COUNT};

/// Accepted file name prefixes
pub const FILE_PREFIXES: [&str; 2] = ["eye_face_", "opt_"];

/// Accepted file extension
pub const FILE_EXTENSION: &str = ".png";

/// Token separator inside a file name
pub const TOKEN_SEPARATOR: char = '_';

/// One axis and the token prefixes that name it
#[derive(Debug, Clone, Copy)]
pub struct TokenRule {
    pub axis: Axis,
    pub prefixes: &'static [&'static str],
}

/// Token rules, checked in order; the first matching prefix wins
pub const TOKEN_RULES: [TokenRule; AXIS_COUNT] = [
    TokenRule {
        axis: Axis::BrowLeft,
        prefixes: &["EBL", "LEB"],
    },
    TokenRule {
        axis: Axis::BrowRight,
        prefixes: &["EBR", "REB"],
    },
    TokenRule {
        axis: Axis::EyeLeft,
        prefixes: &["EWL", "LEW"],
    },
    TokenRule {
        axis: Axis::EyeRight,
        prefixes: &["EWR", "REW"],
    },
    TokenRule {
        axis: Axis::Jaw,
        prefixes: &["JO", "MAA"],
    },
    TokenRule {
        axis: Axis::HeadTilt,
        prefixes: &["BL", "NZ"],
    },
    TokenRule {
        axis: Axis::HeadPitch,
        prefixes: &["HX"],
    },
    TokenRule {
        axis: Axis::HeadYaw,
        prefixes: &["HY"],
    },
];

/// True if the name has an accepted prefix and extension
pub fn is_sprite_name(name: &str) -> bool {
    strip_affixes(name).is_some()
}

/// Parse a sprite file name into its grid key
///
/// Returns `None` unless all 8 axes are present. Levels above an axis bound
/// are clamped. When a field appears twice the last one wins.
pub fn parse_sprite_name(name: &str) -> Option<GridKey> {
    let body = strip_affixes(name)?;

    let mut levels: [Option<i64>; AXIS_COUNT] = [None; AXIS_COUNT];
    for token in body.split(TOKEN_SEPARATOR) {
        if let Some((axis, level)) = parse_token(token) {
            levels[axis.index()] = Some(level);
        }
    }

    let mut out = [0i64; AXIS_COUNT];
    for (slot, level) in out.iter_mut().zip(levels) {
        *slot = level?;
    }
    Some(GridKey::clamped(out))
}

fn strip_affixes(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(FILE_EXTENSION)?;
    FILE_PREFIXES
        .iter()
        .find_map(|prefix| stem.strip_prefix(prefix))
}

/// Match one token against the rule table
///
/// A token whose prefix matches but whose remainder is not all digits is
/// ignored, it does not fall through to later rules.
fn parse_token(token: &str) -> Option<(Axis, i64)> {
    for rule in &TOKEN_RULES {
        if let Some(digits) = rule.prefixes.iter().find_map(|p| token.strip_prefix(p)) {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Saturate absurdly long digit runs; the key clamps anyway
            let level = digits.parse::<i64>().unwrap_or(i64::MAX);
            return Some((rule.axis, level));
        }
    }
    None
}
