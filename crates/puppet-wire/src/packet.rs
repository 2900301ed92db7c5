//! Capture packet parsing
//!
//! Parsing is per segment: a bad segment is counted and skipped, the rest of
//! the packet is still used. Nothing in here fails past the packet boundary.

use puppet_core::names;

/// Segment delimiter
pub const SEGMENT_DELIMITER: char = '|';

/// Marker of the head rotation record
pub const HEAD_MARKER: &str = "=head#";

/// Prefix of the right eye rotation record
pub const RIGHT_EYE_PREFIX: &str = "rightEye#";

/// Prefix of the left eye rotation record
pub const LEFT_EYE_PREFIX: &str = "leftEye#";

/// Values in a head record (3 rotations + 3 translations)
pub const HEAD_RECORD_LEN: usize = 6;

/// Values in an eye record
pub const EYE_RECORD_LEN: usize = 3;

/// One decoded signal value
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Result of parsing one datagram
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    /// Samples in packet order
    pub samples: Vec<Sample>,
    /// Non-empty segments that did not parse
    pub skipped: usize,
}

impl ParseReport {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Parse a raw datagram
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn parse_packet(buf: &[u8]) -> ParseReport {
    parse_text(&String::from_utf8_lossy(buf))
}

/// Parse an already decoded packet
pub fn parse_text(text: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for segment in text.split(SEGMENT_DELIMITER) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if !parse_segment(segment, &mut report.samples) {
            tracing::trace!(segment, "skipping unparseable capture segment");
            report.skipped += 1;
        }
    }

    report
}

/// Parse a single segment, appending what it yields. Returns false if nothing
/// usable was found.
fn parse_segment(segment: &str, out: &mut Vec<Sample>) -> bool {
    if let Some(pos) = segment.find(HEAD_MARKER) {
        let values = &segment[pos + HEAD_MARKER.len()..];
        return parse_rotation(values, HEAD_RECORD_LEN, &names::HEAD, out);
    }
    if let Some(values) = segment.strip_prefix(RIGHT_EYE_PREFIX) {
        return parse_rotation(values, EYE_RECORD_LEN, &names::RIGHT_EYE, out);
    }
    if let Some(values) = segment.strip_prefix(LEFT_EYE_PREFIX) {
        return parse_rotation(values, EYE_RECORD_LEN, &names::LEFT_EYE, out);
    }
    if segment.len() > 3 {
        if let Some(sample) = parse_blendshape(segment) {
            out.push(sample);
            return true;
        }
    }
    false
}

/// Parse `name-percent` into a [0, 1] intensity
fn parse_blendshape(segment: &str) -> Option<Sample> {
    let (name, value) = segment.split_once('-')?;
    if name.is_empty() {
        return None;
    }
    let percent = parse_finite(value)?;
    Some(Sample::new(name, (percent / 100.0).clamp(0.0, 1.0)))
}

/// Parse a comma separated rotation record in degrees
///
/// The record must carry at least `min_len` values; the first three are
/// converted to radians and emitted under `targets`.
fn parse_rotation(
    values: &str,
    min_len: usize,
    targets: &[&str; 3],
    out: &mut Vec<Sample>,
) -> bool {
    let fields: Vec<&str> = values.split(',').collect();
    if fields.len() < min_len {
        return false;
    }

    let mut radians = [0.0f64; 3];
    for (slot, field) in radians.iter_mut().zip(fields.iter()) {
        match parse_finite(field) {
            Some(deg) => *slot = deg.to_radians(),
            None => return false,
        }
    }

    out.extend(
        targets
            .iter()
            .zip(radians)
            .map(|(name, value)| Sample::new(*name, value)),
    );
    true
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
