//! Match results and how they were obtained

use std::fmt;

use crate::GridKey;

/// How a sprite key was chosen. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTag {
    /// Target key exists in the corpus
    Exact,
    /// Found by the staged eyes → mouth → head search
    SequentialFallback,
    /// Reused the last successful match
    Previous,
    /// Neutral pose or one of its near-neutral backups
    Default,
}

impl MatchTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTag::Exact => "exact",
            MatchTag::SequentialFallback => "sequential-fallback",
            MatchTag::Previous => "previous",
            MatchTag::Default => "default",
        }
    }
}

impl fmt::Display for MatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chosen sprite key and the stage that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub key: GridKey,
    pub tag: MatchTag,
}

impl MatchResult {
    pub fn new(key: GridKey, tag: MatchTag) -> Self {
        Self { key, tag }
    }

    pub fn exact(key: GridKey) -> Self {
        Self::new(key, MatchTag::Exact)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.tag)
    }
}
