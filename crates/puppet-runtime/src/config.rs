//! Engine configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use puppet_core::{PuppetError, PuppetResult};
use puppet_sprite::{
    MatchTolerances, DEFAULT_CACHE_CAPACITY, DEFAULT_CORPUS_DIRS, DEFAULT_SENSITIVITY,
    SENSITIVITY_RANGE,
};

/// Engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Directory holding the corpus directories
    pub data_dir: PathBuf,
    /// Corpus directory names, tried in order
    pub corpus_dirs: Vec<String>,
    /// Maximum decoded sprites kept
    pub cache_capacity: usize,
    /// Quantizer sensitivity, 0.2..=0.8
    pub sensitivity: f64,
    /// Run the staged relaxed search when there is no exact sprite
    pub fallback_enabled: bool,
    /// Relaxed search tolerances
    pub tolerances: MatchTolerances,
    /// Tick interval of the fixed-rate driver
    pub tick_interval: Duration,
    /// Minimum spacing between match diagnostics
    pub debug_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data_dir: PathBuf::from("data"),
            corpus_dirs: DEFAULT_CORPUS_DIRS.iter().map(|d| d.to_string()).collect(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            sensitivity: DEFAULT_SENSITIVITY,
            fallback_enabled: true,
            tolerances: MatchTolerances::default(),
            // ~30 Hz
            tick_interval: Duration::from_millis(33),
            debug_interval: Duration::from_secs(3),
        }
    }
}

impl EngineConfig {
    /// Defaults with a different data directory
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        EngineConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// 60 Hz ticking with a larger cache
    pub fn smooth() -> Self {
        EngineConfig {
            cache_capacity: 600,
            tick_interval: Duration::from_micros(16_667),
            ..Default::default()
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> PuppetResult<()> {
        let (lo, hi) = SENSITIVITY_RANGE;
        if !(lo..=hi).contains(&self.sensitivity) {
            return Err(PuppetError::InvalidConfig(format!(
                "sensitivity {} outside [{}, {}]",
                self.sensitivity, lo, hi
            )));
        }
        if self.cache_capacity == 0 {
            return Err(PuppetError::InvalidConfig("cache capacity must be at least 1".into()));
        }
        if self.tick_interval.is_zero() {
            return Err(PuppetError::InvalidConfig("tick interval must be non-zero".into()));
        }
        if self.corpus_dirs.is_empty() {
            return Err(PuppetError::InvalidConfig("no corpus directory names".into()));
        }
        Ok(())
    }
}
