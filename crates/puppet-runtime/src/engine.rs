//! Puppet engine - one tick from snapshot to frame

use std::sync::Arc;
use std::time::{Duration, Instant};

use puppet_core::{GridKey, MatchResult, MatchTag, PuppetResult, RateLimiter, SignalSnapshot};
use puppet_sprite::{
    decode_sprite, CacheStats, DecodeCache, Quantizer, SequentialMatcher, SpriteImage, SpriteIndex,
};

use crate::EngineConfig;

/// Output of one tick
#[derive(Clone, Debug)]
pub struct Frame {
    /// Quantized pose
    pub target: GridKey,
    /// Key of the image handed out and how it was chosen
    pub matched: Option<MatchResult>,
    /// Image to show, `None` only when nothing can be shown at all
    pub image: Option<Arc<SpriteImage>>,
    /// Shown key differs from the previous tick's
    pub changed: bool,
}

impl Frame {
    pub fn key(&self) -> Option<GridKey> {
        self.matched.map(|m| m.key)
    }
}

/// Tick counters
#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub ticks: u64,
    pub exact: u64,
    pub sequential: u64,
    pub previous: u64,
    pub default: u64,
    /// Ticks with no image at all
    pub frames_without_image: u64,
    /// Ticks where a fresh decode failed and the held image stood in
    pub held_frames: u64,
    pub key_changes: u64,
    pub last_tick_duration: Duration,
}

impl RuntimeStats {
    fn record(&mut self, tag: MatchTag) {
        match tag {
            MatchTag::Exact => self.exact += 1,
            MatchTag::SequentialFallback => self.sequential += 1,
            MatchTag::Previous => self.previous += 1,
            MatchTag::Default => self.default += 1,
        }
    }
}

/// Quantizer, matcher and decode cache over one sprite index
///
/// Owned by the foreground tick; nothing in here is shared.
pub struct Engine {
    config: EngineConfig,
    index: SpriteIndex,
    quantizer: Quantizer,
    matcher: SequentialMatcher,
    cache: DecodeCache<SpriteImage>,
    /// Last image handed out, held when a decode fails
    shown: Option<(GridKey, Arc<SpriteImage>)>,
    stats: RuntimeStats,
    debug_limiter: RateLimiter,
}

impl Engine {
    /// Validate the config and index the corpus under its data directory
    pub fn new(config: EngineConfig) -> PuppetResult<Self> {
        config.validate()?;
        let index = SpriteIndex::build(&config.data_dir, &config.corpus_dirs)?;
        Self::with_index(config, index)
    }

    /// Use an already built index
    pub fn with_index(config: EngineConfig, index: SpriteIndex) -> PuppetResult<Self> {
        config.validate()?;
        if index.is_empty() {
            tracing::warn!("sprite index is empty, every frame will be blank");
        }

        Ok(Engine {
            quantizer: Quantizer::new(config.sensitivity),
            matcher: SequentialMatcher::new(config.tolerances),
            cache: DecodeCache::new(config.cache_capacity),
            debug_limiter: RateLimiter::new(config.debug_interval),
            shown: None,
            stats: RuntimeStats::default(),
            index,
            config,
        })
    }

    /// Run one tick
    pub fn tick(&mut self, snapshot: &SignalSnapshot) -> Frame {
        let start = Instant::now();
        self.stats.ticks += 1;

        // Stage 1: quantize
        let target = self.quantizer.quantize(snapshot);

        // Stage 2: match
        let matched = self
            .matcher
            .find_match(target, &self.index, self.config.fallback_enabled);

        // Stage 3: decode, standing in for a sprite that fails
        let (matched, image) = match matched {
            Some(m) => match self.cache.get_or_load(m.key, &self.index, decode_sprite) {
                Some(image) => (Some(m), Some(image)),
                None => self.recover(m.key),
            },
            None => (None, None),
        };

        // Stage 4: bookkeeping
        let shown_key = matched.filter(|_| image.is_some()).map(|m| m.key);
        let changed = shown_key != self.shown.as_ref().map(|(k, _)| *k);
        match (&matched, &image) {
            (Some(m), Some(img)) => {
                self.stats.record(m.tag);
                self.shown = Some((m.key, Arc::clone(img)));
            }
            _ => {
                self.stats.frames_without_image += 1;
                self.shown = None;
            }
        }
        if changed {
            self.stats.key_changes += 1;
        }

        if self.debug_limiter.allow() {
            match matched {
                Some(m) => tracing::debug!(%target, matched = %m.key, method = %m.tag, "match"),
                None => tracing::debug!(%target, "no sprite available"),
            }
        }

        self.stats.last_tick_duration = start.elapsed();
        Frame {
            target,
            matched,
            image,
            changed,
        }
    }

    /// Image to show after `failed` did not decode
    ///
    /// Holds the last shown image. With nothing shown yet, takes the first
    /// key of the default chain that decodes.
    fn recover(&mut self, failed: GridKey) -> (Option<MatchResult>, Option<Arc<SpriteImage>>) {
        if let Some((key, image)) = &self.shown {
            self.stats.held_frames += 1;
            self.matcher.remember(*key);
            return (Some(MatchResult::new(*key, MatchTag::Previous)), Some(Arc::clone(image)));
        }

        for key in SequentialMatcher::terminal_candidates(&self.index).filter(|k| *k != failed) {
            if let Some(image) = self.cache.get_or_load(key, &self.index, decode_sprite) {
                self.matcher.remember(key);
                return (Some(MatchResult::new(key, MatchTag::Default)), Some(image));
            }
        }
        (None, None)
    }

    /// Rescan the corpus; returns the new sprite count
    ///
    /// On error the current index stays in place. The decode cache is not
    /// touched.
    pub fn rebuild_index(&mut self) -> PuppetResult<usize> {
        let index = SpriteIndex::build(&self.config.data_dir, &self.config.corpus_dirs)?;
        self.index = index;
        Ok(self.index.len())
    }

    /// Replace the index with one built elsewhere
    pub fn replace_index(&mut self, index: SpriteIndex) {
        self.index = index;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.quantizer.set_sensitivity(sensitivity);
        self.config.sensitivity = self.quantizer.sensitivity();
    }

    pub fn sensitivity(&self) -> f64 {
        self.quantizer.sensitivity()
    }

    pub fn set_fallback_enabled(&mut self, enabled: bool) {
        self.config.fallback_enabled = enabled;
    }

    pub fn fallback_enabled(&self) -> bool {
        self.config.fallback_enabled
    }

    pub fn index(&self) -> &SpriteIndex {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(&self.index)
    }
}
