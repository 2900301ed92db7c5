//! Moving-average smoothing of capture signals

use std::collections::{HashMap, VecDeque};

use puppet_core::SignalSnapshot;
use puppet_wire::Sample;

/// Default number of samples averaged per signal
pub const DEFAULT_HISTORY_LEN: usize = 3;

/// Per-signal rolling mean over the last few samples
///
/// Owned by the receive loop. Signals absent from a packet keep their last
/// smoothed value.
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    history_len: usize,
    history: HashMap<String, VecDeque<f64>>,
    current: HashMap<String, f64>,
}

impl Default for SignalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl SignalSmoother {
    /// Create a smoother averaging over `history_len` samples (at least 1)
    pub fn new(history_len: usize) -> Self {
        Self {
            history_len: history_len.max(1),
            history: HashMap::new(),
            current: HashMap::new(),
        }
    }

    /// Push one raw value and return the new smoothed value
    pub fn push(&mut self, name: &str, value: f64) -> f64 {
        let cap = self.history_len;
        let window = self
            .history
            .entry(name.to_string())
            .or_insert_with(|| VecDeque::with_capacity(cap));

        if window.len() == cap {
            window.pop_front();
        }
        window.push_back(value);

        let smoothed = mean(window);
        self.current.insert(name.to_string(), smoothed);
        smoothed
    }

    /// Push every sample of a packet
    pub fn apply(&mut self, samples: &[Sample]) {
        for sample in samples {
            self.push(&sample.name, sample.value);
        }
    }

    /// Current smoothed value of a signal
    pub fn value(&self, name: &str) -> Option<f64> {
        self.current.get(name).copied()
    }

    /// Copy of the current smoothed state
    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot::from_map(self.current.clone())
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.history.clear();
        self.current.clear();
    }
}

/// Arithmetic mean; a window of identical values yields that value exactly
fn mean(window: &VecDeque<f64>) -> f64 {
    match window.front() {
        Some(&first) if window.iter().all(|&v| v == first) => first,
        _ => window.iter().sum::<f64>() / window.len() as f64,
    }
}
