//! Session latency tracking.
//!
//! Keeps a bounded window of per-step XHR latencies and exposes the rolling
//! average, p95, and the 2x regression check the risk scorer relies on.
//! Single-writer by design; one window lives inside each engine instance.

use std::collections::VecDeque;
use std::time::Duration;

const DEFAULT_WINDOW: usize = 32;

/// Spikes are only meaningful once a baseline exists.
const MIN_SAMPLES_FOR_REGRESSION: usize = 3;

#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<u32>,
    max_window: usize,
    total_observed: u64,
}

impl LatencyWindow {
    pub fn new(max_window: usize) -> Self {
        let max_window = max_window.max(4);
        Self {
            samples: VecDeque::with_capacity(max_window),
            max_window,
            total_observed: 0,
        }
    }

    /// Record one observed latency. Zero readings mean "no XHR landed this
    /// step" in the caller's telemetry and are ignored.
    pub fn record(&mut self, latency_ms: u32) {
        if latency_ms == 0 {
            return;
        }
        if self.samples.len() == self.max_window {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);
        self.total_observed += 1;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lifetime count of non-zero observations, including evicted ones.
    pub fn total_observed(&self) -> u64 {
        self.total_observed
    }

    pub fn rolling_average(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|&ms| ms as u64).sum();
        Some(Duration::from_millis(sum / self.samples.len() as u64))
    }

    pub fn p95(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<u32> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let idx = ((sorted.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
        Some(Duration::from_millis(sorted[idx] as u64))
    }

    /// True when `latency_ms` runs more than twice the rolling average.
    /// Latency spikes often precede a challenge page.
    pub fn is_regression(&self, latency_ms: u32) -> bool {
        if self.samples.len() < MIN_SAMPLES_FOR_REGRESSION || latency_ms == 0 {
            return false;
        }
        match self.rolling_average() {
            Some(avg) => u128::from(latency_ms) > avg.as_millis() * 2,
            None => false,
        }
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
