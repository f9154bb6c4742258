//! Bounded latency window.
//!
//! # Responsibilities
//! - Keep the most recent round-trip samples (milliseconds)
//! - Evict the oldest sample once capacity is reached
//! - Produce the arithmetic mean on demand
//!
//! # Design Decisions
//! - Fixed capacity, allocated once
//! - Not synchronized; callers hold the owning target's lock

use std::collections::VecDeque;

/// Number of samples retained per target.
pub const LATENCY_WINDOW_CAPACITY: usize = 20;

/// FIFO window of recent round-trip times.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new() -> Self {
        Self::with_capacity(LATENCY_WINDOW_CAPACITY)
    }

    /// Create a window holding at most `capacity` samples (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest one if the window is full.
    pub fn push(&mut self, millis: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(millis);
    }

    /// Mean of the retained samples, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new()
    }
}
