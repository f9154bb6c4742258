//! Round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::target::Target;

/// Round-robin selector that skips unavailable targets.
/// Stores the index of the last target handed out.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pick the next available target after the cursor.
    ///
    /// Scans every target at most once, wrapping around. The cursor only moves
    /// when a target is returned. An out-of-range cursor (left behind by a
    /// removal) is wrapped rather than trusted.
    pub fn next_available(
        &mut self,
        targets: &[Arc<Target>],
        max_latency_ms: f64,
    ) -> Option<Arc<Target>> {
        let len = targets.len();
        if len == 0 {
            return None;
        }

        let start = (self.cursor % len + 1) % len;
        for offset in 0..len {
            let index = (start + offset) % len;
            let target = &targets[index];
            if target.is_available(max_latency_ms) {
                self.cursor = index;
                return Some(target.clone());
            }
        }
        None
    }
}
