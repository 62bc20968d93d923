// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lock-free statistics for throttled drain attempts.
//!
//! The drain hook increments these counters from any thread, and the
//! reporting service in `tickwarden-telemetry` periodically takes a snapshot
//! and clears them. The counters are diagnostic only: a snapshot taken while
//! drains are in flight may split an attempt across two reporting windows.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated counters for the current reporting window.
#[derive(Debug, Default)]
pub struct ThrottleStats {
    calls: AtomicU64,
    queued: AtomicU64,
    capped: AtomicU64,
}

impl ThrottleStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one throttle-eligible drain attempt.
    #[inline]
    pub fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the pre-drain size of a queue to the cumulative total.
    #[inline]
    pub fn record_queued(&self, queue_len: u64) {
        self.queued.fetch_add(queue_len, Ordering::Relaxed);
    }

    /// Counts one attempt that was denied or granted less than it asked for.
    #[inline]
    pub fn record_capped(&self) {
        self.capped.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters without clearing them.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            capped: self.capped.load(Ordering::Relaxed),
        }
    }

    /// Reads and clears all counters.
    ///
    /// Each counter is swapped to zero atomically, so no increment is lost,
    /// but the three swaps are independent of each other.
    pub fn take(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.swap(0, Ordering::Relaxed),
            queued: self.queued.swap(0, Ordering::Relaxed),
            capped: self.capped.swap(0, Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`ThrottleStats`] with derived metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Throttle-eligible drain attempts.
    pub calls: u64,
    /// Sum of the pre-drain queue sizes of granted attempts.
    pub queued: u64,
    /// Attempts that were denied or narrowed.
    pub capped: u64,
}

impl StatsSnapshot {
    /// Average observed queue size per call, or 0 when there were no calls.
    pub fn average_queue(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.queued as f64 / self.calls as f64
    }

    /// Share of capped calls in percent, or 0 when there were no calls.
    pub fn capped_percent(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.capped as f64 / self.calls as f64 * 100.0
    }

    /// `true` if no call was recorded in the window.
    pub fn is_empty(&self) -> bool {
        self.calls == 0
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PendingTicks | calls: {} | avg queue: {:.1} | capped: {} ({:.1}%)",
            self.calls,
            self.average_queue(),
            self.capped,
            self.capped_percent()
        )
    }
}
