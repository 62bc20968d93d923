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

//! Decides whether a queue matches the workload the throttle targets.

use tickwarden_core::host::TickQueue;

/// Subject types that re-schedule themselves every tick (portal blocks).
pub const PORTAL_SUBJECTS: &[&str] = &[
    "minecraft:portal",
    "minecraft:end_portal",
    "minecraft:end_gateway",
];

/// Heuristic filter for throttle-eligible queues.
///
/// A queue is eligible when it holds at least one live entry and every live
/// entry targets a subject from the allow-list. Removed entries are ignored.
#[derive(Debug, Clone, Copy)]
pub struct QueueClassifier {
    subjects: &'static [&'static str],
}

impl QueueClassifier {
    /// Creates a classifier for the portal-like subject set.
    pub const fn new() -> Self {
        Self {
            subjects: PORTAL_SUBJECTS,
        }
    }

    /// Creates a classifier for a custom allow-list.
    pub const fn with_subjects(subjects: &'static [&'static str]) -> Self {
        Self { subjects }
    }

    /// The allow-list this classifier accepts.
    pub fn subjects(&self) -> &'static [&'static str] {
        self.subjects
    }

    /// Returns `true` if the throttle applies to `queue`.
    ///
    /// Stops at the first live entry whose subject is absent or outside the
    /// allow-list.
    pub fn is_eligible(&self, queue: &dyn TickQueue) -> bool {
        let mut matched = false;
        for index in 0..queue.len() {
            let Some(tick) = queue.pending_tick(index) else {
                return false;
            };
            if tick.removed {
                continue;
            }
            match tick.subject {
                Some(subject) if self.accepts(subject) => matched = true,
                _ => return false,
            }
        }
        matched
    }

    #[inline]
    fn accepts(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| *s == subject)
    }
}

impl Default for QueueClassifier {
    fn default() -> Self {
        Self::new()
    }
}
