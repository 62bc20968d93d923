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

//! Admission control for individual drain attempts.
//!
//! Each attempt on an eligible queue is clamped to the per-call ceiling and
//! then claims its slice of the cycle budget. Attempts on any other queue, or
//! while the throttle is switched off, reach the host's drain untouched.

use crate::classifier::QueueClassifier;
use crate::ledger::BudgetLedger;
use std::sync::Arc;
use tickwarden_core::config::LiveSettings;
use tickwarden_core::host::{DrainCall, DrainHook, TickQueue};
use tickwarden_core::stats::ThrottleStats;

/// The outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Forward the call unchanged.
    PassThrough,
    /// The cycle budget is exhausted; drain nothing and report no progress.
    Deny,
    /// Forward the call with its batch size reduced to `granted`.
    Narrow {
        /// Units claimed from the ledger.
        granted: i32,
        /// `true` if `granted` is below the caller's request.
        capped: bool,
    },
}

impl AdmissionDecision {
    /// The batch size to hand to the host for a request of `requested`,
    /// or `None` if the drain must be skipped.
    pub fn batch_size(&self, requested: i32) -> Option<i32> {
        match *self {
            AdmissionDecision::PassThrough => Some(requested),
            AdmissionDecision::Deny => None,
            AdmissionDecision::Narrow { granted, .. } => Some(granted),
        }
    }

    /// `true` if the attempt counts as capped.
    pub fn is_capped(&self) -> bool {
        match *self {
            AdmissionDecision::PassThrough => false,
            AdmissionDecision::Deny => true,
            AdmissionDecision::Narrow { capped, .. } => capped,
        }
    }
}

/// Drain interception that bounds eligible queues by the shared cycle budget.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    ledger: Arc<BudgetLedger>,
    stats: Arc<ThrottleStats>,
    settings: Arc<LiveSettings>,
    classifier: QueueClassifier,
}

impl AdmissionFilter {
    /// Creates a filter drawing from `ledger` and reporting into `stats`.
    pub fn new(
        ledger: Arc<BudgetLedger>,
        stats: Arc<ThrottleStats>,
        settings: Arc<LiveSettings>,
    ) -> Self {
        Self {
            ledger,
            stats,
            settings,
            classifier: QueueClassifier::new(),
        }
    }

    /// Replaces the queue classifier.
    pub fn with_classifier(mut self, classifier: QueueClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Decides how much of `requested` the attempt on `queue` may drain.
    ///
    /// Claims budget and updates statistics as a side effect, except when the
    /// throttle is off or the queue is not eligible.
    pub fn decide(&self, queue: &dyn TickQueue, requested: i32) -> AdmissionDecision {
        if !self.settings.is_throttling() {
            return AdmissionDecision::PassThrough;
        }
        if !self.classifier.is_eligible(queue) {
            return AdmissionDecision::PassThrough;
        }
        // Nothing asked, nothing to bound.
        if requested <= 0 {
            return AdmissionDecision::PassThrough;
        }

        self.stats.record_call();

        let bounded = requested.min(self.settings.max_per_call());
        let granted = self.ledger.claim(bounded);
        if granted == 0 {
            self.stats.record_capped();
            return AdmissionDecision::Deny;
        }

        let capped = granted < requested;
        if capped {
            self.stats.record_capped();
        }
        self.stats.record_queued(queue.len() as u64);

        AdmissionDecision::Narrow { granted, capped }
    }

    /// The ledger this filter draws from.
    pub fn ledger(&self) -> &Arc<BudgetLedger> {
        &self.ledger
    }
}

impl DrainHook for AdmissionFilter {
    fn on_drain(&self, queue: &mut dyn TickQueue, call: DrainCall) -> bool {
        match self.decide(&*queue, call.max).batch_size(call.max) {
            Some(max) if max == call.max => queue.drain(call),
            Some(max) => queue.drain(call.with_max(max)),
            None => false,
        }
    }
}
