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

//! The shared per-cycle allowance of pending ticks.

use std::sync::atomic::{AtomicI32, Ordering};

/// Units of queued work still permitted to drain in the current cycle.
///
/// The ledger is refilled with [`reset`](Self::reset) at every cycle boundary
/// and drawn down by [`claim`](Self::claim) from any number of threads.
/// Claims never jointly exceed the value stored by the last reset.
#[derive(Debug, Default)]
pub struct BudgetLedger {
    remaining: AtomicI32,
}

impl BudgetLedger {
    /// Creates an empty ledger. Every claim is denied until the first reset.
    pub fn new() -> Self {
        Self {
            remaining: AtomicI32::new(0),
        }
    }

    /// Refills the ledger with `ceiling`, clamped to at least 1.
    #[inline]
    pub fn reset(&self, ceiling: i32) {
        self.remaining.store(ceiling.max(1), Ordering::Relaxed);
    }

    /// Atomically takes up to `requested` units and returns how many were granted.
    ///
    /// The grant is `min(requested, remaining)` as observed by the winning
    /// compare-exchange. Returns 0 without touching the ledger when it is
    /// exhausted or when `requested` is not positive.
    #[inline]
    pub fn claim(&self, requested: i32) -> i32 {
        if requested <= 0 {
            return 0;
        }

        let mut remaining = self.remaining.load(Ordering::Relaxed);
        loop {
            if remaining <= 0 {
                return 0;
            }
            let allowed = requested.min(remaining);
            match self.remaining.compare_exchange_weak(
                remaining,
                remaining - allowed,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return allowed,
                Err(current) => remaining = current,
            }
        }
    }

    /// Units left in the current cycle.
    pub fn remaining(&self) -> i32 {
        self.remaining.load(Ordering::Relaxed)
    }

    /// `true` once the current cycle's allowance is spent.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() <= 0
    }
}
