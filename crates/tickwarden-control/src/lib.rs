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

//! # Tickwarden Control
//!
//! The hot path of the throttle. A [`CycleResetTrigger`] refills the shared
//! [`BudgetLedger`] once per cycle, and every drain attempt goes through the
//! [`AdmissionFilter`], which asks the [`QueueClassifier`] whether the queue
//! is eligible and then claims its slice of the budget.
//!
//! Nothing in this crate blocks, allocates, or locks.

#![warn(missing_docs)]

pub mod admission;
pub mod classifier;
pub mod cycle;
pub mod ledger;

pub use admission::{AdmissionDecision, AdmissionFilter};
pub use classifier::{QueueClassifier, PORTAL_SUBJECTS};
pub use cycle::CycleResetTrigger;
pub use ledger::BudgetLedger;
