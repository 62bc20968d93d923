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

//! # Tickwarden Core
//!
//! Foundational crate containing the host contracts, the configuration record,
//! and the lock-free shared state that the pending-tick throttle is built on.

#![warn(missing_docs)]

pub mod config;
pub mod host;
pub mod stats;

pub use config::{LiveSettings, ThrottleConfig};
pub use host::{CycleHook, DrainCall, DrainHook, HookRegistry, PendingTickView, Tick, TickQueue};
pub use stats::{StatsSnapshot, ThrottleStats};
