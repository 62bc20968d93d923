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

//! The public-facing SDK for embedding the pending-tick throttle in a host.
//!
//! A host creates a [`ThrottlePlugin`] with its [`HookRegistry`] and a
//! configuration store, then drives the `load` / `enable` / `disable`
//! lifecycle. Hosts without their own interception machinery can use the
//! in-memory [`HookTable`].

pub mod hook_table;
pub mod plugin;

pub use hook_table::HookTable;
pub use plugin::ThrottlePlugin;

pub mod prelude {
    pub use tickwarden_control::{AdmissionDecision, BudgetLedger, QueueClassifier};
    pub use tickwarden_core::{
        CycleHook, DrainCall, DrainHook, HookRegistry, LiveSettings, PendingTickView,
        StatsSnapshot, ThrottleConfig, ThrottleStats, Tick, TickQueue,
    };
    pub use tickwarden_io::{ConfigStore, JsonConfigStore};
    pub use tickwarden_telemetry::{ChannelSink, LogSink, ReportFormat, ReportSink, StatsReport};

    pub use crate::{HookTable, ThrottlePlugin};
}
