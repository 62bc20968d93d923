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

//! The persisted configuration record and its lock-free live counterpart.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

/// Current on-disk schema version of [`ThrottleConfig`].
pub const CONFIG_VERSION: i32 = 1;

/// Configuration for the pending-tick throttle, as stored by the host.
///
/// Keys are serialized in camelCase. Any key missing from a stored record
/// takes its default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThrottleConfig {
    /// Schema version of the stored record.
    pub version: i32,
    /// Master switch for the whole plugin.
    pub enabled: bool,
    /// Emits the periodic statistics report when set.
    pub debug: bool,
    /// Reporting interval in seconds.
    pub stats_interval_sec: i32,
    /// Switch for the per-cycle budget throttle.
    pub budget_enabled: bool,
    /// Pending ticks the whole server may drain per cycle.
    pub budget_per_tick: i32,
    /// Pending ticks a single drain attempt may process.
    pub max_per_call: i32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            enabled: true,
            debug: false,
            stats_interval_sec: 5,
            budget_enabled: true,
            budget_per_tick: 100,
            max_per_call: 100,
        }
    }
}

impl ThrottleConfig {
    /// Per-cycle ceiling, never below 1.
    pub fn budget_per_tick(&self) -> i32 {
        self.budget_per_tick.max(1)
    }

    /// Per-call ceiling, never below 1.
    pub fn max_per_call(&self) -> i32 {
        self.max_per_call.max(1)
    }

    /// Reporting interval, never shorter than one second.
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec.max(1) as u64)
    }
}

/// Read-mostly view of the configuration consulted by the hot path.
///
/// Every field is a single-word atomic so the drain and cycle hooks can read
/// it without locking. [`apply`](Self::apply) replaces fields one by one;
/// concurrent reloads must be serialized by the caller.
#[derive(Debug)]
pub struct LiveSettings {
    active: AtomicBool,
    enabled: AtomicBool,
    debug: AtomicBool,
    stats_interval_sec: AtomicI32,
    budget_enabled: AtomicBool,
    budget_per_tick: AtomicI32,
    max_per_call: AtomicI32,
}

impl LiveSettings {
    /// Creates inert settings: inactive, holding the default record.
    pub fn new() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }

    /// Creates inactive settings holding `config`.
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self {
            active: AtomicBool::new(false),
            enabled: AtomicBool::new(config.enabled),
            debug: AtomicBool::new(config.debug),
            stats_interval_sec: AtomicI32::new(config.stats_interval_sec),
            budget_enabled: AtomicBool::new(config.budget_enabled),
            budget_per_tick: AtomicI32::new(config.budget_per_tick),
            max_per_call: AtomicI32::new(config.max_per_call),
        }
    }

    /// Replaces the stored record with `config`. The `active` flag is untouched.
    pub fn apply(&self, config: &ThrottleConfig) {
        self.enabled.store(config.enabled, Ordering::Relaxed);
        self.debug.store(config.debug, Ordering::Relaxed);
        self.stats_interval_sec
            .store(config.stats_interval_sec, Ordering::Relaxed);
        self.budget_enabled
            .store(config.budget_enabled, Ordering::Relaxed);
        self.budget_per_tick
            .store(config.budget_per_tick, Ordering::Relaxed);
        self.max_per_call.store(config.max_per_call, Ordering::Relaxed);
    }

    /// Returns the stored record.
    pub fn to_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            version: CONFIG_VERSION,
            enabled: self.enabled.load(Ordering::Relaxed),
            debug: self.debug.load(Ordering::Relaxed),
            stats_interval_sec: self.stats_interval_sec.load(Ordering::Relaxed),
            budget_enabled: self.budget_enabled.load(Ordering::Relaxed),
            budget_per_tick: self.budget_per_tick.load(Ordering::Relaxed),
            max_per_call: self.max_per_call.load(Ordering::Relaxed),
        }
    }

    /// Marks the plugin as running or stopped.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// `true` between `enable()` and `disable()`.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// `true` when the plugin is running and its master switch is on.
    pub fn is_enabled(&self) -> bool {
        self.is_active() && self.enabled.load(Ordering::Relaxed)
    }

    /// `true` when the budget throttle must engage.
    #[inline]
    pub fn is_throttling(&self) -> bool {
        self.is_enabled() && self.budget_enabled.load(Ordering::Relaxed)
    }

    /// Whether the periodic report is emitted.
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Per-cycle ceiling, never below 1.
    #[inline]
    pub fn budget_per_tick(&self) -> i32 {
        self.budget_per_tick.load(Ordering::Relaxed).max(1)
    }

    /// Per-call ceiling, never below 1.
    #[inline]
    pub fn max_per_call(&self) -> i32 {
        self.max_per_call.load(Ordering::Relaxed).max(1)
    }

    /// Reporting interval, never shorter than one second.
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec.load(Ordering::Relaxed).max(1) as u64)
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::new()
    }
}
