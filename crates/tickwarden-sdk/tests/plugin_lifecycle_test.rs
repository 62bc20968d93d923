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

use std::sync::{Arc, Mutex};
use tickwarden_io::{ConfigResult, ConfigStore};
use tickwarden_sdk::prelude::*;

/// Keeps the configuration record in memory.
#[derive(Default)]
struct MemoryStore {
    record: Mutex<Option<ThrottleConfig>>,
}

impl MemoryStore {
    fn with(config: ThrottleConfig) -> Self {
        Self {
            record: Mutex::new(Some(config)),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> ConfigResult<Option<ThrottleConfig>> {
        Ok(self.record.lock().unwrap().clone())
    }

    fn save(&self, config: &ThrottleConfig) -> ConfigResult<()> {
        *self.record.lock().unwrap() = Some(config.clone());
        Ok(())
    }
}

/// A host queue holding only portal ticks.
struct PortalQueue {
    len: usize,
    drains: Vec<i32>,
}

impl PortalQueue {
    fn new(len: usize) -> Self {
        Self {
            len,
            drains: Vec::new(),
        }
    }
}

impl TickQueue for PortalQueue {
    fn len(&self) -> usize {
        self.len
    }

    fn pending_tick(&self, index: usize) -> Option<PendingTickView<'_>> {
        (index < self.len).then(|| PendingTickView::alive("minecraft:portal"))
    }

    fn drain(&mut self, call: DrainCall) -> bool {
        self.drains.push(call.max);
        true
    }
}

fn plugin_with(config: ThrottleConfig) -> (ThrottlePlugin, Arc<HookTable>) {
    let table = Arc::new(HookTable::new());
    let plugin = ThrottlePlugin::new(table.clone(), Box::new(MemoryStore::with(config)));
    plugin.load();
    (plugin, table)
}

fn call(max: i32) -> DrainCall {
    DrainCall::new(Tick(0), max, false)
}

#[test]
fn test_double_enable_installs_hooks_once() {
    let (mut plugin, table) = plugin_with(ThrottleConfig::default());

    plugin.enable().unwrap();
    plugin.enable().unwrap();
    assert!(!plugin.install_hooks());

    assert!(plugin.is_enabled());
    assert!(plugin.hooks_installed());
    assert!(plugin.is_reporting());
    assert_eq!(table.install_count(), 2, "one cycle hook and one drain hook");

    plugin.disable();
}

#[test]
fn test_each_attempt_claims_once() {
    let (mut plugin, table) = plugin_with(ThrottleConfig {
        budget_per_tick: 100,
        max_per_call: 40,
        ..Default::default()
    });
    plugin.enable().unwrap();
    plugin.enable().unwrap();

    table.begin_cycle();
    let mut queue = PortalQueue::new(5);
    for _ in 0..3 {
        table.drain(&mut queue, call(50));
    }
    assert!(!table.drain(&mut queue, call(50)));

    assert_eq!(queue.drains, vec![40, 40, 20]);
    assert_eq!(plugin.ledger().remaining(), 0);
    let stats = plugin.stats().snapshot();
    assert_eq!(stats.calls, 4);
    assert_eq!(stats.capped, 4);

    // The next cycle starts with a full budget again.
    table.begin_cycle();
    assert_eq!(plugin.ledger().remaining(), 100);

    plugin.disable();
}

#[test]
fn test_disable_restores_original_behavior() {
    let (mut plugin, table) = plugin_with(ThrottleConfig::default());
    plugin.enable().unwrap();
    plugin.disable();
    plugin.disable();

    assert!(!plugin.is_enabled());
    assert!(!plugin.hooks_installed());
    assert!(!plugin.is_reporting());
    assert!(!table.has_cycle_hook());
    assert!(!table.has_drain_hook());

    let mut queue = PortalQueue::new(5);
    table.begin_cycle();
    assert!(table.drain(&mut queue, call(500)));
    assert_eq!(queue.drains, vec![500]);
    assert_eq!(plugin.stats().snapshot().calls, 0);
}

#[test]
fn test_throttle_switched_off_passes_through() {
    let (mut plugin, table) = plugin_with(ThrottleConfig {
        budget_enabled: false,
        ..Default::default()
    });
    plugin.enable().unwrap();

    table.begin_cycle();
    let mut queue = PortalQueue::new(5);
    table.drain(&mut queue, call(500));

    assert_eq!(queue.drains, vec![500]);
    assert_eq!(plugin.ledger().remaining(), 0);
    assert_eq!(plugin.stats().snapshot().calls, 0);

    plugin.disable();
}

#[test]
fn test_reload_applies_new_budget() {
    let table = Arc::new(HookTable::new());
    let store = Arc::new(MemoryStore::with(ThrottleConfig::default()));
    let mut plugin = ThrottlePlugin::new(table.clone(), Box::new(SharedStore(store.clone())));
    plugin.load();
    plugin.enable().unwrap();

    store
        .save(&ThrottleConfig {
            budget_per_tick: 7,
            ..Default::default()
        })
        .unwrap();
    let config = plugin.reload();
    assert_eq!(config.budget_per_tick, 7);

    table.begin_cycle();
    assert_eq!(plugin.ledger().remaining(), 7);
    assert_eq!(table.install_count(), 2);

    plugin.disable();
}

#[test]
fn test_debug_report_through_channel() {
    let table = Arc::new(HookTable::new());
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut plugin = ThrottlePlugin::with_sink(
        table.clone(),
        Box::new(MemoryStore::with(ThrottleConfig {
            debug: true,
            stats_interval_sec: 5,
            ..Default::default()
        })),
        Arc::new(ChannelSink::new(tx)),
    );
    plugin.load();
    plugin.enable().unwrap();

    for _ in 0..10 {
        plugin.stats().record_call();
    }
    plugin.stats().record_queued(250);
    plugin.stats().record_capped();
    plugin.stats().record_capped();

    let report = plugin.report_now().unwrap();
    assert_eq!(
        report.to_string(),
        "PendingTicks | calls: 10 | avg queue: 25.0 | capped: 2 (20.0%)"
    );
    assert_eq!(rx.try_recv().unwrap(), report);
    assert_eq!(plugin.stats().snapshot(), StatsSnapshot::default());

    plugin.disable();
}

#[test]
fn test_load_writes_defaults_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let table = Arc::new(HookTable::new());
    let plugin = ThrottlePlugin::new(table, Box::new(JsonConfigStore::new(dir.path())));

    let config = plugin.load();

    assert_eq!(config, ThrottleConfig::default());
    assert!(dir.path().join("config.json").exists());
}

/// Lets a test keep a handle on the store after handing it to the plugin.
struct SharedStore(Arc<MemoryStore>);

impl ConfigStore for SharedStore {
    fn load(&self) -> ConfigResult<Option<ThrottleConfig>> {
        self.0.load()
    }

    fn save(&self, config: &ThrottleConfig) -> ConfigResult<()> {
        self.0.save(config)
    }
}
