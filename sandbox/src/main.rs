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

//! Runs a small fixed-rate host loop with the throttle installed.
//!
//! Two queues are simulated: a block of portals whose ticks re-schedule
//! themselves (the feedback loop the throttle targets) and an ordinary
//! redstone queue that must never be throttled.
//!
//! Usage: `sandbox [config-dir] [cycles]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tickwarden_sdk::prelude::*;

const CYCLE_RATE_HZ: u64 = 20;
const DRAIN_BATCH: i32 = 100;

#[derive(Debug, Clone, Copy)]
struct SimTick {
    subject: &'static str,
    due: u64,
    removed: bool,
}

/// A host tick queue. Portal ticks schedule a copy of themselves when run.
struct SimQueue {
    name: &'static str,
    entries: Vec<SimTick>,
    fan_out: usize,
    processed: u64,
}

impl SimQueue {
    fn new(name: &'static str, subject: &'static str, len: usize, fan_out: usize) -> Self {
        Self {
            name,
            entries: vec![
                SimTick {
                    subject,
                    due: 0,
                    removed: false,
                };
                len
            ],
            fan_out,
            processed: 0,
        }
    }
}

impl TickQueue for SimQueue {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn pending_tick(&self, index: usize) -> Option<PendingTickView<'_>> {
        self.entries.get(index).map(|tick| PendingTickView {
            removed: tick.removed,
            subject: Some(tick.subject),
        })
    }

    fn drain(&mut self, call: DrainCall) -> bool {
        let budget = call.max.max(0) as usize;
        let mut ran = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for tick in self.entries.drain(..) {
            if ran.len() < budget && !tick.removed && tick.due <= call.until.0 {
                ran.push(tick);
            } else if !tick.removed {
                kept.push(tick);
            }
        }

        for tick in &ran {
            for _ in 0..self.fan_out {
                kept.push(SimTick {
                    due: call.until.0 + 1,
                    ..*tick
                });
            }
        }

        self.processed += ran.len() as u64;
        self.entries = kept;
        !ran.is_empty()
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sandbox-config"));
    let cycles: u64 = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid cycle count '{raw}'"))?,
        None => 200,
    };

    let hooks = Arc::new(HookTable::new());
    let mut plugin = ThrottlePlugin::new(hooks.clone(), Box::new(JsonConfigStore::new(&config_dir)));
    plugin.load();
    plugin.enable()?;

    let mut portals = SimQueue::new("portals", "minecraft:portal", 16, 2);
    let mut redstone = SimQueue::new("redstone", "minecraft:redstone_wire", 16, 1);
    let cycle_duration = Duration::from_millis(1000 / CYCLE_RATE_HZ);

    for cycle in 0..cycles {
        let started = Instant::now();
        hooks.begin_cycle();

        for queue in [&mut portals, &mut redstone] {
            hooks.drain(queue, DrainCall::new(Tick(cycle), DRAIN_BATCH, false));
        }

        if cycle % CYCLE_RATE_HZ == 0 {
            log::debug!(
                "cycle {cycle}: {} pending {}, {} pending {}, budget left {}",
                portals.len(),
                portals.name,
                redstone.len(),
                redstone.name,
                plugin.ledger().remaining()
            );
        }

        let elapsed = started.elapsed();
        if elapsed < cycle_duration {
            std::thread::sleep(cycle_duration - elapsed);
        }
    }

    log::info!(
        "Processed {} portal ticks ({} still pending) and {} redstone ticks over {} cycles.",
        portals.processed,
        portals.len(),
        redstone.processed,
        cycles
    );
    if let Some(report) = plugin.report_now() {
        log::info!("Final window: {report}");
    }

    plugin.disable();
    Ok(())
}
