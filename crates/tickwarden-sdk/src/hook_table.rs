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

//! An in-memory [`HookRegistry`] for hosts that dispatch hooks themselves.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tickwarden_core::host::{CycleHook, DrainCall, DrainHook, HookRegistry, TickQueue};

/// Holds the installed interception points and dispatches host calls to them.
///
/// With no hook installed, [`begin_cycle`](Self::begin_cycle) does nothing and
/// [`drain`](Self::drain) calls the queue's original drain directly.
#[derive(Default)]
pub struct HookTable {
    cycle: RwLock<Option<Arc<dyn CycleHook>>>,
    drain: RwLock<Option<Arc<dyn DrainHook>>>,
    installs: AtomicUsize,
}

impl HookTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host notification for the start of a cycle.
    pub fn begin_cycle(&self) {
        let hook = self
            .cycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook.on_cycle_begin();
        }
    }

    /// Host drain entry point, routed through the drain hook when installed.
    pub fn drain(&self, queue: &mut dyn TickQueue, call: DrainCall) -> bool {
        let hook = self
            .drain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match hook {
            Some(hook) => hook.on_drain(queue, call),
            None => queue.drain(call),
        }
    }

    /// `true` while a cycle hook is installed.
    pub fn has_cycle_hook(&self) -> bool {
        self.cycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `true` while a drain hook is installed.
    pub fn has_drain_hook(&self) -> bool {
        self.drain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Total number of hook installations performed since creation.
    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::Relaxed)
    }
}

impl HookRegistry for HookTable {
    fn install_cycle_hook(&self, hook: Arc<dyn CycleHook>) {
        *self.cycle.write().unwrap_or_else(PoisonError::into_inner) = Some(hook);
        self.installs.fetch_add(1, Ordering::Relaxed);
        log::debug!("HookTable: cycle hook installed.");
    }

    fn install_drain_hook(&self, hook: Arc<dyn DrainHook>) {
        *self.drain.write().unwrap_or_else(PoisonError::into_inner) = Some(hook);
        self.installs.fetch_add(1, Ordering::Relaxed);
        log::debug!("HookTable: drain hook installed.");
    }

    fn remove_cycle_hook(&self) {
        self.cycle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        log::debug!("HookTable: cycle hook removed.");
    }

    fn remove_drain_hook(&self) {
        self.drain
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        log::debug!("HookTable: drain hook removed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tickwarden_core::host::{PendingTickView, Tick};

    struct CountingQueue {
        drained: Vec<i32>,
    }

    impl TickQueue for CountingQueue {
        fn len(&self) -> usize {
            0
        }

        fn pending_tick(&self, _index: usize) -> Option<PendingTickView<'_>> {
            None
        }

        fn drain(&mut self, call: DrainCall) -> bool {
            self.drained.push(call.max);
            true
        }
    }

    struct HalvingHook;

    impl DrainHook for HalvingHook {
        fn on_drain(&self, queue: &mut dyn TickQueue, call: DrainCall) -> bool {
            queue.drain(call.with_max(call.max / 2))
        }
    }

    #[derive(Default)]
    struct FlagHook(AtomicBool);

    impl CycleHook for FlagHook {
        fn on_cycle_begin(&self) {
            self.0.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_drain_without_hook_calls_original() {
        let table = HookTable::new();
        let mut queue = CountingQueue { drained: vec![] };

        assert!(table.drain(&mut queue, DrainCall::new(Tick(0), 10, false)));
        assert_eq!(queue.drained, vec![10]);
    }

    #[test]
    fn test_drain_is_routed_through_hook() {
        let table = HookTable::new();
        table.install_drain_hook(Arc::new(HalvingHook));
        let mut queue = CountingQueue { drained: vec![] };

        table.drain(&mut queue, DrainCall::new(Tick(0), 10, false));
        assert_eq!(queue.drained, vec![5]);

        table.remove_drain_hook();
        table.drain(&mut queue, DrainCall::new(Tick(0), 10, false));
        assert_eq!(queue.drained, vec![5, 10]);
    }

    #[test]
    fn test_cycle_hook_dispatch() {
        let table = HookTable::new();
        let hook = Arc::new(FlagHook::default());
        table.begin_cycle();

        table.install_cycle_hook(hook.clone());
        assert!(table.has_cycle_hook());
        table.begin_cycle();
        assert!(hook.0.load(Ordering::Relaxed));
        assert_eq!(table.install_count(), 1);

        table.remove_cycle_hook();
        assert!(!table.has_cycle_hook());
    }
}
