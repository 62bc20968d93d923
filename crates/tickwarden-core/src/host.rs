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

//! Contracts between the throttle and the host simulation engine.
//!
//! The host owns the tick queues and the cycle driver. The throttle only sees
//! them through the narrow traits below: a borrowed queue view for the
//! duration of one drain attempt, and two interception points that the host
//! invokes once installed through its [`HookRegistry`].

use std::fmt;
use std::sync::Arc;

/// An opaque time horizon passed by the host to a drain attempt.
///
/// Pending ticks scheduled at or before this value are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(pub u64);

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick#{}", self.0)
    }
}

/// Arguments of a single drain attempt on a host tick queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainCall {
    /// Horizon up to which pending ticks are due.
    pub until: Tick,
    /// Maximum number of pending ticks the caller wants processed.
    pub max: i32,
    /// Host flag requesting immediate ticking of freshly scheduled entries.
    pub insta: bool,
}

impl DrainCall {
    /// Creates a new drain call.
    pub fn new(until: Tick, max: i32, insta: bool) -> Self {
        Self { until, max, insta }
    }

    /// Returns a copy of this call with the batch size replaced by `max`.
    pub fn with_max(self, max: i32) -> Self {
        Self { max, ..self }
    }
}

/// A borrowed, read-only view of one pending work item in a host queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTickView<'a> {
    /// `true` if the host has logically removed this entry.
    pub removed: bool,
    /// Type name of the subject the tick targets, if it still exists.
    pub subject: Option<&'a str>,
}

impl<'a> PendingTickView<'a> {
    /// A live entry targeting a subject of the given type.
    pub fn alive(subject: &'a str) -> Self {
        Self {
            removed: false,
            subject: Some(subject),
        }
    }

    /// A live entry whose subject reference is absent.
    pub fn orphan() -> Self {
        Self {
            removed: false,
            subject: None,
        }
    }

    /// An entry the host has already marked as removed.
    pub fn removed(subject: Option<&'a str>) -> Self {
        Self {
            removed: true,
            subject,
        }
    }
}

/// A host-owned queue of pending ticks.
///
/// Implementors expose their entries in queue order and provide the original,
/// un-intercepted drain operation. The throttle borrows a queue only for the
/// duration of one [`DrainHook::on_drain`] call and never mutates entries.
pub trait TickQueue {
    /// Number of entries currently held, removed ones included.
    fn len(&self) -> usize;

    /// Returns `true` if the queue holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a view of the entry at `index`, in queue order.
    fn pending_tick(&self, index: usize) -> Option<PendingTickView<'_>>;

    /// The host's original drain operation.
    ///
    /// Processes at most `call.max` due entries and returns whether any
    /// progress was made.
    fn drain(&mut self, call: DrainCall) -> bool;
}

/// Interception point invoked by the host at the start of every cycle.
pub trait CycleHook: Send + Sync {
    /// Called exactly once per cycle, before any drain attempt of that cycle.
    fn on_cycle_begin(&self);
}

/// Interception point wrapping the host's queue drain operation.
pub trait DrainHook: Send + Sync {
    /// Called in place of [`TickQueue::drain`].
    ///
    /// Implementations may narrow `call.max` before delegating to
    /// `queue.drain`, or skip the drain entirely. The return value is handed
    /// back to the host unchanged.
    fn on_drain(&self, queue: &mut dyn TickQueue, call: DrainCall) -> bool;
}

/// Host-side registry of the two interception points.
///
/// Installation and removal are driven by the plugin lifecycle, which
/// guarantees that each hook is installed at most once at a time.
pub trait HookRegistry: Send + Sync {
    /// Installs the per-cycle hook.
    fn install_cycle_hook(&self, hook: Arc<dyn CycleHook>);

    /// Installs the drain hook.
    fn install_drain_hook(&self, hook: Arc<dyn DrainHook>);

    /// Removes the per-cycle hook, restoring the host's original behavior.
    fn remove_cycle_hook(&self);

    /// Removes the drain hook, restoring the host's original behavior.
    fn remove_drain_hook(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_max_keeps_other_arguments() {
        let call = DrainCall::new(Tick(42), 100, true);
        let narrowed = call.with_max(7);

        assert_eq!(narrowed.max, 7);
        assert_eq!(narrowed.until, Tick(42));
        assert!(narrowed.insta);
    }

    #[test]
    fn test_pending_tick_view_constructors() {
        assert_eq!(
            PendingTickView::alive("minecraft:portal").subject,
            Some("minecraft:portal")
        );
        assert!(!PendingTickView::orphan().removed);
        assert!(PendingTickView::orphan().subject.is_none());
        assert!(PendingTickView::removed(None).removed);
    }

    #[test]
    fn test_tick_display() {
        assert_eq!(Tick(3).to_string(), "tick#3");
    }
}
