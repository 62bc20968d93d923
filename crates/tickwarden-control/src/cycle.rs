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

//! Refills the budget ledger at every cycle boundary.

use crate::ledger::BudgetLedger;
use std::sync::Arc;
use tickwarden_core::config::LiveSettings;
use tickwarden_core::host::CycleHook;

/// Per-cycle hook resetting the [`BudgetLedger`] to the configured ceiling.
///
/// While the throttle is off the ledger keeps whatever value it had; the
/// admission filter ignores it in that state.
#[derive(Debug, Clone)]
pub struct CycleResetTrigger {
    ledger: Arc<BudgetLedger>,
    settings: Arc<LiveSettings>,
}

impl CycleResetTrigger {
    /// Creates a trigger refilling `ledger` from `settings`.
    pub fn new(ledger: Arc<BudgetLedger>, settings: Arc<LiveSettings>) -> Self {
        Self { ledger, settings }
    }
}

impl CycleHook for CycleResetTrigger {
    #[inline]
    fn on_cycle_begin(&self) {
        if self.settings.is_throttling() {
            self.ledger.reset(self.settings.budget_per_tick());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwarden_core::config::ThrottleConfig;

    fn trigger_with(config: ThrottleConfig, active: bool) -> CycleResetTrigger {
        let settings = Arc::new(LiveSettings::from_config(&config));
        settings.set_active(active);
        CycleResetTrigger::new(Arc::new(BudgetLedger::new()), settings)
    }

    #[test]
    fn test_cycle_refills_ledger() {
        let trigger = trigger_with(
            ThrottleConfig {
                budget_per_tick: 64,
                ..Default::default()
            },
            true,
        );
        trigger.ledger.claim(1);
        trigger.on_cycle_begin();
        assert_eq!(trigger.ledger.remaining(), 64);

        trigger.ledger.claim(64);
        trigger.on_cycle_begin();
        assert_eq!(trigger.ledger.remaining(), 64);
    }

    #[test]
    fn test_non_positive_ceiling_refills_to_one() {
        let trigger = trigger_with(
            ThrottleConfig {
                budget_per_tick: 0,
                ..Default::default()
            },
            true,
        );
        trigger.on_cycle_begin();
        assert_eq!(trigger.ledger.remaining(), 1);
    }

    #[test]
    fn test_disabled_throttle_leaves_ledger_stale() {
        let trigger = trigger_with(
            ThrottleConfig {
                budget_enabled: false,
                ..Default::default()
            },
            true,
        );
        trigger.ledger.reset(7);
        trigger.ledger.claim(2);
        trigger.on_cycle_begin();
        assert_eq!(trigger.ledger.remaining(), 5);
    }

    #[test]
    fn test_inactive_plugin_does_nothing() {
        let trigger = trigger_with(ThrottleConfig::default(), false);
        trigger.on_cycle_begin();
        assert_eq!(trigger.ledger.remaining(), 0);
    }
}
