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

//! Lifecycle of the pending-tick throttle inside a host process.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tickwarden_control::{AdmissionFilter, BudgetLedger, CycleResetTrigger, QueueClassifier};
use tickwarden_core::config::{LiveSettings, ThrottleConfig};
use tickwarden_core::host::HookRegistry;
use tickwarden_core::stats::ThrottleStats;
use tickwarden_io::ConfigStore;
use tickwarden_telemetry::{LogSink, ReportSink, StatsReporter};

/// The throttle as a host plugin.
///
/// Owns the shared state (ledger, counters, live settings), the two hooks
/// built on top of it, and the statistics reporter. All state starts inert:
/// the ledger is empty and the hooks pass every call through until
/// [`enable`](Self::enable) is called.
pub struct ThrottlePlugin {
    registry: Arc<dyn HookRegistry>,
    store: Box<dyn ConfigStore>,
    settings: Arc<LiveSettings>,
    ledger: Arc<BudgetLedger>,
    stats: Arc<ThrottleStats>,
    cycle_hook: Arc<CycleResetTrigger>,
    drain_hook: Arc<AdmissionFilter>,
    reporter: StatsReporter,
    hooks_installed: AtomicBool,
}

impl ThrottlePlugin {
    /// Creates a plugin that reports statistics to the log.
    pub fn new(registry: Arc<dyn HookRegistry>, store: Box<dyn ConfigStore>) -> Self {
        Self::with_sink(registry, store, Arc::new(LogSink::default()))
    }

    /// Creates a plugin that reports statistics to `sink`.
    pub fn with_sink(
        registry: Arc<dyn HookRegistry>,
        store: Box<dyn ConfigStore>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let settings = Arc::new(LiveSettings::new());
        let ledger = Arc::new(BudgetLedger::new());
        let stats = Arc::new(ThrottleStats::new());

        let cycle_hook = Arc::new(CycleResetTrigger::new(
            Arc::clone(&ledger),
            Arc::clone(&settings),
        ));
        let drain_hook = Arc::new(AdmissionFilter::new(
            Arc::clone(&ledger),
            Arc::clone(&stats),
            Arc::clone(&settings),
        ));
        let reporter = StatsReporter::new(Arc::clone(&stats), Arc::clone(&settings), sink);

        Self {
            registry,
            store,
            settings,
            ledger,
            stats,
            cycle_hook,
            drain_hook,
            reporter,
            hooks_installed: AtomicBool::new(false),
        }
    }

    /// Replaces the queue classifier used by the drain hook.
    ///
    /// Takes effect on the next installation of the hooks.
    pub fn with_classifier(mut self, classifier: QueueClassifier) -> Self {
        let filter = AdmissionFilter::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.stats),
            Arc::clone(&self.settings),
        )
        .with_classifier(classifier);
        self.drain_hook = Arc::new(filter);
        self
    }

    /// Loads the configuration record and applies it.
    ///
    /// A missing or malformed record is replaced by defaults.
    pub fn load(&self) -> ThrottleConfig {
        let config = self.store.load_or_default();
        self.settings.apply(&config);
        log::info!(
            "PendingTickOptimizer loaded (enabled: {}, budget: {}, per call: {}).",
            config.enabled,
            config.budget_per_tick(),
            config.max_per_call()
        );
        config
    }

    /// Re-reads the configuration record and applies it to the running plugin.
    pub fn reload(&self) -> ThrottleConfig {
        let config = self.store.load_or_default();
        self.settings.apply(&config);
        log::info!("PendingTickOptimizer configuration reloaded.");
        config
    }

    /// Activates the throttle: installs the hooks and starts the reporter.
    ///
    /// Calling it again while enabled does nothing.
    pub fn enable(&mut self) -> Result<()> {
        if self.settings.is_active() {
            return Ok(());
        }

        self.settings.set_active(true);
        self.install_hooks();
        if let Err(e) = self.reporter.start() {
            self.disable();
            return Err(e);
        }

        log::info!(
            "PendingTickOptimizer enabled: {} pending ticks per tick, {} per call.",
            self.settings.budget_per_tick(),
            self.settings.max_per_call()
        );
        Ok(())
    }

    /// Deactivates the throttle: removes the hooks and stops the reporter.
    ///
    /// Calling it again while disabled does nothing.
    pub fn disable(&mut self) {
        let was_active = self.settings.is_active();
        self.settings.set_active(false);
        self.remove_hooks();
        self.reporter.stop();

        if was_active {
            log::info!("PendingTickOptimizer disabled.");
        }
    }

    /// Installs both hooks unless they already are. Returns `true` if this
    /// call installed them.
    pub fn install_hooks(&self) -> bool {
        if self.hooks_installed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.registry.install_cycle_hook(self.cycle_hook.clone());
        self.registry.install_drain_hook(self.drain_hook.clone());
        true
    }

    /// Removes both hooks if they are installed. Returns `true` if this call
    /// removed them.
    pub fn remove_hooks(&self) -> bool {
        if !self.hooks_installed.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.registry.remove_drain_hook();
        self.registry.remove_cycle_hook();
        true
    }

    /// `true` between [`enable`](Self::enable) and [`disable`](Self::disable).
    pub fn is_enabled(&self) -> bool {
        self.settings.is_active()
    }

    /// `true` while the hooks are installed in the host.
    pub fn hooks_installed(&self) -> bool {
        self.hooks_installed.load(Ordering::SeqCst)
    }

    /// `true` while the statistics reporter runs.
    pub fn is_reporting(&self) -> bool {
        self.reporter.is_running()
    }

    /// The live settings consulted by the hooks.
    pub fn settings(&self) -> &Arc<LiveSettings> {
        &self.settings
    }

    /// The shared cycle budget.
    pub fn ledger(&self) -> &Arc<BudgetLedger> {
        &self.ledger
    }

    /// The statistics of the current reporting window.
    pub fn stats(&self) -> &Arc<ThrottleStats> {
        &self.stats
    }

    /// Emits a report immediately when debug reporting is on.
    pub fn report_now(&self) -> Option<tickwarden_telemetry::StatsReport> {
        self.reporter.report_now()
    }
}

impl Drop for ThrottlePlugin {
    fn drop(&mut self) {
        self.disable();
    }
}
