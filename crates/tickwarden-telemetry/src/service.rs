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

//! Background service emitting the throttle statistics report.

use crate::report::{ReportSink, StatsReport};
use anyhow::{Context as _, Result};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tickwarden_core::config::LiveSettings;
use tickwarden_core::stats::ThrottleStats;

/// Periodically takes the throttle statistics and emits them to a sink.
///
/// The reporting thread is cooperative: it re-checks the running flag before
/// and after each wait, and [`stop`](Self::stop) wakes it early instead of
/// waiting out the interval.
pub struct StatsReporter {
    stats: Arc<ThrottleStats>,
    settings: Arc<LiveSettings>,
    sink: Arc<dyn ReportSink>,
    running: Arc<AtomicBool>,
    shutdown_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StatsReporter {
    /// Creates a stopped reporter.
    pub fn new(
        stats: Arc<ThrottleStats>,
        settings: Arc<LiveSettings>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            stats,
            settings,
            sink,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Starts the reporting thread. Does nothing if it is already running.
    pub fn start(&mut self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);
        let settings = Arc::clone(&self.settings);
        let sink = Arc::clone(&self.sink);

        let spawned = thread::Builder::new()
            .name("tickwarden-stats".into())
            .spawn(move || {
                log::debug!("StatsReporter thread started.");

                while running.load(Ordering::Relaxed) {
                    match shutdown_rx.recv_timeout(settings.stats_interval()) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if !running.load(Ordering::Relaxed) {
                        break;
                    }
                    report_window(&stats, &settings, sink.as_ref());
                }

                log::debug!("StatsReporter thread stopped.");
            });

        match spawned {
            Ok(handle) => {
                self.shutdown_tx = Some(shutdown_tx);
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e).context("failed to spawn the statistics reporting thread")
            }
        }
    }

    /// Stops the reporting thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Dropping the sender disconnects the channel and ends the wait.
        self.shutdown_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("StatsReporter thread panicked during shutdown.");
            }
        }
    }

    /// Returns `true` while the reporting thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs one reporting step on the calling thread.
    pub fn report_now(&self) -> Option<StatsReport> {
        report_window(&self.stats, &self.settings, self.sink.as_ref())
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Takes the counters and emits a report, if the debug flag is set.
///
/// With the flag cleared the counters keep accumulating.
fn report_window(
    stats: &ThrottleStats,
    settings: &LiveSettings,
    sink: &dyn ReportSink,
) -> Option<StatsReport> {
    if !settings.debug() {
        return None;
    }
    let report = StatsReport::new(settings.stats_interval(), stats.take());
    sink.emit(&report);
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ChannelSink;
    use std::time::{Duration, Instant};
    use tickwarden_core::config::ThrottleConfig;
    use tickwarden_core::stats::StatsSnapshot;

    fn reporter_with(
        config: ThrottleConfig,
    ) -> (StatsReporter, crossbeam_channel::Receiver<StatsReport>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reporter = StatsReporter::new(
            Arc::new(ThrottleStats::new()),
            Arc::new(LiveSettings::from_config(&config)),
            Arc::new(ChannelSink::new(tx)),
        );
        (reporter, rx)
    }

    fn record(stats: &ThrottleStats, calls: u64, queued: u64, capped: u64) {
        for _ in 0..calls {
            stats.record_call();
        }
        stats.record_queued(queued);
        for _ in 0..capped {
            stats.record_capped();
        }
    }

    #[test]
    fn test_report_now_takes_and_clears() {
        let (reporter, rx) = reporter_with(ThrottleConfig {
            debug: true,
            stats_interval_sec: 5,
            ..Default::default()
        });
        record(&reporter.stats, 10, 250, 2);

        let report = reporter.report_now().unwrap();
        assert_eq!(report.interval_sec, 5);
        assert!((report.average_queue - 25.0).abs() < f64::EPSILON);
        assert!((report.capped_percent - 20.0).abs() < f64::EPSILON);
        assert_eq!(rx.try_recv().unwrap(), report);
        assert_eq!(reporter.stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_report_skipped_without_debug() {
        let (reporter, rx) = reporter_with(ThrottleConfig::default());
        record(&reporter.stats, 3, 9, 1);

        assert!(reporter.report_now().is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(reporter.stats.snapshot().calls, 3);
    }

    #[test]
    fn test_reporter_lifecycle() {
        let (mut reporter, _rx) = reporter_with(ThrottleConfig::default());
        reporter.start().unwrap();
        assert!(reporter.is_running());

        // Second start is a no-op.
        reporter.start().unwrap();
        assert!(reporter.is_running());

        reporter.stop();
        assert!(!reporter.is_running());
        reporter.stop();
    }

    #[test]
    fn test_stop_wakes_the_thread_early() {
        let (mut reporter, _rx) = reporter_with(ThrottleConfig {
            stats_interval_sec: 60,
            ..Default::default()
        });
        reporter.start().unwrap();
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        reporter.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_background_thread_emits_reports() {
        let (mut reporter, rx) = reporter_with(ThrottleConfig {
            debug: true,
            stats_interval_sec: 0,
            ..Default::default()
        });
        record(&reporter.stats, 4, 40, 1);
        reporter.start().unwrap();

        let report = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        reporter.stop();

        assert_eq!(report.interval_sec, 1);
        assert_eq!(report.snapshot.calls, 4);
        assert!((report.average_queue - 10.0).abs() < f64::EPSILON);
        assert_eq!(reporter.stats.snapshot().calls, 0);
    }
}
