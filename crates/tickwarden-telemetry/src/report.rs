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

//! Statistics reports and the sinks that receive them.

use crossbeam_channel::Sender;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tickwarden_core::stats::StatsSnapshot;

/// One reporting window worth of throttle statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsReport {
    /// Length of the window, in whole seconds.
    pub interval_sec: u64,
    /// Counters accumulated over the window.
    #[serde(flatten)]
    pub snapshot: StatsSnapshot,
    /// Average pre-drain queue size per call.
    pub average_queue: f64,
    /// Share of capped calls, in percent.
    pub capped_percent: f64,
}

impl StatsReport {
    /// Builds a report from the counters of one window.
    pub fn new(interval: Duration, snapshot: StatsSnapshot) -> Self {
        Self {
            interval_sec: interval.as_secs(),
            snapshot,
            average_queue: snapshot.average_queue(),
            capped_percent: snapshot.capped_percent(),
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.snapshot, f)
    }
}

/// Destination for periodic reports.
pub trait ReportSink: Send + Sync {
    /// Delivers one report. Must not block for long.
    fn emit(&self, report: &StatsReport);
}

/// How [`LogSink`] renders a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// The one-line human readable summary.
    #[default]
    Text,
    /// A single-line JSON object.
    Json,
}

/// Writes reports to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink {
    format: ReportFormat,
}

impl LogSink {
    /// Creates a sink using `format`.
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Renders `report` the way it will be logged.
    pub fn render(&self, report: &StatsReport) -> String {
        match self.format {
            ReportFormat::Text => report.to_string(),
            ReportFormat::Json => match serde_json::to_string(report) {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("LogSink: failed to serialize report: {e}");
                    report.to_string()
                }
            },
        }
    }
}

impl ReportSink for LogSink {
    fn emit(&self, report: &StatsReport) {
        log::info!("{}", self.render(report));
    }
}

/// Forwards reports over a channel, for hosts that consume them directly.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<StatsReport>,
}

impl ChannelSink {
    /// Creates a sink sending into `sender`.
    pub fn new(sender: Sender<StatsReport>) -> Self {
        Self { sender }
    }
}

impl ReportSink for ChannelSink {
    fn emit(&self, report: &StatsReport) {
        if let Err(e) = self.sender.try_send(*report) {
            log::warn!("ChannelSink: dropped report ({e})");
        }
    }
}
