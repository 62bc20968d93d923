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

//! # Tickwarden Telemetry
//!
//! Reads and clears the throttle statistics on a fixed interval and hands the
//! resulting report to a [`ReportSink`].

#![warn(missing_docs)]

pub mod report;
pub mod service;

pub use report::{ChannelSink, LogSink, ReportFormat, ReportSink, StatsReport};
pub use service::StatsReporter;
