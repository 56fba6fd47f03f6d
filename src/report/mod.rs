// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Measurement records and the reports rendered from them.

pub mod csv;
mod error;
pub mod io;
pub mod markdown;
pub mod result;
pub mod stats;

pub use csv::{csv_document, csv_row, CSV_HEADER};
pub use error::{ReportError, ReportResult};
pub use io::ReportWriter;
pub use markdown::{generate_summary, SystemInfo};
pub use result::{MeasurementResult, MemorySnapshot, ProbeKind, SizeMetrics};
