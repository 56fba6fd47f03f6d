// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fixed-column CSV rendering
//!
//! One row per target. Milliseconds carry three decimals, MB and MB/s two.
//! A cell whose probe is unsupported, or that has no data behind it, reads
//! `N/A`. Sizes are always numeric because a missing artifact sizes as zero.

use super::result::{MeasurementResult, ProbeKind};
use super::stats::mean;
use crate::probes::payloads::SizeClass;

pub const CSV_HEADER: &str = "Target,WASM Size (bytes),Gzipped Size (bytes),Cold Start (ms),\
Exec Small (ms),Exec Medium (ms),Exec Large (ms),\
Throughput Small (MB/s),Throughput Medium (MB/s),Throughput Large (MB/s),\
Memory Baseline (MB),Memory Loaded (MB),Memory Peak (MB),Errors";

pub const NOT_AVAILABLE: &str = "N/A";

fn cell(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| format!("{:.*}", decimals, v),
    )
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One data row, without a trailing newline.
pub fn csv_row(result: &MeasurementResult) -> String {
    let unsupported = |probe| result.is_unsupported(probe);
    let gated = |probe, value: Option<f64>| {
        if unsupported(probe) {
            None
        } else {
            value
        }
    };

    let mut fields = vec![
        escape(&result.target),
        result.size.raw_bytes.to_string(),
        result.size.gzipped_bytes.to_string(),
        cell(gated(ProbeKind::ColdStart, mean(&result.cold_start_ms)), 3),
    ];

    for class in SizeClass::REPORTED {
        let samples = result.execution_ms.get(&class).and_then(|s| mean(s));
        fields.push(cell(gated(ProbeKind::Execution, samples), 3));
    }
    for class in SizeClass::REPORTED {
        let throughput = result.throughput_mb_s.get(&class).copied();
        fields.push(cell(gated(ProbeKind::Execution, throughput), 2));
    }

    let memory = &result.memory;
    fields.push(cell(memory.baseline_mb, 2));
    fields.push(cell(memory.loaded_mb, 2));
    fields.push(cell(gated(ProbeKind::Memory, memory.peak_mb), 2));
    fields.push(result.errors.len().to_string());

    fields.join(",")
}

/// Header plus one row per result.
pub fn csv_document(results: &[MeasurementResult]) -> String {
    let mut document = String::from(CSV_HEADER);
    for result in results {
        document.push('\n');
        document.push_str(&csv_row(result));
    }
    document.push('\n');
    document
}
