// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Markdown run summary.

use super::csv::NOT_AVAILABLE;
use super::result::MeasurementResult;
use super::stats::median;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};
use sysinfo::System;

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Host the run was measured on.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub memory_bytes: u64,
    pub hostname: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let unknown = || "Unknown".to_string();
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(unknown),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(unknown),
        }
    }
}

fn kb(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / BYTES_PER_KB)
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.3}", v))
}

/// Smallest non-empty gzipped size, the baseline for size ratios.
fn smallest_gzipped(results: &[MeasurementResult]) -> Option<u64> {
    results
        .iter()
        .map(|r| r.size.gzipped_bytes)
        .filter(|bytes| *bytes > 0)
        .min()
}

fn render(
    results: &[MeasurementResult],
    system: &SystemInfo,
    generated_at: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "# WebAssembly Bake-off Summary")?;
    writeln!(out)?;
    writeln!(out, "Generated: {}", generated_at.to_rfc3339())?;
    writeln!(out)?;

    writeln!(out, "## System")?;
    writeln!(out)?;
    writeln!(out, "- Host: {}", system.hostname)?;
    writeln!(out, "- OS: {} {}", system.os, system.os_version)?;
    if let Some(kernel) = &system.kernel_version {
        writeln!(out, "- Kernel: {}", kernel)?;
    }
    writeln!(out, "- CPU: {} ({} cores)", system.cpu_model, system.cpu_cores)?;
    writeln!(
        out,
        "- Memory: {:.1} GB",
        system.memory_bytes as f64 / BYTES_PER_GB
    )?;
    writeln!(out)?;

    writeln!(out, "## Size")?;
    writeln!(out)?;
    writeln!(out, "| Target | Raw (KB) | Gzipped (KB) | Compression | vs. smallest |")?;
    writeln!(out, "|--------|----------|--------------|-------------|--------------|")?;
    let smallest = smallest_gzipped(results);
    for result in results {
        let size = &result.size;
        let ratio = match smallest {
            Some(base) if size.gzipped_bytes > 0 => {
                format!("{:.2}x", size.gzipped_bytes as f64 / base as f64)
            }
            _ => NOT_AVAILABLE.to_string(),
        };
        writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {} |",
            result.target,
            kb(size.raw_bytes),
            kb(size.gzipped_bytes),
            size.compression_percent,
            ratio
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Cold Start")?;
    writeln!(out)?;
    writeln!(out, "| Target | Median (ms) | Samples |")?;
    writeln!(out, "|--------|-------------|---------|")?;
    for result in results {
        writeln!(
            out,
            "| {} | {} | {} |",
            result.target,
            ms(median(&result.cold_start_ms)),
            result.cold_start_ms.len()
        )?;
    }
    writeln!(out)?;

    let failing: Vec<&MeasurementResult> = results.iter().filter(|r| r.has_errors()).collect();
    if !failing.is_empty() {
        writeln!(out, "## Errors")?;
        writeln!(out)?;
        for result in failing {
            writeln!(out, "### {} ({} at {})", result.target, result.errors.len(), result.stage)?;
            writeln!(out)?;
            for error in &result.errors {
                writeln!(out, "- {}", error)?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "---")?;
    writeln!(out, "Targets: {}", results.len())?;
    Ok(out)
}

/// Renders the summary document.
pub fn generate_summary(
    results: &[MeasurementResult],
    system: &SystemInfo,
    generated_at: DateTime<Utc>,
) -> String {
    // Writing into a String cannot fail.
    render(results, system, generated_at).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> SystemInfo {
        SystemInfo {
            os: "Linux".to_string(),
            os_version: "24.04".to_string(),
            kernel_version: None,
            cpu_model: "Test CPU".to_string(),
            cpu_cores: 8,
            memory_bytes: 16 * 1024 * 1024 * 1024,
            hostname: "bench".to_string(),
        }
    }

    fn sized(name: &str, raw: u64, gzipped: u64) -> MeasurementResult {
        let mut result = MeasurementResult::new(name, "native");
        result.size.raw_bytes = raw;
        result.size.gzipped_bytes = gzipped;
        result.size.compression_percent = (1.0 - gzipped as f64 / raw as f64) * 100.0;
        result
    }

    #[test]
    fn test_size_ratio_against_smallest() {
        let results = vec![sized("rust", 4096, 2048), sized("kotlin", 40960, 8192)];
        let summary = generate_summary(&results, &host(), Utc::now());

        assert!(summary.contains("| rust | 4.0 | 2.0 | 50.0% | 1.00x |"));
        assert!(summary.contains("| kotlin | 40.0 | 8.0 | 80.0% | 4.00x |"));
    }

    #[test]
    fn test_median_cold_start_and_errors() {
        let mut result = sized("rust", 1024, 512);
        result.cold_start_ms = vec![3.0, 1.0, 2.0];
        let mut ghost = MeasurementResult::new("ghost", "native");
        ghost.record_error("Build missing: no artifact");

        let summary = generate_summary(&[result, ghost], &host(), Utc::now());

        assert!(summary.contains("| rust | 2.000 | 3 |"));
        assert!(summary.contains("| ghost | N/A | 0 |"));
        assert!(summary.contains("### ghost (1 at not built)"));
        assert!(summary.contains("- Build missing: no artifact"));
        assert!(summary.contains("- CPU: Test CPU (8 cores)"));
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.memory_bytes > 0);
    }
}
