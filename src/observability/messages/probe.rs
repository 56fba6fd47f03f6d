// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for probe results and probe failures.

use crate::probes::payloads::SizeClass;
use crate::report::{MemorySnapshot, ProbeKind};
use std::fmt::{Display, Formatter};

fn fmt_mb(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |mb| format!("{:.2} MB", mb))
}

/// Size probe finished.
///
/// # Log Level
/// `info!` - Per-target result
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::probe::SizeMeasured;
///
/// let msg = SizeMeasured {
///     target: "rust",
///     raw_bytes: 20480,
///     gzipped_bytes: 8192,
/// };
///
/// assert_eq!(msg.to_string(), "[rust] size: 20480 bytes (8192 gzipped)");
/// ```
pub struct SizeMeasured<'a> {
    pub target: &'a str,
    pub raw_bytes: u64,
    pub gzipped_bytes: u64,
}

impl Display for SizeMeasured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] size: {} bytes ({} gzipped)",
            self.target, self.raw_bytes, self.gzipped_bytes
        )
    }
}

/// Cold-start probe finished.
///
/// # Log Level
/// `info!` - Per-target result
pub struct ColdStartMeasured<'a> {
    pub target: &'a str,
    pub samples: &'a [f64],
}

impl Display for ColdStartMeasured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let rendered: Vec<String> = self.samples.iter().map(|ms| format!("{:.3}", ms)).collect();
        write!(
            f,
            "[{}] cold start: {} sample(s) [{}] ms",
            self.target,
            self.samples.len(),
            rendered.join(", ")
        )
    }
}

/// Execution probe finished one size class.
///
/// # Log Level
/// `info!` - Per-class result
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::probe::ExecutionMeasured;
/// use wasm_bakeoff::probes::SizeClass;
///
/// let msg = ExecutionMeasured {
///     target: "tinygo",
///     class: SizeClass::Medium,
///     samples: &[0.25, 0.75],
///     throughput_mb_s: Some(12.5),
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "[tinygo] execution medium: 2 sample(s), mean 0.500 ms, throughput 12.50 MB/s"
/// );
/// ```
pub struct ExecutionMeasured<'a> {
    pub target: &'a str,
    pub class: SizeClass,
    pub samples: &'a [f64],
    pub throughput_mb_s: Option<f64>,
}

impl Display for ExecutionMeasured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] execution {}: {} sample(s)",
            self.target,
            self.class,
            self.samples.len()
        )?;
        if !self.samples.is_empty() {
            let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            write!(f, ", mean {:.3} ms", mean)?;
        }
        match self.throughput_mb_s {
            Some(throughput) => write!(f, ", throughput {:.2} MB/s", throughput),
            None => write!(f, ", no throughput"),
        }
    }
}

/// Memory probe finished.
///
/// # Log Level
/// `info!` - Per-target result
pub struct MemoryMeasured<'a> {
    pub target: &'a str,
    pub snapshot: &'a MemorySnapshot,
}

impl Display for MemoryMeasured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] memory: baseline {}, loaded {}, peak {}",
            self.target,
            fmt_mb(self.snapshot.baseline_mb),
            fmt_mb(self.snapshot.loaded_mb),
            fmt_mb(self.snapshot.peak_mb)
        )
    }
}

/// Probe does not apply to the target's adapter.
///
/// # Log Level
/// `info!` - Expected for command and glue-less targets
pub struct ProbeSkipped<'a> {
    pub target: &'a str,
    pub probe: ProbeKind,
    pub reason: &'a str,
}

impl Display for ProbeSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} probe unsupported: {}",
            self.target, self.probe, self.reason
        )
    }
}

/// One probe iteration failed; the probe carries on.
///
/// # Log Level
/// `warn!` - Recorded in the target's error list
pub struct ProbeIterationFailed<'a> {
    pub target: &'a str,
    pub probe: ProbeKind,
    pub detail: &'a str,
}

impl Display for ProbeIterationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] {} probe: {}", self.target, self.probe, self.detail)
    }
}
