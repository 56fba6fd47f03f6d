// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-target measurement record
//!
//! A [`MeasurementResult`] is filled in by the probes for one target, in probe
//! order, then handed to the reporter and never changed again. Whatever a
//! probe managed to measure before failing stays in the record next to its
//! error.

use crate::probes::payloads::SizeClass;
use crate::runner::PipelineStage;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Size,
    ColdStart,
    Execution,
    Memory,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Size => write!(f, "size"),
            ProbeKind::ColdStart => write!(f, "cold_start"),
            ProbeKind::Execution => write!(f, "execution"),
            ProbeKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeMetrics {
    pub raw_bytes: u64,
    pub gzipped_bytes: u64,
    pub companion_bytes: u64,
    /// `1 - gzipped/raw` as a percentage; zero for an empty artifact
    pub compression_percent: f64,
}

/// Resident set size readings in MB.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub baseline_mb: Option<f64>,
    pub loaded_mb: Option<f64>,
    pub peak_mb: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementResult {
    pub target: String,
    pub contract: String,
    pub stage: PipelineStage,
    pub size: SizeMetrics,
    pub cold_start_ms: Vec<f64>,
    pub execution_ms: BTreeMap<SizeClass, Vec<f64>>,
    pub throughput_mb_s: BTreeMap<SizeClass, f64>,
    pub memory: MemorySnapshot,
    pub health_status: Option<String>,
    pub unsupported: BTreeSet<ProbeKind>,
    pub errors: Vec<String>,
}

impl MeasurementResult {
    pub fn new(target: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            contract: contract.into(),
            stage: PipelineStage::NotBuilt,
            size: SizeMetrics::default(),
            cold_start_ms: Vec::new(),
            execution_ms: BTreeMap::new(),
            throughput_mb_s: BTreeMap::new(),
            memory: MemorySnapshot::default(),
            health_status: None,
            unsupported: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, error: impl fmt::Display) {
        self.errors.push(error.to_string());
    }

    pub fn mark_unsupported(&mut self, probe: ProbeKind) {
        self.unsupported.insert(probe);
    }

    pub fn is_unsupported(&self, probe: ProbeKind) -> bool {
        self.unsupported.contains(&probe)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
