// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Benchmark orchestration
//!
//! [`BenchmarkRunner`] walks the selected targets strictly one after another.
//! Each target goes through the [`PipelineStage`] sequence: build if missing,
//! then the probes in their fixed order, then its report files. A failed build
//! is the only thing that stops a target early: it skips the probes but still
//! gets its report files, and nothing stops the run.

pub mod rebuild;
mod stage;

pub use rebuild::ensure_artifact;
pub use stage::PipelineStage;

use crate::config::{ArtifactDescriptor, ArtifactRegistry};
use crate::observability::messages::report::ReportFailed;
use crate::observability::messages::runner::{
    RunFinished, RunStarted, StageReached, TargetAbandoned, TargetFinished, TargetStarted,
};
use crate::observability::messages::runtime::ContractMismatch;
use crate::probes::{probe_set, Probe, ProbeContext};
use crate::report::{MeasurementResult, ReportWriter, SystemInfo};
use crate::runtime::engine::run_blocking;
use crate::runtime::{
    contract_mismatch, inspect_artifact, load_artifact_bytes, AdapterError, AdapterOptions,
};
use std::path::PathBuf;
use std::time::Instant;

pub struct BenchmarkRunner<'a> {
    registry: &'a ArtifactRegistry,
    options: AdapterOptions,
    probes: Vec<Box<dyn Probe>>,
    writer: ReportWriter,
}

impl<'a> BenchmarkRunner<'a> {
    /// Runner writing to the registry's configured output directory.
    pub fn new(registry: &'a ArtifactRegistry) -> Self {
        let settings = registry.settings();
        Self {
            registry,
            options: AdapterOptions {
                fuel: registry.wasm().fuel.effective_limit(),
                scratch_dir: settings.scratch_dir.clone(),
            },
            probes: probe_set(settings),
            writer: ReportWriter::new(settings.get_output_dir()),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.writer = ReportWriter::new(output_dir);
        self
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    /// Benchmarks every target in `targets` and writes the combined reports.
    ///
    /// Always returns one result per target, in order.
    pub async fn run(&self, targets: &[&ArtifactDescriptor]) -> Vec<MeasurementResult> {
        let started = Instant::now();
        tracing::info!(
            "{}",
            RunStarted {
                target_count: targets.len(),
                output_dir: self.writer.output_dir(),
            }
        );

        let mut results = Vec::with_capacity(targets.len());
        for descriptor in targets {
            results.push(self.run_target(descriptor).await);
        }

        let system = SystemInfo::collect();
        if let Err(e) = self.writer.write_combined(&results, &system).await {
            tracing::error!(
                "{}",
                ReportFailed {
                    scope: "combined results",
                    error: &e,
                }
            );
        }

        tracing::info!(
            "{}",
            RunFinished {
                target_count: results.len(),
                failed_targets: results.iter().filter(|r| r.has_errors()).count(),
                elapsed: started.elapsed(),
            }
        );
        results
    }

    /// Runs one target's pipeline as far as it gets.
    pub async fn run_target(&self, descriptor: &ArtifactDescriptor) -> MeasurementResult {
        let started = Instant::now();
        let mut result = MeasurementResult::new(&descriptor.name, descriptor.contract.label());
        tracing::info!(
            "{}",
            TargetStarted {
                target: &descriptor.name,
                contract: &result.contract,
            }
        );

        if let Err(e) = ensure_artifact(descriptor, self.registry.base_dir()).await {
            let reason = e.to_string();
            tracing::error!(
                "{}",
                TargetAbandoned {
                    target: &descriptor.name,
                    reason: &reason,
                }
            );
            result.record_error(reason);
            self.write_target(&mut result).await;
            self.finish(&result, started);
            return result;
        }
        advance(&mut result);

        self.check_contract(descriptor).await;

        let ctx = ProbeContext {
            descriptor,
            options: self.options.clone(),
        };
        for probe in &self.probes {
            probe.measure(&ctx, &mut result).await;
            advance(&mut result);
        }

        if self.write_target(&mut result).await {
            advance(&mut result);
        }

        self.finish(&result, started);
        result
    }

    /// Writes the per-target files; a failure is recorded on the result.
    async fn write_target(&self, result: &mut MeasurementResult) -> bool {
        match self.writer.write_target(result).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "{}",
                    ReportFailed {
                        scope: &result.target,
                        error: &e,
                    }
                );
                result.record_error(e);
                false
            }
        }
    }

    /// Warns when the artifact does not look like its declared contract.
    async fn check_contract(&self, descriptor: &ArtifactDescriptor) {
        let path = descriptor.artifact.clone();
        let profile = run_blocking(AdapterError::InvalidWasmBinary, move || {
            inspect_artifact(&load_artifact_bytes(&path)?)
        })
        .await;

        let detail = match profile {
            Ok(profile) => contract_mismatch(&profile, &descriptor.contract),
            Err(e) => Some(e.to_string()),
        };
        if let Some(detail) = detail {
            tracing::warn!(
                "{}",
                ContractMismatch {
                    target: &descriptor.name,
                    detail: &detail,
                }
            );
        }
    }

    fn finish(&self, result: &MeasurementResult, started: Instant) {
        tracing::info!(
            "{}",
            TargetFinished {
                target: &result.target,
                stage: result.stage,
                error_count: result.errors.len(),
                elapsed: started.elapsed(),
            }
        );
    }
}

fn advance(result: &mut MeasurementResult) {
    if let Some(next) = result.stage.next() {
        result.stage = next;
        tracing::debug!(
            "{}",
            StageReached {
                target: &result.target,
                stage: next,
            }
        );
    }
}
