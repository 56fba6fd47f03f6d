// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::payloads::SizeClass;
use super::{Probe, ProbeContext};
use crate::observability::messages::probe::MemoryMeasured;
use crate::report::{MeasurementResult, MemorySnapshot, ProbeKind};
use crate::runtime::{InvocationMode, Operation};
use async_trait::async_trait;
use sysinfo::{Pid, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Resident set size of this process in MB.
///
/// Readings are indicative: the harness shares its process with the guest, so
/// anything else the process allocates shows up too.
pub struct RssSampler {
    system: System,
    pid: Option<Pid>,
}

impl RssSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn sample_mb(&mut self) -> Option<f64> {
        let pid = self.pid?;
        if !self.system.refresh_process(pid) {
            return None;
        }
        self.system
            .process(pid)
            .map(|process| process.memory() as f64 / BYTES_PER_MB)
    }
}

impl Default for RssSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Baseline, after-load and peak memory for one instance.
///
/// The peak reading follows one large transform and is only taken when the
/// adapter can invoke at all; command targets are run indirectly for it.
pub struct MemoryProbe {
    class: SizeClass,
}

impl MemoryProbe {
    pub fn new(class: SizeClass) -> Self {
        Self { class }
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new(SizeClass::Large)
    }
}

#[async_trait]
impl Probe for MemoryProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Memory
    }

    async fn measure(&self, ctx: &ProbeContext<'_>, result: &mut MeasurementResult) {
        let mut sampler = RssSampler::new();
        let mut snapshot = MemorySnapshot {
            baseline_mb: sampler.sample_mb(),
            ..MemorySnapshot::default()
        };

        let mut adapter = match ctx.loaded_adapter().await {
            Ok(adapter) => adapter,
            Err(e) => {
                result.record_error(format!("Memory: {}", e));
                result.memory = snapshot;
                return;
            }
        };
        snapshot.loaded_mb = sampler.sample_mb();

        if adapter.invocation_mode() == InvocationMode::Unsupported {
            result.mark_unsupported(ProbeKind::Memory);
        } else {
            let payload = self.class.payload();
            if let Err(e) = adapter.invoke(Operation::Transform, Some(&payload)).await {
                result.record_error(format!("Memory {} transform: {}", self.class, e));
            }
            snapshot.peak_mb = sampler.sample_mb();
        }
        adapter.dispose();

        tracing::info!(
            "{}",
            MemoryMeasured {
                target: ctx.target(),
                snapshot: &snapshot,
            }
        );
        result.memory = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactDescriptor;
    use crate::runtime::test_fixtures::{native_module, shim_module};
    use crate::runtime::{AdapterOptions, RuntimeContract};
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn run(wasm: &[u8], contract: RuntimeContract) -> MeasurementResult {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("target.wasm");
        std::fs::write(&path, wasm).unwrap();

        let descriptor = ArtifactDescriptor::new("target", path, contract);
        let ctx = ProbeContext {
            descriptor: &descriptor,
            options: AdapterOptions::default(),
        };
        let mut result = MeasurementResult::new("target", descriptor.contract.label());
        MemoryProbe::default().measure(&ctx, &mut result).await;
        result
    }

    #[test]
    fn test_sampler_reads_own_process() {
        let mut sampler = RssSampler::new();
        let mb = sampler.sample_mb().unwrap();
        assert!(mb > 0.0);
    }

    #[tokio::test]
    async fn test_native_snapshot_has_all_readings() {
        let result = run(&native_module(), RuntimeContract::Native).await;

        assert!(!result.has_errors(), "{:?}", result.errors);
        assert!(result.memory.baseline_mb.is_some());
        assert!(result.memory.loaded_mb.is_some());
        assert!(result.memory.peak_mb.is_some());
    }

    #[tokio::test]
    async fn test_glueless_target_has_no_peak() {
        let contract = RuntimeContract::HostRuntimeCoupled { glue: None };
        let result = run(&shim_module(), contract).await;

        assert!(result.memory.loaded_mb.is_some());
        assert_eq!(result.memory.peak_mb, None);
        assert!(result.is_unsupported(ProbeKind::Memory));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_baseline() {
        let descriptor = ArtifactDescriptor::new(
            "ghost",
            PathBuf::from("/nonexistent/ghost.wasm"),
            RuntimeContract::Native,
        );
        let ctx = ProbeContext {
            descriptor: &descriptor,
            options: AdapterOptions::default(),
        };
        let mut result = MeasurementResult::new("ghost", "native");
        MemoryProbe::default().measure(&ctx, &mut result).await;

        assert!(result.memory.baseline_mb.is_some());
        assert_eq!(result.memory.loaded_mb, None);
        assert!(result.errors[0].starts_with("Memory:"));
    }
}
