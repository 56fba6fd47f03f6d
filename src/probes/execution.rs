// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::payloads::SizeClass;
use super::{millis, Probe, ProbeContext};
use crate::observability::messages::probe::{ExecutionMeasured, ProbeIterationFailed, ProbeSkipped};
use crate::report::{MeasurementResult, ProbeKind};
use crate::runtime::{
    verify_health_output, verify_transform_output, InvocationMode, Operation, RuntimeAdapter,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// `transform` latency per input-size class.
///
/// Each class gets one instance, instantiated once and invoked `iterations`
/// times, so only execution is timed. Outputs are checked against the transform
/// contract after the clock stops.
///
/// Throughput comes from the final iteration alone, not an average. Reported
/// numbers are compared across targets on that definition.
pub struct ExecutionProbe {
    iterations: u32,
    classes: Vec<SizeClass>,
}

impl ExecutionProbe {
    pub fn new(iterations: u32, classes: Vec<SizeClass>) -> Self {
        Self {
            iterations,
            classes,
        }
    }
}

/// MB/s for `bytes` processed in `elapsed`.
pub fn throughput_mb_s(bytes: usize, elapsed: Duration) -> Option<f64> {
    let seconds = elapsed.as_secs_f64();
    (seconds > 0.0).then(|| bytes as f64 / BYTES_PER_MB / seconds)
}

impl ExecutionProbe {
    async fn check_health(
        &self,
        adapter: &mut dyn RuntimeAdapter,
        result: &mut MeasurementResult,
    ) {
        let status = match adapter.invoke(Operation::HealthCheck, None).await {
            Ok(output) => verify_health_output(&output),
            Err(e) => Err(e),
        };
        match status {
            Ok(status) => result.health_status = Some(status),
            Err(e) => result.record_error(format!("Health check: {}", e)),
        }
    }

    async fn measure_class(
        &self,
        ctx: &ProbeContext<'_>,
        adapter: &mut dyn RuntimeAdapter,
        class: SizeClass,
        result: &mut MeasurementResult,
    ) {
        let payload = class.payload();
        let mut samples = Vec::with_capacity(self.iterations as usize);
        let mut final_iteration = None;

        for iteration in 1..=self.iterations {
            let started = Instant::now();
            let outcome = adapter.invoke(Operation::Transform, Some(&payload)).await;
            let elapsed = started.elapsed();

            let verified = outcome.and_then(|output| verify_transform_output(&payload, &output));
            match verified {
                Ok(_) => {
                    samples.push(millis(elapsed));
                    if iteration == self.iterations {
                        final_iteration = Some(elapsed);
                    }
                }
                Err(e) => {
                    let detail = format!("Execution {} iteration {}: {}", class, iteration, e);
                    tracing::warn!(
                        "{}",
                        ProbeIterationFailed {
                            target: ctx.target(),
                            probe: ProbeKind::Execution,
                            detail: &detail,
                        }
                    );
                    result.record_error(detail);
                }
            }
        }

        let throughput = final_iteration.and_then(|elapsed| throughput_mb_s(payload.len(), elapsed));
        tracing::info!(
            "{}",
            ExecutionMeasured {
                target: ctx.target(),
                class,
                samples: &samples,
                throughput_mb_s: throughput,
            }
        );

        result.execution_ms.insert(class, samples);
        if let Some(throughput) = throughput {
            result.throughput_mb_s.insert(class, throughput);
        }
    }
}

#[async_trait]
impl Probe for ExecutionProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Execution
    }

    async fn measure(&self, ctx: &ProbeContext<'_>, result: &mut MeasurementResult) {
        let bytes = match ctx.artifact_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                result.record_error(format!("Execution: {}", e));
                return;
            }
        };

        let mut health_checked = false;
        for &class in &self.classes {
            let mut adapter = match ctx.adapter() {
                Ok(adapter) => adapter,
                Err(e) => {
                    result.record_error(format!("Execution {}: {}", class, e));
                    continue;
                }
            };

            let mode = adapter.invocation_mode();
            if mode != InvocationMode::Direct {
                tracing::info!(
                    "{}",
                    ProbeSkipped {
                        target: ctx.target(),
                        probe: ProbeKind::Execution,
                        reason: &format!("{} invocation cannot be timed as a direct call", mode),
                    }
                );
                result.mark_unsupported(ProbeKind::Execution);
                return;
            }

            if let Err(e) = adapter.load(bytes.clone()).await {
                result.record_error(format!("Execution {}: {}", class, e));
                continue;
            }

            if !health_checked {
                self.check_health(adapter.as_mut(), result).await;
                health_checked = true;
            }

            self.measure_class(ctx, adapter.as_mut(), class, result).await;
            adapter.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactDescriptor;
    use crate::runtime::test_fixtures::{command_module, native_module, shim_module};
    use crate::runtime::{AdapterOptions, RuntimeContract, SandboxStyle};
    use tempfile::TempDir;

    async fn run(wasm: &[u8], contract: RuntimeContract, probe: ExecutionProbe) -> MeasurementResult {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("target.wasm");
        std::fs::write(&path, wasm).unwrap();

        let descriptor = ArtifactDescriptor::new("target", path, contract);
        let ctx = ProbeContext {
            descriptor: &descriptor,
            options: AdapterOptions::default(),
        };
        let mut result = MeasurementResult::new("target", descriptor.contract.label());
        probe.measure(&ctx, &mut result).await;
        result
    }

    #[tokio::test]
    async fn test_native_execution_per_class() {
        let probe = ExecutionProbe::new(3, vec![SizeClass::Tiny, SizeClass::Small]);
        let result = run(&native_module(), RuntimeContract::Native, probe).await;

        assert!(!result.has_errors(), "{:?}", result.errors);
        assert_eq!(result.execution_ms[&SizeClass::Tiny].len(), 3);
        assert_eq!(result.execution_ms[&SizeClass::Small].len(), 3);
        assert!(result.throughput_mb_s[&SizeClass::Small] > 0.0);
        assert_eq!(result.health_status.as_deref(), Some("healthy"));
        assert!(!result.is_unsupported(ProbeKind::Execution));
    }

    #[tokio::test]
    async fn test_command_execution_is_unsupported() {
        let contract = RuntimeContract::CapabilitySandbox {
            style: SandboxStyle::Command,
        };
        let probe = ExecutionProbe::new(3, vec![SizeClass::Small]);
        let result = run(&command_module(), contract, probe).await;

        assert!(result.is_unsupported(ProbeKind::Execution));
        assert!(result.execution_ms.is_empty());
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_glueless_host_runtime_is_unsupported() {
        let contract = RuntimeContract::HostRuntimeCoupled { glue: None };
        let probe = ExecutionProbe::new(3, vec![SizeClass::Small]);
        let result = run(&shim_module(), contract, probe).await;

        assert!(result.is_unsupported(ProbeKind::Execution));
    }

    #[tokio::test]
    async fn test_contract_violation_drops_sample() {
        // Echoes its input back, so `original` never appears.
        let wat = r#"
(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (func (export "alloc") (param $len i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (i32.add (local.get $len) (i32.const 8))))
    (local.get $ptr))
  (func (export "dealloc") (param i32 i32))
  (func (export "transform") (param $in i32) (param $len i32) (param $out_len_ptr i32) (result i32)
    (i32.store (local.get $out_len_ptr) (local.get $len))
    (local.get $in)))
"#;
        let probe = ExecutionProbe::new(2, vec![SizeClass::Tiny]);
        let result = run(&wat::parse_str(wat).unwrap(), RuntimeContract::Native, probe).await;

        assert!(result.execution_ms[&SizeClass::Tiny].is_empty());
        assert!(result.throughput_mb_s.is_empty());
        assert!(result.errors.iter().any(|e| e.starts_with("Health check: Operation not found")));
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("Execution tiny iteration 1: Malformed output")));
        assert!(result.errors.iter().any(|e| e.starts_with("Execution tiny iteration 2:")));
    }

    #[test]
    fn test_throughput_definition() {
        let mb = 1024 * 1024;
        assert_eq!(throughput_mb_s(mb, Duration::from_millis(500)), Some(2.0));
        assert_eq!(throughput_mb_s(mb, Duration::ZERO), None);
    }
}
