// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{millis, Probe, ProbeContext};
use crate::observability::messages::probe::{ColdStartMeasured, ProbeIterationFailed};
use crate::report::{MeasurementResult, ProbeKind};
use async_trait::async_trait;
use std::time::Instant;

/// Compile + instantiate latency from a clean state.
///
/// Every iteration builds a new adapter, and with it a new engine, so no
/// compiled code carries over. Nothing is invoked. All samples are kept,
/// including the first; summarizing is the reporter's job.
pub struct ColdStartProbe {
    iterations: u32,
}

impl ColdStartProbe {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

#[async_trait]
impl Probe for ColdStartProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::ColdStart
    }

    async fn measure(&self, ctx: &ProbeContext<'_>, result: &mut MeasurementResult) {
        let bytes = match ctx.artifact_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                result.record_error(format!("Cold start: {}", e));
                return;
            }
        };

        for iteration in 1..=self.iterations {
            let mut adapter = match ctx.adapter() {
                Ok(adapter) => adapter,
                Err(e) => {
                    result.record_error(format!("Cold start iteration {}: {}", iteration, e));
                    continue;
                }
            };

            let started = Instant::now();
            let outcome = adapter.load(bytes.clone()).await;
            let elapsed = started.elapsed();
            adapter.dispose();

            match outcome {
                Ok(()) => result.cold_start_ms.push(millis(elapsed)),
                Err(e) => {
                    let detail = format!("Cold start iteration {}: {}", iteration, e);
                    tracing::warn!(
                        "{}",
                        ProbeIterationFailed {
                            target: ctx.target(),
                            probe: ProbeKind::ColdStart,
                            detail: &detail,
                        }
                    );
                    result.record_error(detail);
                }
            }
        }

        tracing::info!(
            "{}",
            ColdStartMeasured {
                target: ctx.target(),
                samples: &result.cold_start_ms,
            }
        );
    }
}
