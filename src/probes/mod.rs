// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Measurement probes
//!
//! Each probe fills its own slice of a [`MeasurementResult`]. Probes share no
//! state: every one that needs a module builds its own adapter through the
//! factory and drops it when done. Failures are recorded on the result and never
//! returned, so one probe can not stop the next.

pub mod cold_start;
pub mod execution;
pub mod memory;
pub mod payloads;
pub mod size;

use crate::config::{ArtifactDescriptor, Settings};
use crate::report::{MeasurementResult, ProbeKind};
use crate::runtime::engine::run_blocking;
use crate::runtime::{
    load_artifact_bytes, AdapterError, AdapterFactory, AdapterOptions, AdapterResult,
    RuntimeAdapter,
};
use async_trait::async_trait;
use std::sync::Arc;

pub use cold_start::ColdStartProbe;
pub use execution::ExecutionProbe;
pub use memory::MemoryProbe;
pub use payloads::SizeClass;
pub use size::SizeProbe;

/// What a probe is pointed at.
pub struct ProbeContext<'a> {
    pub descriptor: &'a ArtifactDescriptor,
    pub options: AdapterOptions,
}

impl ProbeContext<'_> {
    pub fn target(&self) -> &str {
        &self.descriptor.name
    }

    /// Fresh adapter for this target.
    pub fn adapter(&self) -> AdapterResult<Box<dyn RuntimeAdapter>> {
        AdapterFactory::create(self.descriptor, self.options.clone())
    }

    /// Fresh adapter with the artifact compiled and instantiated.
    pub async fn loaded_adapter(&self) -> AdapterResult<Box<dyn RuntimeAdapter>> {
        let bytes = self.artifact_bytes().await?;
        let mut adapter = self.adapter()?;
        adapter.load(bytes).await?;
        Ok(adapter)
    }

    /// Reads (and if needed gunzips) the artifact off the async thread.
    pub async fn artifact_bytes(&self) -> AdapterResult<Arc<[u8]>> {
        let path = self.descriptor.artifact.clone();
        let bytes = run_blocking(AdapterError::InvalidWasmBinary, move || {
            load_artifact_bytes(&path)
        })
        .await?;
        Ok(Arc::from(bytes))
    }
}

#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Measures one target, writing metrics and errors into `result`.
    async fn measure(&self, ctx: &ProbeContext<'_>, result: &mut MeasurementResult);
}

/// The probe set in its fixed order: size, cold start, execution, memory.
///
/// Memory must come after everything that loads the module less deliberately,
/// and its baseline must precede its own load.
pub fn probe_set(settings: &Settings) -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(SizeProbe::new(settings.get_gzip_level())),
        Box::new(ColdStartProbe::new(settings.get_cold_start_iterations())),
        Box::new(ExecutionProbe::new(
            settings.get_execution_iterations(),
            settings.get_size_classes(),
        )),
        Box::new(MemoryProbe::default()),
    ]
}

/// Milliseconds as a float.
pub(crate) fn millis(elapsed: std::time::Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
