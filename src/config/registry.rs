// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::loader::{ArtifactDescriptor, BenchConfig, Settings, WasmConfig};
use crate::errors::{ConfigError, ValidationError};
use std::path::{Path, PathBuf};

/// Validated, immutable set of benchmark targets plus the run settings.
///
/// Targets keep their registry order; that is the order they are benchmarked
/// and reported in.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    base_dir: PathBuf,
    settings: Settings,
    wasm: WasmConfig,
    descriptors: Vec<ArtifactDescriptor>,
}

impl ArtifactRegistry {
    pub(crate) fn new(base_dir: PathBuf, cfg: BenchConfig) -> Self {
        Self {
            base_dir,
            settings: cfg.settings,
            wasm: cfg.wasm,
            descriptors: cfg.targets,
        }
    }

    /// Directory the registry was loaded from; rebuilds run here.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn wasm(&self) -> &WasmConfig {
        &self.wasm
    }

    pub fn descriptors(&self) -> &[ArtifactDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ArtifactDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors to benchmark: all of them, or only those in `only`.
    ///
    /// Selection keeps registry order. Every unknown name is reported.
    pub fn select(&self, only: &[String]) -> Result<Vec<&ArtifactDescriptor>, ConfigError> {
        if only.is_empty() {
            return Ok(self.descriptors.iter().collect());
        }

        let unknown: Vec<ValidationError> = only
            .iter()
            .filter(|name| self.get(name).is_none())
            .map(|name| ValidationError::UnknownTarget { name: name.clone() })
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::Invalid(unknown));
        }

        Ok(self
            .descriptors
            .iter()
            .filter(|d| only.contains(&d.name))
            .collect())
    }
}
