// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Glue manifests for host-runtime-coupled modules
//!
//! A coupled module only becomes callable through the namespace it registers
//! with the shim at startup. The glue manifest says which entry point boots it,
//! which table holds its callbacks, and which namespace name serves each
//! operation. Without a manifest the target is measurable for size and cold
//! start only.

use crate::runtime::adapter::Operation;
use crate::runtime::error::{AdapterError, AdapterResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_ENTRY_POINT: &str = "_start";
const DEFAULT_FUNCTION_TABLE: &str = "__indirect_function_table";

/// # Example
/// ```
/// use wasm_bakeoff::runtime::{GlueManifest, Operation};
///
/// let glue = GlueManifest::parse("operations:\n  transform: transformData\n").unwrap();
/// assert_eq!(glue.entry_point(), "_start");
/// assert_eq!(glue.resolve(Operation::Transform), Some("transformData"));
/// assert_eq!(glue.resolve(Operation::HealthCheck), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GlueManifest {
    #[serde(default)]
    entry_point: Option<String>,
    #[serde(default)]
    function_table: Option<String>,
    #[serde(default)]
    operations: BTreeMap<Operation, String>,
}

impl GlueManifest {
    pub fn load<P: AsRef<Path>>(path: P) -> AdapterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::InvalidGlue(format!("reading '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| AdapterError::InvalidGlue(format!("'{}': {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> AdapterResult<Self> {
        let manifest: GlueManifest = serde_yaml::from_str(content)
            .map_err(|e| AdapterError::InvalidGlue(e.to_string()))?;

        if let Some((operation, _)) = manifest.operations.iter().find(|(_, name)| name.is_empty()) {
            return Err(AdapterError::InvalidGlue(format!(
                "operation '{}' maps to an empty name",
                operation
            )));
        }
        Ok(manifest)
    }

    pub fn entry_point(&self) -> &str {
        self.entry_point.as_deref().unwrap_or(DEFAULT_ENTRY_POINT)
    }

    pub fn function_table(&self) -> &str {
        self.function_table
            .as_deref()
            .unwrap_or(DEFAULT_FUNCTION_TABLE)
    }

    /// Namespace name registered for `operation`, if the manifest maps it.
    pub fn resolve(&self, operation: Operation) -> Option<&str> {
        self.operations.get(&operation).map(String::as_str)
    }
}
