// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime adapter strategy
//!
//! Every benchmarked artifact is driven through [`RuntimeAdapter`], whatever its
//! runtime contract. The three contracts differ in how a module is instantiated
//! and how an operation reaches it:
//!
//! - **Native**: no imports; operations are direct typed calls
//! - **CapabilitySandbox**: WASI preview 1 imports; reactors are called directly
//!   after `_initialize`, commands are run through their stdio streams
//! - **HostRuntimeCoupled**: a host-runtime shim is the import table; operations
//!   are resolved by name from the namespace the module exposes once ready
//!
//! Probes only see the trait, so no probe branches on the contract.

use crate::runtime::engine::AdapterOptions;
use crate::runtime::error::{AdapterError, AdapterResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use wasmtime::{Engine, Module};

/// Runtime contract an artifact was compiled against.
///
/// # Example
/// ```yaml
/// contract:
///   kind: capability_sandbox
///   style: command
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeContract {
    Native,
    CapabilitySandbox {
        #[serde(default)]
        style: SandboxStyle,
    },
    HostRuntimeCoupled {
        #[serde(default)]
        glue: Option<PathBuf>,
    },
}

impl RuntimeContract {
    pub fn label(&self) -> &'static str {
        match self {
            RuntimeContract::Native => "native",
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Reactor,
            } => "sandbox-reactor",
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Command,
            } => "sandbox-command",
            RuntimeContract::HostRuntimeCoupled { .. } => "host-runtime",
        }
    }
}

/// How a sandboxed module exposes its work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxStyle {
    /// Callable exports after one-time `_initialize`
    #[default]
    Reactor,
    /// Single `_start` entry point, stream-based I/O
    Command,
}

/// The fixed operation set every adapter negotiates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Transform,
    HealthCheck,
}

impl Operation {
    /// Wire name of the operation, as passed to command-style modules.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Transform => "transform",
            Operation::HealthCheck => "healthCheck",
        }
    }

    pub fn requires_input(self) -> bool {
        matches!(self, Operation::Transform)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether and how an instantiated adapter can reach its operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// Typed call into a live instance
    Direct,
    /// Whole-module run per call with stream I/O
    Indirect,
    /// No way to reach operations for this target
    Unsupported,
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationMode::Direct => write!(f, "direct"),
            InvocationMode::Indirect => write!(f, "indirect"),
            InvocationMode::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Export names of the buffer ABI used by native and reactor modules.
///
/// Names are declared per target rather than discovered, so a module that
/// lacks one fails with `OperationNotFound` instead of being guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiExports {
    pub memory: String,
    pub alloc: String,
    pub dealloc: String,
    pub transform: String,
    pub health_check: String,
}

impl Default for AbiExports {
    fn default() -> Self {
        Self {
            memory: "memory".to_string(),
            alloc: "alloc".to_string(),
            dealloc: "dealloc".to_string(),
            transform: "transform".to_string(),
            health_check: "health_check".to_string(),
        }
    }
}

impl AbiExports {
    pub fn export_for(&self, operation: Operation) -> &str {
        match operation {
            Operation::Transform => &self.transform,
            Operation::HealthCheck => &self.health_check,
        }
    }
}

/// A compiled module together with the engine that compiled it.
///
/// Each compile gets its own engine so nothing compiled earlier is reused.
#[derive(Clone)]
pub struct CompiledModule {
    pub(crate) engine: Engine,
    pub(crate) module: Module,
}

impl CompiledModule {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn module(&self) -> &Module {
        &self.module
    }
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModule")
            .field("imports", &self.module.imports().len())
            .field("exports", &self.module.exports().len())
            .finish()
    }
}

/// Uniform driver for one artifact under one runtime contract.
///
/// An adapter owns at most one live instance. It is created for a single probe
/// pass and dropped at the end of it; `dispose` releases the instance early.
#[async_trait]
pub trait RuntimeAdapter: Send {
    /// Name of the target this adapter drives.
    fn target(&self) -> &str;

    /// Contract label for logs and reports.
    fn contract(&self) -> &'static str;

    /// How operations are reached once instantiated.
    fn invocation_mode(&self) -> InvocationMode;

    /// Options this adapter was built with.
    fn options(&self) -> &AdapterOptions;

    /// Compile module bytes with a fresh engine.
    async fn compile(&mut self, bytes: Arc<[u8]>) -> AdapterResult<CompiledModule> {
        crate::runtime::engine::compile_module(bytes, self.options()).await
    }

    /// Instantiate a compiled module, replacing any live instance.
    async fn instantiate(&mut self, module: CompiledModule) -> AdapterResult<()>;

    /// Invoke one of the fixed operations on the live instance.
    async fn invoke(&mut self, operation: Operation, input: Option<&str>) -> AdapterResult<String>;

    /// Drop the live instance, if any.
    fn dispose(&mut self);

    fn is_instantiated(&self) -> bool;

    /// Compile then instantiate.
    async fn load(&mut self, bytes: Arc<[u8]>) -> AdapterResult<()> {
        let module = self.compile(bytes).await?;
        self.instantiate(module).await
    }
}

/// Builds the guest-bound payload for an operation.
///
/// `transform` without input is rejected here so every contract reports the
/// same error for it.
pub(crate) fn operation_payload(operation: Operation, input: Option<&str>) -> AdapterResult<Vec<u8>> {
    match (operation.requires_input(), input) {
        (true, None) => Err(AdapterError::InvocationFailed(format!(
            "{} requires an input document",
            operation
        ))),
        (true, Some(text)) => Ok(text.as_bytes().to_vec()),
        (false, _) => Ok(Vec::new()),
    }
}

/// Decodes guest output into text.
pub(crate) fn decode_output(operation: Operation, bytes: Vec<u8>) -> AdapterResult<String> {
    if bytes.is_empty() {
        return Err(AdapterError::MalformedOutput(format!(
            "{} produced no output",
            operation
        )));
    }
    String::from_utf8(bytes).map_err(|e| {
        AdapterError::MalformedOutput(format!("{} output is not UTF-8: {}", operation, e))
    })
}

pub(crate) fn not_instantiated(target: &str) -> AdapterError {
    AdapterError::InvocationFailed(format!("adapter for '{}' has no live instance", target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_parses_from_yaml() {
        let native: RuntimeContract = serde_yaml::from_str("kind: native").unwrap();
        assert_eq!(native, RuntimeContract::Native);

        let sandbox: RuntimeContract = serde_yaml::from_str("kind: capability_sandbox").unwrap();
        assert_eq!(
            sandbox,
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Reactor
            }
        );

        let command: RuntimeContract =
            serde_yaml::from_str("kind: capability_sandbox\nstyle: command").unwrap();
        assert_eq!(command.label(), "sandbox-command");

        let shim: RuntimeContract =
            serde_yaml::from_str("kind: host_runtime_coupled\nglue: glue.yaml").unwrap();
        assert_eq!(
            shim,
            RuntimeContract::HostRuntimeCoupled {
                glue: Some(PathBuf::from("glue.yaml"))
            }
        );
    }

    #[test]
    fn test_transform_without_input_is_rejected() {
        let result = operation_payload(Operation::Transform, None);
        match result {
            Err(AdapterError::InvocationFailed(msg)) => assert!(msg.contains("requires an input")),
            other => panic!("Expected InvocationFailed, got {:?}", other),
        }
        assert!(operation_payload(Operation::HealthCheck, None).unwrap().is_empty());
    }

    #[test]
    fn test_empty_output_is_malformed() {
        let result = decode_output(Operation::Transform, Vec::new());
        assert!(matches!(result, Err(AdapterError::MalformedOutput(_))));

        let result = decode_output(Operation::Transform, vec![0xff, 0xfe]);
        assert!(matches!(result, Err(AdapterError::MalformedOutput(_))));
    }

    #[test]
    fn test_abi_exports_defaults_fill_missing_fields() {
        let exports: AbiExports = serde_yaml::from_str("transform: transform_data").unwrap();
        assert_eq!(exports.export_for(Operation::Transform), "transform_data");
        assert_eq!(exports.export_for(Operation::HealthCheck), "health_check");
        assert_eq!(exports.alloc, "alloc");
    }
}
