// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime layer
//!
//! Loads artifacts, compiles them with a fresh Wasmtime engine, and drives them
//! through the adapter matching their runtime contract.

pub mod adapter;
pub mod adapters;
pub mod detector;
pub mod engine;
pub mod error;
pub mod factory;
pub mod glue;
mod guest;
pub mod loader;
pub mod output;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use adapter::{
    AbiExports, CompiledModule, InvocationMode, Operation, RuntimeAdapter, RuntimeContract,
    SandboxStyle,
};
pub use detector::{contract_mismatch, inspect_artifact, ArtifactProfile, ModuleImport};
pub use engine::{compile_module, create_engine, AdapterOptions};
pub use error::{AdapterError, AdapterResult};
pub use factory::AdapterFactory;
pub use glue::GlueManifest;
pub use loader::{is_gzip, load_artifact_bytes, locate_artifact};
pub use output::{verify_health_output, verify_transform_output};
