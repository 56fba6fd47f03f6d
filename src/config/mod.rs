// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, ArtifactDescriptor, BenchConfig, FuelConfig, Settings,
    WasmConfig,
};
pub use registry::ArtifactRegistry;
pub use validation::validate_config;
