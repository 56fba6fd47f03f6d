// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Adapter factory
//!
//! Maps a descriptor's declared runtime contract to its adapter:
//!
//! 1. **Native** - [`NativeAdapter`]
//! 2. **CapabilitySandbox** - [`ReactorAdapter`] or [`CommandAdapter`] by style
//! 3. **HostRuntimeCoupled** - [`HostRuntimeAdapter`], with its glue manifest
//!    loaded here so a bad manifest fails before anything is timed

use super::adapters::{CommandAdapter, HostRuntimeAdapter, NativeAdapter, ReactorAdapter};
use crate::config::ArtifactDescriptor;
use crate::observability::messages::runtime::AdapterCreated;
use crate::runtime::adapter::{RuntimeAdapter, RuntimeContract, SandboxStyle};
use crate::runtime::engine::AdapterOptions;
use crate::runtime::error::AdapterResult;
use crate::runtime::glue::GlueManifest;

pub struct AdapterFactory;

impl AdapterFactory {
    /// Builds a fresh adapter for one probe pass over `descriptor`.
    pub fn create(
        descriptor: &ArtifactDescriptor,
        options: AdapterOptions,
    ) -> AdapterResult<Box<dyn RuntimeAdapter>> {
        let name = descriptor.name.as_str();
        let exports = descriptor.exports.clone();

        let adapter: Box<dyn RuntimeAdapter> = match &descriptor.contract {
            RuntimeContract::Native => Box::new(NativeAdapter::new(name, exports, options)),
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Reactor,
            } => Box::new(ReactorAdapter::new(name, exports, options)),
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Command,
            } => Box::new(CommandAdapter::new(name, options)),
            RuntimeContract::HostRuntimeCoupled { glue } => {
                let glue = glue.as_ref().map(GlueManifest::load).transpose()?;
                Box::new(HostRuntimeAdapter::new(name, exports, glue, options))
            }
        };

        tracing::debug!(
            "{}",
            AdapterCreated {
                target: name,
                contract: adapter.contract(),
                mode: adapter.invocation_mode(),
            }
        );
        Ok(adapter)
    }
}
