// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use wasmtime::{Instance, Store};

use crate::runtime::adapter::{
    decode_output, operation_payload, AbiExports, CompiledModule, InvocationMode, Operation,
    RuntimeAdapter,
};
use crate::runtime::engine::{apply_fuel, run_blocking, AdapterOptions};
use crate::runtime::error::{AdapterError, AdapterResult};
use crate::runtime::guest::{resolve_operation, with_guest, BufferAbi, GuestInstance};

/// Adapter for modules with no host dependency.
///
/// Instantiation supplies an empty import list, so any declared import is an
/// `InstantiateFailed`. Operations are direct typed calls over the buffer ABI.
pub struct NativeAdapter {
    target: String,
    exports: AbiExports,
    options: AdapterOptions,
    guest: Option<GuestInstance<()>>,
    abi: Option<BufferAbi>,
}

impl NativeAdapter {
    pub fn new(target: impl Into<String>, exports: AbiExports, options: AdapterOptions) -> Self {
        Self {
            target: target.into(),
            exports,
            options,
            guest: None,
            abi: None,
        }
    }
}

#[async_trait]
impl RuntimeAdapter for NativeAdapter {
    fn target(&self) -> &str {
        &self.target
    }

    fn contract(&self) -> &'static str {
        "native"
    }

    fn invocation_mode(&self) -> InvocationMode {
        InvocationMode::Direct
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    async fn instantiate(&mut self, module: CompiledModule) -> AdapterResult<()> {
        self.dispose();

        let fuel = self.options.fuel;
        let exports = self.exports.clone();
        let (guest, abi) = run_blocking(AdapterError::InstantiateFailed, move || {
            let CompiledModule { engine, module } = module;
            let mut store = Store::new(&engine, ());
            apply_fuel(&mut store, fuel)?;

            let instance = Instance::new(&mut store, &module, &[])
                .map_err(|e| AdapterError::InstantiateFailed(format!("{:#}", e)))?;
            let abi = BufferAbi::resolve(&mut store, &instance, &exports)?;

            Ok((GuestInstance { store, instance }, abi))
        })
        .await?;

        self.guest = Some(guest);
        self.abi = Some(abi);
        Ok(())
    }

    async fn invoke(&mut self, operation: Operation, input: Option<&str>) -> AdapterResult<String> {
        let payload = operation_payload(operation, input)?;
        let abi = self
            .abi
            .clone()
            .ok_or_else(|| crate::runtime::adapter::not_instantiated(&self.target))?;
        let export = self.exports.export_for(operation).to_string();

        let bytes = with_guest(&mut self.guest, &self.target, move |guest| {
            let func = resolve_operation(&mut guest.store, &guest.instance, &export)?;
            abi.call(&mut guest.store, &export, &func, &payload)
        })
        .await?;

        decode_output(operation, bytes)
    }

    fn dispose(&mut self) {
        self.abi = None;
        self.guest = None;
    }

    fn is_instantiated(&self) -> bool {
        self.guest.is_some()
    }
}
