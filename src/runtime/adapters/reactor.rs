// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use wasmtime::{Linker, Store};
use wasmtime_wasi::p1::WasiP1Ctx;
use wasmtime_wasi::WasiCtxBuilder;

use crate::observability::messages::runtime::ReactorInitialized;
use crate::runtime::adapter::{
    decode_output, operation_payload, AbiExports, CompiledModule, InvocationMode, Operation,
    RuntimeAdapter,
};
use crate::runtime::engine::{apply_fuel, run_blocking, AdapterOptions};
use crate::runtime::error::{AdapterError, AdapterResult};
use crate::runtime::guest::{resolve_operation, with_guest, BufferAbi, GuestInstance};

/// Post-instantiation hook of the WASI reactor ABI.
const REACTOR_INIT_EXPORT: &str = "_initialize";

/// Builds the preview 1 capability table shared by reactor and command modules.
pub(crate) fn wasi_linker(engine: &wasmtime::Engine) -> AdapterResult<Linker<WasiP1Ctx>> {
    let mut linker: Linker<WasiP1Ctx> = Linker::new(engine);
    wasmtime_wasi::p1::add_to_linker_sync(&mut linker, |cx: &mut WasiP1Ctx| cx).map_err(|e| {
        AdapterError::InstantiateFailed(format!("building capability table: {}", e))
    })?;
    Ok(linker)
}

/// Adapter for WASI reactor modules.
///
/// The capability table provides clocks, random, args and exit but no
/// inherited stdio. Exports are only callable after `_initialize` has run.
pub struct ReactorAdapter {
    target: String,
    exports: AbiExports,
    options: AdapterOptions,
    guest: Option<GuestInstance<WasiP1Ctx>>,
    abi: Option<BufferAbi>,
    initialized: bool,
}

impl ReactorAdapter {
    pub fn new(target: impl Into<String>, exports: AbiExports, options: AdapterOptions) -> Self {
        Self {
            target: target.into(),
            exports,
            options,
            guest: None,
            abi: None,
            initialized: false,
        }
    }
}

#[async_trait]
impl RuntimeAdapter for ReactorAdapter {
    fn target(&self) -> &str {
        &self.target
    }

    fn contract(&self) -> &'static str {
        "sandbox-reactor"
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
        let target = self.target.clone();
        let (guest, abi, ran_init) = run_blocking(AdapterError::InstantiateFailed, move || {
            let CompiledModule { engine, module } = module;
            let linker = wasi_linker(&engine)?;

            let mut builder = WasiCtxBuilder::new();
            builder.args(&[target.as_str()]);
            let mut store = Store::new(&engine, builder.build_p1());
            apply_fuel(&mut store, fuel)?;

            let instance = linker
                .instantiate(&mut store, &module)
                .map_err(|e| AdapterError::InstantiateFailed(format!("{:#}", e)))?;

            let ran_init = match instance.get_func(&mut store, REACTOR_INIT_EXPORT) {
                Some(init) => {
                    let init = init.typed::<(), ()>(&store).map_err(|e| {
                        AdapterError::InstantiateFailed(format!(
                            "'{}' has unexpected signature: {}",
                            REACTOR_INIT_EXPORT, e
                        ))
                    })?;
                    init.call(&mut store, ()).map_err(|e| {
                        AdapterError::InstantiateFailed(format!(
                            "'{}' trapped: {:#}",
                            REACTOR_INIT_EXPORT, e
                        ))
                    })?;
                    true
                }
                None => false,
            };

            let abi = BufferAbi::resolve(&mut store, &instance, &exports)?;
            Ok((GuestInstance { store, instance }, abi, ran_init))
        })
        .await?;

        tracing::debug!(
            "{}",
            ReactorInitialized {
                target: &self.target,
                ran_initializer: ran_init,
            }
        );

        self.guest = Some(guest);
        self.abi = Some(abi);
        self.initialized = true;
        Ok(())
    }

    async fn invoke(&mut self, operation: Operation, input: Option<&str>) -> AdapterResult<String> {
        if !self.initialized {
            return Err(AdapterError::InvocationFailed(format!(
                "reactor '{}' has not been initialized",
                self.target
            )));
        }

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
        self.initialized = false;
        self.abi = None;
        self.guest = None;
    }

    fn is_instantiated(&self) -> bool {
        self.guest.is_some()
    }
}
