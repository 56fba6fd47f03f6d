// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host-runtime shim
//!
//! Coupled modules expect a host runtime rather than a system interface. The
//! shim stands in for it with a small import namespace:
//!
//! | import            | signature                  | effect                                   |
//! |-------------------|----------------------------|------------------------------------------|
//! | `shim.expose`     | `(name_ptr, name_len, slot)` | registers a table slot under a name    |
//! | `shim.ready`      | `()`                       | signals that the namespace is populated  |
//! | `shim.resolve`    | `(ptr, len)`               | settles the running operation with bytes |
//! | `shim.reject`     | `(ptr, len)`               | settles the running operation with an error |
//! | `shim.log`        | `(ptr, len)`               | guest diagnostics, logged at debug        |
//! | `shim.now`        | `(ptr, cap) -> len`        | writes an RFC 3339 timestamp             |
//!
//! Registered callbacks take `(in_ptr, in_len)` and must settle before they
//! return.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::oneshot;
use wasmtime::{Caller, Instance, Linker, Memory, Ref, Store, TypedFunc};

use crate::observability::messages::runtime::{GuestLogged, ShimReady};
use crate::runtime::adapter::{
    decode_output, not_instantiated, operation_payload, AbiExports, CompiledModule,
    InvocationMode, Operation, RuntimeAdapter,
};
use crate::runtime::engine::{apply_fuel, AdapterOptions};
use crate::runtime::error::{AdapterError, AdapterResult};
use crate::runtime::glue::GlueManifest;
use crate::runtime::guest::{guest_len, release_buffer, with_guest, GuestInstance};

const SHIM_NAMESPACE: &str = "shim";
const DEFAULT_ENTRY_POINT: &str = "_start";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settlement {
    Resolved(Vec<u8>),
    Rejected(String),
}

/// Host state behind the shim imports.
pub(crate) struct ShimState {
    target: String,
    memory_export: String,
    namespace: HashMap<String, u32>,
    ready: Option<oneshot::Sender<()>>,
    settlement: Option<Settlement>,
}

impl ShimState {
    fn new(target: &str, memory_export: &str, ready: oneshot::Sender<()>) -> Self {
        Self {
            target: target.to_string(),
            memory_export: memory_export.to_string(),
            namespace: HashMap::new(),
            ready: Some(ready),
            settlement: None,
        }
    }
}

fn caller_memory(caller: &mut Caller<'_, ShimState>) -> anyhow::Result<Memory> {
    let name = caller.data().memory_export.clone();
    caller
        .get_export(&name)
        .and_then(|export| export.into_memory())
        .ok_or_else(|| anyhow::anyhow!("shim import called but module exports no memory '{}'", name))
}

fn read_guest(caller: &mut Caller<'_, ShimState>, ptr: i32, len: i32) -> anyhow::Result<Vec<u8>> {
    let memory = caller_memory(caller)?;
    let start = usize::try_from(ptr)?;
    let end = start + usize::try_from(len)?;
    memory
        .data(&*caller)
        .get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| anyhow::anyhow!("guest range {}..{} is out of bounds", start, end))
}

fn settle(caller: &mut Caller<'_, ShimState>, settlement: Settlement) -> anyhow::Result<()> {
    if caller.data().settlement.is_some() {
        anyhow::bail!("operation settled more than once");
    }
    caller.data_mut().settlement = Some(settlement);
    Ok(())
}

/// Defines the shim namespace on `linker`.
pub(crate) fn link_shim(linker: &mut Linker<ShimState>) -> AdapterResult<()> {
    let wrap = |e: anyhow::Error| AdapterError::InstantiateFailed(format!("defining shim: {}", e));

    linker
        .func_wrap(
            SHIM_NAMESPACE,
            "expose",
            |mut caller: Caller<'_, ShimState>, ptr: i32, len: i32, slot: i32| -> anyhow::Result<()> {
                let name = String::from_utf8(read_guest(&mut caller, ptr, len)?)?;
                let slot = u32::try_from(slot)?;
                caller.data_mut().namespace.insert(name, slot);
                Ok(())
            },
        )
        .map_err(wrap)?;

    linker
        .func_wrap(SHIM_NAMESPACE, "ready", |mut caller: Caller<'_, ShimState>| {
            if let Some(ready) = caller.data_mut().ready.take() {
                let _ = ready.send(());
            }
        })
        .map_err(wrap)?;

    linker
        .func_wrap(
            SHIM_NAMESPACE,
            "resolve",
            |mut caller: Caller<'_, ShimState>, ptr: i32, len: i32| -> anyhow::Result<()> {
                let bytes = read_guest(&mut caller, ptr, len)?;
                settle(&mut caller, Settlement::Resolved(bytes))
            },
        )
        .map_err(wrap)?;

    linker
        .func_wrap(
            SHIM_NAMESPACE,
            "reject",
            |mut caller: Caller<'_, ShimState>, ptr: i32, len: i32| -> anyhow::Result<()> {
                let bytes = read_guest(&mut caller, ptr, len)?;
                let reason = String::from_utf8_lossy(&bytes).into_owned();
                settle(&mut caller, Settlement::Rejected(reason))
            },
        )
        .map_err(wrap)?;

    linker
        .func_wrap(
            SHIM_NAMESPACE,
            "log",
            |mut caller: Caller<'_, ShimState>, ptr: i32, len: i32| -> anyhow::Result<()> {
                let bytes = read_guest(&mut caller, ptr, len)?;
                tracing::debug!(
                    "{}",
                    GuestLogged {
                        target: &caller.data().target,
                        message: &String::from_utf8_lossy(&bytes),
                    }
                );
                Ok(())
            },
        )
        .map_err(wrap)?;

    linker
        .func_wrap(
            SHIM_NAMESPACE,
            "now",
            |mut caller: Caller<'_, ShimState>, ptr: i32, cap: i32| -> anyhow::Result<i32> {
                let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
                let count = stamp.len().min(usize::try_from(cap)?);
                let memory = caller_memory(&mut caller)?;
                memory.write(&mut caller, usize::try_from(ptr)?, &stamp.as_bytes()[..count])?;
                Ok(i32::try_from(count)?)
            },
        )
        .map_err(wrap)?;

    Ok(())
}

/// Adapter for modules coupled to a host runtime.
///
/// Instantiation runs the glue entry point (or `_start`) and waits for the
/// module to call `shim.ready`. Operations are then looked up by name in the
/// namespace it registered. Without a glue manifest there is no way to map an
/// operation to a name, so invocation is unsupported.
pub struct HostRuntimeAdapter {
    target: String,
    exports: AbiExports,
    glue: Option<GlueManifest>,
    options: AdapterOptions,
    guest: Option<GuestInstance<ShimState>>,
}

impl HostRuntimeAdapter {
    pub fn new(
        target: impl Into<String>,
        exports: AbiExports,
        glue: Option<GlueManifest>,
        options: AdapterOptions,
    ) -> Self {
        Self {
            target: target.into(),
            exports,
            glue,
            options,
            guest: None,
        }
    }

    fn entry_point(&self) -> String {
        self.glue
            .as_ref()
            .map(|g| g.entry_point().to_string())
            .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string())
    }
}

fn boot(
    module: CompiledModule,
    state: ShimState,
    entry_point: &str,
    fuel: Option<u64>,
) -> AdapterResult<GuestInstance<ShimState>> {
    let CompiledModule { engine, module } = module;
    let mut linker: Linker<ShimState> = Linker::new(&engine);
    link_shim(&mut linker)?;

    let mut store = Store::new(&engine, state);
    apply_fuel(&mut store, fuel)?;

    let instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| AdapterError::InstantiateFailed(format!("{:#}", e)))?;

    let entry = instance
        .get_typed_func::<(), ()>(&mut store, entry_point)
        .map_err(|_| {
            AdapterError::InstantiateFailed(format!(
                "module must export entry point '{}'",
                entry_point
            ))
        })?;
    entry.call(&mut store, ()).map_err(|e| {
        AdapterError::InstantiateFailed(format!("'{}' trapped: {:#}", entry_point, e))
    })?;

    // Readiness has to be signalled during the entry point; drop the sender so
    // a silent module is reported instead of awaited forever.
    store.data_mut().ready = None;
    Ok(GuestInstance { store, instance })
}

fn call_exposed(
    guest: &mut GuestInstance<ShimState>,
    exports: &AbiExports,
    table_name: &str,
    name: &str,
    input: &[u8],
) -> AdapterResult<Vec<u8>> {
    let GuestInstance { store, instance } = guest;

    let slot = *store.data().namespace.get(name).ok_or_else(|| {
        AdapterError::OperationNotFound(format!("'{}' was not exposed by the module", name))
    })?;

    let func = exposed_callback(store, instance, table_name, slot, name)?;
    let input = write_input(store, instance, exports, input)?;

    store.data_mut().settlement = None;
    let called = func.call(&mut *store, (input.ptr, input.len));
    input.release(store);
    called.map_err(|e| AdapterError::InvocationFailed(format!("{} trapped: {:#}", name, e)))?;

    match store.data_mut().settlement.take() {
        Some(Settlement::Resolved(bytes)) => Ok(bytes),
        Some(Settlement::Rejected(reason)) => Err(AdapterError::InvocationFailed(reason)),
        None => Err(AdapterError::InvocationFailed(format!(
            "{} returned without settling",
            name
        ))),
    }
}

fn exposed_callback(
    store: &mut Store<ShimState>,
    instance: &Instance,
    table_name: &str,
    slot: u32,
    name: &str,
) -> AdapterResult<TypedFunc<(i32, i32), ()>> {
    let table = instance.get_table(&mut *store, table_name).ok_or_else(|| {
        AdapterError::OperationNotFound(format!("module does not export table '{}'", table_name))
    })?;

    match table.get(&mut *store, u64::from(slot)) {
        Some(Ref::Func(Some(func))) => func.typed::<(i32, i32), ()>(&*store).map_err(|e| {
            AdapterError::OperationNotFound(format!(
                "'{}' does not have signature (i32, i32) -> (): {}",
                name, e
            ))
        }),
        _ => Err(AdapterError::OperationNotFound(format!(
            "'{}' points at empty table slot {}",
            name, slot
        ))),
    }
}

/// Input copied into guest memory. Empty input is passed as `(0, 0)`.
struct GuestInput {
    ptr: i32,
    len: i32,
    dealloc: Option<TypedFunc<(i32, i32), ()>>,
}

impl GuestInput {
    fn release(self, store: &mut Store<ShimState>) {
        if let Some(dealloc) = &self.dealloc {
            release_buffer(store, dealloc, self.ptr, self.len);
        }
    }
}

fn write_input(
    store: &mut Store<ShimState>,
    instance: &Instance,
    exports: &AbiExports,
    input: &[u8],
) -> AdapterResult<GuestInput> {
    if input.is_empty() {
        return Ok(GuestInput {
            ptr: 0,
            len: 0,
            dealloc: None,
        });
    }
    let len = guest_len(input.len())?;

    let alloc = instance
        .get_typed_func::<i32, i32>(&mut *store, &exports.alloc)
        .map_err(|_| {
            AdapterError::InvocationFailed(format!("module must export '{}'", exports.alloc))
        })?;
    let dealloc = instance
        .get_typed_func::<(i32, i32), ()>(&mut *store, &exports.dealloc)
        .map_err(|_| {
            AdapterError::InvocationFailed(format!("module must export '{}'", exports.dealloc))
        })?;
    let memory = instance
        .get_memory(&mut *store, &exports.memory)
        .ok_or_else(|| {
            AdapterError::InvocationFailed(format!("module must export memory '{}'", exports.memory))
        })?;

    let ptr = alloc
        .call(&mut *store, len)
        .map_err(|e| AdapterError::InvocationFailed(format!("guest allocator trapped: {:#}", e)))?;
    if ptr == 0 {
        return Err(AdapterError::InvocationFailed(format!(
            "guest allocator returned null for {} bytes",
            len
        )));
    }
    let written = GuestInput {
        ptr,
        len,
        dealloc: Some(dealloc),
    };
    if let Err(e) = memory.write(&mut *store, ptr as usize, input) {
        written.release(store);
        return Err(AdapterError::InvocationFailed(format!("writing input: {}", e)));
    }
    Ok(written)
}

#[async_trait]
impl RuntimeAdapter for HostRuntimeAdapter {
    fn target(&self) -> &str {
        &self.target
    }

    fn contract(&self) -> &'static str {
        "host-runtime"
    }

    fn invocation_mode(&self) -> InvocationMode {
        if self.glue.is_some() {
            InvocationMode::Direct
        } else {
            InvocationMode::Unsupported
        }
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    async fn instantiate(&mut self, module: CompiledModule) -> AdapterResult<()> {
        self.dispose();

        let (ready_tx, ready_rx) = oneshot::channel();
        let state = ShimState::new(&self.target, &self.exports.memory, ready_tx);
        let entry_point = self.entry_point();
        let fuel = self.options.fuel;

        let booting =
            tokio::task::spawn_blocking(move || boot(module, state, &entry_point, fuel));

        let ready = ready_rx.await;
        let guest = booting.await.map_err(|e| {
            AdapterError::InstantiateFailed(format!("boot did not complete: {}", e))
        })??;
        ready.map_err(|_| {
            AdapterError::InstantiateFailed(
                "entry point returned without signalling readiness".to_string(),
            )
        })?;

        tracing::debug!(
            "{}",
            ShimReady {
                target: &self.target,
                exposed: guest.store.data().namespace.len(),
            }
        );

        self.guest = Some(guest);
        Ok(())
    }

    async fn invoke(&mut self, operation: Operation, input: Option<&str>) -> AdapterResult<String> {
        let glue = self.glue.as_ref().ok_or_else(|| {
            AdapterError::UnsupportedContract(format!(
                "'{}' has no glue manifest; operations cannot be reached",
                self.target
            ))
        })?;
        let name = glue
            .resolve(operation)
            .ok_or_else(|| {
                AdapterError::OperationNotFound(format!("glue does not map '{}'", operation))
            })?
            .to_string();
        let table = glue.function_table().to_string();

        if self.guest.is_none() {
            return Err(not_instantiated(&self.target));
        }
        let payload = operation_payload(operation, input)?;
        let exports = self.exports.clone();

        let bytes = with_guest(&mut self.guest, &self.target, move |guest| {
            call_exposed(guest, &exports, &table, &name, &payload)
        })
        .await?;

        decode_output(operation, bytes)
    }

    fn dispose(&mut self) {
        self.guest = None;
    }

    fn is_instantiated(&self) -> bool {
        self.guest.is_some()
    }
}
