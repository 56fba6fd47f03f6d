// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine construction and compilation
//!
//! Every compile builds a fresh Wasmtime engine. Nothing compiled for one
//! measurement survives into the next, which is what cold-start numbers rely on.
//! Compilation and guest calls run on tokio's blocking pool; awaiting them is the
//! harness's only suspension point besides file and process I/O.

use crate::observability::messages::runtime::EngineCreated;
use crate::runtime::adapter::CompiledModule;
use crate::runtime::error::{AdapterError, AdapterResult};
use std::path::PathBuf;
use std::sync::Arc;
use wasmtime::{Config, Engine, Module, Store};

/// Options bound to an adapter when it is created.
#[derive(Debug, Clone, Default)]
pub struct AdapterOptions {
    /// Fuel granted to each store; `None` runs unmetered.
    pub fuel: Option<u64>,
    /// Directory for command-style stdio files; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

/// Creates a Wasmtime engine for classic core modules.
///
/// Fuel metering is only switched on when a fuel limit is configured, since it
/// adds per-instruction overhead to every timed call.
pub fn create_engine(metered: bool) -> AdapterResult<Engine> {
    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_memory64(false);
    config.consume_fuel(metered);
    config.epoch_interruption(false);

    let engine = Engine::new(&config)
        .map_err(|e| AdapterError::CompileFailed(format!("engine creation: {}", e)))?;
    tracing::debug!("{}", EngineCreated { metered });
    Ok(engine)
}

/// Compiles module bytes on the blocking pool with a fresh engine.
pub async fn compile_module(
    bytes: Arc<[u8]>,
    options: &AdapterOptions,
) -> AdapterResult<CompiledModule> {
    let metered = options.fuel.is_some();
    run_blocking(AdapterError::CompileFailed, move || {
        let engine = create_engine(metered)?;
        let module = Module::new(&engine, &bytes[..])
            .map_err(|e| AdapterError::CompileFailed(format!("{:#}", e)))?;
        Ok(CompiledModule { engine, module })
    })
    .await
}

/// Grants the configured fuel to a new store.
pub(crate) fn apply_fuel<T: 'static>(store: &mut Store<T>, fuel: Option<u64>) -> AdapterResult<()> {
    if let Some(fuel) = fuel {
        store
            .set_fuel(fuel)
            .map_err(|e| AdapterError::InstantiateFailed(format!("setting fuel: {}", e)))?;
    }
    Ok(())
}

/// Runs `work` on the blocking pool.
///
/// A panic in `work` is reported through `fail`, so it lands in the same
/// taxonomy bucket as the stage that was running.
pub(crate) async fn run_blocking<R, F>(fail: fn(String) -> AdapterError, work: F) -> AdapterResult<R>
where
    R: Send + 'static,
    F: FnOnce() -> AdapterResult<R> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| fail(format!("worker did not complete: {}", e)))?
}
