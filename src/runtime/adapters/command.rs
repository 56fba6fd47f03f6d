// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use wasmtime::{InstancePre, Store};
use wasmtime_wasi::cli::{InputFile, OutputFile};
use wasmtime_wasi::p1::WasiP1Ctx;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use super::reactor::wasi_linker;
use super::stdio::ScopedStdio;
use crate::observability::messages::runtime::CommandInvocationFinished;
use crate::runtime::adapter::{
    decode_output, not_instantiated, operation_payload, CompiledModule, InvocationMode, Operation,
    RuntimeAdapter,
};
use crate::runtime::engine::{apply_fuel, run_blocking, AdapterOptions};
use crate::runtime::error::{AdapterError, AdapterResult};

const COMMAND_ENTRY_EXPORT: &str = "_start";

/// Adapter for WASI command modules.
///
/// A command has a single entry point, so each invocation runs the whole module
/// in a fresh store: argv carries the operation name, stdin the input document,
/// and stdout the result. Stdio lives in scoped temp files that are removed
/// whatever the outcome.
pub struct CommandAdapter {
    target: String,
    options: AdapterOptions,
    pre: Option<InstancePre<WasiP1Ctx>>,
}

impl CommandAdapter {
    pub fn new(target: impl Into<String>, options: AdapterOptions) -> Self {
        Self {
            target: target.into(),
            options,
            pre: None,
        }
    }

    fn scratch_dir(&self) -> PathBuf {
        self.options
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Runs `_start` once with the given stdio and argv.
fn run_command(
    pre: &InstancePre<WasiP1Ctx>,
    stdio: &ScopedStdio,
    argv: &[&str],
    fuel: Option<u64>,
) -> AdapterResult<()> {
    let mut builder = WasiCtxBuilder::new();
    builder
        .args(argv)
        .stdin(InputFile::new(stdio.stdin_reader()?))
        .stdout(OutputFile::new(stdio.stdout_writer()?))
        .stderr(OutputFile::new(stdio.stderr_writer()?));

    let mut store = Store::new(pre.module().engine(), builder.build_p1());
    apply_fuel(&mut store, fuel)?;

    let instance = pre
        .instantiate(&mut store)
        .map_err(|e| AdapterError::InvocationFailed(format!("instantiating command: {:#}", e)))?;
    let start = instance
        .get_typed_func::<(), ()>(&mut store, COMMAND_ENTRY_EXPORT)
        .map_err(|_| {
            AdapterError::OperationNotFound(format!(
                "command module must export '{}'",
                COMMAND_ENTRY_EXPORT
            ))
        })?;

    let outcome = start.call(&mut store, ());
    drop(store);

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<I32Exit>() {
            Some(I32Exit(0)) => Ok(()),
            Some(I32Exit(code)) => {
                let stderr = stdio.read_stderr()?;
                if stderr.is_empty() {
                    Err(AdapterError::InvocationFailed(format!("exit code {}", code)))
                } else {
                    Err(AdapterError::InvocationFailed(stderr))
                }
            }
            None => Err(AdapterError::InvocationFailed(format!(
                "{} trapped: {:#}",
                COMMAND_ENTRY_EXPORT, e
            ))),
        },
    }
}

#[async_trait]
impl RuntimeAdapter for CommandAdapter {
    fn target(&self) -> &str {
        &self.target
    }

    fn contract(&self) -> &'static str {
        "sandbox-command"
    }

    fn invocation_mode(&self) -> InvocationMode {
        InvocationMode::Indirect
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    async fn instantiate(&mut self, module: CompiledModule) -> AdapterResult<()> {
        self.dispose();

        let fuel = self.options.fuel;
        let pre = run_blocking(AdapterError::InstantiateFailed, move || {
            let CompiledModule { engine, module } = module;
            let linker = wasi_linker(&engine)?;
            let pre = linker
                .instantiate_pre(&module)
                .map_err(|e| AdapterError::InstantiateFailed(format!("{:#}", e)))?;

            // Prove the module links and its start section runs before it is timed.
            let mut store = Store::new(&engine, WasiCtxBuilder::new().build_p1());
            apply_fuel(&mut store, fuel)?;
            pre.instantiate(&mut store)
                .map_err(|e| AdapterError::InstantiateFailed(format!("{:#}", e)))?;

            Ok(pre)
        })
        .await?;

        self.pre = Some(pre);
        Ok(())
    }

    async fn invoke(&mut self, operation: Operation, input: Option<&str>) -> AdapterResult<String> {
        let payload = operation_payload(operation, input)?;
        let pre = self
            .pre
            .clone()
            .ok_or_else(|| not_instantiated(&self.target))?;

        let stdio = ScopedStdio::create(&self.scratch_dir(), &self.target, &payload)?;
        let target = self.target.clone();
        let fuel = self.options.fuel;
        let started = Instant::now();

        let result = run_blocking(AdapterError::InvocationFailed, move || {
            run_command(&pre, &stdio, &[target.as_str(), operation.name()], fuel)?;

            let stderr = stdio.read_stderr()?;
            if !stderr.is_empty() {
                return Err(AdapterError::InvocationFailed(stderr));
            }
            stdio.read_stdout()
        })
        .await;

        tracing::debug!(
            "{}",
            CommandInvocationFinished {
                target: &self.target,
                operation,
                succeeded: result.is_ok(),
                elapsed: started.elapsed(),
            }
        );

        decode_output(operation, result?)
    }

    fn dispose(&mut self) {
        self.pre = None;
    }

    fn is_instantiated(&self) -> bool {
        self.pre.is_some()
    }
}
