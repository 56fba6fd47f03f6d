// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Live guest instances and the buffer ABI
//!
//! Native and reactor modules share one calling convention:
//!
//! ```text
//! alloc(len) -> ptr
//! dealloc(ptr, len)
//! op(in_ptr, in_len, out_len_ptr) -> out_ptr
//! ```
//!
//! A null `out_ptr` is a failure. A negative length stored at `out_len_ptr`
//! marks the bytes at `out_ptr` as a guest error message of `-len` bytes.

use crate::observability::messages::runtime::GuestReleaseFailed;
use crate::runtime::adapter::AbiExports;
use crate::runtime::error::{AdapterError, AdapterResult};
use wasmtime::{Instance, Memory, Store, TypedFunc};

/// Store plus instance, moved onto the blocking pool for every guest call.
pub(crate) struct GuestInstance<T: 'static> {
    pub store: Store<T>,
    pub instance: Instance,
}

/// Runs `call` against the live guest on the blocking pool.
///
/// The guest is moved out of `slot` for the duration of the call and put back
/// afterwards. If the worker panics the instance is lost and `slot` stays empty.
pub(crate) async fn with_guest<T, R, F>(
    slot: &mut Option<GuestInstance<T>>,
    target: &str,
    call: F,
) -> AdapterResult<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: FnOnce(&mut GuestInstance<T>) -> AdapterResult<R> + Send + 'static,
{
    let mut guest = slot
        .take()
        .ok_or_else(|| crate::runtime::adapter::not_instantiated(target))?;

    let (guest, result) = tokio::task::spawn_blocking(move || {
        let result = call(&mut guest);
        (guest, result)
    })
    .await
    .map_err(|e| AdapterError::InvocationFailed(format!("guest call did not complete: {}", e)))?;

    *slot = Some(guest);
    result
}

/// Resolved buffer ABI exports of one instance.
#[derive(Clone)]
pub(crate) struct BufferAbi {
    memory: Memory,
    alloc: TypedFunc<i32, i32>,
    dealloc: TypedFunc<(i32, i32), ()>,
}

pub(crate) type OperationFunc = TypedFunc<(i32, i32, i32), i32>;

impl BufferAbi {
    /// Resolves memory and allocator exports right after instantiation.
    pub fn resolve<T: 'static>(
        store: &mut Store<T>,
        instance: &Instance,
        exports: &AbiExports,
    ) -> AdapterResult<Self> {
        let memory = instance
            .get_memory(&mut *store, &exports.memory)
            .ok_or_else(|| {
                AdapterError::InstantiateFailed(format!(
                    "module must export memory '{}'",
                    exports.memory
                ))
            })?;

        let alloc = instance
            .get_typed_func::<i32, i32>(&mut *store, &exports.alloc)
            .map_err(|_| {
                AdapterError::InstantiateFailed(format!(
                    "module must export '{}' with signature (i32) -> i32",
                    exports.alloc
                ))
            })?;

        let dealloc = instance
            .get_typed_func::<(i32, i32), ()>(&mut *store, &exports.dealloc)
            .map_err(|_| {
                AdapterError::InstantiateFailed(format!(
                    "module must export '{}' with signature (i32, i32) -> ()",
                    exports.dealloc
                ))
            })?;

        Ok(Self {
            memory,
            alloc,
            dealloc,
        })
    }

    /// Calls `func` with `input` marshaled into guest memory.
    pub fn call<T: 'static>(
        &self,
        store: &mut Store<T>,
        export: &str,
        func: &OperationFunc,
        input: &[u8],
    ) -> AdapterResult<Vec<u8>> {
        let input_len = guest_len(input.len())?;

        let input_ptr = if input.is_empty() {
            0
        } else {
            let ptr = self.allocate(store, input_len)?;
            if let Err(e) = self.memory.write(&mut *store, ptr as usize, input) {
                self.release(store, ptr, input_len);
                return Err(AdapterError::InvocationFailed(format!(
                    "writing input to guest memory: {}",
                    e
                )));
            }
            ptr
        };

        let out_len_ptr = match self.allocate(store, 4) {
            Ok(ptr) => ptr,
            Err(e) => {
                self.release(store, input_ptr, input_len);
                return Err(e);
            }
        };

        let call_result = func.call(&mut *store, (input_ptr, input_len, out_len_ptr));
        self.release(store, input_ptr, input_len);

        let result_ptr = match call_result {
            Ok(ptr) => ptr,
            Err(e) => {
                self.release(store, out_len_ptr, 4);
                return Err(AdapterError::InvocationFailed(format!(
                    "{} trapped: {:#}",
                    export, e
                )));
            }
        };

        let mut out_len_bytes = [0u8; 4];
        let len_read = self
            .memory
            .read(&mut *store, out_len_ptr as usize, &mut out_len_bytes);
        self.release(store, out_len_ptr, 4);
        len_read.map_err(|e| {
            AdapterError::InvocationFailed(format!("reading output length: {}", e))
        })?;

        if result_ptr == 0 {
            return Err(AdapterError::InvocationFailed(format!(
                "{} returned a null pointer",
                export
            )));
        }

        let out_len = i32::from_le_bytes(out_len_bytes);
        let byte_count = out_len.unsigned_abs() as usize;
        let mut output = vec![0u8; byte_count];
        let read = self.memory.read(&mut *store, result_ptr as usize, &mut output);
        self.release(store, result_ptr, out_len.saturating_abs());
        read.map_err(|e| AdapterError::InvocationFailed(format!("reading output: {}", e)))?;

        if out_len < 0 {
            return Err(AdapterError::InvocationFailed(
                String::from_utf8_lossy(&output).into_owned(),
            ));
        }

        Ok(output)
    }

    fn allocate<T: 'static>(&self, store: &mut Store<T>, len: i32) -> AdapterResult<i32> {
        let ptr = self.alloc.call(&mut *store, len).map_err(|e| {
            AdapterError::InvocationFailed(format!("guest allocator trapped: {:#}", e))
        })?;
        if ptr == 0 {
            return Err(AdapterError::InvocationFailed(format!(
                "guest allocator returned null for {} bytes",
                len
            )));
        }
        Ok(ptr)
    }

    fn release<T: 'static>(&self, store: &mut Store<T>, ptr: i32, len: i32) {
        release_buffer(store, &self.dealloc, ptr, len);
    }
}

/// Hands `(ptr, len)` back to the guest allocator. Null buffers are skipped.
pub(crate) fn release_buffer<T: 'static>(
    store: &mut Store<T>,
    dealloc: &TypedFunc<(i32, i32), ()>,
    ptr: i32,
    len: i32,
) {
    if ptr == 0 {
        return;
    }
    if let Err(e) = dealloc.call(&mut *store, (ptr, len)) {
        tracing::debug!(
            "{}",
            GuestReleaseFailed {
                ptr,
                len,
                error: &e,
            }
        );
    }
}

/// Resolves an operation export at call time.
pub(crate) fn resolve_operation<T: 'static>(
    store: &mut Store<T>,
    instance: &Instance,
    export: &str,
) -> AdapterResult<OperationFunc> {
    let func = instance.get_func(&mut *store, export).ok_or_else(|| {
        AdapterError::OperationNotFound(format!("module does not export '{}'", export))
    })?;
    func.typed::<(i32, i32, i32), i32>(&*store).map_err(|e| {
        AdapterError::OperationNotFound(format!(
            "'{}' does not have signature (i32, i32, i32) -> i32: {}",
            export, e
        ))
    })
}

pub(crate) fn guest_len(len: usize) -> AdapterResult<i32> {
    i32::try_from(len).map_err(|_| {
        AdapterError::InvocationFailed(format!("input of {} bytes exceeds guest address space", len))
    })
}
