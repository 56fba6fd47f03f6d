// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for artifact loading and runtime adapter events.
//!
//! This module contains message types for logging events related to:
//! * Artifact loading and decompression
//! * Engine creation and adapter selection
//! * Reactor initialization, command runs and shim readiness

use crate::runtime::{InvocationMode, Operation};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Artifact bytes read from disk.
///
/// # Log Level
/// `debug!` - Repeats for every cold-start iteration
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runtime::ArtifactLoaded;
///
/// let msg = ArtifactLoaded {
///     artifact_path: "build/rust.wasm",
///     size_bytes: 4096,
///     decompressed: false,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ArtifactLoaded<'a> {
    pub artifact_path: &'a str,
    pub size_bytes: usize,
    pub decompressed: bool,
}

impl Display for ArtifactLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded artifact: {} ({} bytes{})",
            self.artifact_path,
            self.size_bytes,
            if self.decompressed { ", gunzipped" } else { "" }
        )
    }
}

/// Artifact could not be read.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runtime::ArtifactLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ArtifactLoadFailed {
///     artifact_path: "build/missing.wasm",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ArtifactLoadFailed<'a> {
    pub artifact_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ArtifactLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load artifact '{}': {}",
            self.artifact_path, self.error
        )
    }
}

/// Fresh engine created for one compile.
///
/// # Log Level
/// `debug!` - Per-compile detail
pub struct EngineCreated {
    pub metered: bool,
}

impl Display for EngineCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created engine (fuel metering {})",
            if self.metered { "on" } else { "off" }
        )
    }
}

/// Adapter selected for a target.
///
/// # Log Level
/// `debug!` - Per-probe detail
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runtime::AdapterCreated;
/// use wasm_bakeoff::runtime::InvocationMode;
///
/// let msg = AdapterCreated {
///     target: "javy",
///     contract: "sandbox-command",
///     mode: InvocationMode::Indirect,
/// };
///
/// assert_eq!(msg.to_string(), "Created sandbox-command adapter for 'javy' (indirect invocation)");
/// ```
pub struct AdapterCreated<'a> {
    pub target: &'a str,
    pub contract: &'a str,
    pub mode: InvocationMode,
}

impl Display for AdapterCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created {} adapter for '{}' ({} invocation)",
            self.contract, self.target, self.mode
        )
    }
}

/// Declared contract disagrees with the artifact's imports or exports.
///
/// # Log Level
/// `warn!` - The adapter will probably fail to instantiate
pub struct ContractMismatch<'a> {
    pub target: &'a str,
    pub detail: &'a str,
}

impl Display for ContractMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Contract mismatch for '{}': {}", self.target, self.detail)
    }
}

/// Reactor instantiated and ready for calls.
///
/// # Log Level
/// `debug!` - Per-instantiation detail
pub struct ReactorInitialized<'a> {
    pub target: &'a str,
    pub ran_initializer: bool,
}

impl Display for ReactorInitialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.ran_initializer {
            write!(f, "Reactor '{}' initialized via _initialize", self.target)
        } else {
            write!(f, "Reactor '{}' has no _initialize export; treated as initialized", self.target)
        }
    }
}

/// One whole-module run of a command target finished.
///
/// # Log Level
/// `debug!` - Per-invocation detail
pub struct CommandInvocationFinished<'a> {
    pub target: &'a str,
    pub operation: Operation,
    pub succeeded: bool,
    pub elapsed: Duration,
}

impl Display for CommandInvocationFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Command '{}' {} {} in {:?}",
            self.target,
            self.operation,
            if self.succeeded { "succeeded" } else { "failed" },
            self.elapsed
        )
    }
}

/// Host-runtime module signalled readiness.
///
/// # Log Level
/// `debug!` - Per-instantiation detail
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runtime::ShimReady;
///
/// let msg = ShimReady { target: "assemblyscript", exposed: 2 };
/// assert_eq!(msg.to_string(), "Shim ready for 'assemblyscript' with 2 exposed operation(s)");
/// ```
pub struct ShimReady<'a> {
    pub target: &'a str,
    pub exposed: usize,
}

impl Display for ShimReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Shim ready for '{}' with {} exposed operation(s)",
            self.target, self.exposed
        )
    }
}

/// Diagnostic text a coupled module sent through `shim.log`.
///
/// # Log Level
/// `debug!` - Guest chatter
pub struct GuestLogged<'a> {
    pub target: &'a str,
    pub message: &'a str,
}

impl Display for GuestLogged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.target, self.message)
    }
}

/// A guest `dealloc` call failed after an operation.
///
/// # Log Level
/// `debug!` - The operation's outcome is already decided
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runtime::GuestReleaseFailed;
///
/// let msg = GuestReleaseFailed { ptr: 1024, len: 16, error: &"trap" };
/// assert_eq!(msg.to_string(), "Guest dealloc(1024, 16) failed: trap");
/// ```
pub struct GuestReleaseFailed<'a> {
    pub ptr: i32,
    pub len: i32,
    pub error: &'a dyn Display,
}

impl Display for GuestReleaseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Guest dealloc({}, {}) failed: {}",
            self.ptr, self.len, self.error
        )
    }
}
