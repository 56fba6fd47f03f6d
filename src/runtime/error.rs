// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for runtime adapter operations.
//!
//! The first seven variants form the failure taxonomy every probe reports
//! against. The remaining variants cover artifact loading and inspection and
//! surface in the error list with their own prefixes.

use thiserror::Error;

/// Failure raised while building, loading, or driving a benchmarked artifact.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Artifact is absent and no rebuild was attempted or succeeded.
    #[error("Build missing: {0}")]
    BuildMissing(String),

    /// Module bytes could not be compiled.
    #[error("Compile failed: {0}")]
    CompileFailed(String),

    /// Instantiation failed, including unsatisfied imports and shim readiness.
    #[error("Instantiate failed: {0}")]
    InstantiateFailed(String),

    /// Capability negotiation failed: the named operation is not exposed.
    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    /// The operation ran but signalled failure.
    #[error("Invocation failed: {0}")]
    InvocationFailed(String),

    /// The operation returned, but its output is not the expected transport format.
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    /// The probe cannot apply to this adapter variant.
    #[error("Unsupported contract: {0}")]
    UnsupportedContract(String),

    /// File I/O error while reading an artifact or companion.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Artifact bytes are not a usable WebAssembly binary.
    #[error("Invalid WASM binary: {0}")]
    InvalidWasmBinary(String),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    ParserError(#[from] wasmparser::BinaryReaderError),

    /// Glue manifest for a host-runtime target could not be parsed.
    #[error("Invalid glue manifest: {0}")]
    InvalidGlue(String),
}

impl AdapterError {
    /// Short taxonomy label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::BuildMissing(_) => "BuildMissing",
            AdapterError::CompileFailed(_) => "CompileFailed",
            AdapterError::InstantiateFailed(_) => "InstantiateFailed",
            AdapterError::OperationNotFound(_) => "OperationNotFound",
            AdapterError::InvocationFailed(_) => "InvocationFailed",
            AdapterError::MalformedOutput(_) => "MalformedOutput",
            AdapterError::UnsupportedContract(_) => "UnsupportedContract",
            AdapterError::IoError(_) => "Io",
            AdapterError::InvalidWasmBinary(_) => "InvalidWasmBinary",
            AdapterError::ParserError(_) => "Parser",
            AdapterError::InvalidGlue(_) => "InvalidGlue",
        }
    }
}

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
