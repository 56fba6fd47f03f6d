// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log lines are built from message structs in [`messages`], grouped by
//! subsystem, and emitted through `tracing`. The binary decides where they go
//! and at which level (`RUST_LOG`, default `info`).
//!
//! # Usage
//!
//! ```rust
//! use wasm_bakeoff::observability::messages::runtime::ArtifactLoadFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = ArtifactLoadFailed {
//!     artifact_path: "build/rust.wasm",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
