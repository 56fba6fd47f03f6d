// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` so log lines stay consistent and no
//! format strings are scattered through the measurement code.
//!
//! # Organization
//!
//! * `runtime` - Artifact loading, engines and runtime adapters
//! * `probe` - Probe results, skipped probes and failed iterations
//! * `runner` - Run and per-target pipeline lifecycle
//! * `report` - Report files
//!
//! # Usage Pattern
//!
//! ```rust
//! use wasm_bakeoff::observability::messages::runner::TargetStarted;
//!
//! let msg = TargetStarted {
//!     target: "tinygo",
//!     contract: "sandbox-reactor",
//! };
//!
//! tracing::info!("{}", msg);
//! ```

pub mod probe;
pub mod report;
pub mod runner;
pub mod runtime;
