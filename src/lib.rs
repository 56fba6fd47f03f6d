// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // registry + settings
pub mod errors;     // config error handling
pub mod observability;
pub mod probes;     // size, cold start, execution, memory
pub mod report;     // results + CSV/JSON/Markdown output
pub mod runner;     // per-target pipeline
pub mod runtime;    // adapters over wasmtime
