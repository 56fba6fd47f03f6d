// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Cold-start samples per target
pub const DEFAULT_COLD_START_ITERATIONS: u32 = 5;
/// Timed `transform` calls per size class
pub const DEFAULT_EXECUTION_ITERATIONS: u32 = 10;
/// Gzip level used by the size probe (best compression)
pub const DEFAULT_GZIP_LEVEL: u32 = 9;
pub const MAX_GZIP_LEVEL: u32 = 9;
/// Report directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Minimum fuel a metered guest may be granted (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum fuel a metered guest may be granted (10 billion instructions)
pub const MAX_FUEL_LEVEL: u64 = 10_000_000_000;
