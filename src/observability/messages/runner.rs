// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the benchmark run and its per-target pipeline.

use crate::runner::PipelineStage;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Benchmark run started.
///
/// # Log Level
/// `info!` - Run lifecycle
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runner::RunStarted;
///
/// let msg = RunStarted {
///     target_count: 5,
///     output_dir: std::path::Path::new("results"),
/// };
///
/// assert_eq!(msg.to_string(), "Benchmarking 5 target(s), reports in results");
/// ```
pub struct RunStarted<'a> {
    pub target_count: usize,
    pub output_dir: &'a Path,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Benchmarking {} target(s), reports in {}",
            self.target_count,
            self.output_dir.display()
        )
    }
}

/// One target's pipeline started.
///
/// # Log Level
/// `info!` - Target lifecycle
pub struct TargetStarted<'a> {
    pub target: &'a str,
    pub contract: &'a str,
}

impl Display for TargetStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] starting ({})", self.target, self.contract)
    }
}

/// Artifact absent, running the target's rebuild command.
///
/// # Log Level
/// `info!` - Precedes possibly long build output
pub struct RebuildStarted<'a> {
    pub target: &'a str,
    pub command: &'a str,
}

impl Display for RebuildStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] artifact missing, rebuilding: {}", self.target, self.command)
    }
}

/// Rebuild command finished successfully.
///
/// # Log Level
/// `info!` - Target lifecycle
pub struct RebuildFinished<'a> {
    pub target: &'a str,
    pub elapsed: Duration,
}

impl Display for RebuildFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] rebuilt in {:?}", self.target, self.elapsed)
    }
}

/// Target could not be built; its remaining probes are skipped.
///
/// # Log Level
/// `error!` - Fatal for this target only
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::runner::TargetAbandoned;
///
/// let msg = TargetAbandoned {
///     target: "kotlin",
///     reason: "Build missing: rebuild exited with status 1",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct TargetAbandoned<'a> {
    pub target: &'a str,
    pub reason: &'a str,
}

impl Display for TargetAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] abandoned: {}", self.target, self.reason)
    }
}

/// Target moved to a new pipeline stage.
///
/// # Log Level
/// `debug!` - Fine-grained progress
pub struct StageReached<'a> {
    pub target: &'a str,
    pub stage: PipelineStage,
}

impl Display for StageReached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] stage: {}", self.target, self.stage)
    }
}

/// One target's pipeline finished.
///
/// # Log Level
/// `info!` - Target lifecycle
pub struct TargetFinished<'a> {
    pub target: &'a str,
    pub stage: PipelineStage,
    pub error_count: usize,
    pub elapsed: Duration,
}

impl Display for TargetFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] finished at {} with {} error(s) in {:?}",
            self.target, self.stage, self.error_count, self.elapsed
        )
    }
}

/// Benchmark run finished.
///
/// # Log Level
/// `info!` - Run lifecycle
pub struct RunFinished {
    pub target_count: usize,
    pub failed_targets: usize,
    pub elapsed: Duration,
}

impl Display for RunFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Benchmark run complete: {} target(s), {} with errors, took {:?}",
            self.target_count, self.failed_targets, self.elapsed
        )
    }
}
