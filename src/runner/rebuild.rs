// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Producing a missing artifact.
//!
//! The rebuild command is opaque: it runs through `sh -c` in the registry
//! directory with the harness's own stdout and stderr, and only its exit
//! status and the artifact's presence afterwards are interpreted.

use crate::config::ArtifactDescriptor;
use crate::observability::messages::runner::{RebuildFinished, RebuildStarted};
use crate::runtime::{locate_artifact, AdapterError, AdapterResult};
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// What [`ensure_artifact`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Present,
    Rebuilt,
}

/// Makes sure the descriptor's artifact exists, rebuilding it if needed.
///
/// Every failure is [`AdapterError::BuildMissing`].
pub async fn ensure_artifact(
    descriptor: &ArtifactDescriptor,
    base_dir: &Path,
) -> AdapterResult<BuildOutcome> {
    if locate_artifact(&descriptor.artifact).is_some() {
        return Ok(BuildOutcome::Present);
    }

    let command = descriptor.rebuild.as_deref().ok_or_else(|| {
        AdapterError::BuildMissing(format!(
            "artifact '{}' not found and no rebuild command configured",
            descriptor.artifact.display()
        ))
    })?;

    tracing::info!(
        "{}",
        RebuildStarted {
            target: &descriptor.name,
            command,
        }
    );
    let started = Instant::now();

    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(base_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| AdapterError::BuildMissing(format!("rebuild could not start: {}", e)))?;

    if !status.success() {
        return Err(AdapterError::BuildMissing(format!(
            "rebuild exited with {}",
            status
        )));
    }

    if locate_artifact(&descriptor.artifact).is_none() {
        return Err(AdapterError::BuildMissing(format!(
            "artifact '{}' still missing after rebuild",
            descriptor.artifact.display()
        )));
    }

    tracing::info!(
        "{}",
        RebuildFinished {
            target: &descriptor.name,
            elapsed: started.elapsed(),
        }
    );
    Ok(BuildOutcome::Rebuilt)
}
