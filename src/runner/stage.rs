// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt;

/// Per-target pipeline position.
///
/// ```text
/// NotBuilt -> Built -> Sized -> ColdStarted -> Executed -> Measured -> Reported
/// ```
///
/// Only a failed build stops a target early; it stays at `NotBuilt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    NotBuilt,
    Built,
    Sized,
    ColdStarted,
    Executed,
    Measured,
    Reported,
}

impl PipelineStage {
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::NotBuilt => Some(PipelineStage::Built),
            PipelineStage::Built => Some(PipelineStage::Sized),
            PipelineStage::Sized => Some(PipelineStage::ColdStarted),
            PipelineStage::ColdStarted => Some(PipelineStage::Executed),
            PipelineStage::Executed => Some(PipelineStage::Measured),
            PipelineStage::Measured => Some(PipelineStage::Reported),
            PipelineStage::Reported => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::NotBuilt => "not built",
            PipelineStage::Built => "built",
            PipelineStage::Sized => "sized",
            PipelineStage::ColdStarted => "cold started",
            PipelineStage::Executed => "executed",
            PipelineStage::Measured => "measured",
            PipelineStage::Reported => "reported",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_advance_in_order() {
        let mut stage = PipelineStage::NotBuilt;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            visited.push(stage);
        }
        assert_eq!(visited.len(), 7);
        assert_eq!(stage, PipelineStage::Reported);
    }
}
