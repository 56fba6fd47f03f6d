// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Registry validation.
//!
//! Every problem is collected before returning, so a registry with several
//! mistakes is reported in one pass. Target names become report file names,
//! which is why they are held to file-name rules here.

use crate::config::consts::MAX_GZIP_LEVEL;
use crate::config::loader::BenchConfig;
use crate::errors::ValidationError;
use std::collections::HashSet;

/// Name reserved for the combined CSV report.
const COMBINED_REPORT_STEM: &str = "all-targets";

pub fn validate_config(cfg: &BenchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_targets(cfg, &mut errors);
    validate_settings(cfg, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_targets(cfg: &BenchConfig, errors: &mut Vec<ValidationError>) {
    if cfg.targets.is_empty() {
        errors.push(ValidationError::EmptyRegistry);
        return;
    }

    let mut seen = HashSet::new();
    for (index, target) in cfg.targets.iter().enumerate() {
        let name = target.name.as_str();
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyTargetName { index });
            continue;
        }
        if let Some(reason) = file_name_problem(name) {
            errors.push(ValidationError::InvalidTargetName {
                name: name.to_string(),
                reason,
            });
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateTargetName {
                name: name.to_string(),
            });
        }
    }
}

fn file_name_problem(name: &str) -> Option<&'static str> {
    if name.contains(['/', '\\']) {
        Some("contains a path separator")
    } else if name == "." || name == ".." {
        Some("is a relative directory name")
    } else if name == COMBINED_REPORT_STEM {
        Some("is reserved for the combined report")
    } else {
        None
    }
}

fn validate_settings(cfg: &BenchConfig, errors: &mut Vec<ValidationError>) {
    let settings = &cfg.settings;

    if settings.get_cold_start_iterations() == 0 {
        errors.push(ValidationError::InvalidIterations {
            setting: "cold_start_iterations",
        });
    }
    if settings.get_execution_iterations() == 0 {
        errors.push(ValidationError::InvalidIterations {
            setting: "execution_iterations",
        });
    }

    let level = settings.get_gzip_level();
    if level > MAX_GZIP_LEVEL {
        errors.push(ValidationError::InvalidCompressionLevel { level });
    }

    if settings.get_size_classes().is_empty() {
        errors.push(ValidationError::EmptySizeClasses);
    }

    let fuel = &cfg.wasm.fuel;
    if fuel.get_minimum() > fuel.get_maximum() {
        errors.push(ValidationError::InvalidFuelBounds {
            minimum: fuel.get_minimum(),
            maximum: fuel.get_maximum(),
        });
    }
}
