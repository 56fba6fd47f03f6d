// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating a benchmark registry
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The registry declares no targets
    EmptyRegistry,
    /// Two targets share a name
    DuplicateTargetName {
        /// The repeated name
        name: String,
    },
    /// A target has an empty name
    EmptyTargetName {
        /// Position of the target in the registry
        index: usize,
    },
    /// A target name cannot be used as a report file name
    InvalidTargetName {
        name: String,
        reason: &'static str,
    },
    /// An iteration count is zero
    InvalidIterations {
        /// Which setting is invalid
        setting: &'static str,
    },
    /// Gzip level outside 0..=9
    InvalidCompressionLevel { level: u32 },
    /// No input-size class would be measured
    EmptySizeClasses,
    /// A fuel bound is inconsistent
    InvalidFuelBounds { minimum: u64, maximum: u64 },
    /// A target filter names a target the registry does not declare
    UnknownTarget { name: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyRegistry => write!(f, "Registry declares no targets"),
            ValidationError::DuplicateTargetName { name } => {
                write!(f, "Duplicate target name: '{}'", name)
            }
            ValidationError::EmptyTargetName { index } => {
                write!(f, "Target #{} has an empty name", index)
            }
            ValidationError::InvalidTargetName { name, reason } => {
                write!(f, "Target name '{}' is not usable as a file name: {}", name, reason)
            }
            ValidationError::InvalidIterations { setting } => {
                write!(f, "Setting '{}' must be at least 1", setting)
            }
            ValidationError::InvalidCompressionLevel { level } => {
                write!(f, "Gzip level {} is outside 0..=9", level)
            }
            ValidationError::EmptySizeClasses => {
                write!(f, "At least one input size class must be measured")
            }
            ValidationError::InvalidFuelBounds { minimum, maximum } => {
                write!(
                    f,
                    "Fuel minimum {} is greater than fuel maximum {}",
                    minimum, maximum
                )
            }
            ValidationError::UnknownTarget { name } => {
                write!(f, "Target '{}' is not declared in the registry", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading the benchmark registry
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read registry '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML registry: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML registry: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Registry validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConfigError::Invalid(errors)
    }
}
