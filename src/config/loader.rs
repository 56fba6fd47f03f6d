// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_COLD_START_ITERATIONS, DEFAULT_EXECUTION_ITERATIONS, DEFAULT_GZIP_LEVEL,
    DEFAULT_OUTPUT_DIR, MAX_FUEL_LEVEL, MIN_FUEL_LEVEL,
};
use crate::config::registry::ArtifactRegistry;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use crate::probes::payloads::{default_size_classes, SizeClass};
use crate::runtime::{AbiExports, RuntimeContract};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Benchmark registry as written on disk.
///
/// # Fields
/// * `settings` - Probe repetition counts and output location (optional)
/// * `wasm` - Engine options such as fuel metering (optional)
/// * `targets` - One descriptor per artifact to benchmark
///
/// # Example
/// ```yaml
/// settings:
///   cold_start_iterations: 5
///   execution_iterations: 10
///   gzip_level: 9
///   output_dir: results
/// targets:
///   - name: rust
///     artifact: build/rust.wasm
///     contract:
///       kind: native
///     rebuild: make rust
///   - name: javy
///     artifact: build/javy.wasm
///     contract:
///       kind: capability_sandbox
///       style: command
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub wasm: WasmConfig,
    #[serde(default)]
    pub targets: Vec<ArtifactDescriptor>,
}

/// Measurement protocol settings. Unset fields fall back to `config::consts`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    pub cold_start_iterations: Option<u32>,
    pub execution_iterations: Option<u32>,
    pub gzip_level: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub size_classes: Option<Vec<SizeClass>>,
    /// Where command-style targets get their stdio files
    pub scratch_dir: Option<PathBuf>,
}

impl Settings {
    pub fn get_cold_start_iterations(&self) -> u32 {
        self.cold_start_iterations
            .unwrap_or(DEFAULT_COLD_START_ITERATIONS)
    }

    pub fn get_execution_iterations(&self) -> u32 {
        self.execution_iterations
            .unwrap_or(DEFAULT_EXECUTION_ITERATIONS)
    }

    pub fn get_gzip_level(&self) -> u32 {
        self.gzip_level.unwrap_or(DEFAULT_GZIP_LEVEL)
    }

    pub fn get_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// Measured classes, ascending and without repeats.
    pub fn get_size_classes(&self) -> Vec<SizeClass> {
        let mut classes = self
            .size_classes
            .clone()
            .unwrap_or_else(default_size_classes);
        classes.sort();
        classes.dedup();
        classes
    }
}

/// Engine options.
///
/// # Example
/// ```yaml
/// wasm:
///   fuel:
///     limit: 100000000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WasmConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
}

/// Fuel metering for runaway guests.
///
/// Metering is off unless `limit` is set, because it slows every guest call
/// and would skew the timings being compared.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FuelConfig {
    pub limit: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Fuel granted per store, clamped to the configured bounds.
    ///
    /// # Example
    /// ```
    /// use wasm_bakeoff::config::FuelConfig;
    ///
    /// assert_eq!(FuelConfig::default().effective_limit(), None);
    ///
    /// let config = FuelConfig { limit: Some(10), ..FuelConfig::default() };
    /// assert_eq!(config.effective_limit(), Some(1_000_000)); // raised to minimum
    /// ```
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit
            .map(|requested| requested.clamp(self.get_minimum(), self.get_maximum()))
    }
}

/// One benchmark target.
///
/// # Fields
/// * `name` - Unique key, also used for report file names
/// * `artifact` - Path to the WebAssembly binary (may be gzip-compressed)
/// * `contract` - Runtime contract the binary was built against
/// * `companions` - Extra files shipped with the artifact, counted by the size probe
/// * `rebuild` - Shell command that produces the artifact when it is missing
/// * `exports` - Buffer ABI export names
///
/// # Example
/// ```yaml
/// name: assemblyscript
/// artifact: build/as.wasm
/// contract:
///   kind: host_runtime_coupled
///   glue: glue/as.yaml
/// companions: [build/as.js]
/// rebuild: npm run asbuild
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtifactDescriptor {
    pub name: String,
    pub artifact: PathBuf,
    pub contract: RuntimeContract,
    #[serde(default)]
    pub companions: Vec<PathBuf>,
    #[serde(default)]
    pub rebuild: Option<String>,
    #[serde(default)]
    pub exports: AbiExports,
}

impl ArtifactDescriptor {
    pub fn new(name: impl Into<String>, artifact: PathBuf, contract: RuntimeContract) -> Self {
        Self {
            name: name.into(),
            artifact,
            contract,
            companions: Vec::new(),
            rebuild: None,
            exports: AbiExports::default(),
        }
    }

    /// Anchors relative paths at `base`.
    fn resolve_paths(&mut self, base: &Path) {
        self.artifact = anchored(base, &self.artifact);
        self.companions = self.companions.iter().map(|c| anchored(base, c)).collect();
        if let RuntimeContract::HostRuntimeCoupled { glue: Some(glue) } = &mut self.contract {
            *glue = anchored(base, glue);
        }
    }
}

fn anchored(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Parses a registry file. `.toml` files are read as TOML, anything else as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BenchConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg: BenchConfig = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Loads, validates and anchors a registry.
///
/// Relative paths in the registry resolve against the registry file's
/// directory, which is also where rebuild commands run.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<ArtifactRegistry, ConfigError> {
    let path = path.as_ref();
    let mut cfg = load_config(path)?;
    validate_config(&cfg)?;

    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    for target in &mut cfg.targets {
        target.resolve_paths(&base_dir);
    }

    Ok(ArtifactRegistry::new(base_dir, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SandboxStyle;
    use tempfile::TempDir;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
targets:
  - name: rust
    artifact: build/rust.wasm
    contract:
      kind: native
    rebuild: make rust
  - name: javy
    artifact: build/javy.wasm
    contract:
      kind: capability_sandbox
      style: command
"#;

        let cfg: BenchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[0].rebuild.as_deref(), Some("make rust"));
        assert_eq!(
            cfg.targets[1].contract,
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Command
            }
        );
        assert_eq!(cfg.settings.get_cold_start_iterations(), 5);
        assert_eq!(cfg.settings.get_execution_iterations(), 10);
        assert_eq!(cfg.settings.get_gzip_level(), 9);
        assert_eq!(cfg.settings.get_output_dir(), PathBuf::from("results"));
        assert_eq!(cfg.wasm.fuel.effective_limit(), None);
    }

    #[test]
    fn test_size_classes_are_sorted_and_deduplicated() {
        let settings: Settings =
            serde_yaml::from_str("size_classes: [large, tiny, large]").unwrap();
        assert_eq!(
            settings.get_size_classes(),
            vec![SizeClass::Tiny, SizeClass::Large]
        );
        assert_eq!(Settings::default().get_size_classes(), default_size_classes());
    }

    #[test]
    fn test_fuel_limit_is_clamped() {
        let fuel: FuelConfig = serde_yaml::from_str("limit: 99999999999999").unwrap();
        assert_eq!(fuel.effective_limit(), Some(MAX_FUEL_LEVEL));
    }

    #[test]
    fn test_load_toml_registry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.toml");
        std::fs::write(
            &path,
            r#"
[settings]
cold_start_iterations = 3

[[targets]]
name = "tinygo"
artifact = "tinygo.wasm"
contract = { kind = "capability_sandbox" }
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.settings.get_cold_start_iterations(), 3);
        assert_eq!(
            cfg.targets[0].contract,
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Reactor
            }
        );
    }

    #[test]
    fn test_relative_paths_resolve_against_registry_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.yaml");
        std::fs::write(
            &path,
            r#"
targets:
  - name: as
    artifact: build/as.wasm
    companions: [build/as.js, /opt/shared.js]
    contract:
      kind: host_runtime_coupled
      glue: glue/as.yaml
"#,
        )
        .unwrap();

        let registry = load_and_validate_config(&path).unwrap();
        let target = registry.get("as").unwrap();
        assert_eq!(target.artifact, dir.path().join("build/as.wasm"));
        assert_eq!(target.companions[0], dir.path().join("build/as.js"));
        assert_eq!(target.companions[1], PathBuf::from("/opt/shared.js"));
        assert_eq!(
            target.contract,
            RuntimeContract::HostRuntimeCoupled {
                glue: Some(dir.path().join("glue/as.yaml"))
            }
        );
        assert_eq!(registry.base_dir(), dir.path());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("/nonexistent/registry.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_yaml_is_yaml_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.yaml");
        std::fs::write(&path, "targets: [name: {").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Yaml(_))));
    }
}
