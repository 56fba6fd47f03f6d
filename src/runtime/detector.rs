// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Artifact inspection
//!
//! Parses an artifact's import and export sections with `wasmparser` so the
//! runner can warn when a declared runtime contract does not match what the
//! module actually imports. The check is advisory; adapters still decide.

use crate::runtime::adapter::{RuntimeContract, SandboxStyle};
use crate::runtime::error::{AdapterError, AdapterResult};
use wasmparser::{Encoding, Parser, Payload};

const WASI_PREVIEW1: &str = "wasi_snapshot_preview1";
const SHIM_MODULE: &str = "shim";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImport {
    pub module: String,
    pub name: String,
}

/// Imports and exports of a core module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactProfile {
    pub imports: Vec<ModuleImport>,
    pub exports: Vec<String>,
}

impl ArtifactProfile {
    pub fn exports(&self, name: &str) -> bool {
        self.exports.iter().any(|e| e == name)
    }

    fn foreign_imports<'a>(&'a self, allowed: &'a str) -> impl Iterator<Item = &'a ModuleImport> {
        self.imports.iter().filter(move |i| i.module != allowed)
    }
}

/// Reads the import and export sections of a core module.
///
/// # Errors
/// - `UnsupportedContract` for component-model binaries
/// - `ParserError` for anything `wasmparser` rejects
pub fn inspect_artifact(bytes: &[u8]) -> AdapterResult<ArtifactProfile> {
    let mut profile = ArtifactProfile::default();
    let mut saw_header = false;

    for payload in Parser::new(0).parse_all(bytes) {
        match payload? {
            Payload::Version { encoding, .. } => {
                if encoding == Encoding::Component {
                    return Err(AdapterError::UnsupportedContract(
                        "component-model binaries are not benchmarked".to_string(),
                    ));
                }
                saw_header = true;
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import?;
                    profile.imports.push(ModuleImport {
                        module: import.module.to_string(),
                        name: import.name.to_string(),
                    });
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    profile.exports.push(export?.name.to_string());
                }
            }
            _ => {}
        }
    }

    if !saw_header {
        return Err(AdapterError::InvalidWasmBinary("missing module header".to_string()));
    }
    Ok(profile)
}

/// Describes how `profile` disagrees with `contract`, if it does.
pub fn contract_mismatch(profile: &ArtifactProfile, contract: &RuntimeContract) -> Option<String> {
    match contract {
        RuntimeContract::Native => {
            let first = profile.imports.first()?;
            Some(format!(
                "native target imports {} host function(s), first {}.{}",
                profile.imports.len(),
                first.module,
                first.name
            ))
        }
        RuntimeContract::CapabilitySandbox { style } => {
            if let Some(import) = profile.foreign_imports(WASI_PREVIEW1).next() {
                return Some(format!(
                    "sandboxed target imports {}.{} outside {}",
                    import.module, import.name, WASI_PREVIEW1
                ));
            }
            match style {
                SandboxStyle::Command if !profile.exports("_start") => {
                    Some("command target does not export _start".to_string())
                }
                SandboxStyle::Reactor if profile.exports("_start") && !profile.exports("_initialize") => {
                    Some("reactor target exports _start but no _initialize; is it a command?".to_string())
                }
                _ => None,
            }
        }
        RuntimeContract::HostRuntimeCoupled { .. } => profile
            .foreign_imports(SHIM_MODULE)
            .next()
            .map(|import| {
                format!(
                    "host-runtime target imports {}.{} outside the {} namespace",
                    import.module, import.name, SHIM_MODULE
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_fixtures::{command_module, native_module, reactor_module, shim_module};

    #[test]
    fn test_empty_input() {
        assert!(inspect_artifact(&[]).is_err());
    }

    #[test]
    fn test_component_is_unsupported() {
        let component = wat::parse_str("(component)").unwrap();
        let result = inspect_artifact(&component);
        assert!(matches!(result, Err(AdapterError::UnsupportedContract(_))));
    }

    #[test]
    fn test_profiles_match_their_contracts() {
        let native = inspect_artifact(&native_module()).unwrap();
        assert!(native.imports.is_empty());
        assert!(native.exports("transform"));
        assert_eq!(contract_mismatch(&native, &RuntimeContract::Native), None);

        let reactor = inspect_artifact(&reactor_module()).unwrap();
        let sandbox = RuntimeContract::CapabilitySandbox {
            style: SandboxStyle::Reactor,
        };
        assert_eq!(contract_mismatch(&reactor, &sandbox), None);

        let command = inspect_artifact(&command_module()).unwrap();
        let command_contract = RuntimeContract::CapabilitySandbox {
            style: SandboxStyle::Command,
        };
        assert_eq!(contract_mismatch(&command, &command_contract), None);
        assert!(contract_mismatch(&command, &sandbox).is_some());

        let shim = inspect_artifact(&shim_module()).unwrap();
        assert_eq!(
            contract_mismatch(&shim, &RuntimeContract::HostRuntimeCoupled { glue: None }),
            None
        );
    }

    #[test]
    fn test_mismatches_are_described() {
        let shim = inspect_artifact(&shim_module()).unwrap();
        let message = contract_mismatch(&shim, &RuntimeContract::Native).unwrap();
        assert!(message.contains("shim."));

        let native = inspect_artifact(&native_module()).unwrap();
        let message = contract_mismatch(
            &native,
            &RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Command,
            },
        )
        .unwrap();
        assert!(message.contains("_start"));
    }
}
