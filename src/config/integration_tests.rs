// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::config::load_and_validate_config;
    use crate::errors::{ConfigError, ValidationError};
    use crate::probes::payloads::SizeClass;
    use crate::runtime::{AdapterFactory, AdapterOptions, GlueManifest, InvocationMode, RuntimeContract, SandboxStyle};
    use std::path::Path;

    /// The shipped registry loads and covers every runtime contract
    #[test]
    fn test_bakeoff_registry_loading() {
        let registry = load_and_validate_config("configs/bakeoff.yaml").unwrap();

        assert_eq!(registry.len(), 5);
        assert_eq!(registry.base_dir(), Path::new("configs"));
        assert_eq!(registry.settings().get_cold_start_iterations(), 5);
        assert_eq!(
            registry.settings().get_size_classes(),
            vec![SizeClass::Small, SizeClass::Medium, SizeClass::Large]
        );

        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "tinygo", "javy", "assemblyscript", "kotlin"]);

        assert_eq!(registry.get("rust").unwrap().contract, RuntimeContract::Native);
        assert_eq!(
            registry.get("javy").unwrap().contract,
            RuntimeContract::CapabilitySandbox {
                style: SandboxStyle::Command
            }
        );
        assert!(registry.descriptors().iter().all(|d| d.rebuild.is_some()));
    }

    /// Glue manifests referenced by the registry resolve relative to it
    #[test]
    fn test_bakeoff_glue_resolves() {
        let registry = load_and_validate_config("configs/bakeoff.yaml").unwrap();
        let target = registry.get("assemblyscript").unwrap();

        let glue_path = match &target.contract {
            RuntimeContract::HostRuntimeCoupled { glue: Some(glue) } => glue.clone(),
            other => panic!("Expected glued host-runtime contract, got {:?}", other),
        };
        assert_eq!(glue_path, Path::new("configs").join("glue/assemblyscript.yaml"));
        assert!(GlueManifest::load(&glue_path).is_ok());

        let adapter = AdapterFactory::create(target, AdapterOptions::default()).unwrap();
        assert_eq!(adapter.invocation_mode(), InvocationMode::Direct);

        let kotlin = AdapterFactory::create(registry.get("kotlin").unwrap(), AdapterOptions::default()).unwrap();
        assert_eq!(kotlin.invocation_mode(), InvocationMode::Unsupported);
    }

    /// The target filter rejects names the registry does not declare
    #[test]
    fn test_bakeoff_target_filter() {
        let registry = load_and_validate_config("configs/bakeoff.yaml").unwrap();

        let selected = registry.select(&["javy".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);

        match registry.select(&["grain".to_string()]) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors, vec![ValidationError::UnknownTarget { name: "grain".to_string() }])
            }
            other => panic!("Expected Invalid, got {:?}", other.map(|v| v.len())),
        }
    }
}
