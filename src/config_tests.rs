// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::{OperatorArgs, OperatorConfig, DEFAULT_CONTROLLER_NAMESPACE};
    use crate::errors::ConfigError;
    use crate::variant::ServerFlavor;
    use clap::Parser;
    use std::time::Duration;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        operator: OperatorArgs,
    }

    fn parse(args: &[&str]) -> OperatorArgs {
        let mut argv = vec!["keycloak-operator"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).operator
    }

    #[test]
    fn test_defaults() {
        let config = OperatorConfig::try_from(&parse(&[])).unwrap();

        assert_eq!(config.flavor, ServerFlavor::Community);
        assert_eq!(config.image_version_fallback, "6.0.0");
        assert!(!config.requires_filesystem_group_override);
        assert_eq!(config.controller_namespace, DEFAULT_CONTROLLER_NAMESPACE);
        assert!(config.ca_secret_names.is_empty());
        assert_eq!(config.schema_job_timeout, Duration::from_secs(600));
        assert_eq!(config, OperatorConfig::default());
    }

    #[test]
    fn test_vendor_certified_mode() {
        let config =
            OperatorConfig::try_from(&parse(&["--compliance-mode", "vendor-certified"])).unwrap();
        assert_eq!(config.flavor, ServerFlavor::VendorCertified);

        let config = OperatorConfig::try_from(&parse(&["--compliance-mode", "RedHat"])).unwrap();
        assert_eq!(config.flavor, ServerFlavor::VendorCertified);
    }

    #[test]
    fn test_unknown_compliance_mode_is_rejected() {
        let result = OperatorConfig::try_from(&parse(&["--compliance-mode", "enterprise"]));
        assert_eq!(
            result,
            Err(ConfigError::UnknownComplianceMode("enterprise".to_string()))
        );
    }

    #[test]
    fn test_ca_secret_names_are_split_and_trimmed() {
        let config = OperatorConfig::try_from(&parse(&[
            "--ca-secret-names",
            "test-ca-secret, other-ca,,",
        ]))
        .unwrap();

        assert_eq!(
            config.ca_secret_names,
            vec!["test-ca-secret".to_string(), "other-ca".to_string()]
        );
    }

    #[test]
    fn test_filesystem_group_override_flag() {
        let config = OperatorConfig::try_from(&parse(&[
            "--requires-filesystem-group-override",
            "true",
        ]))
        .unwrap();
        assert!(config.requires_filesystem_group_override);
    }

    #[test]
    fn test_blank_optional_values_become_none() {
        let config =
            OperatorConfig::try_from(&parse(&["--tls-secret-name", "  ", "--routing-suffix", ""]))
                .unwrap();
        assert_eq!(config.tls_secret_name, None);
        assert_eq!(config.routing_suffix, None);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = OperatorConfig::try_from(&parse(&["--schema-job-timeout-secs", "0"]));
        assert_eq!(result, Err(ConfigError::InvalidSchemaJobTimeout));
    }

    #[test]
    fn test_empty_controller_namespace_is_rejected() {
        let result = OperatorConfig::try_from(&parse(&["--controller-namespace", " "]));
        assert_eq!(result, Err(ConfigError::EmptyControllerNamespace));
    }
}
