// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use std::env;
use std::time::Duration;

/// Where the cost-analyzer lives and how to reach it.
/// Built once per command and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Namespace the cost-analyzer service is installed in
    pub namespace: String,
    pub service_name: String,
    /// Go through the API server's service proxy instead of a port-forward tunnel
    pub use_proxy: bool,
    /// Upper bound for each query, tunnel setup included
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            namespace: defaults::NAMESPACE.to_string(),
            service_name: defaults::SERVICE_NAME.to_string(),
            use_proxy: false,
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(namespace) = lookup("COSTCTL_NAMESPACE").filter(|s| !s.is_empty()) {
            config.namespace = namespace;
        }
        if let Some(service_name) = lookup("COSTCTL_SERVICE_NAME").filter(|s| !s.is_empty()) {
            config.service_name = service_name;
        }
        config.use_proxy = lookup("COSTCTL_USE_PROXY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = BackendConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.namespace, "kubecost");
        assert!(!config.use_proxy);
    }

    #[test]
    fn test_env_overrides() {
        let config = BackendConfig::from_lookup(lookup_from(&[
            ("COSTCTL_NAMESPACE", "cost"),
            ("COSTCTL_SERVICE_NAME", "analyzer"),
            ("COSTCTL_USE_PROXY", "true"),
        ]));
        assert_eq!(config.namespace, "cost");
        assert_eq!(config.service_name, "analyzer");
        assert!(config.use_proxy);
    }

    #[test]
    fn test_unparsable_proxy_flag_is_false() {
        let config = BackendConfig::from_lookup(lookup_from(&[("COSTCTL_USE_PROXY", "yes")]));
        assert!(!config.use_proxy);
    }
}
