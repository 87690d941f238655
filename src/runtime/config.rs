//! Runtime configuration for the REST deployment service.

use crate::error::{DeployError, DeployResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_BUFFER_SIZE: usize = 32;
const DEFAULT_CLASS_LOADER: &str = "system";

/// Settings read once at start.
///
/// | Field | Property | Environment | Default |
/// |-------|----------|-------------|---------|
/// | `virtual_host` | `virtualHost` | `REST_VIRTUAL_HOST` | none |
/// | `buffer_size` | `bufferSize` | `REST_BUFFER_SIZE` | 32 |
/// | `default_class_loader` | `defaultClassLoader` | `REST_DEFAULT_CLASS_LOADER` | `system` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestServiceConfig {
    /// Virtual host every binding is registered under.
    pub virtual_host: Option<String>,
    /// Capacity of the service mailbox.
    pub buffer_size: usize,
    /// Loader used when a web module does not carry its own.
    pub default_class_loader: String,
}

impl Default for RestServiceConfig {
    fn default() -> Self {
        Self {
            virtual_host: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            default_class_loader: DEFAULT_CLASS_LOADER.to_string(),
        }
    }
}

impl RestServiceConfig {
    /// Reads the container's init properties. Unknown keys are ignored.
    pub fn from_properties(properties: &HashMap<String, String>) -> DeployResult<Self> {
        Self::from_lookup(
            |key| properties.get(key).cloned(),
            ["virtualHost", "bufferSize", "defaultClassLoader"],
        )
    }

    pub fn from_env() -> DeployResult<Self> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            [
                "REST_VIRTUAL_HOST",
                "REST_BUFFER_SIZE",
                "REST_DEFAULT_CLASS_LOADER",
            ],
        )
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, keys: [&str; 3]) -> DeployResult<Self> {
        let [virtual_host, buffer_size, class_loader] = keys;
        let mut config = Self::default();

        config.virtual_host = lookup(virtual_host)
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty());

        if let Some(raw) = lookup(buffer_size) {
            let size: usize = raw
                .trim()
                .parse()
                .map_err(|e| DeployError::Config(format!("{buffer_size}={raw:?}: {e}")))?;
            if size == 0 {
                return Err(DeployError::Config(format!("{buffer_size} must be positive")));
            }
            config.buffer_size = size;
        }

        if let Some(loader) = lookup(class_loader).filter(|loader| !loader.trim().is_empty()) {
            config.default_class_loader = loader.trim().to_string();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = RestServiceConfig::from_properties(&HashMap::new()).unwrap();
        assert_eq!(config, RestServiceConfig::default());
        assert_eq!(config.buffer_size, 32);
        assert_eq!(config.virtual_host, None);
    }

    #[test]
    fn test_properties_override_defaults() {
        let config = RestServiceConfig::from_properties(&properties(&[
            ("virtualHost", " shop.local "),
            ("bufferSize", "64"),
            ("defaultClassLoader", "app"),
            ("unrelated", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.virtual_host.as_deref(), Some("shop.local"));
        assert_eq!(config.buffer_size, 64);
        assert_eq!(config.default_class_loader, "app");
    }

    #[test]
    fn test_blank_virtual_host_means_none() {
        let config = RestServiceConfig::from_properties(&properties(&[("virtualHost", "  ")])).unwrap();
        assert_eq!(config.virtual_host, None);
    }

    #[test]
    fn test_invalid_buffer_size() {
        let err = RestServiceConfig::from_properties(&properties(&[("bufferSize", "lots")])).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));

        let err = RestServiceConfig::from_properties(&properties(&[("bufferSize", "0")])).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }
}
