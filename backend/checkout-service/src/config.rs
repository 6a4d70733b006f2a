use std::path::Path;

use domain_types::types::{Connectors, Proxy};

/// Process-level configuration: gateway endpoints, egress proxy and HTTP
/// client limits. Merchant settings (keys, URLs, flags) come from the host
/// per request, not from here.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub connectors: Connectors,
    pub proxy: Proxy,
    pub client: ClientConfig,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// End-to-end timeout per gateway call, in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl AppConfig {
    /// Layered load: optional TOML file, then `QUICKPAY__`-prefixed
    /// environment variables on top.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("QUICKPAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_point_at_the_live_gateway() {
        let config = AppConfig::default();
        assert_eq!(config.connectors.quickpay.base_url, "https://api.quickpay.net");
        assert_eq!(config.client.timeout_secs, 30);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.connectors.quickpay.base_url, "https://api.quickpay.net");
    }
}
