/// Per-connector endpoint parameters, loaded once from configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ConnectorParams {
    pub base_url: String,
}

impl Default for ConnectorParams {
    fn default() -> Self {
        Self {
            base_url: "https://api.quickpay.net".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Connectors {
    pub quickpay: ConnectorParams,
}

/// Outbound proxy configuration for environments that route gateway traffic
/// through an egress proxy.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Proxy {
    pub http_url: Option<String>,
    pub https_url: Option<String>,
    pub bypass_proxy_urls: Vec<String>,
}
