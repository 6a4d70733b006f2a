use common_enums::PaymentStatus;
use common_utils::Secret;

/// Credentials handed in by the host per merchant account.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum ConnectorAuthType {
    /// A single key sent as a request header.
    HeaderKey { api_key: Secret<String> },
    /// An API key plus a second secret; for Quickpay `key1` is the merchant
    /// private key used to authenticate callbacks.
    BodyKey {
        api_key: Secret<String>,
        key1: Secret<String>,
    },
}

/// A gateway-side failure, normalized from whatever error body the remote
/// returned.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub code: String,
    pub message: String,
    pub reason: Option<String>,
    pub status: Option<PaymentStatus>,
    pub connector_transaction_id: Option<String>,
}
