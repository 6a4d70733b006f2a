/// Base64 engine for fingerprints, auth headers and stored link values.
pub const BASE64_ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Fallbacks when a gateway error body carries no usable code/message.
pub const NO_ERROR_CODE: &str = "No error code";
pub const NO_ERROR_MESSAGE: &str = "No error message";
