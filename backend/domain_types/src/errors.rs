#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Failed to obtain authentication type")]
    FailedToObtainAuthType,
    #[error("Failed to encode connector request")]
    RequestEncodingFailed,
    #[error("Failed to deserialize connector response")]
    ResponseDeserializationFailed,
    #[error("Failed to handle connector response")]
    ResponseHandlingFailed,
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("Missing connector transaction id")]
    MissingConnectorTransactionID,
    #[error("Webhook source verification failed")]
    WebhookSourceVerificationFailed,
    #[error("Could not decode incoming webhook body")]
    WebhookBodyDecodingFailed,
    #[error("Could not find event type in incoming webhook body")]
    WebhookEventTypeNotFound,
    #[error("Source verification failed")]
    SourceVerificationFailed,
    #[error("{0} is not implemented")]
    NotImplemented(String),
    #[error("Invalid connector configuration: {config}")]
    InvalidConnectorConfig { config: &'static str },
    #[error("Currency must be a valid ISO 4217 currency code: {currency}")]
    CurrencyNotSupported { currency: String },
    #[error("Failed to convert amount to the required denomination")]
    AmountConversionFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("Failed to construct the HTTP client")]
    ClientConstructionFailed,
    #[error("Failed to encode the request URL")]
    UrlEncodingFailed,
    #[error("Failed to construct the request header map")]
    HeaderMapConstructionFailed,
    #[error("Request did not complete within the configured timeout")]
    RequestTimeoutReceived,
    #[error("Unable to send request to connector: {0}")]
    RequestNotSent(String),
    #[error("Failed to decode the connector response body")]
    ResponseDecodingFailed,
}
