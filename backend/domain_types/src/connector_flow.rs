//! Zero-sized markers for the gateway flows. Each flow pairs with its
//! request/response data types through `ConnectorIntegrationV2`.

/// Create the gateway-side payment session for an order.
#[derive(Debug, Clone)]
pub struct CreateOrder;

/// Generate (or regenerate) the hosted payment-window link for a session.
#[derive(Debug, Clone)]
pub struct CreateLink;

/// Fetch the current payment snapshot.
#[derive(Debug, Clone)]
pub struct PSync;

/// Cancel an authorized but uncaptured payment.
#[derive(Debug, Clone)]
pub struct Void;

/// Capture an authorized payment.
#[derive(Debug, Clone)]
pub struct Capture;

/// Refund a captured (or authorized) payment.
#[derive(Debug, Clone)]
pub struct Refund;

#[derive(Debug, Clone, Copy, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FlowName {
    CreateOrder,
    CreateLink,
    Psync,
    Void,
    Capture,
    Refund,
    IncomingWebhook,
}
