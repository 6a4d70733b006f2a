use std::collections::HashMap;

use common_enums::{Currency, PaymentStatus};
use common_utils::{types::MinorUnit, Secret};
use error_stack::Report;

use crate::{errors::ConnectorError, types::Connectors};

type Error = Report<ConnectorError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectorEnum {
    Quickpay,
}

/// Order-scoped data shared by every payment flow. The host owns the order
/// record; this is a per-invocation view of it, read and written once.
#[derive(Debug, Clone)]
pub struct PaymentFlowData {
    /// Host-side order identifier (opaque to the gateway).
    pub order_id: String,
    /// Human-facing order number, template-generated by the store.
    pub order_number: String,
    /// Host-generated order reference used for callback↔order linkage.
    pub order_reference: String,
    pub currency: Currency,
    pub minor_amount: MinorUnit,
    /// Payment status currently persisted on the order.
    pub status: PaymentStatus,
    /// Gateway-safe order id, already shortened to the gateway's limits.
    pub connector_request_reference_id: String,
    pub test_mode: Option<bool>,
    pub connectors: Connectors,
}

#[derive(Debug, Clone)]
pub struct PaymentCreateOrderData {
    pub order_id: String,
    pub currency: Currency,
    /// Echoed back unmodified in every webhook and snapshot; the
    /// authoritative linkage between gateway payment and host order.
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct PaymentCreateOrderResponse {
    pub connector_payment_id: String,
    pub order_id: String,
}

#[derive(Debug, Clone)]
pub struct PaymentLinkData {
    pub connector_payment_id: String,
    pub amount: MinorUnit,
    pub language: String,
    pub continue_url: String,
    pub cancel_url: String,
    pub callback_url: String,
    pub payment_methods: Option<String>,
    pub auto_fee: Option<bool>,
    pub auto_capture: Option<bool>,
    pub framed: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PaymentLinkResponse {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentsSyncData {
    pub connector_transaction_id: String,
}

#[derive(Debug, Clone)]
pub struct PaymentVoidData {
    pub connector_transaction_id: String,
}

#[derive(Debug, Clone)]
pub struct PaymentsCaptureData {
    pub connector_transaction_id: String,
    pub minor_amount_to_capture: MinorUnit,
    pub currency: Currency,
}

#[derive(Debug, Clone)]
pub struct RefundsData {
    pub connector_transaction_id: String,
    pub minor_refund_amount: MinorUnit,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseId {
    ConnectorTransactionId(String),
    NoResponseId,
}

impl ResponseId {
    pub fn get_connector_transaction_id(&self) -> Result<String, Error> {
        match self {
            Self::ConnectorTransactionId(id) => Ok(id.clone()),
            Self::NoResponseId => Err(ConnectorError::MissingConnectorTransactionID.into()),
        }
    }
}

/// Result of a payment action (sync/cancel/capture/refund). `status` is
/// `None` when the snapshot carried no settled, approved operation — the
/// caller treats that as "no result" and leaves local state untouched.
#[derive(Debug, Clone)]
pub struct PaymentsResponseData {
    pub resource_id: ResponseId,
    pub status: Option<PaymentStatus>,
    pub minor_amount: Option<MinorUnit>,
    pub connector_response_reference_id: Option<String>,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

/// The inbound webhook request exactly as received. `body` must be the raw,
/// unmodified bytes — checksum verification hashes these bytes directly.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub method: HttpMethod,
    pub uri: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub query_params: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectorWebhookSecrets {
    pub secret: Vec<u8>,
    pub additional_secret: Option<Secret<String>>,
}

/// Order-side state needed to reconcile an incoming webhook: the linkage
/// values stored at session creation and the currently persisted status.
#[derive(Debug, Clone)]
pub struct WebhookOrderContext {
    pub order_reference: String,
    pub stored_connector_order_id: Option<String>,
    pub current_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    PaymentAuthorized,
    PaymentCaptured,
    PaymentRefunded,
    PaymentCancelled,
    IncomingWebhookEventUnspecified,
}

/// Why a webhook was rejected outright (as opposed to ignored).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WebhookRejection {
    #[error("checksum header did not match the request body")]
    ChecksumMismatch,
    #[error("capture notified before an authorization was recorded locally")]
    CaptureBeforeAuthorize,
}

/// Outcome of reconciling a webhook delivery against the local order state.
///
/// `NoChange` covers duplicates, declined attempts and unverifiable
/// payloads: the delivery is acknowledged but local state stays untouched.
/// `Rejected` is a hard failure the caller must surface as a rejected
/// request.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Accepted {
        status: PaymentStatus,
        transaction_id: String,
        minor_amount: MinorUnit,
    },
    NoChange,
    Rejected { reason: WebhookRejection },
}
