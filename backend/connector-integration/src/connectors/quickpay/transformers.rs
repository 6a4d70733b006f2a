use std::collections::HashMap;

use base64::Engine;
use common_enums::{Currency, PaymentStatus};
use common_utils::{consts::BASE64_ENGINE, types::MinorUnit, Secret};
use domain_types::{
    connector_flow::{Capture, CreateLink, CreateOrder, Refund},
    connector_types::{
        PaymentCreateOrderData, PaymentCreateOrderResponse, PaymentFlowData, PaymentLinkData,
        PaymentLinkResponse, PaymentsResponseData, ResponseId, WebhookOrderContext,
        WebhookOutcome, WebhookRejection,
    },
    errors::ConnectorError,
    router_data::ConnectorAuthType,
    router_data_v2::RouterDataV2,
};
use serde::{Deserialize, Serialize};

use crate::types::ResponseRouterData;

/// Gateway status code on a fully approved operation.
pub const APPROVED_QP_STATUS_CODE: &str = "20000";
/// Acquirer status code accepted as approval on the callback path.
pub const APPROVED_AQ_STATUS_CODE: &str = "000";

/// The gateway rejects order ids outside 4..=20 characters.
pub const MAX_ORDER_ID_LENGTH: usize = 20;

const ORDER_NUMBER_PLACEHOLDER: &str = "{0}";

/// Variables attached at session creation and echoed back unmodified in
/// every snapshot and callback. These carry the authoritative order linkage.
pub const VARIABLE_ORDER_REFERENCE: &str = "orderReference";
pub const VARIABLE_ORDER_ID: &str = "orderId";
pub const VARIABLE_ORDER_NUMBER: &str = "orderNumber";

#[derive(Debug, Clone)]
pub struct QuickpayAuthType {
    pub api_key: Secret<String>,
    pub private_key: Secret<String>,
}

impl TryFrom<&ConnectorAuthType> for QuickpayAuthType {
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(auth_type: &ConnectorAuthType) -> Result<Self, Self::Error> {
        match auth_type {
            ConnectorAuthType::BodyKey { api_key, key1 } => Ok(Self {
                api_key: api_key.to_owned(),
                private_key: key1.to_owned(),
            }),
            _ => Err(ConnectorError::FailedToObtainAuthType.into()),
        }
    }
}

/// Payment-window language. Anything unrecognized falls back to English.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QuickpayLanguage {
    #[default]
    En,
    Da,
    De,
    Es,
    Fi,
    Fr,
    It,
    Nl,
    No,
    Pl,
    Sv,
}

pub fn parse_language(language: Option<&str>) -> QuickpayLanguage {
    language
        .and_then(|lang| lang.parse().ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickpayOperationType {
    Authorize,
    Capture,
    Refund,
    Cancel,
    #[serde(other)]
    Other,
}

/// One entry in the gateway's append-only operation log. Snapshots are
/// read-only; only the derived status and transaction id are persisted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuickpayOperation {
    pub id: i64,
    #[serde(rename = "type")]
    pub operation_type: QuickpayOperationType,
    pub amount: MinorUnit,
    #[serde(default)]
    pub pending: bool,
    pub qp_status_code: Option<String>,
    pub qp_status_msg: Option<String>,
    pub aq_status_code: Option<String>,
    pub aq_status_msg: Option<String>,
}

impl QuickpayOperation {
    /// Approval rule on the callback path: the gateway or the acquirer
    /// reported success.
    pub fn is_approved(&self) -> bool {
        self.qp_status_code.as_deref() == Some(APPROVED_QP_STATUS_CODE)
            || self.aq_status_code.as_deref() == Some(APPROVED_AQ_STATUS_CODE)
    }

    /// Approval rule on the polling path: settled and gateway-approved.
    pub fn is_settled_and_approved(&self) -> bool {
        !self.pending && self.qp_status_code.as_deref() == Some(APPROVED_QP_STATUS_CODE)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuickpayPaymentLink {
    pub url: Option<String>,
}

/// Full payment snapshot, returned by every payment endpoint and delivered
/// as the callback body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuickpayPayment {
    pub id: i64,
    pub order_id: String,
    #[serde(default)]
    pub accepted: bool,
    pub currency: Option<Currency>,
    pub state: Option<String>,
    #[serde(default)]
    pub operations: Vec<QuickpayOperation>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    pub link: Option<QuickpayPaymentLink>,
    #[serde(default)]
    pub test_mode: bool,
    pub balance: Option<MinorUnit>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<time::OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<time::OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct QuickpayPaymentRequest {
    pub order_id: String,
    pub currency: Currency,
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct QuickpayPaymentLinkRequest {
    pub amount: MinorUnit,
    pub language: String,
    pub continue_url: String,
    pub cancel_url: String,
    pub callback_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_fee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_capture: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct QuickpayCaptureRequest {
    pub amount: MinorUnit,
}

#[derive(Debug, Serialize)]
pub struct QuickpayRefundRequest {
    pub amount: MinorUnit,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentLinkUrl {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuickpayErrorResponse {
    pub message: Option<String>,
    pub error_code: Option<String>,
    #[serde(default)]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

/// Fingerprint binding a session to the inputs it was created from. Any
/// change to payment id, order number, currency or amount invalidates the
/// stored session and forces regeneration. Not a secret, just a cheap
/// change detector.
pub fn payment_fingerprint(
    payment_id: Option<&str>,
    order_number: &str,
    currency: Currency,
    amount: MinorUnit,
) -> String {
    BASE64_ENGINE.encode(format!(
        "{}{}{}{}",
        payment_id.unwrap_or_default(),
        order_number,
        currency,
        amount
    ))
}

/// Shrink an order number to the gateway's order-id length limit, guided by
/// the store's order-number template.
///
/// The template's literal prefix/suffix tell us which end of the number is
/// boilerplate and safe to trim. A bare `"{0}"` template gives nothing to
/// trim against and the number passes through unshortened, even if it still
/// exceeds the limit; the gateway rejects it at creation in that case.
pub fn resolve_order_reference(order_number: &str, order_number_template: &str) -> String {
    let length = order_number.chars().count();
    if length <= MAX_ORDER_ID_LENGTH {
        return order_number.to_string();
    }
    if order_number_template == ORDER_NUMBER_PLACEHOLDER {
        return order_number.to_string();
    }
    let Some(index) = order_number_template.find(ORDER_NUMBER_PLACEHOLDER) else {
        return order_number.to_string();
    };

    let prefix_len = order_number_template[..index].chars().count();
    let suffix_len = order_number_template[index + ORDER_NUMBER_PLACEHOLDER.len()..]
        .chars()
        .count();

    if prefix_len == 0 {
        // Template starts with the placeholder: the tail is boilerplate.
        order_number.chars().take(MAX_ORDER_ID_LENGTH).collect()
    } else if suffix_len == 0 {
        // Template ends with the placeholder: the head is boilerplate.
        order_number
            .chars()
            .skip(length - MAX_ORDER_ID_LENGTH)
            .collect()
    } else {
        // Placeholder embedded: strip both literal ends, then clamp from the
        // start if the remainder still exceeds the limit.
        let core_len = length.saturating_sub(prefix_len + suffix_len);
        let trimmed: String = order_number
            .chars()
            .skip(prefix_len)
            .take(core_len)
            .collect();
        if core_len > MAX_ORDER_ID_LENGTH {
            trimmed
                .chars()
                .skip(core_len - MAX_ORDER_ID_LENGTH)
                .collect()
        } else {
            trimmed
        }
    }
}

pub fn payment_status_from_operation_type(operation_type: QuickpayOperationType) -> PaymentStatus {
    match operation_type {
        QuickpayOperationType::Authorize => PaymentStatus::Authorized,
        QuickpayOperationType::Capture => PaymentStatus::Captured,
        QuickpayOperationType::Refund => PaymentStatus::Refunded,
        QuickpayOperationType::Cancel => PaymentStatus::Cancelled,
        QuickpayOperationType::Other => PaymentStatus::Initialized,
    }
}

/// Latest operation that is settled and gateway-approved; pending and
/// declined attempts are skipped. This governs the polling paths.
pub fn last_settled_operation(
    operations: &[QuickpayOperation],
) -> Option<&QuickpayOperation> {
    operations
        .iter()
        .rev()
        .find(|operation| operation.is_settled_and_approved())
}

/// Whether a callback snapshot belongs to the given order. The echoed
/// `orderReference` variable is authoritative; the (possibly trimmed)
/// gateway order id is only the fallback for sessions created without
/// variables.
pub fn verify_order_linkage(payment: &QuickpayPayment, order: &WebhookOrderContext) -> bool {
    match payment.variables.get(VARIABLE_ORDER_REFERENCE) {
        Some(order_reference) => order_reference == &order.order_reference,
        None => {
            order.stored_connector_order_id.as_deref() == Some(payment.order_id.as_str())
        }
    }
}

/// Reconcile a callback delivery into a local status decision.
///
/// The most recent operation governs. Deliveries repeat and reorder under
/// at-least-once semantics, so acceptance is forward-only: a second
/// authorize is a duplicate, and a capture that arrives before any
/// authorization was recorded locally is rejected rather than applied.
pub fn reconcile_callback_operations(
    payment: &QuickpayPayment,
    current_status: PaymentStatus,
) -> WebhookOutcome {
    let Some(operation) = payment.operations.last() else {
        tracing::warn!(
            payment_id = payment.id,
            order_id = %payment.order_id,
            "callback carried no operations"
        );
        return WebhookOutcome::NoChange;
    };

    if !operation.is_approved() {
        tracing::warn!(
            payment_id = payment.id,
            order_id = %payment.order_id,
            qp_status_code = ?operation.qp_status_code,
            qp_status_msg = ?operation.qp_status_msg,
            aq_status_code = ?operation.aq_status_code,
            aq_status_msg = ?operation.aq_status_msg,
            "payment not approved"
        );
        return WebhookOutcome::NoChange;
    }

    let status = payment_status_from_operation_type(operation.operation_type);
    match status {
        PaymentStatus::Authorized if current_status != PaymentStatus::Initialized => {
            tracing::info!(
                payment_id = payment.id,
                order_id = %payment.order_id,
                %current_status,
                "authorize already recorded, treating delivery as duplicate"
            );
            WebhookOutcome::NoChange
        }
        PaymentStatus::Captured if current_status != PaymentStatus::Authorized => {
            tracing::error!(
                payment_id = payment.id,
                order_id = %payment.order_id,
                %current_status,
                "capture notified before an authorization was recorded"
            );
            WebhookOutcome::Rejected {
                reason: WebhookRejection::CaptureBeforeAuthorize,
            }
        }
        _ => WebhookOutcome::Accepted {
            status,
            transaction_id: payment.id.to_string(),
            minor_amount: operation.amount,
        },
    }
}

impl TryFrom<
        &RouterDataV2<CreateOrder, PaymentFlowData, PaymentCreateOrderData, PaymentCreateOrderResponse>,
    > for QuickpayPaymentRequest
{
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(
        item: &RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: item.request.order_id.clone(),
            currency: item.request.currency,
            variables: item.request.variables.clone(),
        })
    }
}

impl TryFrom<&RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>>
    for QuickpayPaymentLinkRequest
{
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(
        item: &RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: item.request.amount,
            language: item.request.language.clone(),
            continue_url: item.request.continue_url.clone(),
            cancel_url: item.request.cancel_url.clone(),
            callback_url: item.request.callback_url.clone(),
            payment_methods: item.request.payment_methods.clone(),
            auto_fee: item.request.auto_fee,
            auto_capture: item.request.auto_capture,
            framed: item.request.framed,
        })
    }
}

impl
    TryFrom<
        &RouterDataV2<
            Capture,
            PaymentFlowData,
            domain_types::connector_types::PaymentsCaptureData,
            PaymentsResponseData,
        >,
    > for QuickpayCaptureRequest
{
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(
        item: &RouterDataV2<
            Capture,
            PaymentFlowData,
            domain_types::connector_types::PaymentsCaptureData,
            PaymentsResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: item.request.minor_amount_to_capture,
        })
    }
}

impl
    TryFrom<
        &RouterDataV2<
            Refund,
            PaymentFlowData,
            domain_types::connector_types::RefundsData,
            PaymentsResponseData,
        >,
    > for QuickpayRefundRequest
{
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(
        item: &RouterDataV2<
            Refund,
            PaymentFlowData,
            domain_types::connector_types::RefundsData,
            PaymentsResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: item.request.minor_refund_amount,
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            QuickpayPayment,
            RouterDataV2<
                CreateOrder,
                PaymentFlowData,
                PaymentCreateOrderData,
                PaymentCreateOrderResponse,
            >,
        >,
    >
    for RouterDataV2<CreateOrder, PaymentFlowData, PaymentCreateOrderData, PaymentCreateOrderResponse>
{
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(
        item: ResponseRouterData<
            QuickpayPayment,
            RouterDataV2<
                CreateOrder,
                PaymentFlowData,
                PaymentCreateOrderData,
                PaymentCreateOrderResponse,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            response: Ok(PaymentCreateOrderResponse {
                connector_payment_id: item.response.id.to_string(),
                order_id: item.response.order_id,
            }),
            ..item.router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            PaymentLinkUrl,
            RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
        >,
    > for RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>
{
    type Error = error_stack::Report<ConnectorError>;

    fn try_from(
        item: ResponseRouterData<
            PaymentLinkUrl,
            RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            response: Ok(PaymentLinkResponse {
                url: item.response.url,
            }),
            ..item.router_data
        })
    }
}

/// Snapshot handling shared by the sync/cancel/capture/refund flows: the
/// latest settled, approved operation decides the reported status; its
/// absence reports no result and leaves local state untouched.
pub fn payments_response_from_snapshot(
    payment: &QuickpayPayment,
    http_code: u16,
) -> PaymentsResponseData {
    let operation = last_settled_operation(&payment.operations);
    PaymentsResponseData {
        resource_id: ResponseId::ConnectorTransactionId(payment.id.to_string()),
        status: operation
            .map(|operation| payment_status_from_operation_type(operation.operation_type)),
        minor_amount: operation.map(|operation| operation.amount),
        connector_response_reference_id: Some(payment.order_id.clone()),
        status_code: http_code,
    }
}

macro_rules! impl_snapshot_response {
    ($flow:ty, $request:ty) => {
        impl
            TryFrom<
                ResponseRouterData<
                    QuickpayPayment,
                    RouterDataV2<$flow, PaymentFlowData, $request, PaymentsResponseData>,
                >,
            > for RouterDataV2<$flow, PaymentFlowData, $request, PaymentsResponseData>
        {
            type Error = error_stack::Report<ConnectorError>;

            fn try_from(
                item: ResponseRouterData<
                    QuickpayPayment,
                    RouterDataV2<$flow, PaymentFlowData, $request, PaymentsResponseData>,
                >,
            ) -> Result<Self, Self::Error> {
                let response = payments_response_from_snapshot(&item.response, item.http_code);
                Ok(Self {
                    response: Ok(response),
                    ..item.router_data
                })
            }
        }
    };
}

impl_snapshot_response!(
    domain_types::connector_flow::PSync,
    domain_types::connector_types::PaymentsSyncData
);
impl_snapshot_response!(
    domain_types::connector_flow::Void,
    domain_types::connector_types::PaymentVoidData
);
impl_snapshot_response!(Capture, domain_types::connector_types::PaymentsCaptureData);
impl_snapshot_response!(Refund, domain_types::connector_types::RefundsData);
