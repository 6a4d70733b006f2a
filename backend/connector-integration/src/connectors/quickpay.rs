pub mod transformers;
#[cfg(test)]
mod test;

use base64::Engine;
use common_enums::CurrencyUnit;
use common_utils::{
    consts::{BASE64_ENGINE, NO_ERROR_CODE, NO_ERROR_MESSAGE},
    crypto,
    errors::CustomResult,
    ext_traits::{ByteSliceExt, Encode},
    request::{Method, RequestContent},
    types::Response,
    Mask, Maskable, PeekInterface,
};
use domain_types::{
    connector_flow::{Capture, CreateLink, CreateOrder, PSync, Refund, Void},
    connector_types::{
        ConnectorWebhookSecrets, EventType, PaymentCreateOrderData, PaymentCreateOrderResponse,
        PaymentFlowData, PaymentLinkData, PaymentLinkResponse, PaymentVoidData,
        PaymentsCaptureData, PaymentsResponseData, PaymentsSyncData, RefundsData, RequestDetails,
        WebhookOrderContext, WebhookOutcome,
    },
    errors::ConnectorError,
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    types::Connectors,
};
use error_stack::ResultExt;
use interfaces::{
    api::ConnectorCommon,
    connector_integration_v2::ConnectorIntegrationV2,
    connector_types,
    verification::{ConnectorSourceVerificationSecrets, SourceVerification},
};
use transformers as quickpay;

use crate::{types::ResponseRouterData, utils::get_header_ignore_case};

pub(crate) mod headers {
    pub(crate) const CONTENT_TYPE: &str = "Content-Type";
    pub(crate) const AUTHORIZATION: &str = "Authorization";
    pub(crate) const ACCEPT_VERSION: &str = "Accept-Version";
}

/// API version pinned by the gateway contract.
pub const API_VERSION: &str = "v10";

/// Callback authentication header carrying the hex HMAC-SHA256 of the raw
/// request body, keyed by the merchant private key.
pub const CHECKSUM_HEADER: &str = "Quickpay-Checksum-Sha256";

#[derive(Clone, Debug, Default)]
pub struct Quickpay;

impl Quickpay {
    pub const fn new() -> &'static Self {
        &Self
    }

    pub fn build_headers<F, Req, Res>(
        &self,
        req: &RouterDataV2<F, PaymentFlowData, Req, Res>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        let mut header = vec![
            (
                headers::CONTENT_TYPE.to_string(),
                self.common_get_content_type().to_string().into(),
            ),
            (
                headers::ACCEPT_VERSION.to_string(),
                API_VERSION.to_string().into(),
            ),
        ];
        let mut api_key = self.get_auth_header(&req.connector_auth_type)?;
        header.append(&mut api_key);
        Ok(header)
    }

    pub fn connector_base_url<'a, F, Req, Res>(
        &self,
        req: &'a RouterDataV2<F, PaymentFlowData, Req, Res>,
    ) -> &'a str {
        &req.resource_common_data.connectors.quickpay.base_url
    }
}

impl ConnectorCommon for Quickpay {
    fn id(&self) -> &'static str {
        "quickpay"
    }

    fn get_currency_unit(&self) -> CurrencyUnit {
        CurrencyUnit::Minor
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.quickpay.base_url.as_ref()
    }

    fn get_auth_header(
        &self,
        auth_type: &ConnectorAuthType,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        let auth = quickpay::QuickpayAuthType::try_from(auth_type)
            .change_context(ConnectorError::FailedToObtainAuthType)?;
        let encoded_api_key = BASE64_ENGINE.encode(format!(":{}", auth.api_key.peek()));
        Ok(vec![(
            headers::AUTHORIZATION.to_string(),
            format!("Basic {encoded_api_key}").into_masked(),
        )])
    }

    fn build_error_response(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        let response: quickpay::QuickpayErrorResponse = res
            .response
            .parse_struct("QuickpayErrorResponse")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;

        let reason = response
            .errors
            .as_ref()
            .map(|errors| {
                errors
                    .iter()
                    .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .or_else(|| response.message.clone());

        Ok(ErrorResponse {
            status_code: res.status_code,
            code: response
                .error_code
                .unwrap_or_else(|| NO_ERROR_CODE.to_string()),
            message: response
                .message
                .unwrap_or_else(|| NO_ERROR_MESSAGE.to_string()),
            reason,
            status: None,
            connector_transaction_id: None,
        })
    }
}

impl connector_types::ConnectorServiceTrait for Quickpay {}
impl connector_types::PaymentOrderCreate for Quickpay {}
impl connector_types::PaymentLinkCreate for Quickpay {}
impl connector_types::PaymentSyncV2 for Quickpay {}
impl connector_types::PaymentVoidV2 for Quickpay {}
impl connector_types::PaymentCapture for Quickpay {}
impl connector_types::RefundV2 for Quickpay {}

impl
    ConnectorIntegrationV2<
        CreateOrder,
        PaymentFlowData,
        PaymentCreateOrderData,
        PaymentCreateOrderResponse,
    > for Quickpay
{
    fn get_headers(
        &self,
        req: &RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        >,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        self.build_headers(req)
    }

    fn get_url(
        &self,
        req: &RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        >,
    ) -> CustomResult<String, ConnectorError> {
        Ok(format!("{}/payments", self.connector_base_url(req)))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        >,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = quickpay::QuickpayPaymentRequest::try_from(req)?;
        let body = connector_req
            .encode_to_value()
            .change_context(ConnectorError::RequestEncodingFailed)?;
        Ok(Some(RequestContent::Json(body)))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        >,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<CreateOrder, PaymentFlowData, PaymentCreateOrderData, PaymentCreateOrderResponse>,
        ConnectorError,
    > {
        let response: quickpay::QuickpayPayment = res
            .response
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
        .change_context(ConnectorError::ResponseHandlingFailed)
    }

    fn get_error_response_v2(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res)
    }
}

impl ConnectorIntegrationV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>
    for Quickpay
{
    fn get_http_method(&self) -> Method {
        Method::Put
    }

    fn get_headers(
        &self,
        req: &RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        self.build_headers(req)
    }

    fn get_url(
        &self,
        req: &RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(format!(
            "{}/payments/{}/link",
            self.connector_base_url(req),
            req.request.connector_payment_id
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = quickpay::QuickpayPaymentLinkRequest::try_from(req)?;
        let body = connector_req
            .encode_to_value()
            .change_context(ConnectorError::RequestEncodingFailed)?;
        Ok(Some(RequestContent::Json(body)))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<CreateLink, PaymentFlowData, PaymentLinkData, PaymentLinkResponse>,
        ConnectorError,
    > {
        let response: quickpay::PaymentLinkUrl = res
            .response
            .parse_struct("PaymentLinkUrl")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
        .change_context(ConnectorError::ResponseHandlingFailed)
    }

    fn get_error_response_v2(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res)
    }
}

impl ConnectorIntegrationV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>
    for Quickpay
{
    fn get_http_method(&self) -> Method {
        Method::Get
    }

    fn get_headers(
        &self,
        req: &RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        self.build_headers(req)
    }

    fn get_url(
        &self,
        req: &RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(format!(
            "{}/payments/{}",
            self.connector_base_url(req),
            req.request.connector_transaction_id
        ))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>,
        ConnectorError,
    > {
        let response: quickpay::QuickpayPayment = res
            .response
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
        .change_context(ConnectorError::ResponseHandlingFailed)
    }

    fn get_error_response_v2(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res)
    }
}

impl ConnectorIntegrationV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>
    for Quickpay
{
    fn get_headers(
        &self,
        req: &RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        self.build_headers(req)
    }

    fn get_url(
        &self,
        req: &RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(format!(
            "{}/payments/{}/cancel?synchronized",
            self.connector_base_url(req),
            req.request.connector_transaction_id
        ))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
        ConnectorError,
    > {
        let response: quickpay::QuickpayPayment = res
            .response
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
        .change_context(ConnectorError::ResponseHandlingFailed)
    }

    fn get_error_response_v2(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res)
    }
}

impl ConnectorIntegrationV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>
    for Quickpay
{
    fn get_headers(
        &self,
        req: &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        self.build_headers(req)
    }

    fn get_url(
        &self,
        req: &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(format!(
            "{}/payments/{}/capture?synchronized",
            self.connector_base_url(req),
            req.request.connector_transaction_id
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = quickpay::QuickpayCaptureRequest::try_from(req)?;
        let body = connector_req
            .encode_to_value()
            .change_context(ConnectorError::RequestEncodingFailed)?;
        Ok(Some(RequestContent::Json(body)))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        ConnectorError,
    > {
        let response: quickpay::QuickpayPayment = res
            .response
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
        .change_context(ConnectorError::ResponseHandlingFailed)
    }

    fn get_error_response_v2(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res)
    }
}

impl ConnectorIntegrationV2<Refund, PaymentFlowData, RefundsData, PaymentsResponseData>
    for Quickpay
{
    fn get_headers(
        &self,
        req: &RouterDataV2<Refund, PaymentFlowData, RefundsData, PaymentsResponseData>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        self.build_headers(req)
    }

    fn get_url(
        &self,
        req: &RouterDataV2<Refund, PaymentFlowData, RefundsData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(format!(
            "{}/payments/{}/refund?synchronized",
            self.connector_base_url(req),
            req.request.connector_transaction_id
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<Refund, PaymentFlowData, RefundsData, PaymentsResponseData>,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = quickpay::QuickpayRefundRequest::try_from(req)?;
        let body = connector_req
            .encode_to_value()
            .change_context(ConnectorError::RequestEncodingFailed)?;
        Ok(Some(RequestContent::Json(body)))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<Refund, PaymentFlowData, RefundsData, PaymentsResponseData>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<Refund, PaymentFlowData, RefundsData, PaymentsResponseData>,
        ConnectorError,
    > {
        let response: quickpay::QuickpayPayment = res
            .response
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
        .change_context(ConnectorError::ResponseHandlingFailed)
    }

    fn get_error_response_v2(
        &self,
        res: Response,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res)
    }
}

impl SourceVerification for Quickpay {
    fn get_secrets(
        &self,
        secrets: ConnectorSourceVerificationSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        match secrets {
            ConnectorSourceVerificationSecrets::WebhookSecret(secrets) => Ok(secrets.secret),
            ConnectorSourceVerificationSecrets::AuthHeaders(auth) => {
                let auth = quickpay::QuickpayAuthType::try_from(&auth)?;
                Ok(auth.private_key.peek().as_bytes().to_vec())
            }
        }
    }

    fn get_algorithm(
        &self,
    ) -> CustomResult<Box<dyn crypto::VerifySignature + Send>, ConnectorError> {
        Ok(Box::new(crypto::HmacSha256))
    }
}

impl connector_types::IncomingWebhook for Quickpay {
    fn get_webhook_source_verification_signature(
        &self,
        request: &RequestDetails,
        _connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        let checksum = get_header_ignore_case(&request.headers, CHECKSUM_HEADER)
            .map(str::trim)
            .unwrap_or_default();
        // A missing, empty or malformed checksum never matches; the caller
        // rejects on the resulting verification failure.
        Ok(hex::decode(checksum).unwrap_or_default())
    }

    fn verify_webhook_source(
        &self,
        request: &RequestDetails,
        connector_webhook_secret: Option<&ConnectorWebhookSecrets>,
        connector_account_details: Option<&ConnectorAuthType>,
    ) -> CustomResult<bool, ConnectorError> {
        let secret = match (connector_webhook_secret, connector_account_details) {
            (Some(secrets), _) => secrets.secret.clone(),
            (None, Some(auth)) => {
                let auth = quickpay::QuickpayAuthType::try_from(auth)?;
                auth.private_key.peek().as_bytes().to_vec()
            }
            (None, None) => {
                return Err(ConnectorError::WebhookSourceVerificationFailed.into())
            }
        };

        let signature = self.get_webhook_source_verification_signature(
            request,
            &ConnectorWebhookSecrets {
                secret: secret.clone(),
                additional_secret: None,
            },
        )?;
        if signature.is_empty() {
            return Ok(false);
        }

        let algorithm = crypto::HmacSha256;
        crypto::VerifySignature::verify_signature(&algorithm, &secret, &signature, &request.body)
            .change_context(ConnectorError::WebhookSourceVerificationFailed)
    }

    fn get_event_type(
        &self,
        request: &RequestDetails,
    ) -> CustomResult<EventType, ConnectorError> {
        let payment: quickpay::QuickpayPayment = request
            .body
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::WebhookBodyDecodingFailed)?;
        let event = match payment.operations.last() {
            Some(operation) => match operation.operation_type {
                quickpay::QuickpayOperationType::Authorize => EventType::PaymentAuthorized,
                quickpay::QuickpayOperationType::Capture => EventType::PaymentCaptured,
                quickpay::QuickpayOperationType::Refund => EventType::PaymentRefunded,
                quickpay::QuickpayOperationType::Cancel => EventType::PaymentCancelled,
                quickpay::QuickpayOperationType::Other => {
                    EventType::IncomingWebhookEventUnspecified
                }
            },
            None => EventType::IncomingWebhookEventUnspecified,
        };
        Ok(event)
    }

    fn process_payment_webhook(
        &self,
        request: &RequestDetails,
        order: &WebhookOrderContext,
    ) -> CustomResult<WebhookOutcome, ConnectorError> {
        let payment: quickpay::QuickpayPayment = request
            .body
            .parse_struct("QuickpayPayment")
            .change_context(ConnectorError::WebhookBodyDecodingFailed)?;

        if !quickpay::verify_order_linkage(&payment, order) {
            tracing::warn!(
                payment_id = payment.id,
                connector_order_id = %payment.order_id,
                order_reference = %order.order_reference,
                "could not verify that the callback belongs to this order"
            );
            return Ok(WebhookOutcome::NoChange);
        }

        Ok(quickpay::reconcile_callback_operations(
            &payment,
            order.current_status,
        ))
    }
}
