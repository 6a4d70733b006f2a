use common_utils::errors::CustomResult;
use domain_types::{
    connector_flow,
    connector_types::{
        ConnectorWebhookSecrets, EventType, PaymentCreateOrderData, PaymentCreateOrderResponse,
        PaymentFlowData, PaymentLinkData, PaymentLinkResponse, PaymentVoidData,
        PaymentsCaptureData, PaymentsResponseData, PaymentsSyncData, RefundsData, RequestDetails,
        WebhookOrderContext, WebhookOutcome,
    },
    errors::ConnectorError,
    router_data::ConnectorAuthType,
};

use crate::{api::ConnectorCommon, connector_integration_v2::ConnectorIntegrationV2,
    verification::SourceVerification};

pub trait PaymentOrderCreate:
    ConnectorIntegrationV2<
    connector_flow::CreateOrder,
    PaymentFlowData,
    PaymentCreateOrderData,
    PaymentCreateOrderResponse,
>
{
}

pub trait PaymentLinkCreate:
    ConnectorIntegrationV2<
    connector_flow::CreateLink,
    PaymentFlowData,
    PaymentLinkData,
    PaymentLinkResponse,
>
{
}

pub trait PaymentSyncV2:
    ConnectorIntegrationV2<
    connector_flow::PSync,
    PaymentFlowData,
    PaymentsSyncData,
    PaymentsResponseData,
>
{
}

pub trait PaymentVoidV2:
    ConnectorIntegrationV2<connector_flow::Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>
{
}

pub trait PaymentCapture:
    ConnectorIntegrationV2<
    connector_flow::Capture,
    PaymentFlowData,
    PaymentsCaptureData,
    PaymentsResponseData,
>
{
}

pub trait RefundV2:
    ConnectorIntegrationV2<connector_flow::Refund, PaymentFlowData, RefundsData, PaymentsResponseData>
{
}

/// Server-to-server callback handling: authenticate the delivery, classify
/// it, and reconcile it against the local order state.
pub trait IncomingWebhook: SourceVerification {
    fn verify_webhook_source(
        &self,
        _request: &RequestDetails,
        _connector_webhook_secret: Option<&ConnectorWebhookSecrets>,
        _connector_account_details: Option<&ConnectorAuthType>,
    ) -> CustomResult<bool, ConnectorError> {
        Ok(false)
    }

    fn get_webhook_source_verification_signature(
        &self,
        _request: &RequestDetails,
        _connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(Vec::new())
    }

    fn get_webhook_source_verification_message(
        &self,
        request: &RequestDetails,
        _connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(request.body.clone())
    }

    fn get_event_type(
        &self,
        _request: &RequestDetails,
    ) -> CustomResult<EventType, ConnectorError> {
        Err(ConnectorError::NotImplemented("get_event_type".to_string()).into())
    }

    fn process_payment_webhook(
        &self,
        _request: &RequestDetails,
        _order: &WebhookOrderContext,
    ) -> CustomResult<WebhookOutcome, ConnectorError> {
        Err(ConnectorError::NotImplemented("process_payment_webhook".to_string()).into())
    }
}

/// Everything a registered connector must provide.
pub trait ConnectorServiceTrait:
    ConnectorCommon
    + PaymentOrderCreate
    + PaymentLinkCreate
    + PaymentSyncV2
    + PaymentVoidV2
    + PaymentCapture
    + RefundV2
    + IncomingWebhook
{
}

pub type BoxedConnector = Box<&'static (dyn ConnectorServiceTrait + Sync)>;
