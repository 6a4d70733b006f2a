//! Host-facing checkout surface for the Quickpay gateway: idempotent
//! session + payment-link generation, callback reconciliation, and the
//! explicit status/cancel/capture/refund actions.

use std::{collections::HashMap, marker::PhantomData, time::Duration};

use base64::Engine;
use common_enums::{Currency, PaymentStatus};
use common_utils::{
    consts::BASE64_ENGINE,
    errors::CustomResult,
    request::Method,
    types::{FloatMajorUnit, MinorUnit},
    Secret,
};
use connector_integration::connectors::quickpay::{
    transformers::{
        parse_language, payment_fingerprint, resolve_order_reference, VARIABLE_ORDER_ID,
        VARIABLE_ORDER_NUMBER, VARIABLE_ORDER_REFERENCE,
    },
    Quickpay,
};
use domain_types::{
    connector_flow::{Capture, CreateLink, CreateOrder, PSync, Refund, Void},
    connector_types::{
        PaymentCreateOrderData, PaymentCreateOrderResponse, PaymentFlowData, PaymentLinkData,
        PaymentLinkResponse, PaymentVoidData, PaymentsCaptureData, PaymentsResponseData,
        PaymentsSyncData, RefundsData, RequestDetails, WebhookOrderContext, WebhookOutcome,
        WebhookRejection,
    },
    errors::{ApiClientError, ConnectorError},
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    types::Connectors,
};
use error_stack::ResultExt;
use interfaces::{
    connector_integration_v2::{BoxedConnectorIntegrationV2, ConnectorIntegrationAnyV2},
    connector_types::IncomingWebhook,
};

use crate::{config::AppConfig, service};

/// Order properties persisted by the host between invocations. The names
/// are part of the stored-metadata contract and never change.
pub const META_ORDER_ID: &str = "quickPayOrderId";
pub const META_PAYMENT_ID: &str = "quickPayPaymentId";
pub const META_PAYMENT_HASH: &str = "quickPayPaymentHash";
pub const META_LINK_HASH: &str = "quickPayPaymentLinkHash";

const CONNECTOR_NAME: &str = "quickpay";

/// Merchant-level settings as configured on the store.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct QuickpayCheckoutSettings {
    pub continue_url: String,
    pub cancel_url: String,
    pub error_url: String,
    pub api_key: Secret<String>,
    pub private_key: Secret<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub agreement_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Comma-separated allow-list passed to the payment window.
    #[serde(default)]
    pub payment_methods: Option<String>,
    #[serde(default)]
    pub auto_fee: bool,
    #[serde(default)]
    pub auto_capture: bool,
    #[serde(default)]
    pub framed: bool,
}

/// The host's view of one order, read once per invocation.
#[derive(Clone, Debug)]
pub struct OrderContext {
    pub order_id: String,
    pub order_number: String,
    pub order_reference: String,
    pub currency_code: String,
    pub minor_amount: MinorUnit,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    /// Stored gateway metadata from previous invocations.
    pub properties: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct PaymentProviderContext {
    pub order: OrderContext,
    pub settings: QuickpayCheckoutSettings,
    /// Host endpoint the gateway posts callbacks to.
    pub callback_url: String,
    /// The store's order-number template, e.g. `"ORDER-{0}"`.
    pub order_number_template: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaymentForm {
    pub url: String,
    pub method: Method,
}

/// Result of a checkout render: updated metadata to persist plus the
/// redirect form, absent when session creation failed.
#[derive(Clone, Debug)]
pub struct PaymentFormResult {
    pub metadata: HashMap<String, String>,
    pub form: Option<PaymentForm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionInfo {
    pub transaction_id: String,
    pub payment_status: PaymentStatus,
    pub amount_authorized: Option<FloatMajorUnit>,
}

/// Callback processing outcome handed back to the host. `Ignored` must be
/// acknowledged to the gateway without touching local state; `Rejected`
/// maps to a rejected-request response.
#[derive(Clone, Debug, PartialEq)]
pub enum CallbackResult {
    Accepted(TransactionInfo),
    Ignored,
    Rejected(WebhookRejection),
}

/// Result of an explicit payment action. `NoResult` leaves the persisted
/// status untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResult {
    Updated {
        transaction_id: String,
        payment_status: PaymentStatus,
    },
    NoResult,
}

pub struct QuickpayCheckoutService {
    client: reqwest::Client,
    connectors: Connectors,
}

impl QuickpayCheckoutService {
    pub const CAN_FETCH_PAYMENT_STATUS: bool = true;
    pub const CAN_CANCEL_PAYMENTS: bool = true;
    pub const CAN_CAPTURE_PAYMENTS: bool = true;
    pub const CAN_REFUND_PAYMENTS: bool = true;
    pub const FINALIZE_AT_CONTINUE_URL: bool = false;

    pub fn new(config: &AppConfig) -> CustomResult<Self, ApiClientError> {
        let client = service::create_client(
            &config.proxy,
            Duration::from_secs(config.client.timeout_secs),
        )?;
        Ok(Self {
            client,
            connectors: config.connectors.clone(),
        })
    }

    fn auth_type(settings: &QuickpayCheckoutSettings) -> ConnectorAuthType {
        ConnectorAuthType::BodyKey {
            api_key: settings.api_key.clone(),
            key1: settings.private_key.clone(),
        }
    }

    fn validate_settings(settings: &QuickpayCheckoutSettings) -> CustomResult<(), ConnectorError> {
        for (value, name) in [
            (&settings.continue_url, "continue_url"),
            (&settings.cancel_url, "cancel_url"),
            (&settings.error_url, "error_url"),
        ] {
            if value.trim().is_empty() || url::Url::parse(value).is_err() {
                return Err(ConnectorError::InvalidConnectorConfig { config: name }.into());
            }
        }
        Ok(())
    }

    fn parse_currency(currency_code: &str) -> CustomResult<Currency, ConnectorError> {
        currency_code
            .to_uppercase()
            .parse()
            .map_err(|_| {
                ConnectorError::CurrencyNotSupported {
                    currency: currency_code.to_string(),
                }
                .into()
            })
    }

    fn flow_data(
        ctx: &PaymentProviderContext,
        currency: Currency,
        connector_request_reference_id: String,
        connectors: Connectors,
    ) -> PaymentFlowData {
        PaymentFlowData {
            order_id: ctx.order.order_id.clone(),
            order_number: ctx.order.order_number.clone(),
            order_reference: ctx.order.order_reference.clone(),
            currency,
            minor_amount: ctx.order.minor_amount,
            status: ctx.order.payment_status,
            connector_request_reference_id,
            test_mode: None,
            connectors,
        }
    }

    fn pending_response<Resp>() -> Result<Resp, ErrorResponse> {
        Err(ErrorResponse {
            status_code: 0,
            code: common_utils::consts::NO_ERROR_CODE.to_string(),
            message: common_utils::consts::NO_ERROR_MESSAGE.to_string(),
            reason: None,
            status: None,
            connector_transaction_id: None,
        })
    }

    /// Render-time session orchestration. A fingerprint over (payment id,
    /// order number, currency, amount) decides whether the stored session
    /// and link are still valid; only a stale or absent fingerprint causes
    /// remote calls, so repeated checkout renders never create duplicate
    /// gateway sessions.
    #[tracing::instrument(skip_all, fields(order_number = %ctx.order.order_number))]
    pub async fn generate_payment_form(
        &self,
        ctx: &PaymentProviderContext,
    ) -> CustomResult<PaymentFormResult, ConnectorError> {
        Self::validate_settings(&ctx.settings)?;
        let currency = Self::parse_currency(&ctx.order.currency_code)?;
        let order_amount = ctx.order.minor_amount;

        let stored_payment_id = ctx
            .order
            .properties
            .get(META_PAYMENT_ID)
            .filter(|id| !id.is_empty())
            .cloned();
        let stored_hash = ctx
            .order
            .properties
            .get(META_PAYMENT_HASH)
            .cloned()
            .unwrap_or_default();
        let stored_link = ctx
            .order
            .properties
            .get(META_LINK_HASH)
            .and_then(|encoded| BASE64_ENGINE.decode(encoded).ok())
            .and_then(|decoded| String::from_utf8(decoded).ok());

        let expected_hash = payment_fingerprint(
            stored_payment_id.as_deref(),
            &ctx.order.order_number,
            currency,
            order_amount,
        );

        if stored_hash == expected_hash {
            if let Some(link) = stored_link {
                tracing::debug!("stored payment session still valid, reusing link");
                let mut metadata = HashMap::new();
                for key in [META_ORDER_ID, META_PAYMENT_ID, META_PAYMENT_HASH, META_LINK_HASH] {
                    if let Some(value) = ctx.order.properties.get(key) {
                        metadata.insert(key.to_string(), value.clone());
                    }
                }
                return Ok(PaymentFormResult {
                    metadata,
                    form: Some(PaymentForm {
                        url: link,
                        method: Method::Get,
                    }),
                });
            }
        }

        match self.create_session(ctx, currency).await {
            Ok(result) => Ok(result),
            Err(error) => {
                tracing::error!(
                    order_number = %ctx.order.order_number,
                    ?error,
                    "error creating payment"
                );
                Ok(PaymentFormResult {
                    metadata: ctx.order.properties.clone(),
                    form: None,
                })
            }
        }
    }

    async fn create_session(
        &self,
        ctx: &PaymentProviderContext,
        currency: Currency,
    ) -> CustomResult<PaymentFormResult, ConnectorError> {
        let connector = Quickpay::new();
        let reference =
            resolve_order_reference(&ctx.order.order_number, &ctx.order_number_template);

        let variables = HashMap::from([
            (
                VARIABLE_ORDER_REFERENCE.to_string(),
                ctx.order.order_reference.clone(),
            ),
            (VARIABLE_ORDER_ID.to_string(), ctx.order.order_id.clone()),
            (
                VARIABLE_ORDER_NUMBER.to_string(),
                ctx.order.order_number.clone(),
            ),
        ]);

        let order_router_data: RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        > = RouterDataV2 {
            flow: PhantomData,
            resource_common_data: Self::flow_data(
                ctx,
                currency,
                reference.clone(),
                self.connectors.clone(),
            ),
            connector_auth_type: Self::auth_type(&ctx.settings),
            request: PaymentCreateOrderData {
                order_id: reference.clone(),
                currency,
                variables,
            },
            response: Self::pending_response(),
        };

        let connector_integration: BoxedConnectorIntegrationV2<
            '_,
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        > = connector.get_connector_integration_v2();
        let order_result = service::execute_connector_processing_step(
            &self.client,
            connector_integration,
            order_router_data,
            CONNECTOR_NAME,
        )
        .await?;

        let created = order_result
            .response
            .map_err(|error| {
                error_stack::report!(ConnectorError::ResponseHandlingFailed).attach_printable(
                    format!(
                        "payment session creation failed: code {} ({})",
                        error.code, error.message
                    ),
                )
            })?;

        let link_router_data: RouterDataV2<
            CreateLink,
            PaymentFlowData,
            PaymentLinkData,
            PaymentLinkResponse,
        > = RouterDataV2 {
            flow: PhantomData,
            resource_common_data: Self::flow_data(
                ctx,
                currency,
                reference.clone(),
                self.connectors.clone(),
            ),
            connector_auth_type: Self::auth_type(&ctx.settings),
            request: PaymentLinkData {
                connector_payment_id: created.connector_payment_id.clone(),
                amount: ctx.order.minor_amount,
                language: parse_language(ctx.settings.language.as_deref()).to_string(),
                continue_url: ctx.settings.continue_url.clone(),
                cancel_url: ctx.settings.cancel_url.clone(),
                callback_url: ctx.callback_url.clone(),
                payment_methods: normalize_payment_methods(
                    ctx.settings.payment_methods.as_deref(),
                ),
                auto_fee: Some(ctx.settings.auto_fee),
                auto_capture: Some(ctx.settings.auto_capture),
                framed: Some(ctx.settings.framed),
            },
            response: Self::pending_response(),
        };

        let connector_integration: BoxedConnectorIntegrationV2<
            '_,
            CreateLink,
            PaymentFlowData,
            PaymentLinkData,
            PaymentLinkResponse,
        > = connector.get_connector_integration_v2();
        let link_result = service::execute_connector_processing_step(
            &self.client,
            connector_integration,
            link_router_data,
            CONNECTOR_NAME,
        )
        .await?;

        let link = link_result
            .response
            .map_err(|error| {
                error_stack::report!(ConnectorError::ResponseHandlingFailed).attach_printable(
                    format!(
                        "payment link creation failed: code {} ({})",
                        error.code, error.message
                    ),
                )
            })?;

        let payment_hash = payment_fingerprint(
            Some(&created.connector_payment_id),
            &ctx.order.order_number,
            currency,
            ctx.order.minor_amount,
        );
        let link_hash = BASE64_ENGINE.encode(&link.url);

        let metadata = HashMap::from([
            (META_ORDER_ID.to_string(), reference),
            (
                META_PAYMENT_ID.to_string(),
                created.connector_payment_id.clone(),
            ),
            (META_PAYMENT_HASH.to_string(), payment_hash),
            (META_LINK_HASH.to_string(), link_hash),
        ]);

        Ok(PaymentFormResult {
            metadata,
            form: Some(PaymentForm {
                url: link.url,
                method: Method::Get,
            }),
        })
    }

    /// Reconcile one callback delivery. The checksum gate runs first over
    /// the raw body; nothing is mutated when it fails. Verification and
    /// reconciliation then run against the order context the host passed
    /// in.
    #[tracing::instrument(skip_all, fields(order_number = %ctx.order.order_number))]
    pub fn process_callback(
        &self,
        ctx: &PaymentProviderContext,
        request: &RequestDetails,
    ) -> CustomResult<CallbackResult, ConnectorError> {
        let connector = Quickpay::new();
        let auth = Self::auth_type(&ctx.settings);

        let verified = connector.verify_webhook_source(request, None, Some(&auth))?;
        if !verified {
            tracing::warn!(
                order_number = %ctx.order.order_number,
                "checksum validation failed"
            );
            return Ok(CallbackResult::Rejected(WebhookRejection::ChecksumMismatch));
        }

        let order_context = WebhookOrderContext {
            order_reference: ctx.order.order_reference.clone(),
            stored_connector_order_id: ctx.order.properties.get(META_ORDER_ID).cloned(),
            current_status: ctx.order.payment_status,
        };

        let outcome = match connector.process_payment_webhook(request, &order_context) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(
                    order_number = %ctx.order.order_number,
                    ?error,
                    "error processing callback"
                );
                return Ok(CallbackResult::Ignored);
            }
        };

        match outcome {
            WebhookOutcome::Accepted {
                status,
                transaction_id,
                minor_amount,
            } => {
                let currency = Self::parse_currency(&ctx.order.currency_code)?;
                let amount_authorized = minor_amount
                    .to_major_unit_as_f64(currency)
                    .change_context(ConnectorError::AmountConversionFailed)?;
                Ok(CallbackResult::Accepted(TransactionInfo {
                    transaction_id,
                    payment_status: status,
                    amount_authorized: Some(amount_authorized),
                }))
            }
            WebhookOutcome::NoChange => Ok(CallbackResult::Ignored),
            WebhookOutcome::Rejected { reason } => Ok(CallbackResult::Rejected(reason)),
        }
    }

    fn transaction_id(ctx: &PaymentProviderContext) -> CustomResult<String, ConnectorError> {
        ctx.order
            .transaction_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConnectorError::MissingConnectorTransactionID.into())
    }

    fn into_api_result(
        result: Result<PaymentsResponseData, ErrorResponse>,
        order_number: &str,
        action: &'static str,
    ) -> ApiResult {
        match result {
            Ok(response) => match response.status {
                Some(payment_status) => match response.resource_id.get_connector_transaction_id() {
                    Ok(transaction_id) => ApiResult::Updated {
                        transaction_id,
                        payment_status,
                    },
                    Err(_) => ApiResult::NoResult,
                },
                None => {
                    tracing::debug!(order_number, action, "no settled approved operation yet");
                    ApiResult::NoResult
                }
            },
            Err(error) => {
                tracing::warn!(
                    order_number,
                    action,
                    code = %error.code,
                    message = %error.message,
                    status_code = u64::from(error.status_code),
                    "gateway rejected the request"
                );
                ApiResult::NoResult
            }
        }
    }

    async fn run_payment_action<F, Req>(
        &self,
        ctx: &PaymentProviderContext,
        request: Req,
        action: &'static str,
    ) -> CustomResult<ApiResult, ConnectorError>
    where
        F: Clone + Send + Sync + 'static,
        Req: Clone + std::fmt::Debug + Send + Sync + 'static,
        Quickpay: interfaces::connector_integration_v2::ConnectorIntegrationV2<
            F,
            PaymentFlowData,
            Req,
            PaymentsResponseData,
        >,
    {
        let currency = Self::parse_currency(&ctx.order.currency_code)?;
        let connector = Quickpay::new();

        let router_data: RouterDataV2<F, PaymentFlowData, Req, PaymentsResponseData> =
            RouterDataV2 {
                flow: PhantomData,
                resource_common_data: Self::flow_data(
                    ctx,
                    currency,
                    ctx.order
                        .properties
                        .get(META_ORDER_ID)
                        .cloned()
                        .unwrap_or_else(|| ctx.order.order_number.clone()),
                    self.connectors.clone(),
                ),
                connector_auth_type: Self::auth_type(&ctx.settings),
                request,
                response: Self::pending_response(),
            };

        let connector_integration: BoxedConnectorIntegrationV2<
            '_,
            F,
            PaymentFlowData,
            Req,
            PaymentsResponseData,
        > = connector.get_connector_integration_v2();

        match service::execute_connector_processing_step(
            &self.client,
            connector_integration,
            router_data,
            CONNECTOR_NAME,
        )
        .await
        {
            Ok(result) => Ok(Self::into_api_result(
                result.response,
                &ctx.order.order_number,
                action,
            )),
            Err(error) => {
                tracing::error!(
                    order_number = %ctx.order.order_number,
                    action,
                    ?error,
                    "gateway call failed"
                );
                Ok(ApiResult::NoResult)
            }
        }
    }

    /// GET /payments/{id}; the latest settled approved operation governs.
    #[tracing::instrument(skip_all, fields(order_number = %ctx.order.order_number))]
    pub async fn fetch_payment_status(
        &self,
        ctx: &PaymentProviderContext,
    ) -> CustomResult<ApiResult, ConnectorError> {
        let connector_transaction_id = Self::transaction_id(ctx)?;
        self.run_payment_action::<PSync, _>(
            ctx,
            PaymentsSyncData {
                connector_transaction_id,
            },
            "fetch_payment_status",
        )
        .await
    }

    /// POST /payments/{id}/cancel?synchronized.
    #[tracing::instrument(skip_all, fields(order_number = %ctx.order.order_number))]
    pub async fn cancel_payment(
        &self,
        ctx: &PaymentProviderContext,
    ) -> CustomResult<ApiResult, ConnectorError> {
        let connector_transaction_id = Self::transaction_id(ctx)?;
        self.run_payment_action::<Void, _>(
            ctx,
            PaymentVoidData {
                connector_transaction_id,
            },
            "cancel_payment",
        )
        .await
    }

    /// POST /payments/{id}/capture?synchronized with the authorized amount.
    #[tracing::instrument(skip_all, fields(order_number = %ctx.order.order_number))]
    pub async fn capture_payment(
        &self,
        ctx: &PaymentProviderContext,
    ) -> CustomResult<ApiResult, ConnectorError> {
        let connector_transaction_id = Self::transaction_id(ctx)?;
        let currency = Self::parse_currency(&ctx.order.currency_code)?;
        self.run_payment_action::<Capture, _>(
            ctx,
            PaymentsCaptureData {
                connector_transaction_id,
                minor_amount_to_capture: ctx.order.minor_amount,
                currency,
            },
            "capture_payment",
        )
        .await
    }

    /// POST /payments/{id}/refund?synchronized with the authorized amount.
    #[tracing::instrument(skip_all, fields(order_number = %ctx.order.order_number))]
    pub async fn refund_payment(
        &self,
        ctx: &PaymentProviderContext,
    ) -> CustomResult<ApiResult, ConnectorError> {
        let connector_transaction_id = Self::transaction_id(ctx)?;
        let currency = Self::parse_currency(&ctx.order.currency_code)?;
        self.run_payment_action::<Refund, _>(
            ctx,
            RefundsData {
                connector_transaction_id,
                minor_refund_amount: ctx.order.minor_amount,
                currency,
            },
            "refund_payment",
        )
        .await
    }
}

/// Split the configured allow-list on commas, trim entries, drop empties.
fn normalize_payment_methods(payment_methods: Option<&str>) -> Option<String> {
    let normalized = payment_methods?
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!normalized.is_empty()).then_some(normalized)
}
