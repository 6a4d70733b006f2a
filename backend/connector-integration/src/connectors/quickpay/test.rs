#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::expect_used)]
mod tests {
    use std::{collections::HashMap, marker::PhantomData};

    use common_enums::{Currency, PaymentStatus};
    use common_utils::{
        crypto::{self, SignMessage},
        types::MinorUnit,
        Secret,
    };
    use domain_types::{
        connector_flow::{Capture, CreateLink, CreateOrder, PSync},
        connector_types::{
            ConnectorWebhookSecrets, EventType, HttpMethod, PaymentCreateOrderData,
            PaymentCreateOrderResponse, PaymentFlowData, PaymentLinkData, PaymentLinkResponse,
            PaymentsCaptureData, PaymentsResponseData, PaymentsSyncData, RequestDetails,
            WebhookOrderContext, WebhookOutcome, WebhookRejection,
        },
        router_data::ConnectorAuthType,
        router_data_v2::RouterDataV2,
        types::{ConnectorParams, Connectors},
    };
    use interfaces::{
        connector_integration_v2::ConnectorIntegrationV2, connector_types::IncomingWebhook,
    };

    use crate::connectors::quickpay::{
        transformers::{
            self, parse_language, payment_fingerprint, payment_status_from_operation_type,
            reconcile_callback_operations, resolve_order_reference, verify_order_linkage,
            QuickpayAuthType, QuickpayLanguage, QuickpayOperation, QuickpayOperationType,
            QuickpayPayment,
        },
        Quickpay, CHECKSUM_HEADER,
    };

    fn auth() -> ConnectorAuthType {
        ConnectorAuthType::BodyKey {
            api_key: Secret::new("test_api_key".to_string()),
            key1: Secret::new("test_private_key".to_string()),
        }
    }

    fn flow_data() -> PaymentFlowData {
        PaymentFlowData {
            order_id: "0e8aefb5-9de5-4f3a-b4c1-5b20a1a8f001".to_string(),
            order_number: "ORDER-0042".to_string(),
            order_reference: "umbraco-commerce://order/0e8aefb5".to_string(),
            currency: Currency::DKK,
            minor_amount: MinorUnit::new(12050),
            status: PaymentStatus::Initialized,
            connector_request_reference_id: "ORDER-0042".to_string(),
            test_mode: Some(true),
            connectors: Connectors {
                quickpay: ConnectorParams {
                    base_url: "https://api.quickpay.net".to_string(),
                },
            },
        }
    }

    fn operation(
        operation_type: QuickpayOperationType,
        pending: bool,
        qp_status_code: &str,
    ) -> QuickpayOperation {
        QuickpayOperation {
            id: 1,
            operation_type,
            amount: MinorUnit::new(12050),
            pending,
            qp_status_code: Some(qp_status_code.to_string()),
            qp_status_msg: None,
            aq_status_code: None,
            aq_status_msg: None,
        }
    }

    fn payment(operations: Vec<QuickpayOperation>) -> QuickpayPayment {
        QuickpayPayment {
            id: 142090279,
            order_id: "ORDER-0042".to_string(),
            accepted: true,
            currency: Some(Currency::DKK),
            state: None,
            operations,
            variables: HashMap::from([(
                "orderReference".to_string(),
                "umbraco-commerce://order/0e8aefb5".to_string(),
            )]),
            link: None,
            test_mode: true,
            balance: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn auth_type_conversion() {
        let quickpay_auth = QuickpayAuthType::try_from(&auth());
        assert!(quickpay_auth.is_ok());
    }

    #[test]
    fn auth_type_invalid_conversion() {
        let header_only = ConnectorAuthType::HeaderKey {
            api_key: Secret::new("test_api_key".to_string()),
        };
        assert!(QuickpayAuthType::try_from(&header_only).is_err());
    }

    #[test]
    fn language_parsing_defaults_to_english() {
        assert_eq!(parse_language(None), QuickpayLanguage::En);
        assert_eq!(parse_language(Some("DA")), QuickpayLanguage::Da);
        assert_eq!(parse_language(Some("da")), QuickpayLanguage::Da);
        assert_eq!(parse_language(Some("klingon")), QuickpayLanguage::En);
    }

    #[test]
    fn operation_type_status_mapping() {
        assert_eq!(
            payment_status_from_operation_type(QuickpayOperationType::Authorize),
            PaymentStatus::Authorized
        );
        assert_eq!(
            payment_status_from_operation_type(QuickpayOperationType::Capture),
            PaymentStatus::Captured
        );
        assert_eq!(
            payment_status_from_operation_type(QuickpayOperationType::Refund),
            PaymentStatus::Refunded
        );
        assert_eq!(
            payment_status_from_operation_type(QuickpayOperationType::Cancel),
            PaymentStatus::Cancelled
        );
        assert_eq!(
            payment_status_from_operation_type(QuickpayOperationType::Other),
            PaymentStatus::Initialized
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let first = payment_fingerprint(
            Some("142090279"),
            "ORDER-0042",
            Currency::DKK,
            MinorUnit::new(12050),
        );
        let second = payment_fingerprint(
            Some("142090279"),
            "ORDER-0042",
            Currency::DKK,
            MinorUnit::new(12050),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn fingerprint_changes_with_every_input() {
        let base = payment_fingerprint(
            Some("142090279"),
            "ORDER-0042",
            Currency::DKK,
            MinorUnit::new(12050),
        );
        assert_ne!(
            base,
            payment_fingerprint(Some("9"), "ORDER-0042", Currency::DKK, MinorUnit::new(12050))
        );
        assert_ne!(
            base,
            payment_fingerprint(
                Some("142090279"),
                "ORDER-0043",
                Currency::DKK,
                MinorUnit::new(12050)
            )
        );
        assert_ne!(
            base,
            payment_fingerprint(
                Some("142090279"),
                "ORDER-0042",
                Currency::EUR,
                MinorUnit::new(12050)
            )
        );
        assert_ne!(
            base,
            payment_fingerprint(
                Some("142090279"),
                "ORDER-0042",
                Currency::DKK,
                MinorUnit::new(12051)
            )
        );
        assert_ne!(
            base,
            payment_fingerprint(None, "ORDER-0042", Currency::DKK, MinorUnit::new(12050))
        );
    }

    #[test]
    fn short_order_number_passes_through() {
        assert_eq!(
            resolve_order_reference("ORDER-0042", "ORD-{0}"),
            "ORDER-0042"
        );
    }

    #[test]
    fn prefix_template_keeps_the_tail() {
        let order_number = "ABCDEFGHIJKLMNOPQRSTUVWXY";
        assert_eq!(
            resolve_order_reference(order_number, "INV-{0}"),
            "FGHIJKLMNOPQRSTUVWXY"
        );
    }

    #[test]
    fn suffix_template_keeps_the_head() {
        let order_number = "ABCDEFGHIJKLMNOPQRSTUVWXY";
        assert_eq!(
            resolve_order_reference(order_number, "{0}-X"),
            "ABCDEFGHIJKLMNOPQRST"
        );
    }

    #[test]
    fn embedded_template_strips_both_ends() {
        let order_number = "INV-ABCDEFGHIJKLMNOPQR-DK";
        let resolved = resolve_order_reference(order_number, "INV-{0}-DK");
        assert_eq!(resolved, "ABCDEFGHIJKLMNOPQR");
        assert!(resolved.chars().count() <= transformers::MAX_ORDER_ID_LENGTH);
    }

    // The bare "{0}" template gives nothing to trim against; the reference
    // passes through oversized and the gateway enforces its limit at
    // creation time.
    #[test]
    fn bare_placeholder_template_passes_through_oversized() {
        let order_number = "ABCDEFGHIJKLMNOPQRSTUVWXY";
        assert_eq!(resolve_order_reference(order_number, "{0}"), order_number);
    }

    #[test]
    fn settled_operation_selection_skips_pending_and_declined() {
        let operations = vec![
            operation(QuickpayOperationType::Authorize, false, "20000"),
            operation(QuickpayOperationType::Capture, false, "40001"),
            operation(QuickpayOperationType::Capture, true, "20000"),
        ];
        let settled = transformers::last_settled_operation(&operations).unwrap();
        assert_eq!(settled.operation_type, QuickpayOperationType::Authorize);
    }

    #[test]
    fn acquirer_code_approves_on_callback_path_only() {
        let mut declined = operation(QuickpayOperationType::Authorize, false, "40001");
        declined.aq_status_code = Some("000".to_string());
        assert!(declined.is_approved());
        assert!(!declined.is_settled_and_approved());
    }

    #[test]
    fn callback_authorize_transitions_from_initialized() {
        let payment = payment(vec![operation(
            QuickpayOperationType::Authorize,
            false,
            "20000",
        )]);
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Initialized);
        assert_eq!(
            outcome,
            WebhookOutcome::Accepted {
                status: PaymentStatus::Authorized,
                transaction_id: "142090279".to_string(),
                minor_amount: MinorUnit::new(12050),
            }
        );
    }

    #[test]
    fn callback_duplicate_authorize_is_no_change() {
        let payment = payment(vec![operation(
            QuickpayOperationType::Authorize,
            false,
            "20000",
        )]);
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Authorized);
        assert_eq!(outcome, WebhookOutcome::NoChange);
    }

    #[test]
    fn callback_capture_before_authorize_is_rejected() {
        let payment = payment(vec![operation(
            QuickpayOperationType::Capture,
            false,
            "20000",
        )]);
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Initialized);
        assert_eq!(
            outcome,
            WebhookOutcome::Rejected {
                reason: WebhookRejection::CaptureBeforeAuthorize,
            }
        );
    }

    #[test]
    fn callback_capture_after_authorize_is_accepted() {
        let payment = payment(vec![
            operation(QuickpayOperationType::Authorize, false, "20000"),
            operation(QuickpayOperationType::Capture, false, "20000"),
        ]);
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Authorized);
        assert_eq!(
            outcome,
            WebhookOutcome::Accepted {
                status: PaymentStatus::Captured,
                transaction_id: "142090279".to_string(),
                minor_amount: MinorUnit::new(12050),
            }
        );
    }

    #[test]
    fn callback_refund_is_flat_transition_regardless_of_amount() {
        let mut refund = operation(QuickpayOperationType::Refund, false, "20000");
        refund.amount = MinorUnit::new(500);
        let payment = payment(vec![refund]);
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Captured);
        assert_eq!(
            outcome,
            WebhookOutcome::Accepted {
                status: PaymentStatus::Refunded,
                transaction_id: "142090279".to_string(),
                minor_amount: MinorUnit::new(500),
            }
        );
    }

    #[test]
    fn callback_declined_operation_is_no_change() {
        let mut declined = operation(QuickpayOperationType::Authorize, false, "40001");
        declined.aq_status_code = Some("111".to_string());
        let payment = payment(vec![declined]);
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Initialized);
        assert_eq!(outcome, WebhookOutcome::NoChange);
    }

    #[test]
    fn callback_without_operations_is_no_change() {
        let payment = payment(Vec::new());
        let outcome = reconcile_callback_operations(&payment, PaymentStatus::Initialized);
        assert_eq!(outcome, WebhookOutcome::NoChange);
    }

    #[test]
    fn order_linkage_prefers_variables() {
        let payment = payment(vec![]);
        let order = WebhookOrderContext {
            order_reference: "umbraco-commerce://order/0e8aefb5".to_string(),
            stored_connector_order_id: Some("SOMETHING-ELSE".to_string()),
            current_status: PaymentStatus::Initialized,
        };
        assert!(verify_order_linkage(&payment, &order));

        let mismatch = WebhookOrderContext {
            order_reference: "umbraco-commerce://order/other".to_string(),
            stored_connector_order_id: Some("ORDER-0042".to_string()),
            current_status: PaymentStatus::Initialized,
        };
        assert!(!verify_order_linkage(&payment, &mismatch));
    }

    #[test]
    fn order_linkage_falls_back_to_stored_order_id() {
        let mut snapshot = payment(vec![]);
        snapshot.variables.clear();
        let order = WebhookOrderContext {
            order_reference: "umbraco-commerce://order/0e8aefb5".to_string(),
            stored_connector_order_id: Some("ORDER-0042".to_string()),
            current_status: PaymentStatus::Initialized,
        };
        assert!(verify_order_linkage(&snapshot, &order));

        let unknown = WebhookOrderContext {
            order_reference: "umbraco-commerce://order/0e8aefb5".to_string(),
            stored_connector_order_id: None,
            current_status: PaymentStatus::Initialized,
        };
        assert!(!verify_order_linkage(&snapshot, &unknown));
    }

    #[test]
    fn create_order_request_build() {
        let connector = Quickpay::new();
        let router_data: RouterDataV2<
            CreateOrder,
            PaymentFlowData,
            PaymentCreateOrderData,
            PaymentCreateOrderResponse,
        > = RouterDataV2 {
            flow: PhantomData,
            resource_common_data: flow_data(),
            connector_auth_type: auth(),
            request: PaymentCreateOrderData {
                order_id: "ORDER-0042".to_string(),
                currency: Currency::DKK,
                variables: HashMap::from([(
                    "orderNumber".to_string(),
                    "ORDER-0042".to_string(),
                )]),
            },
            response: Err(domain_types::router_data::ErrorResponse {
                status_code: 0,
                code: String::new(),
                message: String::new(),
                reason: None,
                status: None,
                connector_transaction_id: None,
            }),
        };

        let url = connector.get_url(&router_data).unwrap();
        assert_eq!(url, "https://api.quickpay.net/payments");

        let body = connector.get_request_body(&router_data).unwrap().unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&body.get_inner_value()).unwrap();
        assert_eq!(value["order_id"], "ORDER-0042");
        assert_eq!(value["currency"], "DKK");
        assert_eq!(value["variables"]["orderNumber"], "ORDER-0042");
    }

    #[test]
    fn link_request_build_skips_absent_flags() {
        let connector = Quickpay::new();
        let router_data: RouterDataV2<
            CreateLink,
            PaymentFlowData,
            PaymentLinkData,
            PaymentLinkResponse,
        > = RouterDataV2 {
            flow: PhantomData,
            resource_common_data: flow_data(),
            connector_auth_type: auth(),
            request: PaymentLinkData {
                connector_payment_id: "142090279".to_string(),
                amount: MinorUnit::new(12050),
                language: "en".to_string(),
                continue_url: "https://shop.example/continue".to_string(),
                cancel_url: "https://shop.example/cancel".to_string(),
                callback_url: "https://shop.example/callback".to_string(),
                payment_methods: None,
                auto_fee: Some(true),
                auto_capture: None,
                framed: None,
            },
            response: Err(domain_types::router_data::ErrorResponse {
                status_code: 0,
                code: String::new(),
                message: String::new(),
                reason: None,
                status: None,
                connector_transaction_id: None,
            }),
        };

        assert_eq!(
            <Quickpay as ConnectorIntegrationV2<
                CreateLink,
                PaymentFlowData,
                PaymentLinkData,
                PaymentLinkResponse,
            >>::get_http_method(connector),
            common_utils::request::Method::Put
        );
        let url = connector.get_url(&router_data).unwrap();
        assert_eq!(url, "https://api.quickpay.net/payments/142090279/link");

        let body = connector.get_request_body(&router_data).unwrap().unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&body.get_inner_value()).unwrap();
        assert_eq!(value["amount"], 12050);
        assert_eq!(value["language"], "en");
        assert_eq!(value["auto_fee"], true);
        assert!(value.get("auto_capture").is_none());
        assert!(value.get("payment_methods").is_none());
        assert!(value.get("framed").is_none());
    }

    #[test]
    fn capture_request_build() {
        let connector = Quickpay::new();
        let router_data: RouterDataV2<
            Capture,
            PaymentFlowData,
            PaymentsCaptureData,
            PaymentsResponseData,
        > = RouterDataV2 {
            flow: PhantomData,
            resource_common_data: flow_data(),
            connector_auth_type: auth(),
            request: PaymentsCaptureData {
                connector_transaction_id: "142090279".to_string(),
                minor_amount_to_capture: MinorUnit::new(12050),
                currency: Currency::DKK,
            },
            response: Err(domain_types::router_data::ErrorResponse {
                status_code: 0,
                code: String::new(),
                message: String::new(),
                reason: None,
                status: None,
                connector_transaction_id: None,
            }),
        };

        let url = connector.get_url(&router_data).unwrap();
        assert_eq!(
            url,
            "https://api.quickpay.net/payments/142090279/capture?synchronized"
        );
        let body = connector.get_request_body(&router_data).unwrap().unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&body.get_inner_value()).unwrap();
        assert_eq!(value, serde_json::json!({ "amount": 12050 }));
    }

    #[test]
    fn sync_request_is_a_get_on_the_payment() {
        let connector = Quickpay::new();
        let router_data: RouterDataV2<
            PSync,
            PaymentFlowData,
            PaymentsSyncData,
            PaymentsResponseData,
        > = RouterDataV2 {
            flow: PhantomData,
            resource_common_data: flow_data(),
            connector_auth_type: auth(),
            request: PaymentsSyncData {
                connector_transaction_id: "142090279".to_string(),
            },
            response: Err(domain_types::router_data::ErrorResponse {
                status_code: 0,
                code: String::new(),
                message: String::new(),
                reason: None,
                status: None,
                connector_transaction_id: None,
            }),
        };

        assert_eq!(
            <Quickpay as ConnectorIntegrationV2<
                PSync,
                PaymentFlowData,
                PaymentsSyncData,
                PaymentsResponseData,
            >>::get_http_method(connector),
            common_utils::request::Method::Get
        );
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://api.quickpay.net/payments/142090279"
        );
        assert!(connector.get_request_body(&router_data).unwrap().is_none());
    }

    fn webhook_request(body: Vec<u8>, checksum: Option<String>) -> RequestDetails {
        let mut headers = HashMap::new();
        if let Some(checksum) = checksum {
            headers.insert(CHECKSUM_HEADER.to_string(), checksum);
        }
        RequestDetails {
            method: HttpMethod::Post,
            uri: Some("/umbraco/commerce/payment/callback/quickpay".to_string()),
            headers,
            body,
            query_params: None,
        }
    }

    #[test]
    fn webhook_source_verification_accepts_valid_checksum() {
        let connector = Quickpay::new();
        let body = serde_json::to_vec(&payment(vec![operation(
            QuickpayOperationType::Authorize,
            false,
            "20000",
        )]))
        .unwrap();
        let signature = crypto::HmacSha256
            .sign_message(b"test_private_key", &body)
            .unwrap();
        let request = webhook_request(body, Some(hex::encode(signature)));

        let verified = connector
            .verify_webhook_source(
                &request,
                Some(&ConnectorWebhookSecrets {
                    secret: b"test_private_key".to_vec(),
                    additional_secret: None,
                }),
                None,
            )
            .unwrap();
        assert!(verified);
    }

    #[test]
    fn webhook_source_verification_rejects_tampered_body() {
        let connector = Quickpay::new();
        let body = serde_json::to_vec(&payment(vec![operation(
            QuickpayOperationType::Authorize,
            false,
            "20000",
        )]))
        .unwrap();
        let signature = crypto::HmacSha256
            .sign_message(b"test_private_key", &body)
            .unwrap();
        let mut tampered = body;
        tampered[0] ^= 0x01;
        let request = webhook_request(tampered, Some(hex::encode(signature)));

        let verified = connector
            .verify_webhook_source(
                &request,
                Some(&ConnectorWebhookSecrets {
                    secret: b"test_private_key".to_vec(),
                    additional_secret: None,
                }),
                None,
            )
            .unwrap();
        assert!(!verified);
    }

    #[test]
    fn webhook_source_verification_rejects_missing_checksum() {
        let connector = Quickpay::new();
        let body = serde_json::to_vec(&payment(vec![])).unwrap();
        let request = webhook_request(body, None);

        let verified = connector
            .verify_webhook_source(
                &request,
                Some(&ConnectorWebhookSecrets {
                    secret: b"test_private_key".to_vec(),
                    additional_secret: None,
                }),
                None,
            )
            .unwrap();
        assert!(!verified);
    }

    #[test]
    fn webhook_secret_falls_back_to_account_details() {
        let connector = Quickpay::new();
        let body = serde_json::to_vec(&payment(vec![])).unwrap();
        let signature = crypto::HmacSha256
            .sign_message(b"test_private_key", &body)
            .unwrap();
        let request = webhook_request(body, Some(hex::encode(signature)));

        let verified = connector
            .verify_webhook_source(&request, None, Some(&auth()))
            .unwrap();
        assert!(verified);
    }

    #[test]
    fn webhook_event_type_follows_last_operation() {
        let connector = Quickpay::new();
        let body = serde_json::to_vec(&payment(vec![
            operation(QuickpayOperationType::Authorize, false, "20000"),
            operation(QuickpayOperationType::Capture, false, "20000"),
        ]))
        .unwrap();
        let request = webhook_request(body, None);
        assert_eq!(
            connector.get_event_type(&request).unwrap(),
            EventType::PaymentCaptured
        );
    }

    #[test]
    fn payment_snapshot_deserializes_gateway_shape() {
        let raw = br#"{
            "id": 142090279,
            "merchant_id": 129,
            "order_id": "ORDER-0042",
            "accepted": true,
            "type": "Payment",
            "currency": "DKK",
            "state": "new",
            "test_mode": true,
            "operations": [
                {
                    "id": 1,
                    "type": "authorize",
                    "amount": 12050,
                    "pending": false,
                    "qp_status_code": "20000",
                    "qp_status_msg": "Approved",
                    "aq_status_code": "000",
                    "aq_status_msg": "Approved"
                }
            ],
            "variables": { "orderReference": "umbraco-commerce://order/0e8aefb5" },
            "link": { "url": "https://payment.quickpay.net/payments/abc" },
            "balance": 0,
            "created_at": "2025-05-01T10:21:08Z",
            "updated_at": "2025-05-01T10:22:45Z"
        }"#;
        let snapshot: QuickpayPayment = serde_json::from_slice(raw).unwrap();
        assert_eq!(snapshot.id, 142090279);
        assert_eq!(snapshot.operations.len(), 1);
        assert_eq!(
            snapshot.operations[0].operation_type,
            QuickpayOperationType::Authorize
        );
        assert!(snapshot.created_at.is_some());
        assert_eq!(
            snapshot.link.and_then(|link| link.url).as_deref(),
            Some("https://payment.quickpay.net/payments/abc")
        );
    }

    #[test]
    fn unknown_operation_type_deserializes_as_other() {
        let raw = br#"{"id": 9, "type": "session", "amount": 0, "pending": false,
            "qp_status_code": "20000", "qp_status_msg": null,
            "aq_status_code": null, "aq_status_msg": null}"#;
        let parsed: QuickpayOperation = serde_json::from_slice(raw).unwrap();
        assert_eq!(parsed.operation_type, QuickpayOperationType::Other);
    }
}
