#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use checkout_service::{
    config::AppConfig,
    payments::{
        CallbackResult, OrderContext, PaymentProviderContext, QuickpayCheckoutService,
        QuickpayCheckoutSettings, META_ORDER_ID, META_PAYMENT_HASH, META_PAYMENT_ID,
    },
};
use common_enums::PaymentStatus;
use common_utils::{
    crypto::{HmacSha256, SignMessage},
    types::MinorUnit,
    Secret,
};
use domain_types::connector_types::{HttpMethod, RequestDetails, WebhookRejection};

const PRIVATE_KEY: &str = "cb3e1b6f9a8d4c21";
const ORDER_NUMBER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXY"; // 25 chars
const RESOLVED_REFERENCE: &str = "FGHIJKLMNOPQRSTUVWXY"; // last 20 of the above
const ORDER_REFERENCE: &str = "store://order/3fe2a6b1";
const PAYMENT_ID: i64 = 142090279;

fn settings() -> QuickpayCheckoutSettings {
    QuickpayCheckoutSettings {
        continue_url: "https://shop.example/continue".to_string(),
        cancel_url: "https://shop.example/cancel".to_string(),
        error_url: "https://shop.example/error".to_string(),
        api_key: Secret::new("api-key".to_string()),
        private_key: Secret::new(PRIVATE_KEY.to_string()),
        merchant_id: None,
        agreement_id: None,
        language: Some("da".to_string()),
        payment_methods: None,
        auto_fee: false,
        auto_capture: false,
        framed: false,
    }
}

fn context(status: PaymentStatus) -> PaymentProviderContext {
    PaymentProviderContext {
        order: OrderContext {
            order_id: "3fe2a6b1-74d2-4a17-9c05-b1a51f1f90aa".to_string(),
            order_number: ORDER_NUMBER.to_string(),
            order_reference: ORDER_REFERENCE.to_string(),
            currency_code: "DKK".to_string(),
            minor_amount: MinorUnit::new(12050),
            payment_status: status,
            transaction_id: Some(PAYMENT_ID.to_string()),
            properties: HashMap::from([
                (META_ORDER_ID.to_string(), RESOLVED_REFERENCE.to_string()),
                (META_PAYMENT_ID.to_string(), PAYMENT_ID.to_string()),
                (META_PAYMENT_HASH.to_string(), "stale".to_string()),
            ]),
        },
        settings: settings(),
        callback_url: "https://shop.example/callback/quickpay".to_string(),
        order_number_template: "INV-{0}".to_string(),
    }
}

fn service() -> QuickpayCheckoutService {
    QuickpayCheckoutService::new(&AppConfig::default()).unwrap()
}

fn callback_body(operation_type: &str, qp_status_code: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": PAYMENT_ID,
        "order_id": RESOLVED_REFERENCE,
        "accepted": true,
        "currency": "DKK",
        "test_mode": true,
        "operations": [{
            "id": 1,
            "type": operation_type,
            "amount": 12050,
            "pending": false,
            "qp_status_code": qp_status_code,
            "qp_status_msg": "Approved",
            "aq_status_code": null,
            "aq_status_msg": null
        }],
        "variables": { "orderReference": ORDER_REFERENCE }
    }))
    .unwrap()
}

fn signed_request(body: Vec<u8>) -> RequestDetails {
    let checksum = hex::encode(
        HmacSha256
            .sign_message(PRIVATE_KEY.as_bytes(), &body)
            .unwrap(),
    );
    RequestDetails {
        method: HttpMethod::Post,
        uri: Some("/callback/quickpay".to_string()),
        headers: HashMap::from([("Quickpay-Checksum-Sha256".to_string(), checksum)]),
        body,
        query_params: None,
    }
}

#[test]
fn authorize_callback_delivered_twice_applies_once() {
    let service = service();
    let body = callback_body("authorize", "20000");

    // First delivery against a freshly initialized order.
    let first = service
        .process_callback(&context(PaymentStatus::Initialized), &signed_request(body.clone()))
        .unwrap();
    match first {
        CallbackResult::Accepted(info) => {
            assert_eq!(info.payment_status, PaymentStatus::Authorized);
            assert_eq!(info.transaction_id, PAYMENT_ID.to_string());
            assert_eq!(
                info.amount_authorized.map(|amount| amount.get_amount_as_f64()),
                Some(120.50)
            );
        }
        other => panic!("expected acceptance, got {other:?}"),
    }

    // Identical re-delivery after the host persisted Authorized.
    let second = service
        .process_callback(&context(PaymentStatus::Authorized), &signed_request(body))
        .unwrap();
    assert_eq!(second, CallbackResult::Ignored);
}

#[test]
fn callback_with_bad_checksum_is_rejected() {
    let service = service();
    let mut request = signed_request(callback_body("authorize", "20000"));
    request.body[0] ^= 0x01;

    let result = service
        .process_callback(&context(PaymentStatus::Initialized), &request)
        .unwrap();
    assert_eq!(
        result,
        CallbackResult::Rejected(WebhookRejection::ChecksumMismatch)
    );
}

#[test]
fn callback_without_checksum_is_rejected() {
    let service = service();
    let mut request = signed_request(callback_body("authorize", "20000"));
    request.headers.clear();

    let result = service
        .process_callback(&context(PaymentStatus::Initialized), &request)
        .unwrap();
    assert_eq!(
        result,
        CallbackResult::Rejected(WebhookRejection::ChecksumMismatch)
    );
}

#[test]
fn capture_callback_before_authorize_is_a_sequence_violation() {
    let service = service();
    let request = signed_request(callback_body("capture", "20000"));

    let result = service
        .process_callback(&context(PaymentStatus::Initialized), &request)
        .unwrap();
    assert_eq!(
        result,
        CallbackResult::Rejected(WebhookRejection::CaptureBeforeAuthorize)
    );
}

#[test]
fn capture_callback_after_authorize_advances_the_status() {
    let service = service();
    let request = signed_request(callback_body("capture", "20000"));

    let result = service
        .process_callback(&context(PaymentStatus::Authorized), &request)
        .unwrap();
    match result {
        CallbackResult::Accepted(info) => {
            assert_eq!(info.payment_status, PaymentStatus::Captured);
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[test]
fn declined_operation_leaves_state_untouched() {
    let service = service();
    let request = signed_request(callback_body("authorize", "40001"));

    let result = service
        .process_callback(&context(PaymentStatus::Initialized), &request)
        .unwrap();
    assert_eq!(result, CallbackResult::Ignored);
}

#[test]
fn callback_for_an_unknown_order_is_ignored() {
    let service = service();
    let mut ctx = context(PaymentStatus::Initialized);
    ctx.order.order_reference = "store://order/someone-else".to_string();
    ctx.order
        .properties
        .insert(META_ORDER_ID.to_string(), "OTHER-REF".to_string());
    let request = signed_request(callback_body("authorize", "20000"));

    let result = service.process_callback(&ctx, &request).unwrap();
    assert_eq!(result, CallbackResult::Ignored);
}
