#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use base64::Engine;
use checkout_service::{
    config::AppConfig,
    payments::{
        OrderContext, PaymentProviderContext, QuickpayCheckoutService, QuickpayCheckoutSettings,
        META_LINK_HASH, META_ORDER_ID, META_PAYMENT_HASH, META_PAYMENT_ID,
    },
};
use common_enums::{Currency, PaymentStatus};
use common_utils::{consts::BASE64_ENGINE, request::Method, types::MinorUnit, Secret};
use connector_integration::connectors::quickpay::transformers::payment_fingerprint;

const PAYMENT_LINK: &str = "https://payment.quickpay.net/payments/0f2a7b44";

fn settings() -> QuickpayCheckoutSettings {
    QuickpayCheckoutSettings {
        continue_url: "https://shop.example/continue".to_string(),
        cancel_url: "https://shop.example/cancel".to_string(),
        error_url: "https://shop.example/error".to_string(),
        api_key: Secret::new("api-key".to_string()),
        private_key: Secret::new("private-key".to_string()),
        merchant_id: None,
        agreement_id: None,
        language: None,
        payment_methods: Some("creditcard, mobilepay".to_string()),
        auto_fee: false,
        auto_capture: true,
        framed: false,
    }
}

fn context(properties: HashMap<String, String>) -> PaymentProviderContext {
    PaymentProviderContext {
        order: OrderContext {
            order_id: "3fe2a6b1-74d2-4a17-9c05-b1a51f1f90aa".to_string(),
            order_number: "ORDER-0042".to_string(),
            order_reference: "store://order/3fe2a6b1".to_string(),
            currency_code: "DKK".to_string(),
            minor_amount: MinorUnit::new(12050),
            payment_status: PaymentStatus::Initialized,
            transaction_id: None,
            properties,
        },
        settings: settings(),
        callback_url: "https://shop.example/callback/quickpay".to_string(),
        order_number_template: "ORDER-{0}".to_string(),
    }
}

#[tokio::test]
async fn matching_fingerprint_reuses_the_stored_link() {
    let fingerprint = payment_fingerprint(
        Some("142090279"),
        "ORDER-0042",
        Currency::DKK,
        MinorUnit::new(12050),
    );
    let properties = HashMap::from([
        (META_ORDER_ID.to_string(), "ORDER-0042".to_string()),
        (META_PAYMENT_ID.to_string(), "142090279".to_string()),
        (META_PAYMENT_HASH.to_string(), fingerprint),
        (
            META_LINK_HASH.to_string(),
            BASE64_ENGINE.encode(PAYMENT_LINK),
        ),
    ]);

    let service = QuickpayCheckoutService::new(&AppConfig::default()).unwrap();
    let result = service
        .generate_payment_form(&context(properties.clone()))
        .await
        .unwrap();

    let form = result.form.expect("stored link should be reused");
    assert_eq!(form.url, PAYMENT_LINK);
    assert_eq!(form.method, Method::Get);
    assert_eq!(result.metadata, properties);
}

#[tokio::test]
async fn changed_amount_invalidates_the_stored_session() {
    // Fingerprint computed for a different amount than the order now holds.
    let fingerprint = payment_fingerprint(
        Some("142090279"),
        "ORDER-0042",
        Currency::DKK,
        MinorUnit::new(999),
    );
    let properties = HashMap::from([
        (META_ORDER_ID.to_string(), "ORDER-0042".to_string()),
        (META_PAYMENT_ID.to_string(), "142090279".to_string()),
        (META_PAYMENT_HASH.to_string(), fingerprint),
        (
            META_LINK_HASH.to_string(),
            BASE64_ENGINE.encode(PAYMENT_LINK),
        ),
    ]);

    // Unroutable endpoint: regeneration is attempted and fails, which must
    // surface as a formless result with the stored metadata untouched.
    let mut config = AppConfig::default();
    config.connectors.quickpay.base_url = "http://127.0.0.1:9".to_string();
    config.client.timeout_secs = 1;

    let service = QuickpayCheckoutService::new(&config).unwrap();
    let result = service
        .generate_payment_form(&context(properties.clone()))
        .await
        .unwrap();

    assert!(result.form.is_none());
    assert_eq!(result.metadata, properties);
}

#[tokio::test]
async fn missing_continue_url_is_a_configuration_error() {
    let mut ctx = context(HashMap::new());
    ctx.settings.continue_url = String::new();

    let service = QuickpayCheckoutService::new(&AppConfig::default()).unwrap();
    let error = service.generate_payment_form(&ctx).await.unwrap_err();
    assert!(format!("{error:?}").contains("continue_url"));
}

#[tokio::test]
async fn unknown_currency_is_a_validation_error() {
    let mut ctx = context(HashMap::new());
    ctx.order.currency_code = "XYZ".to_string();

    let service = QuickpayCheckoutService::new(&AppConfig::default()).unwrap();
    let error = service.generate_payment_form(&ctx).await.unwrap_err();
    assert!(format!("{error:?}").contains("ISO 4217"));
}
