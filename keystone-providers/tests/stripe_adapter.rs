use httpmock::prelude::*;
use keystone_core::payment::{Metadata, PaymentAdapter, PaymentIntentRequest, PaymentRequest};
use keystone_core::{CoreError, RequestContext};
use keystone_providers::payment::StripeAdapter;
use keystone_store::app_config::StripeSettings;
use rust_decimal_macros::dec;
use serde_json::json;

fn adapter(server: &MockServer) -> StripeAdapter {
    StripeAdapter::new(&StripeSettings {
        base_url: server.base_url(),
        api_key: "sk_test_123".into(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn payment_request() -> PaymentRequest {
    let mut metadata = Metadata::new();
    metadata.insert("order_id".to_string(), json!("order-42"));
    PaymentRequest {
        order_id: "order-42".to_string(),
        amount: dec!(99.99),
        currency: "usd".to_string(),
        description: "Order order-42".to_string(),
        customer_id: "cus_1".to_string(),
        metadata,
    }
}

#[tokio::test]
async fn test_charge_sends_minor_units_and_reads_them_back() {
    let server = MockServer::start();
    let charge_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/charges")
            .header("Authorization", "Bearer sk_test_123")
            .json_body_partial(r#"{"amount": 9999, "currency": "usd", "customer": "cus_1"}"#);
        then.status(200).json_body(json!({
            "id": "ch_1",
            "status": "succeeded",
            "amount": 9999,
            "currency": "usd",
            "balance_transaction": "txn_1",
            "created": 1_700_000_000,
            "metadata": {"order_id": "order-42"}
        }));
    });

    let response = adapter(&server)
        .process_payment(&RequestContext::background(), &payment_request())
        .await
        .unwrap();

    charge_mock.assert();
    assert_eq!(response.id, "ch_1");
    assert_eq!(response.amount, dec!(99.99));
    assert_eq!(response.transaction_id, "txn_1");
    assert_eq!(response.created_at.timestamp(), 1_700_000_000);
    assert!(response.metadata.is_some());
}

#[tokio::test]
async fn test_sub_cent_charge_is_rejected_before_sending() {
    let server = MockServer::start();
    let charge_mock = server.mock(|when, then| {
        when.method(POST).path("/charges");
        then.status(200).json_body(json!({
            "id": "ch_0",
            "status": "succeeded",
            "amount": 0,
            "currency": "usd"
        }));
    });

    let mut request = payment_request();
    request.amount = dec!(0.004);
    let err = adapter(&server)
        .process_payment(&RequestContext::background(), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationError(_)));
    charge_mock.assert_hits(0);
}

#[tokio::test]
async fn test_declined_charge_is_vendor_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/charges");
        then.status(402).json_body(json!({"error": {"message": "card declined"}}));
    });

    let err = adapter(&server)
        .process_payment(&RequestContext::background(), &payment_request())
        .await
        .unwrap_err();

    match err {
        CoreError::VendorError { vendor, operation, message } => {
            assert_eq!(vendor, "stripe");
            assert_eq!(operation, "process_payment");
            assert!(message.contains("402"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_field_is_vendor_error_not_panic() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/charges/ch_1");
        then.status(200).json_body(json!({"id": "ch_1"}));
    });

    let err = adapter(&server)
        .get_payment_status(&RequestContext::background(), "ch_1")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::VendorError { .. }));
}

#[tokio::test]
async fn test_refund_posts_charge_id() {
    let server = MockServer::start();
    let refund_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/refunds")
            .json_body(json!({"charge": "ch_1"}));
        then.status(200).json_body(json!({
            "id": "re_1",
            "charge": "ch_1",
            "amount": 2500,
            "status": "succeeded",
            "created": 1_700_000_100
        }));
    });

    let refund = adapter(&server)
        .refund_payment(&RequestContext::background(), "ch_1")
        .await
        .unwrap();

    refund_mock.assert();
    assert_eq!(refund.payment_id, "ch_1");
    assert_eq!(refund.amount, dec!(25.00));
}

#[tokio::test]
async fn test_payment_intent_returns_client_secret() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/payment_intents")
            .json_body_partial(r#"{"amount": 1050}"#);
        then.status(200).json_body(json!({
            "id": "pi_1",
            "client_secret": "pi_1_secret_abc",
            "status": "requires_payment_method"
        }));
    });

    let intent = adapter(&server)
        .create_payment_intent(
            &RequestContext::background(),
            &PaymentIntentRequest {
                amount: dec!(10.50),
                currency: "usd".to_string(),
                customer_id: String::new(),
                description: "intent".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(intent.id, "pi_1");
    assert_eq!(intent.client_secret, "pi_1_secret_abc");
}
