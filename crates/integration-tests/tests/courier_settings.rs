//! Settings resolution, balance dispatch and shipment creation.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use httpmock::prelude::*;
use parcelhub_admin::couriers::{COURIER_GROUP, CourierError, CourierOrderRequest};
use parcelhub_admin::db::SettingsStore;
use parcelhub_core::CourierProvider;
use parcelhub_integration_tests::{TestContext, pairs, steadfast_settings};
use rust_decimal::Decimal;
use serde_json::json;

fn shipment() -> CourierOrderRequest {
    CourierOrderRequest {
        invoice: "INV-2001".to_string(),
        recipient_name: "Karim Ahmed".to_string(),
        recipient_phone: "01711111111".to_string(),
        recipient_address: "Flat 3B, Gulshan 2".to_string(),
        cod_amount: Decimal::from(900),
        ..CourierOrderRequest::default()
    }
}

#[tokio::test]
async fn test_resolved_group_is_cached_when_ttl_is_set() {
    let ctx = TestContext::with_settings_ttl(&[("pathao_store_id", "12")], Duration::from_secs(300));
    let resolver = ctx.state.couriers().resolver();

    let first = resolver.resolve(COURIER_GROUP).await.unwrap();
    let second = resolver.resolve(COURIER_GROUP).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get("pathao_store_id").map(String::as_str), Some("12"));
    assert_eq!(ctx.settings.reads(), 1);
}

#[tokio::test]
async fn test_resolves_read_through_by_default() {
    let ctx = TestContext::new(&[("pathao_store_id", "12")]);
    let resolver = ctx.state.couriers().resolver();

    resolver.resolve(COURIER_GROUP).await.unwrap();
    resolver.resolve(COURIER_GROUP).await.unwrap();

    assert_eq!(ctx.settings.reads(), 2);
}

#[tokio::test]
async fn test_upsert_through_resolver_is_visible_immediately() {
    let ctx = TestContext::with_settings_ttl(&[("pathao_store_id", "12")], Duration::from_secs(300));
    let resolver = ctx.state.couriers().resolver();
    resolver.resolve(COURIER_GROUP).await.unwrap();

    resolver
        .upsert("pathao_store_id", "99", COURIER_GROUP)
        .await
        .unwrap();

    let map = resolver.resolve(COURIER_GROUP).await.unwrap();
    assert_eq!(map.get("pathao_store_id").map(String::as_str), Some("99"));
}

#[tokio::test]
async fn test_direct_store_write_is_visible_on_next_resolve() {
    let ctx = TestContext::new(&[("redx_base_url", "https://old.example.com")]);
    let resolver = ctx.state.couriers().resolver();
    resolver.resolve(COURIER_GROUP).await.unwrap();

    ctx.settings
        .upsert("redx_base_url", "https://new.example.com", COURIER_GROUP)
        .await
        .unwrap();

    let map = resolver.resolve(COURIER_GROUP).await.unwrap();
    assert_eq!(map["redx_base_url"], "https://new.example.com");
}

#[tokio::test]
async fn test_other_groups_are_isolated() {
    let ctx = TestContext::new(&[("steadfast_api_key", "abc")]);

    let map = ctx
        .state
        .couriers()
        .resolver()
        .resolve("payments")
        .await
        .unwrap();

    assert!(map.is_empty());
}

#[tokio::test]
async fn test_steadfast_balance_is_returned_verbatim() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/get_balance")
                .header("Api-Key", "sf-key")
                .header("Secret-Key", "sf-secret");
            then.status(200)
                .json_body(json!({"status": 200, "current_balance": 1520.5}));
        })
        .await;

    let settings = steadfast_settings(&server.base_url());
    let ctx = TestContext::new(&pairs(&settings));

    let (status, body) = ctx
        .request("GET", "/api/couriers/balance/Steadfast%20Courier", None, true)
        .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Balance retrieved");
    assert_eq!(body["data"]["current_balance"], 1520.5);
}

#[tokio::test]
async fn test_balance_placeholder_for_other_providers() {
    let ctx = TestContext::new(&[]);

    for name in ["RedX", "paperfly", "eCourier"] {
        let balance = ctx.state.couriers().check_balance(name).await.unwrap();
        assert_eq!(balance["current_balance"], 0);
        assert_eq!(
            balance["message"],
            format!("Balance check not supported for {name}")
        );
    }
}

#[tokio::test]
async fn test_balance_for_unknown_provider() {
    let ctx = TestContext::new(&[]);

    let (status, body) = ctx
        .request("GET", "/api/couriers/balance/dhl", None, true)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_steadfast_balance_without_keys() {
    let ctx = TestContext::new(&[]);

    let (status, body) = ctx
        .request("GET", "/api/couriers/balance/steadfast", None, true)
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "not_configured");
}

#[tokio::test]
async fn test_create_shipment_without_credentials_makes_no_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200).json_body(json!({}));
        })
        .await;

    let base_url = server.base_url();
    let ctx = TestContext::new(&[
        ("steadfast_base_url", base_url.as_str()),
        ("pathao_base_url", base_url.as_str()),
        ("redx_base_url", base_url.as_str()),
        ("paperfly_base_url", base_url.as_str()),
        ("ecourier_base_url", base_url.as_str()),
    ]);

    for provider in CourierProvider::ALL {
        let err = ctx
            .state
            .couriers()
            .create_shipment(provider, &shipment())
            .await
            .unwrap_err();
        assert!(err.is_not_configured(), "{provider}: {err}");
    }

    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_incomplete_shipment_rejected_before_settings_lookup() {
    let ctx = TestContext::new(&[]);
    let request = CourierOrderRequest {
        recipient_phone: " ".to_string(),
        ..shipment()
    };

    let err = ctx
        .state
        .couriers()
        .create_shipment(CourierProvider::Redx, &request)
        .await
        .unwrap_err();

    assert!(matches!(err, CourierError::Validation(ref m) if m == "recipient_phone is required"));
    assert_eq!(ctx.settings.reads(), 0);
}

#[tokio::test]
async fn test_steadfast_shipment_through_route() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/create_order")
                .header("Api-Key", "sf-key")
                .json_body_partial(r#"{"invoice": "INV-2001"}"#);
            then.status(200).json_body(json!({
                "status": 200,
                "consignment": {"consignment_id": 555, "tracking_code": "SF55TRK"}
            }));
        })
        .await;

    let settings = steadfast_settings(&server.base_url());
    let ctx = TestContext::new(&pairs(&settings));

    let (status, body) = ctx
        .request(
            "POST",
            "/api/couriers/steadfast/orders",
            Some(json!({
                "invoice": "INV-2001",
                "recipient_name": "Karim Ahmed",
                "recipient_phone": "01711111111",
                "recipient_address": "Flat 3B, Gulshan 2",
                "cod_amount": "900"
            })),
            true,
        )
        .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Steadfast order created");
    assert_eq!(body["data"]["tracking_code"], "SF55TRK");
    assert_eq!(body["data"]["raw"]["consignment"]["consignment_id"], 555);
}

#[tokio::test]
async fn test_upstream_rejection_surfaces_provider_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/create_order");
            then.status(422)
                .json_body(json!({"status": 422, "errors": {"recipient_phone": ["invalid"]}}));
        })
        .await;

    let settings = steadfast_settings(&server.base_url());
    let ctx = TestContext::new(&pairs(&settings));

    let (status, body) = ctx
        .request(
            "POST",
            "/api/couriers/steadfast/orders",
            Some(json!({
                "invoice": "INV-2002",
                "recipient_name": "Karim Ahmed",
                "recipient_phone": "0171",
                "recipient_address": "Flat 3B, Gulshan 2"
            })),
            true,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["provider_error"]["errors"]["recipient_phone"][0],
        "invalid"
    );
}
