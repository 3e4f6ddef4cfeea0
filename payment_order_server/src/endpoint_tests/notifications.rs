use actix_web::{http::StatusCode, test::TestRequest, web};
use payment_order_engine::{
    db_types::{BuyerSnapshot, NewPaymentOrder, OrderStatusType, PaymentOrder},
    NotificationApi,
    PaymentOrderStoreError,
};
use pob_common::{MinorUnits, Secret};

use super::{
    helpers::{send_request, signed_notification, stored, with_status, SIGNATURE_KEY},
    mocks::{MockHook, MockOrderStore},
};
use crate::{config::ProxyConfig, routes::PaymentNotificationRoute};

fn pending_order() -> PaymentOrder {
    let buyer = BuyerSnapshot { email: "ada@example.com".into(), ..Default::default() };
    stored(NewPaymentOrder::new(MinorUnits::try_positive(1000).unwrap(), "PLN", "Premium Frame", buyer))
}

fn configure(
    store: MockOrderStore,
    hook: MockHook,
    key: &str,
    proxy: ProxyConfig,
) -> impl FnOnce(&mut web::ServiceConfig) {
    let key = Secret::new(key.to_string());
    move |cfg| {
        let api = NotificationApi::new(store, hook, key);
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(proxy))
            .service(PaymentNotificationRoute::<MockOrderStore, MockHook>::new());
    }
}

fn notify(body: String, header_name: &str, signature: &str) -> TestRequest {
    TestRequest::post()
        .uri("/payments/notify")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((header_name.to_string(), signature.to_string()))
        .set_payload(body)
}

#[actix_web::test]
async fn completion_is_applied_and_granted() {
    let order = pending_order();
    let (body, signature) = signed_notification(&order.ext_order_id, "G1", "COMPLETED");
    let mut store = MockOrderStore::new();
    let found = order.clone();
    store.expect_fetch_order_by_ext_id().times(1).returning(move |_| Ok(Some(found.clone())));
    let updated = order.clone();
    store
        .expect_compare_and_set_status()
        .withf(|_, expected, new, gid| {
            *expected == OrderStatusType::Pending && *new == OrderStatusType::Completed && *gid == Some("G1")
        })
        .times(1)
        .returning(move |_, _, _, gid| {
            let mut order = with_status(updated.clone(), OrderStatusType::Completed);
            order.gateway_order_id = gid.map(String::from);
            Ok(Some(order))
        });
    let mut hook = MockHook::new();
    hook.expect_on_payment_completed().times(1).returning(|_| Ok(()));
    let req = notify(body, "OpenPayU-Signature", &signature);
    let (status, body) = send_request(req, configure(store, hook, SIGNATURE_KEY, ProxyConfig::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Notification processed.");
}

#[actix_web::test]
async fn bad_signature_is_rejected_without_touching_orders() {
    let (body, _) = signed_notification("abc", "G1", "COMPLETED");
    let (_, other_signature) = signed_notification("abc", "G1", "CANCELED");
    let req = notify(body, "OpenPayU-Signature", &other_signature);
    let (status, body) =
        send_request(req, configure(MockOrderStore::new(), MockHook::new(), SIGNATURE_KEY, ProxyConfig::default()))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"The notification was rejected."#), "{body}");
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let (body, _) = signed_notification("abc", "G1", "COMPLETED");
    let req = TestRequest::post().uri("/payments/notify").set_payload(body);
    let (status, _) =
        send_request(req, configure(MockOrderStore::new(), MockHook::new(), SIGNATURE_KEY, ProxyConfig::default()))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_orders_are_acknowledged() {
    let (body, signature) = signed_notification("GHOST", "G404", "COMPLETED");
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_ext_id().times(1).returning(|_| Ok(None));
    store.expect_fetch_order_by_gateway_id().times(1).returning(|_| Ok(None));
    store.expect_compare_and_set_status().never();
    let mut hook = MockHook::new();
    hook.expect_on_payment_completed().never();
    let req = notify(body, "OpenPayU-Signature", &signature);
    let (status, body) = send_request(req, configure(store, hook, SIGNATURE_KEY, ProxyConfig::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Order not found, acknowledged.");
}

#[actix_web::test]
async fn storage_failures_ask_for_a_redelivery() {
    let (body, signature) = signed_notification("abc", "G1", "COMPLETED");
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_ext_id()
        .times(1)
        .returning(|_| Err(PaymentOrderStoreError::DatabaseError("database is locked".into())));
    let req = notify(body, "OpenPayU-Signature", &signature);
    let (status, _) = send_request(req, configure(store, MockHook::new(), SIGNATURE_KEY, ProxyConfig::default())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn missing_signature_key_is_a_server_error() {
    let (body, signature) = signed_notification("abc", "G1", "COMPLETED");
    let req = notify(body, "OpenPayU-Signature", &signature);
    let (status, body) =
        send_request(req, configure(MockOrderStore::new(), MockHook::new(), "", ProxyConfig::default())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("signature key"), "{body}");
}

#[actix_web::test]
async fn signature_header_name_is_configurable() {
    let order = with_status(pending_order(), OrderStatusType::Completed);
    let (body, signature) = signed_notification(&order.ext_order_id, "G1", "COMPLETED");
    let mut store = MockOrderStore::new();
    let found = order.clone();
    store.expect_fetch_order_by_ext_id().times(1).returning(move |_| {
        let mut order = found.clone();
        order.gateway_order_id = Some("G1".into());
        Ok(Some(order))
    });
    store.expect_compare_and_set_status().never();
    let proxy = ProxyConfig { signature_header: "X-Gateway-Signature".into(), ..Default::default() };
    // Sent under the default name, which is not the configured one
    let req = notify(body.clone(), "OpenPayU-Signature", &signature);
    let (status, _) =
        send_request(req, configure(MockOrderStore::new(), MockHook::new(), SIGNATURE_KEY, proxy.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // A redelivery for an already completed order changes nothing
    let req = notify(body, "X-Gateway-Signature", &signature);
    let (status, body) = send_request(req, configure(store, MockHook::new(), SIGNATURE_KEY, proxy)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Notification processed.");
}
