use std::sync::{Arc, Mutex};

use actix_web::{http::StatusCode, test::TestRequest, web};
use gateway_client::{CreatedOrder, GatewayOrderResult, GatewayRejection};
use payment_order_engine::{
    db_types::{OrderStatusType, PaymentOrder},
    order_objects::OrderFlowSettings,
    PaymentInitiationApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{send_request, stored, with_status},
    mocks::{MockGateway, MockOrderStore},
};
use crate::{
    config::ProxyConfig,
    middleware::{DISPLAY_NAME_HEADER, EMAIL_HEADER},
    routes::InitiatePaymentRoute,
};

fn settings() -> OrderFlowSettings {
    OrderFlowSettings {
        app_base_url: "https://shop.test".into(),
        merchant_pos_id: "300746".into(),
        ..Default::default()
    }
}

fn configure(store: MockOrderStore, gateway: MockGateway) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let api = PaymentInitiationApi::new(store, gateway, settings());
        let proxy = ProxyConfig { use_x_forwarded_for: true, ..Default::default() };
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(proxy))
            .service(InitiatePaymentRoute::<MockOrderStore, MockGateway>::new());
    }
}

fn initiate(body: Value) -> TestRequest {
    TestRequest::post()
        .uri("/payments/initiate")
        .insert_header((EMAIL_HEADER, "ada@example.com"))
        .insert_header((DISPLAY_NAME_HEADER, "Ada Lovelace"))
        .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
        .set_json(body)
}

#[actix_web::test]
async fn anonymous_callers_are_refused() {
    let req = TestRequest::post().uri("/payments/initiate").set_json(json!({"amount": 1000, "description": "Frame"}));
    let (status, body) = send_request(req, configure(MockOrderStore::new(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication is required to access this resource."}"#);
}

#[actix_web::test]
async fn successful_initiation() {
    let inserted = Arc::new(Mutex::new(None::<PaymentOrder>));
    let mut store = MockOrderStore::new();
    let saved = Arc::clone(&inserted);
    store.expect_insert_order().times(1).returning(move |order| {
        let order = stored(order);
        *saved.lock().unwrap() = Some(order.clone());
        Ok(order)
    });
    let saved = Arc::clone(&inserted);
    store.expect_record_gateway_acceptance().times(1).returning(move |_, gid, uri| {
        let mut order = saved.lock().unwrap().clone().unwrap();
        order.gateway_order_id = gid.map(String::from);
        order.redirect_uri = Some(uri.to_string());
        Ok(order)
    });
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_order()
        .withf(|req| {
            req.customer_ip == "203.0.113.7" &&
                req.total_amount == "1000" &&
                req.buyer.first_name == "Ada" &&
                req.buyer.last_name == "Lovelace"
        })
        .times(1)
        .returning(|_| {
            GatewayOrderResult::Created(CreatedOrder {
                redirect_uri: "https://pay/x".into(),
                gateway_order_id: Some("G1".into()),
            })
        });
    let req = initiate(json!({"amount": 1000, "description": "Premium Frame"}));
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    let order = inserted.lock().unwrap().clone().unwrap();
    assert_eq!(body["message"], "Payment initiated. Redirecting to the payment provider...");
    assert_eq!(body["redirectUri"], "https://pay/x");
    assert_eq!(body["gatewayOrderId"], "G1");
    assert_eq!(body["internalOrderId"], order.id.as_str());
    assert_eq!(order.description, "Premium Frame");
    assert_eq!(order.buyer_email, "ada@example.com");
}

#[actix_web::test]
async fn invalid_amount_is_a_bad_request() {
    let req = initiate(json!({"amount": 0, "description": "Premium Frame"}));
    let (status, body) = send_request(req, configure(MockOrderStore::new(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["field"], "amount");
}

#[actix_web::test]
async fn unreadable_body_is_a_bad_request() {
    let req = initiate(json!({"amount": "lots", "description": "Premium Frame"}));
    let (status, body) = send_request(req, configure(MockOrderStore::new(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Could not read request body"), "{body}");
}

#[actix_web::test]
async fn gateway_rejection_is_a_bad_gateway() {
    let mut store = MockOrderStore::new();
    store.expect_insert_order().times(1).returning(|order| Ok(stored(order)));
    store.expect_mark_failed_if_pending().times(1).returning(|id| {
        let order = stored(payment_order_engine::db_types::NewPaymentOrder::new(
            pob_common::MinorUnits::try_positive(1000).unwrap(),
            "PLN",
            "Premium Frame",
            Default::default(),
        ));
        Ok(Some(with_status(PaymentOrder { id: id.clone(), ..order }, OrderStatusType::Failed)))
    });
    store.expect_record_gateway_acceptance().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().times(1).returning(|_| {
        GatewayOrderResult::Rejected(GatewayRejection {
            http_status: 400,
            details: json!({"status": {"statusCode": "ERROR_VALUE_INVALID"}}),
        })
    });
    let req = initiate(json!({"amount": 1000, "description": "Premium Frame"}));
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Failed to initiate payment with the payment provider.");
    assert_eq!(body["details"]["httpStatus"], 400);
    assert_eq!(body["details"]["response"]["status"]["statusCode"], "ERROR_VALUE_INVALID");
    assert!(body.get("redirectUri").is_none());
}
