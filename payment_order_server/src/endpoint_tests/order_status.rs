use actix_web::{http::StatusCode, test::TestRequest, web};
use payment_order_engine::{
    db_types::{BuyerSnapshot, EntitlementGrant, NewPaymentOrder, OrderStatusType, PaymentOrder},
    EntitlementLedger,
    OrderStatusApi,
};
use pob_common::MinorUnits;
use serde_json::Value;

use super::{
    helpers::{send_request, stored, with_status},
    mocks::{MockGrantStore, MockOrderStore},
};
use crate::{
    middleware::EMAIL_HEADER,
    routes::{MyEntitlementRoute, MyOrdersRoute, PaymentFinishRoute},
};

fn order_for(email: &str, description: &str) -> PaymentOrder {
    let buyer = BuyerSnapshot { email: email.into(), ..Default::default() };
    stored(NewPaymentOrder::new(MinorUnits::try_positive(1000).unwrap(), "PLN", description, buyer))
}

fn configure(store: MockOrderStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderStatusApi::new(store)))
            .service(PaymentFinishRoute::<MockOrderStore>::new())
            .service(MyOrdersRoute::<MockOrderStore>::new());
    }
}

#[actix_web::test]
async fn finish_page_for_a_completed_order() {
    let order = with_status(order_for("ada@example.com", "Premium Frame"), OrderStatusType::Completed);
    let uri = format!("/payments/finish?internal_order_id={}", order.id.as_str());
    let mut store = MockOrderStore::new();
    let found = order.clone();
    store.expect_fetch_order().times(1).returning(move |_| Ok(Some(found.clone())));
    let (status, body) = send_request(TestRequest::get().uri(&uri), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["isError"], false);
    assert_eq!(body["order"]["status"], "COMPLETED");
    assert!(body["message"].as_str().unwrap().ends_with("has been completed successfully."));
}

#[actix_web::test]
async fn finish_page_hides_other_buyers_orders() {
    let order = order_for("ada@example.com", "Premium Frame");
    let uri = format!("/payments/finish?internal_order_id={}", order.id.as_str());
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().times(1).returning(move |_| Ok(Some(order.clone())));
    let req = TestRequest::get().uri(&uri).insert_header((EMAIL_HEADER, "mallory@example.com"));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["order"].is_null());
    assert_eq!(body["message"], "The details of your order could not be found.");
}

#[actix_web::test]
async fn finish_page_reports_gateway_errors() {
    let req = TestRequest::get().uri("/payments/finish?error=501");
    let (status, body) = send_request(req, configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["isError"], true);
    assert!(body["message"].as_str().unwrap().contains("error code: 501"));
}

#[actix_web::test]
async fn my_orders_requires_a_principal() {
    let (status, _) = send_request(TestRequest::get().uri("/payments/orders"), configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut store = MockOrderStore::new();
    store
        .expect_orders_for_buyer()
        .withf(|email| email.to_string() == "ada@example.com")
        .times(1)
        .returning(|email| Ok(vec![order_for(email, "Gold Frame"), order_for(email, "Silver Frame")]));
    let req = TestRequest::get().uri("/payments/orders").insert_header((EMAIL_HEADER, "ada@example.com"));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    let descriptions = body.as_array().unwrap().iter().map(|o| o["description"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(descriptions, vec!["Gold Frame", "Silver Frame"]);
}

#[actix_web::test]
async fn my_entitlement() {
    let order = order_for("ada@example.com", "Gold Frame");
    let grant = EntitlementGrant {
        order_id: order.id.clone(),
        buyer_email: order.buyer_email.clone(),
        item: order.description.clone(),
        granted_at: order.created_at,
    };
    let mut store = MockGrantStore::new();
    store.expect_latest_grant_for().times(1).returning(move |_| Ok(Some(grant.clone())));
    let configure = move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(EntitlementLedger::new(store)))
            .service(MyEntitlementRoute::<MockGrantStore>::new());
    };
    let req = TestRequest::get().uri("/payments/entitlement").insert_header((EMAIL_HEADER, "ada@example.com"));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["entitlement"]["item"], "Gold Frame");
}
