use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use gateway_client::signature::calculate_signature;
use log::debug;
use payment_order_engine::db_types::{NewPaymentOrder, OrderStatusType, PaymentOrder};
use serde_json::json;

use crate::{middleware::IdentityHeadersFactory, server::json_config};

pub const SIGNATURE_KEY: &str = "b6ca15b0d1020e8094d9b5f8d163db54";

/// Runs a single request against an app holding whatever `configure` registers. Identity headers are trusted.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init().ok();
    let app = App::new().wrap(IdentityHeadersFactory::new(true)).app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

/// What the store would hand back after inserting `order`.
pub fn stored(order: NewPaymentOrder) -> PaymentOrder {
    PaymentOrder {
        id: order.id,
        ext_order_id: order.ext_order_id,
        gateway_order_id: None,
        status: OrderStatusType::Pending,
        amount: order.amount,
        currency: order.currency,
        description: order.description,
        buyer_email: order.buyer.email,
        buyer_first_name: order.buyer.first_name,
        buyer_last_name: order.buyer.last_name,
        redirect_uri: None,
        created_at: order.created_at,
        updated_at: order.created_at,
    }
}

pub fn with_status(mut order: PaymentOrder, status: OrderStatusType) -> PaymentOrder {
    order.status = status;
    order
}

pub fn signed_notification(ext_order_id: &str, gateway_order_id: &str, status: &str) -> (String, String) {
    let body = json!({
        "order": {"orderId": gateway_order_id, "extOrderId": ext_order_id, "status": status, "totalAmount": "1000"}
    })
    .to_string();
    let signature = calculate_signature(body.as_bytes(), SIGNATURE_KEY);
    (body, format!("sender=checkout;signature={signature};algorithm=SHA-256;content=DOCUMENT"))
}
