use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use gateway_client::{
    signature::calculate_signature,
    CreatedOrder,
    GatewayOrderResult,
    GatewayRejection,
    OrderCreateRequest,
    TransportErrorKind,
    TransportFailure,
};
use payment_order_engine::{
    db_types::{OrderId, PaymentOrder},
    EntitlementError,
    EntitlementHook,
    PaymentGateway,
};
use serde_json::json;

pub const SIGNATURE_KEY: &str = "b6ca15b0d1020e8094d9b5f8d163db54";

/// A gateway that always gives the same answer, and remembers what it was asked.
#[derive(Clone)]
pub struct StubGateway {
    result: GatewayOrderResult,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<OrderCreateRequest>>>,
}

impl StubGateway {
    pub fn new(result: GatewayOrderResult) -> Self {
        Self { result, calls: Arc::new(AtomicUsize::new(0)), requests: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn created(redirect_uri: &str, gateway_order_id: Option<&str>) -> Self {
        Self::new(GatewayOrderResult::Created(CreatedOrder {
            redirect_uri: redirect_uri.to_string(),
            gateway_order_id: gateway_order_id.map(String::from),
        }))
    }

    pub fn timeout() -> Self {
        Self::new(GatewayOrderResult::TransportFailure(TransportFailure::new(
            TransportErrorKind::Timeout,
            "operation timed out",
        )))
    }

    pub fn rejected() -> Self {
        Self::new(GatewayOrderResult::Rejected(GatewayRejection {
            http_status: 400,
            details: json!({"status": {"statusCode": "ERROR_VALUE_INVALID", "codeLiteral": "INVALID_TOTAL_AMOUNT"}}),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<OrderCreateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl PaymentGateway for StubGateway {
    async fn create_order(&self, order: &OrderCreateRequest) -> GatewayOrderResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(order.clone());
        self.result.clone()
    }
}

/// Counts hook invocations, and optionally fails every one of them.
#[derive(Clone, Default)]
pub struct CountingHook {
    granted: Arc<Mutex<Vec<OrderId>>>,
    fail: bool,
}

impl CountingHook {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn count(&self) -> usize {
        self.granted.lock().unwrap().len()
    }

    pub fn granted(&self) -> Vec<OrderId> {
        self.granted.lock().unwrap().clone()
    }
}

impl EntitlementHook for CountingHook {
    async fn on_payment_completed(&self, order: &PaymentOrder) -> Result<(), EntitlementError> {
        self.granted.lock().unwrap().push(order.id.clone());
        if self.fail {
            Err(EntitlementError::GrantFailed("the profile service is down".into()))
        } else {
            Ok(())
        }
    }
}

/// A notification body for the order, with its signature header.
pub fn signed_notification(ext_order_id: Option<&str>, gateway_order_id: Option<&str>, status: &str) -> (Vec<u8>, String) {
    let mut order = json!({
        "status": status,
        "totalAmount": "1000",
        "currencyCode": "PLN",
        "buyer": {"email": "ada@example.com", "language": "pl"}
    });
    if let Some(ext) = ext_order_id {
        order["extOrderId"] = json!(ext);
    }
    if let Some(gid) = gateway_order_id {
        order["orderId"] = json!(gid);
    }
    let body = serde_json::to_vec(&json!({"order": order, "localReceiptDateTime": "2024-06-01T10:00:00.000+02:00"}))
        .unwrap();
    let header = sign(&body);
    (body, header)
}

pub fn sign(body: &[u8]) -> String {
    format!("sender=checkout;signature={};algorithm=SHA-256;content=DOCUMENT", calculate_signature(body, SIGNATURE_KEY))
}
