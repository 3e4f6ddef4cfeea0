use std::fmt::Debug;

use log::*;
use uuid::Uuid;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentOrder},
    poe_api::order_objects::OrderStatusSummary,
    traits::{PaymentOrderStore, PaymentOrderStoreError},
};

const DEFAULT_MESSAGE: &str =
    "Thank you! Your payment is being processed. You will receive a confirmation of its status shortly.";
const ORDER_NOT_FOUND: &str = "The details of your order could not be found.";
const INVALID_ORDER_ID: &str = "An error occurred while reading your order details (invalid identifier).";
const LOOKUP_FAILED: &str = "An error occurred while fetching your order details.";
const PAYMENT_FAILED: &str = "Unfortunately your payment did not go through. Please try again or contact us.";
const CONTACT_SUPPORT: &str = "If you have been charged, please contact support.";

/// Read-only views of payment orders: the summary shown when the buyer returns from the gateway, and the order history
/// of a buyer.
pub struct OrderStatusApi<B> {
    db: B,
}

impl<B> Debug for OrderStatusApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderStatusApi")
    }
}

impl<B> OrderStatusApi<B>
where B: PaymentOrderStore
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Summarises the state of an order for the buyer who has just been sent back by the gateway.
    ///
    /// If `principal_email` is given, orders that belong to someone else are treated as not found. A `gateway_error`
    /// (the gateway appends one to the continue URL when the payment flow broke) always marks the summary as an error.
    /// Lookup problems are reported in the message, never as an `Err`.
    pub async fn order_status(
        &self,
        internal_order_id: Option<&str>,
        principal_email: Option<&str>,
        gateway_error: Option<&str>,
    ) -> OrderStatusSummary {
        let (order, order_message) = match internal_order_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => self.lookup(id, principal_email).await,
            None => (None, None),
        };
        let gateway_error = gateway_error.map(str::trim).filter(|s| !s.is_empty());
        let failed = order.as_ref().map(|o| o.status == OrderStatusType::Failed).unwrap_or(false);
        let (message, is_error) = match (gateway_error, order_message) {
            (Some(code), msg) => {
                info!("🔄️ Buyer returned from the gateway with error code {code}");
                let detail = msg.unwrap_or_else(|| CONTACT_SUPPORT.to_string());
                (format!("The payment provider reported an error (error code: {code}). {detail}"), true)
            },
            (None, Some(msg)) => (msg, failed),
            (None, None) if failed => (PAYMENT_FAILED.to_string(), true),
            (None, None) => (DEFAULT_MESSAGE.to_string(), false),
        };
        OrderStatusSummary { message, is_error, order }
    }

    /// All orders placed by the buyer, newest first.
    pub async fn orders_for_buyer(&self, email: &str) -> Result<Vec<PaymentOrder>, PaymentOrderStoreError> {
        self.db.orders_for_buyer(email.trim()).await
    }

    async fn lookup(&self, id: &str, principal_email: Option<&str>) -> (Option<PaymentOrder>, Option<String>) {
        if Uuid::parse_str(id).is_err() {
            warn!("🔄️ Invalid internal order id in the continue URL: {id}");
            return (None, Some(INVALID_ORDER_ID.to_string()));
        }
        let order = match self.db.fetch_order(&OrderId(id.to_string())).await {
            Ok(order) => order,
            Err(e) => {
                error!("🔄️ Could not fetch order {id} for the status summary. {e}");
                return (None, Some(LOOKUP_FAILED.to_string()));
            },
        };
        let order = order.filter(|o| match principal_email {
            Some(email) => o.buyer_email.eq_ignore_ascii_case(email.trim()),
            None => true,
        });
        match order {
            Some(order) => {
                let message = status_message(&order);
                (Some(order), message)
            },
            None => {
                warn!("🔄️ Order {id} was not found, or does not belong to the caller");
                (None, Some(ORDER_NOT_FOUND.to_string()))
            },
        }
    }
}

fn status_message(order: &PaymentOrder) -> Option<String> {
    let what = format!("Payment for order '{}' (ID: {})", order.description, order.ext_order_id);
    match order.status {
        OrderStatusType::Completed => Some(format!("{what} has been completed successfully.")),
        OrderStatusType::Canceled => Some(format!("{what} has been canceled.")),
        OrderStatusType::Failed => Some(format!("{what} has failed.")),
        OrderStatusType::Pending | OrderStatusType::Processing => None,
    }
}
