use chrono::Utc;
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentOrder, OrderId, OrderStatusType, PaymentOrder},
    traits::PaymentOrderStoreError,
};

/// Inserts a new order into the database using the given connection. The status is always `PENDING`.
///
/// This is not atomic. You can embed this call inside a transaction if you need to ensure atomicity, and pass
/// `&mut *tx` as the connection argument.
pub async fn insert_order(
    order: NewPaymentOrder,
    conn: &mut SqliteConnection,
) -> Result<PaymentOrder, PaymentOrderStoreError> {
    let order: PaymentOrder = sqlx::query_as(
        r#"
            INSERT INTO payment_orders (
                id,
                ext_order_id,
                status,
                amount,
                currency,
                description,
                buyer_email,
                buyer_first_name,
                buyer_last_name,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *;
        "#,
    )
    .bind(order.id.as_str())
    .bind(order.ext_order_id)
    .bind(OrderStatusType::Pending.to_string())
    .bind(order.amount.value())
    .bind(order.currency)
    .bind(order.description)
    .bind(order.buyer.email)
    .bind(order.buyer.first_name)
    .bind(order.buyer.last_name)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with ext id {}", order.id, order.ext_order_id);
    Ok(order)
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<PaymentOrder>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM payment_orders WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_ext_id(
    ext_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentOrder>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM payment_orders WHERE ext_order_id = $1")
        .bind(ext_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_gateway_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentOrder>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM payment_orders WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Stores the redirect URI, and the gateway order id if the order does not have one yet. A terminal order keeps its
/// redirect URI unset.
pub(crate) async fn record_gateway_acceptance(
    id: &OrderId,
    gateway_order_id: Option<&str>,
    redirect_uri: &str,
    conn: &mut SqliteConnection,
) -> Result<PaymentOrder, PaymentOrderStoreError> {
    let result: Option<PaymentOrder> = sqlx::query_as(
        r#"
            UPDATE payment_orders SET
                gateway_order_id = COALESCE(gateway_order_id, $1),
                redirect_uri = CASE WHEN status IN ('COMPLETED', 'CANCELED') THEN redirect_uri ELSE $2 END,
                updated_at = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(gateway_order_id)
    .bind(redirect_uri)
    .bind(Utc::now())
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| PaymentOrderStoreError::OrderNotFound(id.clone()))
}

/// The compare-and-swap at the heart of every status change. The update only happens if the order is still in the
/// `expected` status. `None` means the swap lost.
pub(crate) async fn compare_and_set_status(
    id: &OrderId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    gateway_order_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentOrder>, PaymentOrderStoreError> {
    let result: Option<PaymentOrder> = sqlx::query_as(
        r#"
            UPDATE payment_orders SET
                status = $1,
                gateway_order_id = COALESCE(gateway_order_id, $2),
                updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(new_status.to_string())
    .bind(gateway_order_id)
    .bind(Utc::now())
    .bind(id.as_str())
    .bind(expected.to_string())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ CAS {id} {expected} -> {new_status}: {}", if result.is_some() { "won" } else { "lost" });
    Ok(result)
}

/// Fetches all orders for the buyer, newest first. Emails match case-insensitively.
pub async fn orders_for_buyer(email: &str, conn: &mut SqliteConnection) -> Result<Vec<PaymentOrder>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM payment_orders
            WHERE buyer_email = $1 COLLATE NOCASE
            ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(email.trim())
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
