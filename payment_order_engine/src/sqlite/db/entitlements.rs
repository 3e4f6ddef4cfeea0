use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{EntitlementGrant, PaymentOrder};

/// Records a grant for the order's buyer. Returns `false` if the order already has a grant.
pub async fn insert_grant(order: &PaymentOrder, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO entitlement_grants (order_id, buyer_email, item, granted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id) DO NOTHING;
        "#,
    )
    .bind(order.id.as_str())
    .bind(&order.buyer_email)
    .bind(&order.description)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn latest_grant_for(email: &str, conn: &mut SqliteConnection) -> Result<Option<EntitlementGrant>, sqlx::Error> {
    let grant = sqlx::query_as(
        r#"
            SELECT * FROM entitlement_grants
            WHERE buyer_email = $1 COLLATE NOCASE
            ORDER BY granted_at DESC, rowid DESC
            LIMIT 1
        "#,
    )
    .bind(email.trim())
    .fetch_optional(conn)
    .await?;
    Ok(grant)
}
