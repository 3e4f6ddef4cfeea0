//! `SqliteDatabase` is a concrete implementation of a payment order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, entitlements, new_pool, orders};
use crate::{
    db_types::{EntitlementGrant, NewPaymentOrder, OrderId, OrderStatusType, PaymentOrder},
    traits::{EntitlementError, EntitlementStore, PaymentOrderStore, PaymentOrderStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentOrderStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewPaymentOrder) -> Result<PaymentOrder, PaymentOrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<PaymentOrder>, PaymentOrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_ext_id(&self, ext_order_id: &str) -> Result<Option<PaymentOrder>, PaymentOrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_ext_id(ext_order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_gateway_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentOrder>, PaymentOrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_gateway_id(gateway_order_id, &mut conn).await?;
        Ok(order)
    }

    async fn record_gateway_acceptance(
        &self,
        id: &OrderId,
        gateway_order_id: Option<&str>,
        redirect_uri: &str,
    ) -> Result<PaymentOrder, PaymentOrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::record_gateway_acceptance(id, gateway_order_id, redirect_uri, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {id} accepted by the gateway as {}", order.gateway_order_id.as_deref().unwrap_or("(no id)"));
        Ok(order)
    }

    async fn mark_failed_if_pending(&self, id: &OrderId) -> Result<Option<PaymentOrder>, PaymentOrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::compare_and_set_status(id, OrderStatusType::Pending, OrderStatusType::Failed, None, &mut tx)
                .await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn compare_and_set_status(
        &self,
        id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
        gateway_order_id: Option<&str>,
    ) -> Result<Option<PaymentOrder>, PaymentOrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::compare_and_set_status(id, expected, new_status, gateway_order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn orders_for_buyer(&self, email: &str) -> Result<Vec<PaymentOrder>, PaymentOrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_buyer(email, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) -> Result<(), PaymentOrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl EntitlementStore for SqliteDatabase {
    async fn record_grant(&self, order: &PaymentOrder) -> Result<bool, EntitlementError> {
        let mut conn = self.pool.acquire().await.map_err(|e| EntitlementError::StorageError(e.to_string()))?;
        entitlements::insert_grant(order, &mut conn).await.map_err(|e| EntitlementError::StorageError(e.to_string()))
    }

    async fn latest_grant_for(&self, email: &str) -> Result<Option<EntitlementGrant>, EntitlementError> {
        let mut conn = self.pool.acquire().await.map_err(|e| EntitlementError::StorageError(e.to_string()))?;
        entitlements::latest_grant_for(email, &mut conn)
            .await
            .map_err(|e| EntitlementError::StorageError(e.to_string()))
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `POB_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
