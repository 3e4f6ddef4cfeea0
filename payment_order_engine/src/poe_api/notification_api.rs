use std::{fmt::Debug, time::Duration};

use gateway_client::{signature::verify_signature, GatewayOrderStatus, OrderNotification};
use log::*;
use pob_common::Secret;
use rand::Rng;

use crate::{
    db_types::{OrderStatusType, PaymentOrder},
    poe_api::{
        errors::NotificationError,
        order_objects::{Acknowledgement, ProcessedOutcome, RejectionReason},
    },
    traits::{EntitlementHook, PaymentOrderStore, PaymentOrderStoreError},
};

/// How many times a status update is attempted before giving up on a busy order.
const MAX_CAS_ATTEMPTS: usize = 8;

/// `NotificationApi` applies the gateway's order status notifications to the matching payment order.
///
/// Notifications arrive at least once, possibly out of order, and possibly concurrently. Every write is a
/// compare-and-swap on the order's current status, so two deliveries of the same notification cannot both move an
/// order into `COMPLETED`, and the entitlement hook runs exactly once per completed order.
pub struct NotificationApi<B, H> {
    db: B,
    hook: H,
    signature_key: Secret<String>,
}

impl<B, H> Debug for NotificationApi<B, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B, H> NotificationApi<B, H> {
    pub fn new(db: B, hook: H, signature_key: Secret<String>) -> Self {
        Self { db, hook, signature_key }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, H> NotificationApi<B, H>
where
    B: PaymentOrderStore,
    H: EntitlementHook,
{
    /// Authenticates, parses and applies a notification.
    ///
    /// Notifications that fail authentication or cannot be parsed are [`Acknowledgement::Rejected`] without touching
    /// any order. Everything else is [`Acknowledgement::Processed`], including notifications for orders we do not know.
    /// An `Err` means the notification could not be applied and should be redelivered.
    pub async fn receive(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<Acknowledgement, NotificationError> {
        if self.signature_key.is_blank() {
            error!("🪛️ The notification signature key is not configured. Notifications cannot be verified.");
            return Err(NotificationError::Configuration("The signature key is not set".into()));
        }
        if let Err(e) = verify_signature(raw_body, signature_header, &self.signature_key) {
            warn!("📨️ Rejecting notification. {e}");
            return Ok(Acknowledgement::Rejected(RejectionReason::Signature(e)));
        }
        let notification = match serde_json::from_slice::<OrderNotification>(raw_body) {
            Ok(n) => n,
            Err(e) => {
                warn!("📨️ Rejecting notification. The body could not be parsed: {e}");
                return Ok(Acknowledgement::Rejected(RejectionReason::MalformedPayload(e.to_string())));
            },
        };
        let ext_order_id = notification.order.ext_order_id();
        let gateway_order_id = notification.order.gateway_order_id();
        if ext_order_id.is_none() && gateway_order_id.is_none() {
            warn!("📨️ Rejecting notification. It carries neither an extOrderId nor an orderId.");
            return Ok(Acknowledgement::Rejected(RejectionReason::MalformedPayload(
                "The notification does not identify an order".into(),
            )));
        }
        let gateway_status = notification.order.gateway_status();
        info!(
            "📨️ Notification received. extOrderId: {}, orderId: {}, status: {gateway_status}",
            ext_order_id.unwrap_or("-"),
            gateway_order_id.unwrap_or("-")
        );
        let Some(order) = self.resolve_order(ext_order_id, gateway_order_id).await? else {
            info!("📨️ No order matches the notification. Acknowledged without changes.");
            return Ok(Acknowledgement::Processed(ProcessedOutcome::OrderNotFound));
        };
        let outcome = self.apply_status(order, &gateway_status, gateway_order_id).await?;
        Ok(Acknowledgement::Processed(outcome))
    }

    async fn resolve_order(
        &self,
        ext_order_id: Option<&str>,
        gateway_order_id: Option<&str>,
    ) -> Result<Option<PaymentOrder>, NotificationError> {
        if let Some(ext_id) = ext_order_id {
            if let Some(order) = self.db.fetch_order_by_ext_id(ext_id).await? {
                return Ok(Some(order));
            }
        }
        match gateway_order_id {
            Some(gid) => Ok(self.db.fetch_order_by_gateway_id(gid).await?),
            None => Ok(None),
        }
    }

    /// The read-decide-write loop. Each pass decides the new status from the order as last read, and writes it only if
    /// the order is still in that status. A lost race re-reads the order and decides again.
    ///
    /// A gateway order id that already belongs to another order is not backfilled; the status is still applied.
    async fn apply_status(
        &self,
        mut order: PaymentOrder,
        gateway_status: &GatewayOrderStatus,
        gateway_order_id: Option<&str>,
    ) -> Result<ProcessedOutcome, NotificationError> {
        let mut gateway_order_id = gateway_order_id;
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = order.status;
            let backfill = gateway_order_id.filter(|_| order.gateway_order_id.is_none());
            let target = match current.transition_for(gateway_status) {
                Some(next) if next != current => next,
                _ if backfill.is_some() => current,
                _ => {
                    debug!("📨️ Order {} stays {current}. Gateway status: {gateway_status}", order.id);
                    return Ok(ProcessedOutcome::Unchanged { order_id: order.id, status: current });
                },
            };
            let swapped = match self.db.compare_and_set_status(&order.id, current, target, backfill).await {
                Err(PaymentOrderStoreError::ConstraintViolation(e)) if backfill.is_some() => {
                    warn!(
                        "📨️ Gateway order id {} is already taken by another order. Order {} is updated without it. {e}",
                        backfill.unwrap_or_default(),
                        order.id
                    );
                    gateway_order_id = None;
                    continue;
                },
                result => result?,
            };
            match swapped {
                Some(updated) => {
                    info!("📨️ Order {} moved from {current} to {target}", updated.id);
                    if target == OrderStatusType::Completed && current != OrderStatusType::Completed {
                        self.grant_entitlement(&updated).await;
                    }
                    return Ok(ProcessedOutcome::Applied { order_id: updated.id, from: current, to: target });
                },
                None => {
                    debug!("📨️ Order {} changed underneath us (attempt {attempt}). Re-reading.", order.id);
                    order = self
                        .db
                        .fetch_order(&order.id)
                        .await?
                        .ok_or_else(|| PaymentOrderStoreError::OrderNotFound(order.id.clone()))?;
                    let pause = rand::thread_rng().gen_range(1..=10u64);
                    tokio::time::sleep(Duration::from_millis(pause)).await;
                },
            }
        }
        warn!("📨️ Giving up on order {} after {MAX_CAS_ATTEMPTS} attempts. The gateway will redeliver.", order.id);
        Err(NotificationError::Contention(order.id))
    }

    async fn grant_entitlement(&self, order: &PaymentOrder) {
        match self.hook.on_payment_completed(order).await {
            Ok(()) => info!("📨️ Entitlement for order {} handed over to {}", order.id, order.buyer_email),
            Err(e) => error!("📨️ The entitlement hook failed for completed order {}. {e}", order.id),
        }
    }
}
