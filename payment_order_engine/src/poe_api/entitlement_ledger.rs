use log::*;

use crate::{
    db_types::{EntitlementGrant, PaymentOrder},
    traits::{EntitlementError, EntitlementHook, EntitlementStore},
};

/// The bundled [`EntitlementHook`]: every completed order grants its buyer the purchased item (the order description).
///
/// Grants are keyed on the order, so calling the hook twice for the same order is harmless. The buyer's active
/// entitlement is the most recently granted one.
#[derive(Debug, Clone)]
pub struct EntitlementLedger<S> {
    store: S,
}

impl<S> EntitlementLedger<S>
where S: EntitlementStore
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn active_entitlement(&self, email: &str) -> Result<Option<EntitlementGrant>, EntitlementError> {
        self.store.latest_grant_for(email.trim()).await
    }
}

impl<S> EntitlementHook for EntitlementLedger<S>
where S: EntitlementStore
{
    async fn on_payment_completed(&self, order: &PaymentOrder) -> Result<(), EntitlementError> {
        if self.store.record_grant(order).await? {
            info!("🔄️ {} now has '{}' (order {})", order.buyer_email, order.description, order.id);
        } else {
            debug!("🔄️ Order {} was already granted. Nothing to do.", order.id);
        }
        Ok(())
    }
}
