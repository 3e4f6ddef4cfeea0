use thiserror::Error;

use crate::db_types::{EntitlementGrant, PaymentOrder};

#[derive(Debug, Clone, Error)]
pub enum EntitlementError {
    #[error("Could not record the entitlement. {0}")]
    StorageError(String),
    #[error("The entitlement could not be granted. {0}")]
    GrantFailed(String),
}

/// Called once for every order that reaches `COMPLETED`.
///
/// Implementations must be idempotent. Errors are logged by the caller and go no further: the order is already
/// durably `COMPLETED` when this is called.
#[allow(async_fn_in_trait)]
pub trait EntitlementHook {
    async fn on_payment_completed(&self, order: &PaymentOrder) -> Result<(), EntitlementError>;
}

/// A hook that grants nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntitlements;

impl EntitlementHook for NoEntitlements {
    async fn on_payment_completed(&self, _order: &PaymentOrder) -> Result<(), EntitlementError> {
        Ok(())
    }
}

/// Storage for entitlement grants. One grant per order.
#[allow(async_fn_in_trait)]
pub trait EntitlementStore: Clone {
    /// Records a grant for the order. Returns `false` if the order already had one, in which case nothing changes.
    async fn record_grant(&self, order: &PaymentOrder) -> Result<bool, EntitlementError>;

    /// The most recent grant for the buyer, if any.
    async fn latest_grant_for(&self, email: &str) -> Result<Option<EntitlementGrant>, EntitlementError>;
}
