//! Payment Order Engine
//!
//! The payment order engine brokers a purchase between the local order ledger and an external card gateway. It is
//! storage-agnostic and knows nothing about what is being bought.
//!
//! The library is divided into these sections:
//! 1. Data types ([`mod@db_types`]). Payment orders, their status state machine, and the buyer identity that is copied
//!    onto each order.
//! 2. Backend contracts ([`mod@traits`]). Storage, the gateway, and the entitlement hook are all traits, so that each
//!    can be swapped out or mocked. A SQLite backend is provided ([`SqliteDatabase`]).
//! 3. The public API ([`mod@poe_api`]):
//!    * [`PaymentInitiationApi`] creates an order and registers it with the gateway.
//!    * [`NotificationApi`] verifies and applies the gateway's asynchronous status notifications, and calls the
//!      [`EntitlementHook`] once per completed order.
//!    * [`OrderStatusApi`] answers "what happened to my order?".
//!    * [`EntitlementLedger`] is a ready-made [`EntitlementHook`] that records what each buyer has paid for.
pub mod db_types;
pub mod poe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use poe_api::{
    entitlement_ledger::EntitlementLedger,
    errors::{InitiationError, NotificationError},
    initiation_api::PaymentInitiationApi,
    notification_api::NotificationApi,
    order_objects,
    order_status_api::OrderStatusApi,
};
pub use traits::{
    EntitlementError,
    EntitlementHook,
    EntitlementStore,
    NoEntitlements,
    PaymentGateway,
    PaymentOrderStore,
    PaymentOrderStoreError,
};
