//! # Backend contracts
//!
//! The engine's APIs are generic over these traits, so that the storage backend, the gateway and the entitlement side
//! effect can each be swapped out (or mocked) independently.
//!
//! * [`PaymentOrderStore`] persists payment orders and performs the compare-and-swap status updates that keep
//!   concurrent notifications from trampling each other.
//! * [`PaymentGateway`] creates orders with the card gateway. It is implemented for [`gateway_client::GatewayClient`].
//! * [`EntitlementHook`] is told about every order that reaches `COMPLETED`. The engine does not know or care what was
//!   bought.
//! * [`EntitlementStore`] backs the bundled [`crate::EntitlementLedger`] hook.
mod entitlements;
mod payment_gateway;
mod payment_order_store;

pub use entitlements::{EntitlementError, EntitlementHook, EntitlementStore, NoEntitlements};
pub use payment_gateway::PaymentGateway;
pub use payment_order_store::{PaymentOrderStore, PaymentOrderStoreError};
