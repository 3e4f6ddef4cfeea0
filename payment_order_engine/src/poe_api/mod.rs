//! The public API of the payment order engine.
//!
//! Each API object is generic over the backend traits in [`crate::traits`], and holds its own clone of the backend.
pub mod entitlement_ledger;
pub mod errors;
pub mod initiation_api;
pub mod notification_api;
pub mod order_objects;
pub mod order_status_api;
