//! # Payment order server
//! This module hosts the HTTP adapter for the payment order engine. It is responsible for:
//! * Starting card payments for authenticated buyers, and handing back the gateway's payment page URL.
//! * Receiving the gateway's signed status notifications and applying them to the order ledger.
//! * Telling buyers what happened to their order when the gateway sends them back.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /payments/initiate`: Start a payment. Requires an authenticated buyer.
//! * `POST /payments/notify`: The gateway's status notification webhook.
//! * `GET /payments/finish`: Where the gateway sends the buyer back to.
//! * `GET /payments/orders`: The authenticated buyer's orders.
//! * `GET /payments/entitlement`: What the authenticated buyer most recently paid for.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
