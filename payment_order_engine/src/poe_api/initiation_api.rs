use std::fmt::Debug;

use gateway_client::{Buyer, GatewayOrderResult, OrderCreateRequest, Product};
use log::*;
use pob_common::MinorUnits;

use crate::{
    db_types::{NewPaymentOrder, PaymentOrder, Principal},
    poe_api::{
        errors::InitiationError,
        order_objects::{GatewayFailure, InitiationRequest, InitiationResult, OrderFlowSettings},
    },
    traits::{PaymentGateway, PaymentOrderStore},
};

pub const MAX_DESCRIPTION_LENGTH: usize = 255;
const FALLBACK_FIRST_NAME: &str = "Customer";
const FALLBACK_LAST_NAME: &str = "Unknown";

/// `PaymentInitiationApi` turns a purchase request from an authenticated buyer into a payment order, and registers
/// that order with the card gateway.
///
/// The gateway is called exactly once per request. Whatever it says is written back to the order before this API
/// returns.
pub struct PaymentInitiationApi<B, G> {
    db: B,
    gateway: G,
    settings: OrderFlowSettings,
}

impl<B, G> Debug for PaymentInitiationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentInitiationApi")
    }
}

impl<B, G> PaymentInitiationApi<B, G> {
    pub fn new(db: B, gateway: G, settings: OrderFlowSettings) -> Self {
        Self { db, gateway, settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> PaymentInitiationApi<B, G>
where
    B: PaymentOrderStore,
    G: PaymentGateway,
{
    /// Creates a `PENDING` order for the principal and asks the gateway to create a matching order.
    ///
    /// * On success the gateway's order id and redirect URI are stored on the order and returned.
    /// * On any gateway failure the order is marked `FAILED` (if it is still `PENDING`) and
    ///   [`InitiationError::Gateway`] is returned, with the upstream details attached.
    /// * Invalid input and missing configuration are reported before any order is created.
    pub async fn initiate(
        &self,
        principal: &Principal,
        request: InitiationRequest,
        client_ip: &str,
    ) -> Result<InitiationResult, InitiationError> {
        let (amount, description) = validate_request(principal, &request)?;
        self.check_settings()?;
        let buyer = principal.buyer_snapshot();
        let new_order = NewPaymentOrder::new(amount, &self.settings.currency, &description, buyer);
        let order = self.db.insert_order(new_order).await?;
        info!("🔄️ Order {} created for {} ({} {})", order.id, order.buyer_email, order.amount, order.currency);
        let payload = self.order_create_request(&order, client_ip);
        let failure = match self.gateway.create_order(&payload).await {
            GatewayOrderResult::Created(created) => {
                let updated = self
                    .db
                    .record_gateway_acceptance(&order.id, created.gateway_order_id.as_deref(), &created.redirect_uri)
                    .await?;
                if updated.status.is_terminal() {
                    warn!(
                        "🔄️ Order {} was already {} when the gateway accepted it. The redirect is withheld.",
                        order.id, updated.status
                    );
                    return Err(InitiationError::OrderClosed { order_id: updated.id, status: updated.status });
                }
                info!(
                    "🔄️ Order {} registered with the gateway as {}",
                    order.id,
                    updated.gateway_order_id.as_deref().unwrap_or("(unknown)")
                );
                return Ok(InitiationResult {
                    redirect_uri: created.redirect_uri,
                    internal_order_id: updated.id,
                    gateway_order_id: created.gateway_order_id,
                });
            },
            GatewayOrderResult::Rejected(r) => GatewayFailure::Rejected(r),
            GatewayOrderResult::TransportFailure(t) => GatewayFailure::Transport(t),
            GatewayOrderResult::NoToken => GatewayFailure::NoToken,
        };
        warn!("🔄️ Order {} could not be registered with the gateway: {failure}", order.id);
        match self.db.mark_failed_if_pending(&order.id).await? {
            Some(_) => debug!("🔄️ Order {} marked as FAILED", order.id),
            None => info!("🔄️ Order {} had already moved on from PENDING. Its status was left alone.", order.id),
        }
        Err(InitiationError::Gateway { order_id: order.id, failure })
    }

    fn check_settings(&self) -> Result<(), InitiationError> {
        if self.settings.app_base_url.trim().is_empty() {
            error!("🪛️ The application base URL is not configured. Callback URLs cannot be built.");
            return Err(InitiationError::Configuration("The callback base URL is not set".into()));
        }
        if self.settings.merchant_pos_id.trim().is_empty() {
            error!("🪛️ The gateway merchant POS id is not configured.");
            return Err(InitiationError::Configuration("The merchant POS id is not set".into()));
        }
        Ok(())
    }

    fn order_create_request(&self, order: &PaymentOrder, client_ip: &str) -> OrderCreateRequest {
        let or_fallback = |s: &str, fallback: &str| if s.is_empty() { fallback.to_string() } else { s.to_string() };
        let amount = order.amount.to_wire_string();
        OrderCreateRequest {
            notify_url: self.settings.notify_url(),
            continue_url: self.settings.continue_url(&order.id),
            customer_ip: client_ip.to_string(),
            merchant_pos_id: self.settings.merchant_pos_id.clone(),
            description: order.description.clone(),
            currency_code: order.currency.clone(),
            total_amount: amount.clone(),
            ext_order_id: order.ext_order_id.clone(),
            buyer: Buyer {
                email: order.buyer_email.clone(),
                first_name: or_fallback(&order.buyer_first_name, FALLBACK_FIRST_NAME),
                last_name: or_fallback(&order.buyer_last_name, FALLBACK_LAST_NAME),
                language: self.settings.buyer_language.clone(),
            },
            products: vec![Product { name: order.description.clone(), unit_price: amount, quantity: "1".to_string() }],
        }
    }
}

fn validate_request(
    principal: &Principal,
    request: &InitiationRequest,
) -> Result<(MinorUnits, String), InitiationError> {
    let amount = MinorUnits::try_positive(request.amount).map_err(|e| InitiationError::validation("amount", e.to_string()))?;
    let description = request.description.trim();
    if description.is_empty() {
        return Err(InitiationError::validation("description", "A description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(InitiationError::validation(
            "description",
            format!("The description may be at most {MAX_DESCRIPTION_LENGTH} characters long"),
        ));
    }
    if principal.email.trim().is_empty() {
        return Err(InitiationError::validation("buyer email", "The buyer must have an email address"));
    }
    Ok((amount, description.to_string()))
}
