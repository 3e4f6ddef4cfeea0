use gateway_client::{GatewayClient, GatewayOrderResult, OrderCreateRequest};

/// Anything that can register an order with the card gateway.
///
/// Implementations must make exactly one attempt and report every outcome as a [`GatewayOrderResult`].
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_order(&self, order: &OrderCreateRequest) -> GatewayOrderResult;
}

impl PaymentGateway for GatewayClient {
    async fn create_order(&self, order: &OrderCreateRequest) -> GatewayOrderResult {
        GatewayClient::create_order(self, order).await
    }
}
