use payment_order_engine::order_objects::InitiationResult;
use serde::{Deserialize, Serialize};

pub const INITIATION_MESSAGE: &str = "Payment initiated. Redirecting to the payment provider...";

#[derive(Debug, Clone, Serialize)]
pub struct InitiationResponse {
    pub message: String,
    #[serde(flatten)]
    pub result: InitiationResult,
}

impl From<InitiationResult> for InitiationResponse {
    fn from(result: InitiationResult) -> Self {
        Self { message: INITIATION_MESSAGE.to_string(), result }
    }
}

/// Query parameters of the page the gateway sends the buyer back to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinishParams {
    pub internal_order_id: Option<String>,
    /// Set by the gateway when the payment flow broke.
    pub error: Option<String>,
}
