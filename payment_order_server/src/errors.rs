use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use payment_order_engine::{db_types::OrderId, InitiationError, NotificationError};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid {field}. {reason}")]
    ValidationError { field: String, reason: String },
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication is required to access this resource.")]
    Unauthenticated,
    #[error("Failed to initiate payment with the payment provider.")]
    GatewayError { order_id: OrderId, details: Value },
    #[error("The notification was rejected. {0}")]
    NotificationRejected(String),
    #[error("The order is already {status}.")]
    OrderClosed { order_id: OrderId, status: String },
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::GatewayError { .. } => StatusCode::BAD_GATEWAY,
            Self::NotificationRejected(_) => StatusCode::BAD_REQUEST,
            Self::OrderClosed { .. } => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::GatewayError { order_id, details } => json!({
                "error": self.to_string(),
                "internalOrderId": order_id,
                "details": details,
            }),
            Self::ValidationError { field, .. } => json!({ "error": self.to_string(), "field": field }),
            Self::OrderClosed { order_id, status } => json!({
                "error": self.to_string(),
                "internalOrderId": order_id,
                "status": status,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<InitiationError> for ServerError {
    fn from(e: InitiationError) -> Self {
        match e {
            InitiationError::Validation { field, reason } => Self::ValidationError { field: field.to_string(), reason },
            InitiationError::Configuration(s) => {
                error!("💻️ Payment initiation is misconfigured. {s}");
                Self::ConfigurationError("The payment service is not configured correctly.".into())
            },
            InitiationError::Gateway { order_id, failure } => Self::GatewayError { order_id, details: failure.details() },
            InitiationError::Persistence(e) => Self::BackendError(format!("Could not create the order record. {e}")),
            InitiationError::OrderClosed { order_id, status } => Self::OrderClosed { order_id, status: status.to_string() },
        }
    }
}

impl From<NotificationError> for ServerError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::Configuration(s) => {
                error!("💻️ Notifications cannot be verified. {s}");
                Self::ConfigurationError("Internal server configuration error for signature key.".into())
            },
            NotificationError::Persistence(e) => Self::BackendError(e.to_string()),
            NotificationError::Contention(id) => Self::BackendError(format!("Order {id} is busy. Please retry.")),
        }
    }
}
