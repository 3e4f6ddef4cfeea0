use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid gateway configuration. {0}")]
    Configuration(String),
}

/// Reasons an inbound notification fails authentication. None of these cause any order to be read or modified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("The notification did not carry a signature header")]
    MissingHeader,
    #[error("The signature header could not be parsed: {0}")]
    MalformedHeader(String),
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("The notification signature does not match its body")]
    Mismatch,
}
