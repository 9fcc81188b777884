//! Error types for the application

use thiserror::Error;

/// Result type alias using our TraderError
pub type Result<T> = std::result::Result<T, TraderError>;

/// Main error type for venue, session and collaborator operations
#[derive(Error, Debug)]
pub enum TraderError {
    /// WebSocket connection errors
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    /// WebSocket send/receive errors
    #[error("WebSocket communication error: {0}")]
    WebSocketCommunication(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Credential rejected by the venue
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Error payload returned by the venue for a request
    #[error("Venue API error [{code}]: {message}")]
    Api { code: String, message: String },

    /// Proposal or purchase rejected by the venue
    #[error("Order rejected: {0}")]
    Order(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Entitlement collaborator could not answer
    #[error("Entitlement check failed: {0}")]
    Entitlement(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session parameters that violate the session invariants
    #[error("Invalid session configuration: {0}")]
    InvalidSession(String),

    /// Configuration attempted while a session is running
    #[error("Session already running")]
    SessionActive,

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl TraderError {
    /// Whether this error is a rejected order rather than a connection fault.
    ///
    /// Rejected orders are a missed opportunity for the tick; everything else
    /// raised inside a tick invalidates the current venue connection.
    pub fn is_order_rejection(&self) -> bool {
        matches!(self, TraderError::Order(_))
    }

    /// Whether the error came from the transport layer (socket, timeout, framing)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TraderError::WebSocketConnection(_)
                | TraderError::WebSocketCommunication(_)
                | TraderError::Timeout(_)
                | TraderError::JsonParse(_)
                | TraderError::InvalidResponse(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TraderError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TraderError::WebSocketCommunication(err.to_string())
    }
}
