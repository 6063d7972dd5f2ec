// errors.rs
use crate::media::MediaError;
use astra::Response;
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, auth, missing resources) or downstream layers (DB, media host).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Upstream Error: {0}")]
    Upstream(String),
    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound(_) => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden(_) => 403,
            ServerError::DbError(_) | ServerError::Upstream(_) | ServerError::InternalError => 500,
        }
    }

    /// Message shown to API clients. Internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::NotFound(msg)
            | ServerError::BadRequest(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::Forbidden(msg) => msg.clone(),
            ServerError::DbError(_) | ServerError::Upstream(_) | ServerError::InternalError => {
                "Internal Server Error".to_string()
            }
        }
    }

    pub fn listing_not_found() -> Self {
        ServerError::NotFound("Property not found".into())
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::DbError(format!("document (de)serialization failed: {e}"))
    }
}

impl From<MediaError> for ServerError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::InvalidFormat(msg) => ServerError::BadRequest(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}
