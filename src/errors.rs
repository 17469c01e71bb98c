use std::fmt;

use actix_web::http::StatusCode;

pub type Result<T> = std::result::Result<T, LinkpressError>;

#[derive(Debug, Clone)]
pub enum LinkpressError {
    InvalidInput(String),
    Conflict(String),
    NotFound(String),
    Expired(String),
    ResourceExhausted(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
}

impl LinkpressError {
    /// Stable error code for logs and diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            LinkpressError::InvalidInput(_) => "E001",
            LinkpressError::Conflict(_) => "E002",
            LinkpressError::NotFound(_) => "E003",
            LinkpressError::Expired(_) => "E004",
            LinkpressError::ResourceExhausted(_) => "E005",
            LinkpressError::DatabaseConfig(_) => "E006",
            LinkpressError::DatabaseConnection(_) => "E007",
            LinkpressError::DatabaseOperation(_) => "E008",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            LinkpressError::InvalidInput(_) => "Invalid Input",
            LinkpressError::Conflict(_) => "Conflict",
            LinkpressError::NotFound(_) => "Resource Not Found",
            LinkpressError::Expired(_) => "Link Expired",
            LinkpressError::ResourceExhausted(_) => "Resource Exhausted",
            LinkpressError::DatabaseConfig(_) => "Database Configuration Error",
            LinkpressError::DatabaseConnection(_) => "Database Connection Error",
            LinkpressError::DatabaseOperation(_) => "Database Operation Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LinkpressError::InvalidInput(msg) => msg,
            LinkpressError::Conflict(msg) => msg,
            LinkpressError::NotFound(msg) => msg,
            LinkpressError::Expired(msg) => msg,
            LinkpressError::ResourceExhausted(msg) => msg,
            LinkpressError::DatabaseConfig(msg) => msg,
            LinkpressError::DatabaseConnection(msg) => msg,
            LinkpressError::DatabaseOperation(msg) => msg,
        }
    }

    /// HTTP status the error maps to at the handler boundary.
    ///
    /// Database errors intentionally collapse to a generic 500; internal
    /// detail stays in the logs and never reaches the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LinkpressError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LinkpressError::Conflict(_) => StatusCode::CONFLICT,
            LinkpressError::NotFound(_) => StatusCode::NOT_FOUND,
            LinkpressError::Expired(_) => StatusCode::GONE,
            LinkpressError::ResourceExhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LinkpressError::DatabaseConfig(_)
            | LinkpressError::DatabaseConnection(_)
            | LinkpressError::DatabaseOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to API clients. 4xx variants carry client-fixable
    /// detail; everything else is reported generically.
    pub fn public_message(&self) -> &str {
        match self {
            LinkpressError::InvalidInput(msg) => msg,
            LinkpressError::Conflict(msg) => msg,
            LinkpressError::NotFound(msg) => msg,
            LinkpressError::Expired(msg) => msg,
            _ => "Internal Server Error",
        }
    }
}

impl fmt::Display for LinkpressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for LinkpressError {}

// Convenience constructors
impl LinkpressError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        LinkpressError::InvalidInput(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        LinkpressError::Conflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkpressError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        LinkpressError::Expired(msg.into())
    }

    pub fn resource_exhausted<T: Into<String>>(msg: T) -> Self {
        LinkpressError::ResourceExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkpressError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkpressError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkpressError::DatabaseOperation(msg.into())
    }
}
