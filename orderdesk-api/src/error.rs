use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Store error: {0}")]
    Store(#[from] orderdesk_store_db::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Server startup failed: {reason}")]
    Startup { reason: String },
}

/// A failed lookup, as reported to the HTTP client.
///
/// Only a missing lookup key is a client error. Everything else is answered
/// with `200` and an `"error"` field, which clients already depend on.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Could not find {what}: {source}")]
    Failed {
        what: &'static str,
        #[source]
        source: orderdesk_store_db::Error,
    },

    #[error("Could not find {what}: {reason}")]
    Canceled { what: &'static str, reason: String },
}

impl LookupError {
    pub(crate) fn new(what: &'static str, err: orderdesk_store_db::Error) -> Self {
        match err {
            orderdesk_store_db::Error::InvalidArgument(message) => Self::InvalidArgument(message),
            source => Self::Failed { what, source },
        }
    }
}

impl ResponseError for LookupError {
    fn status_code(&self) -> StatusCode {
        match self {
            LookupError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            LookupError::Failed { .. } | LookupError::Canceled { .. } => StatusCode::OK,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::OK {
            log::error!("{self}");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Extension trait for adding context to IO errors
pub trait IoErrorContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AppError::Io {
            context: context.into(),
            source: e,
        })
    }
}
