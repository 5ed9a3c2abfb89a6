// src/error.rs
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),

    // Any non-2xx answer from the payroll backend that is not a plain "not found"
    #[error("Payroll API error: Status={status}, Message='{message}'")]
    Api { status: StatusCode, message: String },

    #[error("File I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    #[error("Configuration error")]
    Config(#[from] envy::Error),
}

impl PayrollError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        PayrollError::InvalidArgument(msg.into())
    }

    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        PayrollError::Io {
            source,
            context: context.into(),
        }
    }
}
