use crate::domain::settlement::SettlementFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    /// Rejected before any request was made.
    #[error("{0}")]
    ValidationError(String),
    /// The backend answered with a non-success envelope. The message is shown verbatim.
    #[error("{0}")]
    Api(String),
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Session expired, please log in again")]
    Unauthorized,
    #[error("Request cancelled")]
    Cancelled,
    #[error("A settlement is already being submitted")]
    Busy,
    #[error("{}", .0.message)]
    Settlement(Box<SettlementFailure>),
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShopError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Errors the user can fix by editing the form and retrying.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

impl From<SettlementFailure> for ShopError {
    fn from(failure: SettlementFailure) -> Self {
        Self::Settlement(Box::new(failure))
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
