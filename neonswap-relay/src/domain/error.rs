use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref USER_REJECTION: Regex =
        Regex::new(r"(?i)\bcode\W{0,3}4001\b|user (rejected|denied)").unwrap();
}

/// Main error type for the NeonSwap relay
#[derive(Error, Debug, Clone)]
pub enum SwapError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("RPC error on {endpoint}: {message}")]
    UpstreamRpc { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out after {seconds}s")]
    Timeout { endpoint: String, seconds: u64 },

    #[error("All {attempts} RPC endpoints failed, last error: {last}")]
    AllEndpointsFailed { attempts: usize, last: Box<SwapError> },

    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("Wallet rejected the request: {0}")]
    WalletRejected(String),

    #[error("Wrong network: expected chain {expected}, wallet is on chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type SwapResult<T> = Result<T, SwapError>;

impl SwapError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Wrap a transport or contract failure from a single endpoint
    pub fn upstream(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::UpstreamRpc {
            endpoint: endpoint.into(),
            message: err.to_string(),
        }
    }

    /// Classify an error raised while the wallet was signing or submitting.
    ///
    /// EIP-1193 wallets report a declined prompt with code 4001; remote signers
    /// tend to only say "user rejected" or "user denied" in the message.
    pub fn from_signer(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if USER_REJECTION.is_match(&message) {
            Self::WalletRejected(message)
        } else {
            Self::UpstreamRpc {
                endpoint: endpoint.into(),
                message,
            }
        }
    }

    /// Setup bugs rather than input variance; quoting lets these through.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownToken(_) | Self::Configuration(_))
    }

    /// Infrastructure failures the balance reader recovers from by trying the next endpoint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamRpc { .. } | Self::Timeout { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::UnknownToken(_) => "UNKNOWN_TOKEN",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::UpstreamRpc { .. } => "UPSTREAM_RPC_ERROR",
            Self::Timeout { .. } => "UPSTREAM_TIMEOUT",
            Self::AllEndpointsFailed { .. } => "ALL_ENDPOINTS_FAILED",
            Self::WalletUnavailable(_) => "WALLET_UNAVAILABLE",
            Self::WalletRejected(_) => "WALLET_REJECTED",
            Self::WrongNetwork { .. } => "WRONG_NETWORK",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        let status_code = match self {
            Self::Validation(_) | Self::InvalidAmount(_) | Self::UnknownToken(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::WalletRejected(_) | Self::WrongNetwork { .. } => StatusCode::CONFLICT,
            Self::WalletUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamRpc { .. } | Self::Timeout { .. } | Self::AllEndpointsFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::Configuration(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = serde_json::json!({
            "error": self.code(),
            "code": self.code(),
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Self::WrongNetwork { expected, actual } = self {
            body["expectedChainId"] = serde_json::json!(expected);
            body["actualChainId"] = serde_json::json!(actual);
        }

        (status_code, body)
    }
}

impl ResponseError for SwapError {
    fn status_code(&self) -> StatusCode {
        self.to_http_response().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, body) = self.to_http_response();
        HttpResponse::build(status_code).json(body)
    }
}

impl From<std::io::Error> for SwapError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {err}"))
    }
}

impl From<tokio::task::JoinError> for SwapError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::storage(format!("Task join error: {err}"))
    }
}
