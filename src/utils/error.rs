use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{message}: {detail}")]
    ProviderRequest {
        message: String,
        status: Option<u16>,
        detail: String,
    },

    #[error("Provider response for payment {payment_id} has no checkout URL")]
    MissingCheckoutUrl { payment_id: String },

    #[error("Payment not found: {payment_id}")]
    PaymentNotFound { payment_id: String },

    #[error("Payment {payment_id} is already completed")]
    PaymentAlreadyCompleted { payment_id: String },

    #[error("Payment {payment_id} has no provider transaction id")]
    MissingTransactionId { payment_id: String },

    #[error(
        "Unexpected provider status for payment {payment_id}: {}",
        .status.as_deref().unwrap_or("<missing>")
    )]
    UnexpectedStatus {
        payment_id: String,
        status: Option<String>,
    },

    #[error("Missing callback parameter: {name}")]
    MissingParameter { name: String },

    #[error("Missing configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Provider,
    Payment,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GatewayError {
    /// 建立 provider 請求失敗錯誤，body 只保留前 200 字元
    pub fn provider_request(message: &str, status: Option<u16>, detail: &str) -> Self {
        GatewayError::ProviderRequest {
            message: message.to_string(),
            status,
            detail: detail.chars().take(200).collect(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::ProviderRequest { .. }
            | GatewayError::MissingCheckoutUrl { .. }
            | GatewayError::UnexpectedStatus { .. } => ErrorCategory::Provider,
            GatewayError::PaymentNotFound { .. }
            | GatewayError::PaymentAlreadyCompleted { .. }
            | GatewayError::MissingTransactionId { .. }
            | GatewayError::MissingParameter { .. } => ErrorCategory::Payment,
            GatewayError::MissingConfig { .. }
            | GatewayError::InvalidValue { .. }
            | GatewayError::ConfigValidation { .. } => ErrorCategory::Configuration,
            GatewayError::Storage { .. }
            | GatewayError::Io(_)
            | GatewayError::Serialization(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 使用者或 provider 稍後可重試
            GatewayError::ProviderRequest { .. } | GatewayError::UnexpectedStatus { .. } => {
                ErrorSeverity::Medium
            }
            GatewayError::MissingCheckoutUrl { .. }
            | GatewayError::PaymentNotFound { .. }
            | GatewayError::PaymentAlreadyCompleted { .. }
            | GatewayError::MissingTransactionId { .. }
            | GatewayError::MissingParameter { .. }
            | GatewayError::InvalidValue { .. } => ErrorSeverity::High,
            GatewayError::MissingConfig { .. }
            | GatewayError::ConfigValidation { .. }
            | GatewayError::Storage { .. }
            | GatewayError::Io(_)
            | GatewayError::Serialization(_) => ErrorSeverity::Critical,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GatewayError::ProviderRequest { status: Some(401), .. } => {
                "Check that api_key is a valid live_ or test_ key"
            }
            GatewayError::ProviderRequest { .. } => {
                "Check network connectivity and the provider status page, then retry"
            }
            GatewayError::MissingCheckoutUrl { .. } => {
                "Inspect the provider response; the payment method may not need a checkout"
            }
            GatewayError::PaymentNotFound { .. } => {
                "Verify the payment_id in the callback URL matches a stored payment"
            }
            GatewayError::PaymentAlreadyCompleted { .. } => {
                "The payment is settled; redirect the customer to the success URL"
            }
            GatewayError::MissingTransactionId { .. } => {
                "Create the provider payment before confirming it"
            }
            GatewayError::UnexpectedStatus { .. } => {
                "Let the customer retry the checkout or contact the provider"
            }
            GatewayError::MissingParameter { .. } => {
                "Make sure the callback URL carries the payment_id parameter"
            }
            GatewayError::MissingConfig { .. }
            | GatewayError::InvalidValue { .. }
            | GatewayError::ConfigValidation { .. } => "Fix the gateway configuration file",
            GatewayError::Storage { .. } | GatewayError::Io(_) | GatewayError::Serialization(_) => {
                "Check the payment store path and its permissions"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Provider => format!("Payment provider problem: {}", self),
            ErrorCategory::Payment => format!("Payment could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Gateway misconfigured: {}", self),
            ErrorCategory::Storage => format!("Payment store unavailable: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
