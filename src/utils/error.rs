use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustkitError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Spreadsheet archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Failed to issue API token: {status} {body}")]
    TokenIssuanceError { status: u16, body: String },

    #[error("{operation} failed: {status} {body}")]
    VendorError {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Vendor,
    Configuration,
    Output,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 對應的程序退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl TrustkitError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TrustkitError::HttpError(_) => ErrorCategory::Network,
            TrustkitError::TokenIssuanceError { .. } | TrustkitError::VendorError { .. } => {
                ErrorCategory::Vendor
            }
            TrustkitError::ConfigValidationError { .. }
            | TrustkitError::MissingConfigError { .. }
            | TrustkitError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            TrustkitError::CsvError(_) | TrustkitError::IoError(_) | TrustkitError::ZipError(_) => {
                ErrorCategory::Output
            }
            TrustkitError::SerializationError(_) | TrustkitError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrustkitError::TokenIssuanceError { .. } => ErrorSeverity::Critical,
            TrustkitError::HttpError(_) | TrustkitError::VendorError { .. } => {
                ErrorSeverity::Medium
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and BASE_URL, then rerun",
            ErrorCategory::Vendor => match self {
                TrustkitError::TokenIssuanceError { .. } => {
                    "Verify API_KEY is valid and active for this environment"
                }
                _ => "Inspect the logged response body; the record can be retried on a later run",
            },
            ErrorCategory::Configuration => {
                "Check the .env file, environment variables and --config profile"
            }
            ErrorCategory::Output => "Make sure the output path exists and is writable",
            ErrorCategory::Data => "The API returned an unexpected payload shape",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TrustkitError::TokenIssuanceError { status, .. } => {
                format!("Could not authenticate with the API (HTTP {})", status)
            }
            TrustkitError::MissingConfigError { field } => {
                format!("Required setting '{}' is not configured", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrustkitError>;
