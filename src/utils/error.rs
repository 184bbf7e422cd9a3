use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("API request to {url} failed with status {status}: {message}")]
    ApiRequestFailed {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Rate limited by {url}")]
    RateLimited { url: String, reset_at: Option<i64> },

    #[error("Unexpected API response: {message}")]
    InvalidResponse { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Network,
    Api,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SearchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SearchError::ConfigError { .. }
            | SearchError::ConfigValidationError { .. }
            | SearchError::InvalidConfigValueError { .. }
            | SearchError::MissingConfigError { .. }
            | SearchError::UrlError(_) => ErrorCategory::Configuration,
            SearchError::AuthenticationError { .. } => ErrorCategory::Authentication,
            SearchError::HttpError(_) => ErrorCategory::Network,
            SearchError::ApiRequestFailed { .. }
            | SearchError::RateLimited { .. }
            | SearchError::InvalidResponse { .. } => ErrorCategory::Api,
            SearchError::SerializationError(_)
            | SearchError::CsvError(_)
            | SearchError::ProcessingError { .. } => ErrorCategory::Data,
            SearchError::IoError(_) | SearchError::ZipError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SearchError::HttpError(_) | SearchError::RateLimited { .. } => ErrorSeverity::Medium,
            SearchError::ApiRequestFailed { status, .. } if *status >= 500 => {
                ErrorSeverity::Medium
            }
            SearchError::IoError(_) | SearchError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Transient failures worth another attempt by the HTTP layer.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::HttpError(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            SearchError::ApiRequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SearchError::MissingConfigError { .. } => {
                "Set TWITTER_BEARER_TOKEN, or TWITTER_CONSUMER_KEY and TWITTER_CONSUMER_SECRET"
            }
            SearchError::AuthenticationError { .. } => {
                "Check the app's consumer key and secret on developer.twitter.com"
            }
            SearchError::RateLimited { .. } => {
                "Wait for the rate limit window to reset (15 minutes) and retry"
            }
            SearchError::HttpError(_) => "Check network connectivity and retry",
            SearchError::ApiRequestFailed { status, .. } if *status >= 500 => {
                "Twitter is having trouble; retry later"
            }
            SearchError::ApiRequestFailed { .. } => {
                "Check the query, dates and premium endpoint/environment label"
            }
            SearchError::InvalidResponse { .. } => {
                "The API answered with an unexpected payload; run with --verbose for details"
            }
            SearchError::ConfigError { .. }
            | SearchError::ConfigValidationError { .. }
            | SearchError::InvalidConfigValueError { .. }
            | SearchError::UrlError(_) => "Fix the configuration value and run again",
            SearchError::IoError(_) | SearchError::ZipError(_) => {
                "Make sure the data directory is writable and has free space"
            }
            SearchError::SerializationError(_)
            | SearchError::CsvError(_)
            | SearchError::ProcessingError { .. } => "Run with --verbose and report the failing tweet",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SearchError::RateLimited {
                reset_at: Some(reset),
                ..
            } => {
                let when = chrono::DateTime::from_timestamp(*reset, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| reset.to_string());
                format!("Twitter rate limit reached; window resets at {}", when)
            }
            SearchError::RateLimited { .. } => "Twitter rate limit reached".to_string(),
            SearchError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
