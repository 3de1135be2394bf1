use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Service rejected the request ({status}): {message}")]
    ServiceError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Record not found: {collection}({id})")]
    NotFound { collection: String, id: String },

    #[error("Malformed service response: {message}")]
    MalformedResponse { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Service,
    Transport,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CrmError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CrmError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        CrmError::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CrmError::ValidationError { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CrmError::ValidationError { .. } => ErrorCategory::Validation,
            CrmError::ConfigError { .. }
            | CrmError::MissingConfigError { .. }
            | CrmError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CrmError::ServiceError { .. } | CrmError::NotFound { .. } => ErrorCategory::Service,
            CrmError::ApiError(_) | CrmError::IoError(_) => ErrorCategory::Transport,
            CrmError::MalformedResponse { .. }
            | CrmError::CsvError(_)
            | CrmError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CrmError::NotFound { .. } => ErrorSeverity::Low,
            CrmError::ApiError(_) => ErrorSeverity::Medium,
            CrmError::ServiceError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            CrmError::ServiceError { .. }
            | CrmError::ValidationError { .. }
            | CrmError::MalformedResponse { .. }
            | CrmError::CsvError(_)
            | CrmError::SerializationError(_) => ErrorSeverity::High,
            CrmError::IoError(_)
            | CrmError::ConfigError { .. }
            | CrmError::MissingConfigError { .. }
            | CrmError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CrmError::ApiError(e) if e.is_timeout() => {
                "The CRM service did not answer in time".to_string()
            }
            CrmError::ApiError(e) if e.is_connect() => {
                "Could not connect to the CRM service".to_string()
            }
            CrmError::ServiceError {
                status: 401 | 403, ..
            } => "The CRM service refused the credentials".to_string(),
            CrmError::ServiceError { message, .. } => {
                format!("The CRM service rejected the request: {}", message)
            }
            CrmError::NotFound { collection, id } => {
                format!("No {} record with id {}", collection, id)
            }
            CrmError::ValidationError { field, message } => {
                format!("Invalid input for '{}': {}", field, message)
            }
            CrmError::MissingConfigError { field } => {
                format!("Required setting '{}' is not configured", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Check the values passed to the command and try again",
            ErrorCategory::Configuration => {
                "Check the env file / TOML config (CRM_URL, CRM_ACCESS_TOKEN)"
            }
            ErrorCategory::Service => match self {
                CrmError::ServiceError {
                    status: 401 | 403, ..
                } => "Refresh CRM_ACCESS_TOKEN; it may have expired",
                CrmError::ServiceError { status, .. } if *status == 429 || *status >= 500 => {
                    "The service is busy or unavailable, retry later"
                }
                _ => "Inspect the service message; the record data was rejected",
            },
            ErrorCategory::Transport => "Check network access to the CRM service URL",
            ErrorCategory::Data => "Run with --verbose to inspect the raw service response",
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_status() {
        let throttled = CrmError::ServiceError {
            status: 429,
            code: None,
            message: "slow down".to_string(),
        };
        let rejected = CrmError::ServiceError {
            status: 400,
            code: Some("0x80040203".to_string()),
            message: "bad attribute".to_string(),
        };

        assert_eq!(throttled.severity(), ErrorSeverity::Medium);
        assert_eq!(rejected.severity(), ErrorSeverity::High);
        assert_eq!(rejected.category(), ErrorCategory::Service);
    }

    #[test]
    fn test_validation_helpers() {
        let err = CrmError::validation("email", "missing '@'");
        assert!(err.is_validation());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.user_friendly_message().contains("email"));
    }
}
