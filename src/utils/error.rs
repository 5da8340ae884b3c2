use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data file {file} not found at {path}")]
    MissingDataFileError { file: String, path: String },

    #[error("Data file {file} is malformed: {reason}")]
    MalformedDataFileError { file: String, reason: String },

    #[error("Completion API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Completion API returned no content")]
    EmptyCompletionError,

    #[error("{message}")]
    UsageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AgentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AgentError::HttpError(_)
            | AgentError::ApiError { .. }
            | AgentError::EmptyCompletionError => ErrorCategory::Network,
            AgentError::ConfigError { .. }
            | AgentError::InvalidConfigValueError { .. }
            | AgentError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AgentError::MissingDataFileError { .. }
            | AgentError::MalformedDataFileError { .. }
            | AgentError::SerializationError(_) => ErrorCategory::Data,
            AgentError::UsageError { .. } => ErrorCategory::Input,
            AgentError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AgentError::HttpError(_) => {
                "Check network connectivity and the --api-base endpoint".to_string()
            }
            AgentError::ApiError { status, .. } if *status == 401 => {
                "Check that OPENAI_API_KEY holds a valid key".to_string()
            }
            AgentError::ApiError { status, .. } if *status == 429 => {
                "Rate limit or quota reached, wait before retrying".to_string()
            }
            AgentError::ApiError { .. } | AgentError::EmptyCompletionError => {
                "Retry the command; the rule-based answer is shown meanwhile".to_string()
            }
            AgentError::ConfigError { .. } => "Review the TOML configuration file".to_string(),
            AgentError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the config file or CLI flags", field)
            }
            AgentError::MissingConfigError { field } => {
                format!("Provide '{}' in the config file or CLI flags", field)
            }
            AgentError::MissingDataFileError { file, .. } => format!(
                "Place {} in the data directory (--data-dir) or run with --allow-partial",
                file
            ),
            AgentError::MalformedDataFileError { file, .. } => {
                format!("Make sure {} contains a JSON array of objects", file)
            }
            AgentError::SerializationError(_) => "Check the JSON input".to_string(),
            AgentError::UsageError { .. } => "Type 'help' for available commands".to_string(),
            AgentError::IoError(_) => "Check file permissions and disk state".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AgentError::HttpError(e) if e.is_timeout() => {
                "The AI service did not answer in time".to_string()
            }
            AgentError::HttpError(_) => "Could not reach the AI service".to_string(),
            AgentError::ApiError { status, message } => {
                format!("The AI service rejected the request ({}): {}", status, message)
            }
            AgentError::EmptyCompletionError => "The AI service returned an empty answer".to_string(),
            AgentError::MissingDataFileError { file, path } => {
                format!("Required data file {} is missing ({})", file, path)
            }
            AgentError::MalformedDataFileError { file, reason } => {
                format!("Data file {} could not be read: {}", file, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        AgentError::UsageError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
