use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Contract violation in {operation}: {message}")]
    ContractViolation { operation: String, message: String },

    #[error("Data source error: {message}")]
    DataSourceError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Io,
    Contract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeskError {
    pub fn contract(operation: &str, message: impl Into<String>) -> Self {
        DeskError::ContractViolation {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DeskError::IoError(_) => ErrorCategory::Io,
            DeskError::SerializationError(_)
            | DeskError::CsvError(_)
            | DeskError::DataSourceError { .. } => ErrorCategory::Data,
            DeskError::ConfigValidationError { .. }
            | DeskError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DeskError::ContractViolation { .. } => ErrorCategory::Contract,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeskError::DataSourceError { .. } => ErrorSeverity::Medium,
            DeskError::SerializationError(_) | DeskError::CsvError(_) => ErrorSeverity::High,
            DeskError::ConfigValidationError { .. }
            | DeskError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            DeskError::IoError(_) | DeskError::ContractViolation { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DeskError::IoError(_) => "Check that the file exists and is readable".to_string(),
            DeskError::SerializationError(_) => {
                "Check that the record file is valid JSON in the expected shape".to_string()
            }
            DeskError::CsvError(_) => "Check that the export destination is writable".to_string(),
            DeskError::ConfigValidationError { field, .. }
            | DeskError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' entry in the configuration file", field)
            }
            DeskError::ContractViolation { .. } => {
                "This is a bug in the calling code, not a data problem".to_string()
            }
            DeskError::DataSourceError { .. } => "Retry once the data source is reachable".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Could not process records: {}", self),
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Contract => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
