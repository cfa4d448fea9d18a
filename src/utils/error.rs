use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Parquet processing error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input not found: {location}")]
    InputNotFound { location: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Column name collision while flattening: '{column}' already exists")]
    ColumnCollision { column: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::IoError(_) | EtlError::InputNotFound { .. } | EtlError::StorageError { .. } => {
                ErrorCategory::Storage
            }
            EtlError::CsvError(_)
            | EtlError::ParquetError(_)
            | EtlError::SerializationError(_)
            | EtlError::ColumnCollision { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 嚴重程度決定 CLI 的退出碼；Medium 代表排程器可以重試
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ApiError(_) | EtlError::StorageError { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::InputNotFound { .. }
            | EtlError::CsvError(_)
            | EtlError::ParquetError(_)
            | EtlError::SerializationError(_)
            | EtlError::ColumnCollision { .. }
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check network connectivity and the dataset endpoint, then retry",
            EtlError::IoError(_) => "Check that the output directory exists and is writable",
            EtlError::InputNotFound { .. } => "Run the fetch step first or point --input at an existing file",
            EtlError::StorageError { .. } => "Check the bucket name, region and AWS credentials",
            EtlError::CsvError(_) | EtlError::ParquetError(_) => {
                "Check free disk space and the output format"
            }
            EtlError::SerializationError(_) => "Make sure the input is a JSON array of objects",
            EtlError::ColumnCollision { .. } => {
                "Rename the conflicting source field before flattening"
            }
            EtlError::ProcessingError { .. } => "Inspect the raw input for unexpected structure",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Review the configuration file and CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not download the dataset: {}", self),
            ErrorCategory::Storage => format!("Could not read or write data: {}", self),
            ErrorCategory::Data => format!("Could not process the dataset: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
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
}

pub type Result<T> = std::result::Result<T, EtlError>;
