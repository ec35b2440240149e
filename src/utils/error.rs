use crate::domain::model::{CanonicalField, TransactionType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Required column \"{column}\" not found in {file}")]
    MissingRequiredColumn { column: CanonicalField, file: String },

    #[error("No CSV files selected for {tx_type} batch")]
    NoFilesSelected { tx_type: TransactionType },

    #[error("No {tx_type} table to export, no batch has been processed yet")]
    EmptyResultTable { tx_type: TransactionType },

    #[error("Unknown transaction type: {value}")]
    UnknownTransactionType { value: String },

    #[error("Unknown output format: {value}")]
    UnknownOutputFormat { value: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Output,
    System,
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
            EtlError::MissingRequiredColumn { .. }
            | EtlError::NoFilesSelected { .. }
            | EtlError::CsvError(_) => ErrorCategory::Input,
            EtlError::UnknownTransactionType { .. }
            | EtlError::UnknownOutputFormat { .. }
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::EmptyResultTable { .. }
            | EtlError::ZipError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Output,
            EtlError::IoError(_) | EtlError::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::EmptyResultTable { .. } => ErrorSeverity::Low,
            // 檔案可能仍在寫入中，重試即可
            EtlError::IoError(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                ErrorSeverity::Medium
            }
            EtlError::IoError(_) | EtlError::TaskError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Process exit code for the binaries, derived from severity.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::MissingRequiredColumn { column, .. } => match column {
                CanonicalField::TagId => {
                    "For replan transactions, add a \"tag_id\" column to the export".to_string()
                }
                CanonicalField::UpdateQty => {
                    "For pick/pack/returns transactions, add an \"update_qty\" column to the export"
                        .to_string()
                }
                _ => "Make sure row 2 of the CSV holds the headers and includes \"tran_time\" and \"user_id\""
                    .to_string(),
            },
            EtlError::NoFilesSelected { .. } => {
                "Pass at least one CSV file with --files".to_string()
            }
            EtlError::EmptyResultTable { .. } => {
                "Process a file for this transaction type first".to_string()
            }
            EtlError::UnknownTransactionType { .. } => {
                "Use one of: pick, pack, returns, replan".to_string()
            }
            EtlError::UnknownOutputFormat { .. } => {
                "Use one of: html, email, txt, csv, json, zip".to_string()
            }
            EtlError::CsvError(_) => "Check the CSV export is not truncated".to_string(),
            EtlError::IoError(_) => "Check the file paths and permissions".to_string(),
            EtlError::ZipError(_) | EtlError::SerializationError(_) => {
                "Check there is enough disk space in the output directory".to_string()
            }
            EtlError::TaskError(_) => "Re-run the batch".to_string(),
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Review the command line arguments or the TOML job file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingRequiredColumn { column, file } => match column {
                CanonicalField::TranTime | CanonicalField::UserId => format!(
                    "Required columns not found in {}. Please ensure your CSV has \"tran_time\" and \"user_id\" columns.",
                    file
                ),
                CanonicalField::TagId => format!(
                    "For replan transactions, \"tag_id\" column is required ({}).",
                    file
                ),
                CanonicalField::UpdateQty => format!(
                    "For pick/pack/returns transactions, \"update_qty\" column is required ({}).",
                    file
                ),
            },
            EtlError::NoFilesSelected { .. } => "Please select at least one CSV file.".to_string(),
            EtlError::EmptyResultTable { .. } => {
                "No table to export. Please process a file first.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
