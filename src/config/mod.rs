pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{OutputFormat, TransactionType};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_file_extensions, validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_PATH: &str = "./output";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "wh-productivity"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Hourly warehouse productivity tables from WMS transaction exports")
)]
pub struct CliConfig {
    /// Transaction type of this batch: pick, pack, returns or replan
    #[cfg_attr(feature = "cli", arg(long = "type", default_value = "pick"))]
    pub tx_type: TransactionType,

    /// CSV exports to aggregate together
    #[cfg_attr(feature = "cli", arg(long, value_delimiter = ','))]
    pub files: Vec<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_OUTPUT_PATH))]
    pub output_path: String,

    /// Output formats: html, email, txt, csv, json, zip
    #[cfg_attr(feature = "cli", arg(long, value_delimiter = ',', default_value = "html,txt"))]
    pub formats: Vec<OutputFormat>,

    /// Directory holding userMappings.json
    #[cfg_attr(feature = "cli", arg(long, default_value = "."))]
    pub mappings_path: String,

    /// Print the table as tab-separated text after processing
    #[cfg_attr(feature = "cli", arg(long))]
    pub print: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Log CPU and memory per phase"))]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn transaction_type(&self) -> TransactionType {
        self.tx_type
    }

    fn input_files(&self) -> &[String] {
        &self.files
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.formats
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(EtlError::NoFilesSelected {
                tx_type: self.tx_type,
            });
        }
        validate_file_extensions("files", &self.files, &["csv"])?;
        validate_path("output_path", &self.output_path)?;
        validate_path("mappings_path", &self.mappings_path)?;

        if self.formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "formats".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(files: &[&str]) -> CliConfig {
        CliConfig {
            tx_type: TransactionType::Pack,
            files: files.iter().map(|f| f.to_string()).collect(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            formats: vec![OutputFormat::Html],
            mappings_path: ".".to_string(),
            print: false,
            verbose: false,
            monitor: false,
        }
    }

    #[test]
    fn test_no_files_selected() {
        let err = config(&[]).validate().unwrap_err();
        assert!(matches!(
            err,
            EtlError::NoFilesSelected {
                tx_type: TransactionType::Pack
            }
        ));
    }

    #[test]
    fn test_rejects_non_csv_inputs() {
        assert!(config(&["pack.csv"]).validate().is_ok());
        assert!(config(&["pack.xlsx"]).validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_parse_arguments() {
        let config = CliConfig::try_parse_from([
            "wh-productivity",
            "--type",
            "returns",
            "--files",
            "a.csv,b.csv",
            "--formats",
            "csv,zip",
        ])
        .unwrap();

        assert_eq!(config.tx_type, TransactionType::Returns);
        assert_eq!(config.files, vec!["a.csv", "b.csv"]);
        assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Zip]);
        assert_eq!(config.output_path, DEFAULT_OUTPUT_PATH);
    }
}
