use crate::core::ConfigProvider;
use crate::domain::model::{OutputFormat, TransactionType};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path,
    validate_required_field, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

/// A job file describing one or more batches, typically one per shift export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub load: LoadConfig,
    pub users: Option<UsersConfig>,
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default)]
    pub batches: Vec<BatchSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersConfig {
    pub mappings_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    pub r#type: String,
    pub files: Vec<String>,
    pub enabled: Option<bool>,
}

/// One `[[batches]]` entry resolved against the job-wide settings.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub tx_type: TransactionType,
    pub files: Vec<String>,
    pub output_path: String,
    pub output_formats: Vec<OutputFormat>,
}

impl ConfigProvider for BatchConfig {
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
        &self.output_formats
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EXPORT_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("job.name", &self.job.name)?;
        validate_path("load.output_path", &self.load.output_path)?;

        if self.load.output_formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "load.output_formats".to_string(),
            });
        }
        for format in &self.load.output_formats {
            format.parse::<OutputFormat>()?;
        }

        if let Some(users) = &self.users {
            let path = validate_required_field("users.mappings_path", &users.mappings_path)?;
            validate_path("users.mappings_path", path)?;
        }

        if self.enabled_batches().next().is_none() {
            return Err(EtlError::MissingConfigError {
                field: "batches".to_string(),
            });
        }

        for (index, batch) in self.enabled_batches().enumerate() {
            let tx_type: TransactionType = batch.r#type.parse()?;
            if batch.files.is_empty() {
                return Err(EtlError::NoFilesSelected { tx_type });
            }
            validate_file_extensions(&format!("batches[{}].files", index), &batch.files, &["csv"])?;
        }

        Ok(())
    }

    fn enabled_batches(&self) -> impl Iterator<Item = &BatchSection> {
        self.batches.iter().filter(|b| b.enabled.unwrap_or(true))
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }

    /// Directory of `userMappings.json`, the working directory when unset.
    pub fn mappings_path(&self) -> &str {
        self.users
            .as_ref()
            .and_then(|u| u.mappings_path.as_deref())
            .unwrap_or(".")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    /// Enabled batches in file order. Call after [`Validate::validate`].
    pub fn batch_configs(&self) -> Result<Vec<BatchConfig>> {
        let output_formats = self
            .load
            .output_formats
            .iter()
            .map(|f| f.parse())
            .collect::<Result<Vec<OutputFormat>>>()?;

        self.enabled_batches()
            .map(|batch| {
                Ok(BatchConfig {
                    tx_type: batch.r#type.parse()?,
                    files: batch.files.clone(),
                    output_path: self.load.output_path.clone(),
                    output_formats: output_formats.clone(),
                })
            })
            .collect()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
