pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::user_map::{UserMappingStore, UserMappings};
pub use app::AppState;
pub use config::{cli::LocalStorage, toml_config::TomlConfig, CliConfig};
pub use core::{etl::EtlEngine, pipeline::ProductivityPipeline};
pub use domain::model::{OutputFormat, Report, TransactionType};
pub use utils::error::{EtlError, Result};
