use crate::domain::model::{OutputFormat, ProcessedBatch, SourceFile, TransactionType};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removing a path that does not exist succeeds.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings for one batch: a transaction type and the files submitted for it.
pub trait ConfigProvider: Send + Sync {
    fn transaction_type(&self) -> TransactionType;
    fn input_files(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceFile>>;
    async fn transform(&self, files: Vec<SourceFile>) -> Result<ProcessedBatch>;
    async fn load(&self, batch: ProcessedBatch) -> Result<LoadOutcome>;
}

/// What the load phase wrote, plus the batch it wrote it from.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub batch: ProcessedBatch,
    pub written: Vec<String>,
}
