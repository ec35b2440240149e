use crate::core::{LoadOutcome, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Extract, transform and load one batch. Nothing is written unless every
    /// file of the batch was read and resolved.
    pub async fn run(&self) -> Result<LoadOutcome> {
        tracing::info!("Starting batch...");

        // Extract
        let files = self.pipeline.extract().await?;
        tracing::info!("Read {} files", files.len());
        self.monitor.log_stats("extract");

        // Transform
        let batch = self.pipeline.transform(files).await?;
        tracing::info!(
            "Aggregated {} {} transactions for {} workers",
            batch.transactions,
            batch.tx_type,
            batch.report.rows.len()
        );
        self.monitor.log_stats("transform");

        // Load
        let outcome = self.pipeline.load(batch).await?;
        for path in &outcome.written {
            tracing::info!("📁 Output saved to: {}", path);
        }
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(outcome)
    }
}
