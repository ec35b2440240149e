use crate::adapters::render::export_artifact;
use crate::adapters::user_map::UserMappings;
use crate::core::aggregate::add_transactions;
use crate::core::extract::extract_transactions;
use crate::core::report::build_report;
use crate::core::tokenizer::parse_csv;
use crate::core::{
    AggregateMap, ConfigProvider, LoadOutcome, Pipeline, ProcessedBatch, SourceFile, Storage,
};
use crate::utils::error::{EtlError, Result};
use tokio::task::JoinSet;

/// Reads every file of a batch, aggregates them together and writes the table.
///
/// `source` resolves input paths, `sink` receives the rendered outputs.
pub struct ProductivityPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
    mappings: UserMappings,
}

impl<S: Storage + Clone + 'static, C: ConfigProvider> ProductivityPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C, mappings: UserMappings) -> Self {
        Self {
            source,
            sink,
            config,
            mappings,
        }
    }
}

fn decode(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data).into_owned();
    if let Some(rest) = text.strip_prefix('\u{feff}') {
        return rest.to_string();
    }
    text
}

#[async_trait::async_trait]
impl<S: Storage + Clone + 'static, C: ConfigProvider> Pipeline for ProductivityPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceFile>> {
        let tx_type = self.config.transaction_type();
        let files = self.config.input_files();
        if files.is_empty() {
            return Err(EtlError::NoFilesSelected { tx_type });
        }

        // 每個檔案各自讀取，全部完成後才進入彙總
        let mut reads = JoinSet::new();
        for (index, path) in files.iter().cloned().enumerate() {
            let storage = self.source.clone();
            reads.spawn(async move {
                let data = storage.read_file(&path).await;
                (index, path, data)
            });
        }

        let mut sources = Vec::with_capacity(files.len());
        while let Some(joined) = reads.join_next().await {
            let (index, name, data) = joined?;
            let data = data?;
            tracing::debug!("Read {} ({} bytes)", name, data.len());
            let rows = parse_csv(&decode(&data));
            sources.push((index, SourceFile { name, rows }));
        }

        // 依完成順序收集，再還原為輸入順序以便錯誤訊息穩定
        sources.sort_by_key(|(index, _)| *index);
        Ok(sources.into_iter().map(|(_, source)| source).collect())
    }

    async fn transform(&self, files: Vec<SourceFile>) -> Result<ProcessedBatch> {
        let tx_type = self.config.transaction_type();
        let mut aggregates = AggregateMap::new();
        let mut transactions = 0;

        for file in &files {
            let extracted = extract_transactions(&file.rows, tx_type, &file.name)?;
            transactions += extracted.len();
            add_transactions(&mut aggregates, &extracted);
        }

        let report = build_report(&aggregates, tx_type, |id| self.mappings.display_name(id));
        tracing::debug!(
            "{} batch: {} transactions, {} workers, {} hours",
            tx_type,
            transactions,
            report.rows.len(),
            report.hours.len()
        );

        Ok(ProcessedBatch {
            tx_type,
            files: files.into_iter().map(|f| f.name).collect(),
            transactions,
            aggregates,
            report,
        })
    }

    async fn load(&self, batch: ProcessedBatch) -> Result<LoadOutcome> {
        let mut written = Vec::new();

        for format in self.config.output_formats() {
            let file_name = format.file_name(batch.tx_type);
            let data = export_artifact(&batch.report, *format)?;

            tracing::debug!("Writing {} ({} bytes)", file_name, data.len());
            self.sink.write_file(&file_name, &data).await?;
            written.push(format!("{}/{}", self.config.output_path(), file_name));
        }

        Ok(LoadOutcome { batch, written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Classification, OutputFormat, TransactionType};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, content: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), content.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn remove_file(&self, path: &str) -> Result<()> {
            let mut files = self.files.lock().await;
            files.remove(path);
            Ok(())
        }
    }

    struct MockConfig {
        tx_type: TransactionType,
        files: Vec<String>,
        output_path: String,
        formats: Vec<OutputFormat>,
    }

    impl MockConfig {
        fn new(tx_type: TransactionType, files: &[&str]) -> Self {
            Self {
                tx_type,
                files: files.iter().map(|f| f.to_string()).collect(),
                output_path: "test_output".to_string(),
                formats: vec![OutputFormat::Txt, OutputFormat::Json],
            }
        }
    }

    impl ConfigProvider for MockConfig {
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

    const FILE_A: &str = "Pick log,day\nuser_id,tran_time,update_qty\nU1,08:15:00,50\nU1,09:05:00,60\n";
    const FILE_B: &str = "\u{feff}Pick log,day\nUser,Time,Quantity\nU1,08:40:00,60\n";

    fn pipeline(
        storage: &MockStorage,
        tx_type: TransactionType,
        files: &[&str],
    ) -> ProductivityPipeline<MockStorage, MockConfig> {
        ProductivityPipeline::new(
            storage.clone(),
            storage.clone(),
            MockConfig::new(tx_type, files),
            UserMappings::new(),
        )
    }

    #[tokio::test]
    async fn test_extract_reads_all_files_in_input_order() {
        let storage = MockStorage::default();
        storage.put("a.csv", FILE_A).await;
        storage.put("b.csv", FILE_B).await;

        let sources = pipeline(&storage, TransactionType::Pick, &["a.csv", "b.csv"])
            .extract()
            .await
            .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "a.csv");
        assert_eq!(sources[1].name, "b.csv");
        assert_eq!(sources[1].rows[0][0], "Pick log");
    }

    #[tokio::test]
    async fn test_extract_without_files() {
        let storage = MockStorage::default();
        let result = pipeline(&storage, TransactionType::Pack, &[]).extract().await;
        assert!(matches!(result, Err(EtlError::NoFilesSelected { .. })));
    }

    #[tokio::test]
    async fn test_extract_missing_file_fails_batch() {
        let storage = MockStorage::default();
        storage.put("a.csv", FILE_A).await;
        let result = pipeline(&storage, TransactionType::Pick, &["a.csv", "gone.csv"])
            .extract()
            .await;
        assert!(matches!(result, Err(EtlError::IoError(_))));
    }

    #[tokio::test]
    async fn test_transform_aggregates_across_files() {
        let storage = MockStorage::default();
        storage.put("a.csv", FILE_A).await;
        storage.put("b.csv", FILE_B).await;
        let pipeline = pipeline(&storage, TransactionType::Pick, &["a.csv", "b.csv"]);

        let sources = pipeline.extract().await.unwrap();
        let batch = pipeline.transform(sources).await.unwrap();

        assert_eq!(batch.transactions, 3);
        assert_eq!(batch.aggregates["U1"][&8], 110);
        assert_eq!(batch.aggregates["U1"][&9], 60);

        let row = &batch.report.rows[0];
        assert_eq!(row.total, 170);
        assert_eq!(row.cells[0].classification, Classification::AboveTarget);
        assert_eq!(row.cells[1].classification, Classification::BelowTarget);
    }

    #[tokio::test]
    async fn test_transform_fails_whole_batch_on_missing_column() {
        let storage = MockStorage::default();
        storage.put("a.csv", FILE_A).await;
        storage
            .put("bad.csv", "Pick log,day\ntran_time,update_qty\n08:00:00,10\n")
            .await;
        let pipeline = pipeline(&storage, TransactionType::Pick, &["a.csv", "bad.csv"]);

        let sources = pipeline.extract().await.unwrap();
        let err = pipeline.transform(sources).await.unwrap_err();
        match err {
            EtlError::MissingRequiredColumn { file, .. } => assert_eq!(file, "bad.csv"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_load_writes_requested_formats() {
        let storage = MockStorage::default();
        storage.put("a.csv", FILE_A).await;
        let pipeline = pipeline(&storage, TransactionType::Pick, &["a.csv"]);

        let sources = pipeline.extract().await.unwrap();
        let batch = pipeline.transform(sources).await.unwrap();
        let outcome = pipeline.load(batch).await.unwrap();

        assert_eq!(
            outcome.written,
            vec![
                "test_output/pick_transactions.txt".to_string(),
                "test_output/pick_transactions.json".to_string(),
            ]
        );

        let text = storage.get_file("pick_transactions.txt").await.unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("\t08:00\t09:00\tTOTAL\nU1\t50\t60\t110"));
        assert!(storage.get_file("pick_transactions.json").await.is_some());
    }
}
