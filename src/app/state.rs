use crate::adapters::render::{clipboard_payload, export_artifact, ClipboardPayload};
use crate::adapters::user_map::UserMappings;
use crate::core::report::relabel;
use crate::domain::model::{OutputFormat, Report, TransactionType};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;

/// Session state shared by the binaries: which transaction type is selected,
/// the latest table per type, and the name mapping snapshot used to label rows.
#[derive(Debug, Clone)]
pub struct AppState {
    current: TransactionType,
    reports: HashMap<TransactionType, Report>,
    mappings: UserMappings,
}

impl AppState {
    pub fn new(mappings: UserMappings) -> Self {
        Self {
            current: TransactionType::Pick,
            reports: HashMap::new(),
            mappings,
        }
    }

    pub fn current(&self) -> TransactionType {
        self.current
    }

    pub fn select(&mut self, tx_type: TransactionType) {
        tracing::debug!("Selected {} table", tx_type);
        self.current = tx_type;
    }

    pub fn mappings(&self) -> &UserMappings {
        &self.mappings
    }

    /// Replaces the snapshot and re-labels every stored table with it.
    pub fn refresh_mappings(&mut self, mappings: UserMappings) {
        self.mappings = mappings;
        let mappings = &self.mappings;
        for report in self.reports.values_mut() {
            relabel(report, |id| mappings.display_name(id));
        }
    }

    /// Stores a freshly processed table, replacing the previous one of its type.
    pub fn record(&mut self, report: Report) {
        self.reports.insert(report.tx_type, report);
    }

    pub fn report(&self, tx_type: TransactionType) -> Option<&Report> {
        self.reports.get(&tx_type)
    }

    fn require_report(&self, tx_type: TransactionType) -> Result<&Report> {
        self.report(tx_type)
            .ok_or(EtlError::EmptyResultTable { tx_type })
    }

    pub fn export(&self, tx_type: TransactionType, format: OutputFormat) -> Result<Vec<u8>> {
        export_artifact(self.require_report(tx_type)?, format)
    }

    pub fn copy(&self, tx_type: TransactionType) -> Result<ClipboardPayload> {
        Ok(clipboard_payload(self.require_report(tx_type)?))
    }

    pub fn copy_current(&self) -> Result<ClipboardPayload> {
        self.copy(self.current)
    }

    /// Writes the email table of every type that has one, skipping the types
    /// in `already_written`. Returns the file names written.
    pub async fn write_email_tables<S: Storage>(
        &self,
        sink: &S,
        already_written: &[TransactionType],
    ) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for tx_type in TransactionType::ALL {
            if already_written.contains(&tx_type) {
                continue;
            }
            match self.export(tx_type, OutputFormat::Email) {
                Ok(html) => {
                    let file_name = OutputFormat::Email.file_name(tx_type);
                    sink.write_file(&file_name, &html).await?;
                    written.push(file_name);
                }
                Err(EtlError::EmptyResultTable { .. }) => {
                    tracing::debug!("No {} table this run", tx_type);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::core::aggregate::group_by_user_and_hour;
    use crate::core::report::build_report;
    use crate::domain::model::Transaction;

    fn pack_report(mappings: &UserMappings) -> Report {
        let grouped = group_by_user_and_hour(&[Transaction {
            user_id: "U1".to_string(),
            hour: 14,
            quantity: 160,
        }]);
        build_report(&grouped, TransactionType::Pack, |id| mappings.display_name(id))
    }

    #[test]
    fn test_export_without_table_fails() {
        let state = AppState::new(UserMappings::new());
        assert!(matches!(
            state.export(TransactionType::Pick, OutputFormat::Txt),
            Err(EtlError::EmptyResultTable {
                tx_type: TransactionType::Pick
            })
        ));
        assert!(matches!(
            state.copy_current(),
            Err(EtlError::EmptyResultTable { .. })
        ));
    }

    #[test]
    fn test_record_select_and_copy() {
        let mut state = AppState::new(UserMappings::new());
        let report = pack_report(state.mappings());
        state.record(report);
        state.select(TransactionType::Pack);

        let payload = state.copy_current().unwrap();
        assert!(payload.text.contains("U1\t160\t160"));
        assert!(payload.html.contains("#90EE90"));

        // other tabs stay empty
        assert!(state.copy(TransactionType::Returns).is_err());
        assert!(state.export(TransactionType::Pack, OutputFormat::Csv).is_ok());
    }

    #[tokio::test]
    async fn test_write_email_tables_skips_written_and_empty_types() {
        let dir = tempfile::TempDir::new().unwrap();
        let sink = LocalStorage::new(dir.path().to_str().unwrap().to_string());

        let mut state = AppState::new(UserMappings::new());
        let report = pack_report(state.mappings());
        state.record(report);

        let written = state.write_email_tables(&sink, &[]).await.unwrap();
        assert_eq!(written, vec!["pack_transactions.email.html".to_string()]);
        let html = std::fs::read_to_string(dir.path().join(&written[0])).unwrap();
        assert!(html.contains("#90EE90"));

        // pack already wrote its email table in the load phase
        std::fs::remove_file(dir.path().join(&written[0])).unwrap();
        let written = state
            .write_email_tables(&sink, &[TransactionType::Pack])
            .await
            .unwrap();
        assert!(written.is_empty());
        assert!(!dir.path().join("pack_transactions.email.html").exists());
    }

    #[test]
    fn test_refresh_mappings_relabels_tables() {
        let mut state = AppState::new(UserMappings::new());
        let report = pack_report(state.mappings());
        state.record(report);

        let mut mappings = UserMappings::new();
        mappings.add("U1", "Ana");
        state.refresh_mappings(mappings);

        let report = state.report(TransactionType::Pack).unwrap();
        assert_eq!(report.rows[0].display_name, "U1/Ana");
    }
}
