use crate::utils::error::EtlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Ordered string fields of one CSV line.
pub type Row = Vec<String>;

/// userId -> hour -> summed quantity. Both levels iterate in sorted order.
pub type AggregateMap = BTreeMap<String, BTreeMap<u8, i64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Pick,
    Pack,
    Returns,
    Replan,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Pick,
        TransactionType::Pack,
        TransactionType::Returns,
        TransactionType::Replan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Pick => "pick",
            TransactionType::Pack => "pack",
            TransactionType::Returns => "returns",
            TransactionType::Replan => "replan",
        }
    }

    /// Hourly quantity a worker is expected to reach. Replan has no target.
    pub fn target(&self) -> Option<i64> {
        match self {
            TransactionType::Pick => Some(100),
            TransactionType::Pack => Some(150),
            TransactionType::Returns => Some(25),
            TransactionType::Replan => None,
        }
    }

    /// Replan rows count tagged rows instead of reading a quantity column.
    pub fn counts_tags(&self) -> bool {
        matches!(self, TransactionType::Replan)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pick" => Ok(TransactionType::Pick),
            "pack" => Ok(TransactionType::Pack),
            "returns" => Ok(TransactionType::Returns),
            "replan" => Ok(TransactionType::Replan),
            _ => Err(EtlError::UnknownTransactionType {
                value: s.to_string(),
            }),
        }
    }
}

/// Semantic column roles that loosely named CSV headers resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    UpdateQty,
    TranTime,
    UserId,
    TagId,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::UpdateQty => "update_qty",
            CanonicalField::TranTime => "tran_time",
            CanonicalField::UserId => "user_id",
            CanonicalField::TagId => "tag_id",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndexMap {
    indices: HashMap<CanonicalField, usize>,
}

impl ColumnIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: CanonicalField, index: usize) {
        self.indices.insert(field, index);
    }

    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.indices.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: String,
    pub hour: u8,
    pub quantity: i64,
}

/// Raw CSV content of one input file, already split into rows.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    AboveTarget,
    BelowTarget,
    Neutral,
}

impl Classification {
    /// Class name the rendered table uses; neutral cells carry none.
    pub fn css_class(&self) -> &'static str {
        match self {
            Classification::AboveTarget => "green",
            Classification::BelowTarget => "red",
            Classification::Neutral => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCell {
    /// `None` when the hour summed to zero; rendered blank.
    pub value: Option<i64>,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub user_id: String,
    pub display_name: String,
    pub cells: Vec<ReportCell>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub tx_type: TransactionType,
    pub target: Option<i64>,
    pub hours: Vec<u8>,
    pub rows: Vec<ReportRow>,
    pub column_totals: Vec<i64>,
    pub grand_total: i64,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Output of the transform phase for one batch.
#[derive(Debug, Clone)]
pub struct ProcessedBatch {
    pub tx_type: TransactionType,
    pub files: Vec<String>,
    pub transactions: usize,
    pub aggregates: AggregateMap,
    pub report: Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Standalone page with class-based colors.
    Html,
    /// Inline-styled table fragment that survives pasting into mail clients.
    Email,
    Txt,
    Csv,
    Json,
    Zip,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Html,
        OutputFormat::Email,
        OutputFormat::Txt,
        OutputFormat::Csv,
        OutputFormat::Json,
        OutputFormat::Zip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Email => "email",
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Zip => "zip",
        }
    }

    pub fn file_name(&self, tx_type: TransactionType) -> String {
        match self {
            OutputFormat::Email => format!("{}_transactions.email.html", tx_type),
            other => format!("{}_transactions.{}", tx_type, other.as_str()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| EtlError::UnknownOutputFormat {
                value: s.to_string(),
            })
    }
}
