pub mod aggregate;
pub mod columns;
pub mod etl;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod tokenizer;

pub use crate::domain::model::{
    AggregateMap, ProcessedBatch, Report, Row, SourceFile, Transaction, TransactionType,
};
pub use crate::domain::ports::{ConfigProvider, LoadOutcome, Pipeline, Storage};
pub use crate::utils::error::Result;
