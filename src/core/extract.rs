use crate::core::columns::{require_columns, resolve_columns};
use crate::domain::model::{CanonicalField, ColumnIndexMap, Row, Transaction, TransactionType};
use crate::utils::error::Result;
use regex::Regex;
use std::sync::LazyLock;

/// First row is a title/preamble, second row holds the headers.
pub const HEADER_ROW: usize = 1;
pub const FIRST_DATA_ROW: usize = 2;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2}):([0-9]{2}):([0-9]{2})").expect("time pattern is a valid regex")
});

/// Hour of day from a transaction time.
///
/// Accepted grammar is `H:MM:SS` or `HH:MM:SS` anywhere in the value, so
/// `2024-05-01 08:15:00` yields 8. The hour is read as a 24-hour clock with no
/// AM/PM handling. Values without a match, or with an hour above 23, yield `None`.
pub fn parse_hour(time: &str) -> Option<u8> {
    let captures = TIME_PATTERN.captures(time)?;
    let hour: u8 = captures.get(1)?.as_str().parse().ok()?;
    (hour <= 23).then_some(hour)
}

/// Leading-integer parse: optional whitespace and sign, then ASCII digits.
/// Anything after the digits is ignored (`"12 pcs"` is 12); no digits is 0.
/// Radix prefixes are not recognised: `"0x10"` is 0, not 16.
pub fn parse_quantity(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut magnitude: i64 = 0;
    for digit in rest.bytes().take_while(u8::is_ascii_digit) {
        magnitude = magnitude
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn cell<'a>(row: &'a Row, columns: &ColumnIndexMap, field: CanonicalField) -> &'a str {
    columns
        .get(field)
        .and_then(|index| row.get(index))
        .map(String::as_str)
        .unwrap_or("")
}

/// Converts one data row, or `None` when the row is dropped.
pub fn extract_row(
    row: &Row,
    columns: &ColumnIndexMap,
    tx_type: TransactionType,
) -> Option<Transaction> {
    let quantity = if tx_type.counts_tags() {
        i64::from(!cell(row, columns, CanonicalField::TagId).trim().is_empty())
    } else {
        parse_quantity(cell(row, columns, CanonicalField::UpdateQty))
    };

    let time = cell(row, columns, CanonicalField::TranTime);
    let user_id = cell(row, columns, CanonicalField::UserId).trim();

    if time.is_empty() || user_id.is_empty() || quantity == 0 {
        return None;
    }

    let hour = parse_hour(time)?;
    Some(Transaction {
        user_id: user_id.to_string(),
        hour,
        quantity,
    })
}

/// Transactions from one tokenized file.
///
/// Fails only when a required column is missing. Malformed rows are dropped
/// without surfacing an error.
pub fn extract_transactions(
    rows: &[Row],
    tx_type: TransactionType,
    file: &str,
) -> Result<Vec<Transaction>> {
    let Some(headers) = rows.get(HEADER_ROW) else {
        tracing::warn!("{} has no header row, skipping", file);
        return Ok(Vec::new());
    };

    let columns = resolve_columns(headers);
    require_columns(&columns, tx_type, file)?;

    let data_rows = rows.get(FIRST_DATA_ROW..).unwrap_or_default();
    let transactions: Vec<Transaction> = data_rows
        .iter()
        .filter_map(|row| extract_row(row, &columns, tx_type))
        .collect();

    let dropped = data_rows.len() - transactions.len();
    if dropped > 0 {
        tracing::debug!("{}: dropped {} of {} rows", file, dropped, data_rows.len());
    }
    tracing::debug!("{}: extracted {} {} transactions", file, transactions.len(), tx_type);

    Ok(transactions)
}
