use crate::domain::model::{CanonicalField, ColumnIndexMap, TransactionType};
use crate::utils::error::{EtlError, Result};

/// Header spellings accepted for each canonical field, compared after
/// lowercasing and trimming.
const ALIASES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::UpdateQty, &["update_qty", "updateqty", "quantity"]),
    (
        CanonicalField::TranTime,
        &["tran_time", "trantime", "transaction_time", "time"],
    ),
    (CanonicalField::UserId, &["user_id", "userid", "user"]),
    (CanonicalField::TagId, &["tag_id", "tagid", "tag"]),
];

pub fn canonical_field(header: &str) -> Option<CanonicalField> {
    let normalized = header.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(_, names)| names.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

/// Maps header cells to column positions, scanning left to right.
///
/// A later header resolving to the same field overwrites the earlier index.
pub fn resolve_columns(headers: &[String]) -> ColumnIndexMap {
    let mut columns = ColumnIndexMap::new();
    for (index, header) in headers.iter().enumerate() {
        if let Some(field) = canonical_field(header) {
            columns.insert(field, index);
        }
    }
    columns
}

/// Checks the columns `tx_type` needs, in the order the user is told about them.
pub fn require_columns(
    columns: &ColumnIndexMap,
    tx_type: TransactionType,
    file: &str,
) -> Result<()> {
    let quantity_field = if tx_type.counts_tags() {
        CanonicalField::TagId
    } else {
        CanonicalField::UpdateQty
    };

    for field in [CanonicalField::TranTime, CanonicalField::UserId, quantity_field] {
        if !columns.contains(field) {
            return Err(EtlError::MissingRequiredColumn {
                column: field,
                file: file.to_string(),
            });
        }
    }
    Ok(())
}
