use crate::domain::model::{AggregateMap, Transaction};

/// Sums quantities per worker and hour. Input order does not affect the result.
pub fn group_by_user_and_hour(transactions: &[Transaction]) -> AggregateMap {
    let mut grouped = AggregateMap::new();
    add_transactions(&mut grouped, transactions);
    grouped
}

pub fn add_transactions(grouped: &mut AggregateMap, transactions: &[Transaction]) {
    for transaction in transactions {
        let cell = grouped
            .entry(transaction.user_id.clone())
            .or_default()
            .entry(transaction.hour)
            .or_insert(0);
        // clamps at the i64 bounds
        *cell = cell.saturating_add(transaction.quantity);
    }
}
