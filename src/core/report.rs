use crate::domain::model::{
    AggregateMap, Classification, Report, ReportCell, ReportRow, TransactionType,
};
use chrono::Utc;
use std::collections::BTreeSet;

/// Colors a cell against the hourly target. Zero and untargeted cells stay neutral.
pub fn classify(value: i64, target: Option<i64>) -> Classification {
    match target {
        _ if value == 0 => Classification::Neutral,
        Some(target) if value >= target => Classification::AboveTarget,
        Some(_) => Classification::BelowTarget,
        None => Classification::Neutral,
    }
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// Builds the user × hour table for one batch.
///
/// Hours are the union over all workers in ascending order and rows follow the
/// raw worker id order. `display_name` supplies the row label only.
pub fn build_report<F>(
    aggregates: &AggregateMap,
    tx_type: TransactionType,
    display_name: F,
) -> Report
where
    F: Fn(&str) -> String,
{
    let target = tx_type.target();
    let hours: Vec<u8> = aggregates
        .values()
        .flat_map(|per_hour| per_hour.keys().copied())
        .collect::<BTreeSet<u8>>()
        .into_iter()
        .collect();

    let rows: Vec<ReportRow> = aggregates
        .iter()
        .map(|(user_id, per_hour)| {
            let cells = hours
                .iter()
                .map(|hour| {
                    let value = per_hour.get(hour).copied().unwrap_or(0);
                    ReportCell {
                        value: (value != 0).then_some(value),
                        classification: classify(value, target),
                    }
                })
                .collect();

            ReportRow {
                user_id: user_id.clone(),
                display_name: display_name(user_id),
                cells,
                total: saturating_sum(per_hour.values().copied()),
            }
        })
        .collect();

    let column_totals: Vec<i64> = hours
        .iter()
        .map(|hour| {
            saturating_sum(
                aggregates
                    .values()
                    .filter_map(|per_hour| per_hour.get(hour).copied()),
            )
        })
        .collect();
    let grand_total = saturating_sum(column_totals.iter().copied());

    Report {
        tx_type,
        target,
        hours,
        rows,
        column_totals,
        grand_total,
        generated_at: Utc::now(),
    }
}

/// Re-labels rows after the worker name mapping changed.
pub fn relabel<F>(report: &mut Report, display_name: F)
where
    F: Fn(&str) -> String,
{
    for row in &mut report.rows {
        row.display_name = display_name(&row.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::group_by_user_and_hour;
    use crate::domain::model::Transaction;

    fn tx(user_id: &str, hour: u8, quantity: i64) -> Transaction {
        Transaction {
            user_id: user_id.to_string(),
            hour,
            quantity,
        }
    }

    #[test]
    fn test_classify_against_target() {
        assert_eq!(classify(100, Some(100)), Classification::AboveTarget);
        assert_eq!(classify(99, Some(100)), Classification::BelowTarget);
        assert_eq!(classify(0, Some(100)), Classification::Neutral);
        assert_eq!(classify(-5, Some(25)), Classification::BelowTarget);
        assert_eq!(classify(40, None), Classification::Neutral);
    }

    #[test]
    fn test_report_layout_and_totals() {
        let grouped = group_by_user_and_hour(&[
            tx("U2", 10, 30),
            tx("U1", 8, 110),
            tx("U1", 9, 60),
            tx("U2", 8, 5),
        ]);
        let report = build_report(&grouped, TransactionType::Pick, |id| id.to_string());

        assert_eq!(report.target, Some(100));
        assert_eq!(report.hours, vec![8, 9, 10]);
        assert_eq!(report.rows.len(), 2);

        let u1 = &report.rows[0];
        assert_eq!(u1.user_id, "U1");
        assert_eq!(u1.total, 170);
        assert_eq!(u1.cells[0].value, Some(110));
        assert_eq!(u1.cells[0].classification, Classification::AboveTarget);
        assert_eq!(u1.cells[1].classification, Classification::BelowTarget);
        // U1 has nothing at 10:00
        assert_eq!(u1.cells[2].value, None);
        assert_eq!(u1.cells[2].classification, Classification::Neutral);

        assert_eq!(report.column_totals, vec![115, 60, 30]);
        assert_eq!(report.grand_total, 205);
    }

    #[test]
    fn test_zero_sum_cell_is_blank_and_neutral() {
        let grouped = group_by_user_and_hour(&[tx("U1", 7, 30), tx("U1", 7, -30)]);
        let report = build_report(&grouped, TransactionType::Returns, |id| id.to_string());

        assert_eq!(report.hours, vec![7]);
        assert_eq!(report.rows[0].cells[0].value, None);
        assert_eq!(report.rows[0].cells[0].classification, Classification::Neutral);
        assert_eq!(report.rows[0].total, 0);
    }

    #[test]
    fn test_replan_cells_are_neutral() {
        let grouped = group_by_user_and_hour(&[tx("U1", 7, 1), tx("U1", 7, 1)]);
        let report = build_report(&grouped, TransactionType::Replan, |id| id.to_string());

        assert_eq!(report.target, None);
        assert_eq!(report.rows[0].cells[0].value, Some(2));
        assert_eq!(report.rows[0].cells[0].classification, Classification::Neutral);
    }

    #[test]
    fn test_rows_sorted_by_raw_id_and_labelled() {
        let grouped = group_by_user_and_hour(&[tx("b7", 8, 1), tx("A2", 8, 1), tx("a1", 8, 1)]);
        let report = build_report(&grouped, TransactionType::Pick, |id| {
            if id == "a1" {
                format!("{}/Ana", id)
            } else {
                id.to_string()
            }
        });

        let ids: Vec<&str> = report.rows.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["A2", "a1", "b7"]);
        assert_eq!(report.rows[1].display_name, "a1/Ana");
    }

    #[test]
    fn test_relabel_updates_display_names() {
        let grouped = group_by_user_and_hour(&[tx("U1", 8, 1)]);
        let mut report = build_report(&grouped, TransactionType::Pick, |id| id.to_string());
        relabel(&mut report, |id| format!("{}/Sam", id));
        assert_eq!(report.rows[0].display_name, "U1/Sam");
    }

    #[test]
    fn test_empty_aggregates() {
        let report = build_report(&AggregateMap::new(), TransactionType::Pack, |id| id.to_string());
        assert!(report.is_empty());
        assert!(report.hours.is_empty());
        assert_eq!(report.grand_total, 0);
    }

    #[test]
    fn test_oversized_quantities_clamp_instead_of_overflowing() {
        use crate::core::extract::extract_transactions;
        use crate::core::tokenizer::parse_csv;

        let rows = parse_csv(
            "Pick export,generated\n\
             user_id,tran_time,update_qty\n\
             U1,08:00:00,9999999999999999999\n\
             U1,08:30:00,5\n\
             U2,09:00:00,9999999999999999999\n\
             U2,09:10:00,9999999999999999999\n",
        );
        let transactions = extract_transactions(&rows, TransactionType::Pick, "pick.csv").unwrap();
        assert_eq!(transactions.len(), 4);

        let grouped = group_by_user_and_hour(&transactions);
        let report = build_report(&grouped, TransactionType::Pick, |id| id.to_string());

        assert_eq!(report.rows[0].cells[0].value, Some(i64::MAX));
        assert_eq!(report.rows[0].cells[0].classification, Classification::AboveTarget);
        assert_eq!(report.rows[1].cells[1].value, Some(i64::MAX));
        assert_eq!(report.rows[1].cells[1].classification, Classification::AboveTarget);
        assert_eq!(report.rows[0].total, i64::MAX);
        assert_eq!(report.column_totals, vec![i64::MAX, i64::MAX]);
        assert_eq!(report.grand_total, i64::MAX);
    }
}
