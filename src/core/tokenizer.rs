use crate::domain::model::Row;

/// Splits raw CSV text into rows.
///
/// Every `"` toggles quoted mode and is dropped from the field; `""` is not an
/// escaped quote. Lines are split on `\n` only, so a trailing `\r` stays in the
/// last field. Rows with fewer than two fields are discarded.
pub fn parse_csv(text: &str) -> Vec<Row> {
    text.split('\n')
        .map(parse_line)
        .filter(|row| row.len() > 1)
        .collect()
}

fn parse_line(line: &str) -> Row {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
