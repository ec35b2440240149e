use crate::domain::model::{Classification, OutputFormat, Report};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const TOTAL_LABEL: &str = "TOTAL";

/// Background colors of the pasteable table.
pub mod colors {
    pub const ABOVE_TARGET: &str = "#90EE90";
    pub const BELOW_TARGET: &str = "#FFB6C1";
    pub const HIGHLIGHT: &str = "#b3d9ff";
    pub const HEADER: &str = "#cce7ff";
    pub const BODY: &str = "#e6f3ff";
}

const EMAIL_TABLE_STYLE: &str =
    "border-collapse: collapse; font-family: Arial, sans-serif; font-size: 12px; background-color: #e6f3ff;";
const EMAIL_CELL_STYLE: &str = "border: 1px solid #333; padding: 4px 8px; text-align: center;";

const PAGE_STYLE: &str = r#"table { border-collapse: collapse; font-family: Arial, sans-serif; font-size: 12px; background-color: #e6f3ff; }
td, th { border: 1px solid #333; padding: 4px 8px; text-align: center; }
th { background-color: #cce7ff; font-weight: bold; }
.green { background-color: #90EE90; }
.red { background-color: #FFB6C1; }
.user-cell, .total-cell { background-color: #b3d9ff; }"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Header,
    User,
    Value(Classification),
    RowTotal,
    Total,
}

impl CellKind {
    fn class_name(&self) -> &'static str {
        match self {
            CellKind::Header | CellKind::RowTotal => "",
            CellKind::User => "user-cell",
            CellKind::Value(classification) => classification.css_class(),
            CellKind::Total => "total-cell",
        }
    }

    fn background(&self) -> &'static str {
        match self {
            CellKind::Header => colors::HEADER,
            CellKind::User | CellKind::Total => colors::HIGHLIGHT,
            CellKind::Value(Classification::AboveTarget) => colors::ABOVE_TARGET,
            CellKind::Value(Classification::BelowTarget) => colors::BELOW_TARGET,
            CellKind::Value(Classification::Neutral) | CellKind::RowTotal => colors::BODY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
    pub kind: CellKind,
}

impl TableCell {
    fn new(text: impl Into<String>, kind: CellKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Rich and plain text halves of a clipboard copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipboardPayload {
    pub html: String,
    pub text: String,
}

pub fn hour_label(hour: u8) -> String {
    format!("{:02}:00", hour)
}

/// Lays the report out as rendered: header row, one row per worker, TOTAL row.
pub fn table_grid(report: &Report) -> Vec<Vec<TableCell>> {
    let mut grid = Vec::with_capacity(report.rows.len() + 2);

    let mut header = vec![TableCell::new("", CellKind::Header)];
    header.extend(
        report
            .hours
            .iter()
            .map(|hour| TableCell::new(hour_label(*hour), CellKind::Header)),
    );
    header.push(TableCell::new(TOTAL_LABEL, CellKind::Header));
    grid.push(header);

    for row in &report.rows {
        let mut cells = vec![TableCell::new(row.display_name.clone(), CellKind::User)];
        cells.extend(row.cells.iter().map(|cell| {
            let text = cell.value.map(|v| v.to_string()).unwrap_or_default();
            TableCell::new(text, CellKind::Value(cell.classification))
        }));
        cells.push(TableCell::new(row.total.to_string(), CellKind::RowTotal));
        grid.push(cells);
    }

    let mut totals = vec![TableCell::new(TOTAL_LABEL, CellKind::Total)];
    totals.extend(
        report
            .column_totals
            .iter()
            .map(|total| TableCell::new(total.to_string(), CellKind::Total)),
    );
    totals.push(TableCell::new(report.grand_total.to_string(), CellKind::Total));
    grid.push(totals);

    grid
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn render_table<F>(report: &Report, table_attrs: &str, cell_attrs: F) -> String
where
    F: Fn(&TableCell) -> String,
{
    let mut html = format!("<table{}>", table_attrs);
    for row in table_grid(report) {
        html.push_str("<tr>");
        for cell in &row {
            let tag = if cell.kind == CellKind::Header { "th" } else { "td" };
            html.push_str(&format!(
                "<{tag}{}>{}</{tag}>",
                cell_attrs(cell),
                escape_html(&cell.text)
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Table markup using `green`, `red`, `user-cell` and `total-cell` classes.
pub fn render_html_table(report: &Report) -> String {
    render_table(report, "", |cell| match cell.kind {
        CellKind::Header => String::new(),
        kind => format!(" class=\"{}\"", kind.class_name()),
    })
}

pub fn render_html_page(report: &Report) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{} transactions</title>\n<style>\n{}\n</style>\n</head>\n<body>\n<h2>{} transactions</h2>\n{}\n<p>Generated {}</p>\n</body>\n</html>\n",
        report.tx_type,
        PAGE_STYLE,
        report.tx_type,
        render_html_table(report),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Same table with every color inlined, for mail clients that drop `<style>`.
pub fn render_email_html(report: &Report) -> String {
    let table_attrs = format!(" style=\"{}\"", EMAIL_TABLE_STYLE);
    render_table(report, &table_attrs, |cell| {
        let weight = if cell.kind == CellKind::Header {
            " font-weight: bold;"
        } else {
            ""
        };
        format!(
            " style=\"{} background-color: {};{}\"",
            EMAIL_CELL_STYLE,
            cell.kind.background(),
            weight
        )
    })
}

/// Tab-separated cells, one line per table row.
pub fn render_text(report: &Report) -> String {
    table_grid(report)
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.text.as_str())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_csv(report: &Report) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in table_grid(report) {
        writer.write_record(row.iter().map(|cell| cell.text.as_str()))?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))
}

pub fn render_json(report: &Report) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(report)?)
}

pub fn clipboard_payload(report: &Report) -> ClipboardPayload {
    ClipboardPayload {
        html: render_email_html(report),
        text: render_text(report),
    }
}

/// Every other format bundled into one archive.
pub fn render_zip(report: &Report) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for format in OutputFormat::ALL {
        if format == OutputFormat::Zip {
            continue;
        }
        let data = export_artifact(report, format)?;
        zip.start_file::<_, ()>(format.file_name(report.tx_type), FileOptions::default())?;
        zip.write_all(&data)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn export_artifact(report: &Report, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Html => Ok(render_html_page(report).into_bytes()),
        OutputFormat::Email => Ok(render_email_html(report).into_bytes()),
        OutputFormat::Txt => Ok(render_text(report).into_bytes()),
        OutputFormat::Csv => render_csv(report),
        OutputFormat::Json => render_json(report),
        OutputFormat::Zip => render_zip(report),
    }
}
