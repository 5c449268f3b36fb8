//! CSV export of flat record sets.
//!
//! The header row is taken from the keys of the first record. Records with
//! a different key set are written as-is and will not line up with the
//! header; callers that mix shapes must normalize them first.

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::ReportError;
use crate::models::ReportKind;
use crate::report::RecordSet;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// A CSV body ready to be served as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvAttachment {
    pub filename: String,
    pub body: String,
}

impl CsvAttachment {
    pub fn content_type(&self) -> &'static str {
        CSV_CONTENT_TYPE
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

/// `report-<kind>-<epoch-ms>.<extension>`
pub fn report_filename(kind: ReportKind, generated_at: DateTime<Utc>, extension: &str) -> String {
    format!(
        "report-{}-{}.{}",
        kind.as_str(),
        generated_at.timestamp_millis(),
        extension
    )
}

pub fn csv_attachment(
    records: &RecordSet,
    generated_at: DateTime<Utc>,
) -> Result<CsvAttachment, ReportError> {
    Ok(CsvAttachment {
        filename: report_filename(records.kind(), generated_at, "csv"),
        body: record_set_csv(records)?,
    })
}

/// Exports the primary rows of a record set. Class performance exports its
/// grade rows.
pub fn record_set_csv(records: &RecordSet) -> Result<String, ReportError> {
    match records {
        RecordSet::Grades(records) => to_csv(records),
        RecordSet::Attendance(records) => to_csv(records),
        RecordSet::TeacherPerformance(records) => to_csv(records),
        RecordSet::ClassPerformance { grades, .. } => to_csv(grades),
    }
}

pub fn to_csv<T: Serialize>(records: &[T]) -> Result<String, ReportError> {
    let rows = records
        .iter()
        .map(flatten)
        .collect::<Result<Vec<_>, _>>()?;
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };

    let mut out = Vec::new();
    {
        let mut header = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut out);
        header.write_record(first.iter().map(|(key, _)| key))?;
        header.flush()?;
    }
    {
        let mut body = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(&mut out);
        for row in &rows {
            body.write_record(row.iter().map(|(_, value)| value))?;
        }
        body.flush()?;
    }

    let mut text = String::from_utf8(out)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Key/value pairs of one record in field order.
fn flatten<T: Serialize>(record: &T) -> Result<Vec<(String, String)>, ReportError> {
    Ok(match serde_json::to_value(record)? {
        Value::Object(fields) => fields
            .into_iter()
            .map(|(key, value)| (key, text(value)))
            .collect(),
        other => vec![("value".to_string(), text(other))],
    })
}

fn text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(value) => value,
        other => other.to_string(),
    }
}
