//! Flat JSON records <-> CSV text.
//!
//! Quoting follows RFC 4180: a field is wrapped in double quotes when it
//! contains a comma, a double quote, CR or LF, and embedded double quotes are
//! doubled. Every record, the header included, ends with CRLF.

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use serde_json::Value;
use std::borrow::Cow;
use std::io;

use crate::services::error::TransferError;
use crate::services::fetcher::Record;

#[derive(Debug, Clone, Default)]
pub struct CsvEncoder {
    columns: Option<Vec<String>>,
}

impl CsvEncoder {
    /// Columns follow the key order of the first record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns are fixed up front, so even an empty input produces a header.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }

    /// Encodes the records into one CSV document. Keys absent from the header
    /// are dropped, and header keys absent from a record become empty fields.
    pub fn encode(&self, records: &[Record]) -> Result<String, TransferError> {
        let columns: Vec<String> = match (&self.columns, records.first()) {
            (Some(columns), _) => columns.clone(),
            (None, Some(first)) => first.keys().cloned().collect(),
            (None, None) => return Ok(String::new()),
        };
        if columns.is_empty() {
            return Ok(String::new());
        }

        let mut writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());

        writer.write_record(&columns)?;
        for record in records {
            writer.write_record(columns.iter().map(|c| field_text(record.get(c)).into_owned()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| TransferError::Csv(e.into_error().into()))?;

        String::from_utf8(bytes).map_err(|e| {
            TransferError::Csv(io::Error::new(io::ErrorKind::InvalidData, e).into())
        })
    }
}

fn field_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(b)) => Cow::Owned(b.to_string()),
        Some(Value::Number(n)) => Cow::Owned(n.to_string()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Parses a CSV document with a header row. All values come back as JSON
/// strings; rows whose width differs from the header are an error.
pub fn decode(text: &str) -> Result<Vec<Record>, TransferError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        records.push(record);
    }

    Ok(records)
}
