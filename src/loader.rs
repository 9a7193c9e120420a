use std::io::{Read, Seek, SeekFrom};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, SpyError};
use crate::models::{Transaction, TransactionTable};

pub const DATE_COLUMN: &str = "date";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const AMOUNT_COLUMN: &str = "amount";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Header names compare case- and whitespace-insensitively: " Date " -> "date".
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parse a money amount. Accepts plain numbers, `$` and thousands separators,
/// and accounting-style parentheses for negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(['$', ','], "");
    let s = s.trim();
    let value = if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        -inner.trim().parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Raw table
// ---------------------------------------------------------------------------

/// CSV contents with normalized headers and untouched string fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SpyError::MissingColumn(name.to_string()))
    }

    /// Resolve the required columns and parse `date` and `amount` on every row.
    /// The first bad row fails the whole table.
    pub fn into_transactions(self) -> Result<TransactionTable> {
        let date_idx = self.column(DATE_COLUMN)?;
        let desc_idx = self.column(DESCRIPTION_COLUMN)?;
        let amount_idx = self.column(AMOUNT_COLUMN)?;

        let field = |record: &[String], idx: usize| -> String {
            record.get(idx).cloned().unwrap_or_default()
        };

        let mut rows = Vec::with_capacity(self.records.len());
        for (i, record) in self.records.iter().enumerate() {
            let row = i + 1;
            let raw_date = field(record, date_idx);
            let date = parse_date(&raw_date).ok_or(SpyError::InvalidDate {
                row,
                value: raw_date.clone(),
            })?;
            let raw_amount = field(record, amount_idx);
            let amount = parse_amount(&raw_amount).ok_or(SpyError::InvalidAmount {
                row,
                value: raw_amount.clone(),
            })?;
            rows.push(Transaction::new(date, field(record, desc_idx), amount));
        }

        Ok(TransactionTable {
            headers: self.headers,
            records: self.records,
            rows,
        })
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read CSV with a header row from any reader, from its current position.
pub fn load_reader<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }

    debug!(columns = headers.len(), rows = records.len(), "loaded csv");
    Ok(RawTable { headers, records })
}

/// Rewind a seekable source to its start, then read it. Loading the same
/// stream twice yields the same table.
pub fn load_stream<S: Read + Seek>(source: &mut S) -> Result<RawTable> {
    source.seek(SeekFrom::Start(0))?;
    load_reader(source)
}
