use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::InquiryRecord;

/// One row as it comes off the CSV parser, before any validation.
/// Field names follow the export's Korean header labels.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RawRow {
    #[serde(rename = "문의 일자", default)]
    pub inquiry_date: Option<String>,
    #[serde(rename = "매출액", default)]
    pub sales_amount: Option<String>,
    #[serde(rename = "마진금액", default)]
    pub margin_amount: Option<String>,
    #[serde(rename = "진행 팀", default)]
    pub team: Option<String>,
    #[serde(rename = "담당자", default)]
    pub managers: Option<String>,
    #[serde(rename = "상태", default)]
    pub status: Option<String>,
    #[serde(rename = "문의경로", default)]
    pub source_channel: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load inquiry data from {path}")]
    DataLoad {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path} contains no rows with a usable inquiry date")]
    EmptyDataset { path: String },
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

/// Reads the CSV export and returns the canonical record collection.
/// Fails only when the file is unreadable or nothing survives
/// preprocessing; per-field malformation never fails the load.
pub fn load_records(path: &Path) -> Result<Vec<InquiryRecord>, LoadError> {
    let data_load = |source| LoadError::DataLoad {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(data_load)?;
    let mut raw = Vec::new();
    for row in reader.deserialize::<RawRow>() {
        raw.push(row.map_err(data_load)?);
    }

    let records = preprocess(&raw);
    if records.is_empty() {
        return Err(LoadError::EmptyDataset {
            path: path.display().to_string(),
        });
    }
    Ok(records)
}

/// Pure transform from raw rows to typed records. Rows without a
/// parseable inquiry date are discarded; amount fields lose their
/// thousands separators and default to 0 when malformed.
pub fn preprocess(rows: &[RawRow]) -> Vec<InquiryRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let date_field = row
            .inquiry_date
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let Some(inquiry_date) = date_field.and_then(parse_date) else {
            dropped += 1;
            continue;
        };

        records.push(InquiryRecord {
            inquiry_date,
            team: clean(&row.team),
            managers: split_managers(row.managers.as_deref().unwrap_or("")),
            sales_amount: parse_amount(row.sales_amount.as_deref()),
            margin_amount: parse_amount(row.margin_amount.as_deref()),
            status: clean(&row.status),
            source_channel: clean(&row.source_channel),
        });
    }

    if dropped > 0 {
        debug!(dropped, "discarded rows without a usable inquiry date");
    }
    records
}

/// Splits a comma-separated manager list, trimming each name and keeping
/// the first occurrence only, so split credit always sums to one.
pub fn split_managers(raw: &str) -> Vec<String> {
    let mut managers: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let name = part.trim();
        if name.is_empty() || managers.iter().any(|m| m == name) {
            continue;
        }
        managers.push(name.to_owned());
    }
    managers
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn parse_amount(value: Option<&str>) -> f64 {
    let Some(value) = value else { return 0.0 };
    let digits: String = value.trim().chars().filter(|c| *c != ',').collect();
    digits.parse::<f64>().unwrap_or(0.0)
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
