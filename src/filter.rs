use chrono::Datelike;

use crate::models::{FilterSpec, InquiryRecord, PeriodFilter};

/// Returns the records matching every active filter dimension, in their
/// original order.
pub fn apply_filters(records: &[InquiryRecord], spec: &FilterSpec) -> Vec<InquiryRecord> {
    records
        .iter()
        .filter(|record| matches(record, spec))
        .cloned()
        .collect()
}

fn matches(record: &InquiryRecord, spec: &FilterSpec) -> bool {
    if !period_matches(record, &spec.period) {
        return false;
    }

    if let Some(team) = spec.team.as_deref() {
        if record.team.as_deref() != Some(team) {
            return false;
        }
    }

    if let Some(manager) = spec.manager.as_deref() {
        if !record.managers.iter().any(|m| m == manager) {
            return false;
        }
    }

    true
}

fn period_matches(record: &InquiryRecord, period: &PeriodFilter) -> bool {
    let date = record.inquiry_date;
    match period {
        PeriodFilter::All => true,
        PeriodFilter::Range {
            start: Some(start),
            end: Some(end),
        } => *start <= date && date <= *end,
        // A range with a missing bound leaves the date dimension unfiltered.
        PeriodFilter::Range { .. } => true,
        PeriodFilter::Year(year) => date.year() == *year,
        PeriodFilter::Month { year, month } => date.year() == *year && date.month() == *month,
    }
}
