use chrono::NaiveDate;
use serde::Serialize;

/// Status labels counted as a confirmed outcome.
pub const SUCCESS_STATUSES: [&str; 2] = ["확정", "진행 완료"];

/// Bucket label for records with no value in a grouping field.
pub const UNSPECIFIED: &str = "(미지정)";

/// One preprocessed inquiry row. Immutable after preprocessing; every
/// record in the canonical collection carries a valid inquiry date.
#[derive(Debug, Clone)]
pub struct InquiryRecord {
    pub inquiry_date: NaiveDate,
    pub team: Option<String>,
    pub managers: Vec<String>,
    pub sales_amount: f64,
    pub margin_amount: f64,
    pub status: Option<String>,
    pub source_channel: Option<String>,
}

impl InquiryRecord {
    pub fn is_successful(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| SUCCESS_STATUSES.contains(&status))
    }
}

/// Date dimension of a filter. Exactly one variant is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFilter {
    All,
    /// Inclusive bounds. Only constrains the date when BOTH are present;
    /// a half-filled range leaves the date dimension unfiltered.
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Year(i32),
    Month { year: i32, month: u32 },
}

/// Filter state rebuilt on every filter-change event. `None` on the team
/// and manager dimensions means no restriction (the "전체" option).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub period: PeriodFilter,
    pub team: Option<String>,
    pub manager: Option<String>,
}

impl Default for FilterSpec {
    fn default() -> FilterSpec {
        FilterSpec {
            period: PeriodFilter::All,
            team: None,
            manager: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Granularity {
    Week,
    Month,
}

/// Grouping dimension for breakdown statistics. Manager is the one
/// multi-valued field and gets split credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupField {
    Manager,
    Team,
    SourceChannel,
    Status,
}

/// Which chart view is active on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    TimeSeries(Granularity),
    Breakdown(GroupField),
    StatusDistribution,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    pub total: usize,
    pub successful: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub bucket_start: NaiveDate,
    pub total: usize,
    pub successful: usize,
}

impl TimeSeriesPoint {
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            self.successful as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Per-key breakdown totals. Fractional under manager split credit.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub total: f64,
    pub successful: f64,
}

impl GroupStat {
    pub fn success_rate(&self) -> f64 {
        if self.total > 0.0 {
            self.successful / self.total * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub label: String,
    pub count: usize,
}

/// Sums of the normalized currency columns for a filtered record set.
#[derive(Debug, Clone, Serialize)]
pub struct AmountTotals {
    pub sales: f64,
    pub margin: f64,
}

/// Distinct filter values present in the canonical dataset, in display
/// order: teams and managers ascending, years newest first.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub teams: Vec<String>,
    pub managers: Vec<String>,
    pub years: Vec<i32>,
}
