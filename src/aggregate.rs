use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    AmountTotals, FilterOptions, Granularity, GroupField, GroupStat, InquiryRecord, KpiSummary,
    StatusCount, TimeSeriesPoint, UNSPECIFIED,
};

pub fn kpi_summary(records: &[InquiryRecord]) -> KpiSummary {
    let total = records.len();
    let successful = records.iter().filter(|r| r.is_successful()).count();
    let success_rate = if total > 0 {
        successful as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    KpiSummary {
        total,
        successful,
        success_rate,
    }
}

/// Monday of the week containing `date`. Sunday belongs to the week that
/// started six days earlier, not the one starting the next day.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("the first of a month taken from a valid date is always valid")
}

/// Counts per time bucket, ascending by bucket start. Buckets with no
/// matching records are absent rather than zero-filled.
pub fn group_by_time(records: &[InquiryRecord], granularity: Granularity) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

    for record in records {
        let key = match granularity {
            Granularity::Week => week_start(record.inquiry_date),
            Granularity::Month => month_start(record.inquiry_date),
        };
        let entry = buckets.entry(key).or_insert((0, 0));
        entry.0 += 1;
        if record.is_successful() {
            entry.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(bucket_start, (total, successful))| TimeSeriesPoint {
            bucket_start,
            total,
            successful,
        })
        .collect()
}

/// Breakdown totals per key, sorted by total descending. A record with N
/// managers contributes 1/N to each manager's bucket; single-valued
/// fields contribute full credit, with missing values pooled under the
/// unspecified label.
pub fn group_by_key(records: &[InquiryRecord], field: GroupField) -> Vec<GroupStat> {
    let mut stats: HashMap<String, (f64, f64)> = HashMap::new();

    for record in records {
        let successful = record.is_successful();
        match field {
            GroupField::Manager if !record.managers.is_empty() => {
                let share = 1.0 / record.managers.len() as f64;
                for manager in &record.managers {
                    credit(&mut stats, manager, share, successful);
                }
            }
            GroupField::Manager => credit(&mut stats, UNSPECIFIED, 1.0, successful),
            GroupField::Team => credit(
                &mut stats,
                record.team.as_deref().unwrap_or(UNSPECIFIED),
                1.0,
                successful,
            ),
            GroupField::SourceChannel => credit(
                &mut stats,
                record.source_channel.as_deref().unwrap_or(UNSPECIFIED),
                1.0,
                successful,
            ),
            GroupField::Status => credit(
                &mut stats,
                record.status.as_deref().unwrap_or(UNSPECIFIED),
                1.0,
                successful,
            ),
        }
    }

    let mut breakdown: Vec<GroupStat> = stats
        .into_iter()
        .map(|(key, (total, successful))| GroupStat {
            key,
            total,
            successful,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    breakdown
}

fn credit(stats: &mut HashMap<String, (f64, f64)>, key: &str, share: f64, successful: bool) {
    let entry = stats.entry(key.to_owned()).or_insert((0.0, 0.0));
    entry.0 += share;
    if successful {
        entry.1 += share;
    }
}

/// Count per status label, in order of first occurrence.
pub fn status_distribution(records: &[InquiryRecord]) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::new();

    for record in records {
        let label = record.status.as_deref().unwrap_or(UNSPECIFIED);
        match counts.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(StatusCount {
                label: label.to_owned(),
                count: 1,
            }),
        }
    }

    counts
}

pub fn amount_totals(records: &[InquiryRecord]) -> AmountTotals {
    AmountTotals {
        sales: records.iter().map(|r| r.sales_amount).sum(),
        margin: records.iter().map(|r| r.margin_amount).sum(),
    }
}

/// Distinct teams, managers, and years present in the dataset, for
/// populating filter choices.
pub fn filter_options(records: &[InquiryRecord]) -> FilterOptions {
    let mut teams = BTreeSet::new();
    let mut managers = BTreeSet::new();
    let mut years = BTreeSet::new();

    for record in records {
        if let Some(team) = &record.team {
            teams.insert(team.clone());
        }
        for manager in &record.managers {
            managers.insert(manager.clone());
        }
        years.insert(record.inquiry_date.year());
    }

    FilterOptions {
        teams: teams.into_iter().collect(),
        managers: managers.into_iter().collect(),
        years: years.into_iter().rev().collect(),
    }
}

/// Months (1-12) with at least one record in the given year, ascending.
pub fn months_for_year(records: &[InquiryRecord], year: i32) -> Vec<u32> {
    let months: BTreeSet<u32> = records
        .iter()
        .filter(|r| r.inquiry_date.year() == year)
        .map(|r| r.inquiry_date.month())
        .collect();
    months.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, status: Option<&str>, managers: &[&str]) -> InquiryRecord {
        InquiryRecord {
            inquiry_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            team: None,
            managers: managers.iter().map(|m| m.to_string()).collect(),
            sales_amount: 0.0,
            margin_amount: 0.0,
            status: status.map(str::to_owned),
            source_channel: None,
        }
    }

    fn stat<'a>(breakdown: &'a [GroupStat], key: &str) -> &'a GroupStat {
        breakdown.iter().find(|s| s.key == key).unwrap()
    }

    #[test]
    fn kpi_counts_successes_and_rate() {
        let records = vec![
            record("2024-01-05", Some("확정"), &[]),
            record("2024-01-20", Some("대기"), &[]),
        ];

        let kpi = kpi_summary(&records);
        assert_eq!(kpi.total, 2);
        assert_eq!(kpi.successful, 1);
        assert!((kpi.success_rate - 50.0).abs() < 0.001);
    }

    #[test]
    fn kpi_rate_is_zero_for_an_empty_set() {
        let kpi = kpi_summary(&[]);
        assert_eq!(kpi.total, 0);
        assert_eq!(kpi.success_rate, 0.0);
    }

    #[test]
    fn both_success_statuses_count() {
        let records = vec![
            record("2024-01-05", Some("확정"), &[]),
            record("2024-01-06", Some("진행 완료"), &[]),
            record("2024-01-07", Some("보류"), &[]),
        ];
        assert_eq!(kpi_summary(&records).successful, 2);
    }

    #[test]
    fn sunday_belongs_to_the_previous_monday() {
        // 2024-01-07 is a Sunday; its week started on 2024-01-01.
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn month_buckets_are_sparse_and_sorted() {
        let records = vec![
            record("2024-03-10", None, &[]),
            record("2024-01-05", Some("확정"), &[]),
            record("2024-03-25", None, &[]),
        ];

        let points = group_by_time(&records, Granularity::Month);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].bucket_start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(points[0].successful, 1);
        assert_eq!(points[1].bucket_start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(points[1].total, 2);
    }

    #[test]
    fn bucket_totals_sum_to_the_record_count() {
        let records = vec![
            record("2024-01-01", None, &[]),
            record("2024-01-07", None, &[]),
            record("2024-02-15", None, &[]),
            record("2024-03-01", None, &[]),
        ];

        for granularity in [Granularity::Week, Granularity::Month] {
            let points = group_by_time(&records, granularity);
            let total: usize = points.iter().map(|p| p.total).sum();
            assert_eq!(total, records.len());
        }
    }

    #[test]
    fn empty_input_yields_empty_trend() {
        assert!(group_by_time(&[], Granularity::Week).is_empty());
    }

    #[test]
    fn co_managers_split_credit_evenly() {
        let records = vec![
            record("2024-01-05", Some("확정"), &["김철수", "이영희"]),
            record("2024-01-20", Some("대기"), &["김철수", "이영희"]),
        ];

        let breakdown = group_by_key(&records, GroupField::Manager);
        assert_eq!(breakdown.len(), 2);
        for key in ["김철수", "이영희"] {
            let entry = stat(&breakdown, key);
            assert!((entry.total - 1.0).abs() < 0.001);
            assert!((entry.successful - 0.5).abs() < 0.001);
        }
    }

    #[test]
    fn split_credit_sums_to_one_per_record() {
        let records = vec![record("2024-01-05", Some("확정"), &["a", "b", "c"])];
        let breakdown = group_by_key(&records, GroupField::Manager);

        let total: f64 = breakdown.iter().map(|s| s.total).sum();
        let successful: f64 = breakdown.iter().map(|s| s.successful).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((successful - 1.0).abs() < 1e-9);
    }

    #[test]
    fn records_without_managers_get_full_unspecified_credit() {
        let records = vec![record("2024-01-05", None, &[])];
        let breakdown = group_by_key(&records, GroupField::Manager);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].key, UNSPECIFIED);
        assert!((breakdown[0].total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn breakdown_is_sorted_by_total_descending() {
        let records = vec![
            record("2024-01-05", Some("확정"), &[]),
            record("2024-01-06", Some("대기"), &[]),
            record("2024-01-07", Some("대기"), &[]),
        ];

        let breakdown = group_by_key(&records, GroupField::Status);
        assert_eq!(breakdown[0].key, "대기");
        assert!((breakdown[0].total - 2.0).abs() < 1e-9);
    }

    #[test]
    fn group_stat_rate_guards_division_by_zero() {
        let empty = GroupStat {
            key: "x".to_string(),
            total: 0.0,
            successful: 0.0,
        };
        assert_eq!(empty.success_rate(), 0.0);
    }

    #[test]
    fn status_distribution_keeps_first_occurrence_order() {
        let records = vec![
            record("2024-01-05", Some("대기"), &[]),
            record("2024-01-06", Some("확정"), &[]),
            record("2024-01-07", Some("대기"), &[]),
            record("2024-01-08", None, &[]),
        ];

        let counts = status_distribution(&records);
        let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["대기", "확정", UNSPECIFIED]);
        assert_eq!(counts[0].count, 2);
    }

    #[test]
    fn amount_totals_sum_both_columns() {
        let mut first = record("2024-01-05", None, &[]);
        first.sales_amount = 1000.0;
        first.margin_amount = 200.0;
        let mut second = record("2024-01-06", None, &[]);
        second.sales_amount = 500.0;
        second.margin_amount = 100.0;

        let totals = amount_totals(&[first, second]);
        assert_eq!(totals.sales, 1500.0);
        assert_eq!(totals.margin, 300.0);
    }

    #[test]
    fn filter_options_are_ordered_for_display() {
        let mut a = record("2024-03-05", None, &["이영희"]);
        a.team = Some("영업2팀".to_string());
        let mut b = record("2025-01-10", None, &["김철수"]);
        b.team = Some("영업1팀".to_string());

        let options = filter_options(&[a, b]);
        assert_eq!(options.teams, vec!["영업1팀", "영업2팀"]);
        assert_eq!(options.managers, vec!["김철수", "이영희"]);
        assert_eq!(options.years, vec![2025, 2024]);
    }

    #[test]
    fn months_are_restricted_to_the_requested_year() {
        let records = vec![
            record("2024-03-05", None, &[]),
            record("2024-01-10", None, &[]),
            record("2025-06-01", None, &[]),
        ];
        assert_eq!(months_for_year(&records, 2024), vec![1, 3]);
        assert_eq!(months_for_year(&records, 2023), Vec::<u32>::new());
    }
}
