use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::aggregate;
use crate::dashboard::{RenderSink, ViewData};
use crate::filter::apply_filters;
use crate::models::{
    FilterSpec, Granularity, GroupField, GroupStat, InquiryRecord, KpiSummary, PeriodFilter,
    StatusCount, TimeSeriesPoint,
};

/// Sink that keeps the most recent render, for one-shot CLI output.
#[derive(Default)]
pub struct CapturedRender {
    pub kpi: Option<KpiSummary>,
    pub view: Option<ViewData>,
}

impl RenderSink for CapturedRender {
    fn kpis(&mut self, kpi: &KpiSummary) {
        self.kpi = Some(kpi.clone());
    }

    fn view(&mut self, view: &ViewData) {
        self.view = Some(view.clone());
    }
}

pub fn render_kpis(kpi: &KpiSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Total inquiries: {}", kpi.total);
    let _ = writeln!(output, "Successful: {}", kpi.successful);
    let _ = writeln!(output, "Success rate: {:.1}%", kpi.success_rate);
    output
}

pub fn render_view(view: &ViewData) -> String {
    match view {
        ViewData::TimeSeries(points) => render_trend(points),
        ViewData::Breakdown { stats, .. } => render_breakdown(stats),
        ViewData::StatusDistribution(counts) => render_statuses(counts),
    }
}

fn render_trend(points: &[TimeSeriesPoint]) -> String {
    let mut output = String::new();
    if points.is_empty() {
        let _ = writeln!(output, "No inquiries in this window.");
        return output;
    }
    for point in points {
        let _ = writeln!(
            output,
            "- {}: {} inquiries, {} successful ({:.1}%)",
            point.bucket_start,
            point.total,
            point.successful,
            point.success_rate()
        );
    }
    output
}

fn render_breakdown(stats: &[GroupStat]) -> String {
    let mut output = String::new();
    if stats.is_empty() {
        let _ = writeln!(output, "No inquiries in this window.");
        return output;
    }
    for stat in stats {
        let _ = writeln!(
            output,
            "- {}: {:.1} inquiries, {:.1} successful ({:.1}%)",
            stat.key,
            stat.total,
            stat.successful,
            stat.success_rate()
        );
    }
    output
}

fn render_statuses(counts: &[StatusCount]) -> String {
    let mut output = String::new();
    if counts.is_empty() {
        let _ = writeln!(output, "No inquiries in this window.");
        return output;
    }
    for status in counts {
        let _ = writeln!(output, "- {}: {}", status.label, status.count);
    }
    output
}

/// Human-readable summary of the active filter, for report headers.
pub fn describe_filter(spec: &FilterSpec) -> String {
    let period = match &spec.period {
        PeriodFilter::All => "all periods".to_string(),
        PeriodFilter::Range {
            start: Some(start),
            end: Some(end),
        } => format!("{start} to {end}"),
        PeriodFilter::Range { .. } => "all periods".to_string(),
        PeriodFilter::Year(year) => format!("year {year}"),
        PeriodFilter::Month { year, month } => format!("{year}-{month:02}"),
    };
    let team = spec.team.as_deref().unwrap_or("all teams");
    let manager = spec.manager.as_deref().unwrap_or("all managers");
    format!("{period}, {team}, {manager}")
}

/// Full markdown report covering every view of the filtered record set.
pub fn build_report(
    records: &[InquiryRecord],
    spec: &FilterSpec,
    generated_at: DateTime<Local>,
) -> String {
    let filtered = apply_filters(records, spec);
    let kpi = aggregate::kpi_summary(&filtered);
    let totals = aggregate::amount_totals(&filtered);
    let trend = aggregate::group_by_time(&filtered, Granularity::Month);
    let managers = aggregate::group_by_key(&filtered, GroupField::Manager);
    let channels = aggregate::group_by_key(&filtered, GroupField::SourceChannel);
    let statuses = aggregate::status_distribution(&filtered);

    let mut output = String::new();
    let _ = writeln!(output, "# Sales Inquiry Report");
    let _ = writeln!(
        output,
        "Generated {} ({})",
        generated_at.format("%Y-%m-%d %H:%M"),
        describe_filter(spec)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## KPIs");
    let _ = write!(output, "{}", render_kpis(&kpi));
    let _ = writeln!(output, "Sales total: {:.0}", totals.sales);
    let _ = writeln!(output, "Margin total: {:.0}", totals.margin);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Trend");
    let _ = write!(output, "{}", render_trend(&trend));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Manager Breakdown");
    let _ = write!(output, "{}", render_breakdown(&managers));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Source Channels");
    let _ = write!(output, "{}", render_breakdown(&channels));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Distribution");
    let _ = write!(output, "{}", render_statuses(&statuses));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: &str, status: Option<&str>, managers: &[&str]) -> InquiryRecord {
        InquiryRecord {
            inquiry_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            team: Some("영업1팀".to_string()),
            managers: managers.iter().map(|m| m.to_string()).collect(),
            sales_amount: 1000.0,
            margin_amount: 200.0,
            status: status.map(str::to_owned),
            source_channel: Some("홈페이지".to_string()),
        }
    }

    #[test]
    fn report_contains_every_section() {
        let records = vec![
            record("2024-01-05", Some("확정"), &["김철수"]),
            record("2024-02-20", Some("대기"), &["이영희"]),
        ];

        let report = build_report(&records, &FilterSpec::default(), Local::now());
        for section in [
            "# Sales Inquiry Report",
            "## KPIs",
            "## Monthly Trend",
            "## Manager Breakdown",
            "## Source Channels",
            "## Status Distribution",
        ] {
            assert!(report.contains(section), "missing section: {section}");
        }
        assert!(report.contains("Success rate: 50.0%"));
        assert!(report.contains("Sales total: 2000"));
    }

    #[test]
    fn empty_window_reports_no_data_lines() {
        let records = vec![record("2024-01-05", None, &[])];
        let spec = FilterSpec {
            period: PeriodFilter::Year(1999),
            team: None,
            manager: None,
        };

        let report = build_report(&records, &spec, Local::now());
        assert!(report.contains("Total inquiries: 0"));
        assert!(report.contains("No inquiries in this window."));
    }

    #[test]
    fn filter_description_names_every_dimension() {
        let spec = FilterSpec {
            period: PeriodFilter::Month {
                year: 2024,
                month: 3,
            },
            team: Some("영업1팀".to_string()),
            manager: None,
        };
        assert_eq!(describe_filter(&spec), "2024-03, 영업1팀, all managers");
    }

    #[test]
    fn half_filled_range_reads_as_all_periods() {
        let spec = FilterSpec {
            period: PeriodFilter::Range {
                start: NaiveDate::from_ymd_opt(2024, 1, 1),
                end: None,
            },
            team: None,
            manager: None,
        };
        assert!(describe_filter(&spec).starts_with("all periods"));
    }

    #[test]
    fn captured_render_keeps_the_latest_frame() {
        let mut sink = CapturedRender::default();
        sink.kpis(&KpiSummary {
            total: 1,
            successful: 0,
            success_rate: 0.0,
        });
        sink.kpis(&KpiSummary {
            total: 5,
            successful: 2,
            success_rate: 40.0,
        });
        assert_eq!(sink.kpi.unwrap().total, 5);
    }
}
