use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;

mod aggregate;
mod dashboard;
mod data;
mod filter;
mod models;
mod report;

use dashboard::{Dashboard, Event, ViewData};
use models::{FilterSpec, Granularity, GroupField, PeriodFilter, ViewKind};
use report::CapturedRender;

#[derive(Parser)]
#[command(name = "inquiry-dashboard")]
#[command(about = "Sales inquiry analytics over a CSV export", long_about = None)]
struct Cli {
    /// Path to the inquiry CSV export
    #[arg(long, global = true, default_value = "data.csv")]
    csv: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("period")
        .args(["from", "year", "month"])
        .multiple(false)
))]
struct FilterArgs {
    /// Start of an inclusive date range (YYYY-MM-DD); only constrains
    /// the date together with --to
    #[arg(long)]
    from: Option<NaiveDate>,
    /// End of an inclusive date range (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Restrict to a calendar year
    #[arg(long)]
    year: Option<i32>,
    /// Restrict to a calendar month (YYYY-MM)
    #[arg(long, value_parser = parse_year_month)]
    month: Option<(i32, u32)>,
    /// Restrict to a team
    #[arg(long)]
    team: Option<String>,
    /// Restrict to a manager
    #[arg(long)]
    manager: Option<String>,
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        let period = if let Some(year) = self.year {
            PeriodFilter::Year(year)
        } else if let Some((year, month)) = self.month {
            PeriodFilter::Month { year, month }
        } else if self.from.is_some() || self.to.is_some() {
            PeriodFilter::Range {
                start: self.from,
                end: self.to,
            }
        } else {
            PeriodFilter::All
        };

        FilterSpec {
            period,
            team: self.team.clone(),
            manager: self.manager.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print summary KPIs for the filtered records
    Kpi {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Inquiry counts per week or month bucket
    Trend {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "month")]
        granularity: Granularity,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Grouped statistics by manager, team, source channel, or status
    Breakdown {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "manager")]
        by: GroupField,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Status distribution of the filtered records
    Status {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the filter values present in the dataset
    Options {
        /// List the months available within this year instead
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Write a full markdown report
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_year_month(value: &str) -> Result<(i32, u32), String> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{value}'"))?;
    let year: i32 = year
        .parse()
        .map_err(|_| format!("invalid year in '{value}'"))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month in '{value}'"))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month must be 1-12, got {month}"));
    }
    Ok((year, month))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let records = data::load_records(&cli.csv)
        .with_context(|| format!("cannot initialize the dashboard from {}", cli.csv.display()))?;
    info!(count = records.len(), "loaded inquiry records");

    match cli.command {
        Commands::Kpi { filters, format } => {
            let rendered = render_one_shot(
                records,
                filters.to_spec(),
                ViewKind::TimeSeries(Granularity::Month),
            );
            let kpi = rendered.kpi.context("no KPI frame was rendered")?;
            match format {
                OutputFormat::Text => print!("{}", report::render_kpis(&kpi)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&kpi)?),
            }
        }
        Commands::Trend {
            filters,
            granularity,
            format,
        } => {
            let rendered = render_one_shot(
                records,
                filters.to_spec(),
                ViewKind::TimeSeries(granularity),
            );
            print_view(&rendered, format)?;
        }
        Commands::Breakdown {
            filters,
            by,
            format,
        } => {
            let rendered =
                render_one_shot(records, filters.to_spec(), ViewKind::Breakdown(by));
            print_view(&rendered, format)?;
        }
        Commands::Status { filters, format } => {
            let rendered =
                render_one_shot(records, filters.to_spec(), ViewKind::StatusDistribution);
            print_view(&rendered, format)?;
        }
        Commands::Options { year, format } => match year {
            Some(year) => {
                let months = aggregate::months_for_year(&records, year);
                match format {
                    OutputFormat::Text => {
                        for month in months {
                            println!("{year}-{month:02}");
                        }
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&months)?),
                }
            }
            None => {
                let options = aggregate::filter_options(&records);
                match format {
                    OutputFormat::Text => {
                        println!("Teams: {}", options.teams.join(", "));
                        println!("Managers: {}", options.managers.join(", "));
                        let years: Vec<String> =
                            options.years.iter().map(|y| y.to_string()).collect();
                        println!("Years: {}", years.join(", "));
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&options)?),
                }
            }
        },
        Commands::Report { filters, out } => {
            let report = report::build_report(&records, &filters.to_spec(), Local::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// Runs one filter-change and one tab-selection event against a fresh
/// dashboard and returns the final rendered frame.
fn render_one_shot(
    records: Vec<models::InquiryRecord>,
    spec: FilterSpec,
    view: ViewKind,
) -> CapturedRender {
    let mut dashboard = Dashboard::new(records);
    let mut sink = CapturedRender::default();
    dashboard.handle(Event::FilterChanged(spec), &mut sink);
    dashboard.handle(Event::TabSelected(view), &mut sink);
    sink
}

fn print_view(rendered: &CapturedRender, format: OutputFormat) -> anyhow::Result<()> {
    let view = rendered
        .view
        .as_ref()
        .context("no view frame was rendered")?;
    match format {
        OutputFormat::Text => print!("{}", report::render_view(view)),
        OutputFormat::Json => {
            let json = match view {
                ViewData::TimeSeries(points) => serde_json::to_string_pretty(points)?,
                ViewData::Breakdown { stats, .. } => serde_json::to_string_pretty(stats)?,
                ViewData::StatusDistribution(counts) => serde_json::to_string_pretty(counts)?,
            };
            println!("{json}");
        }
    }
    Ok(())
}
