use crate::aggregate;
use crate::filter::apply_filters;
use crate::models::{
    FilterSpec, Granularity, GroupField, GroupStat, InquiryRecord, KpiSummary, StatusCount,
    TimeSeriesPoint, ViewKind,
};

/// Chart-ready data for whichever view is active.
#[derive(Debug, Clone)]
pub enum ViewData {
    TimeSeries(Vec<TimeSeriesPoint>),
    Breakdown {
        field: GroupField,
        stats: Vec<GroupStat>,
    },
    StatusDistribution(Vec<StatusCount>),
}

/// Presentation adapter boundary. Each refresh delivers the KPI summary
/// and exactly one view's data; the sink decides how to draw them.
pub trait RenderSink {
    fn kpis(&mut self, kpi: &KpiSummary);
    fn view(&mut self, view: &ViewData);
}

/// UI events, dispatched synchronously to [`Dashboard::handle`].
#[derive(Debug, Clone)]
pub enum Event {
    FilterChanged(FilterSpec),
    TabSelected(ViewKind),
}

/// Owns the canonical record collection and the current UI state. The
/// collection is written once at construction and read-only afterwards;
/// replacing the data means constructing a new context.
pub struct Dashboard {
    records: Vec<InquiryRecord>,
    filter: FilterSpec,
    active_view: ViewKind,
}

impl Dashboard {
    pub fn new(records: Vec<InquiryRecord>) -> Dashboard {
        Dashboard {
            records,
            filter: FilterSpec::default(),
            active_view: ViewKind::TimeSeries(Granularity::Month),
        }
    }

    pub fn records(&self) -> &[InquiryRecord] {
        &self.records
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    /// Applies the event, then re-runs filter → aggregate → render for
    /// the active view only.
    pub fn handle(&mut self, event: Event, sink: &mut dyn RenderSink) {
        match event {
            Event::FilterChanged(spec) => self.filter = spec,
            Event::TabSelected(view) => self.active_view = view,
        }
        self.refresh(sink);
    }

    pub fn refresh(&self, sink: &mut dyn RenderSink) {
        let filtered = apply_filters(&self.records, &self.filter);
        sink.kpis(&aggregate::kpi_summary(&filtered));
        sink.view(&self.compute_view(&filtered));
    }

    fn compute_view(&self, filtered: &[InquiryRecord]) -> ViewData {
        match self.active_view {
            ViewKind::TimeSeries(granularity) => {
                ViewData::TimeSeries(aggregate::group_by_time(filtered, granularity))
            }
            ViewKind::Breakdown(field) => ViewData::Breakdown {
                field,
                stats: aggregate::group_by_key(filtered, field),
            },
            ViewKind::StatusDistribution => {
                ViewData::StatusDistribution(aggregate::status_distribution(filtered))
            }
        }
    }
}
