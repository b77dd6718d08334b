use chrono::{Duration, NaiveDate};
use contracts::dashboards::d402_sales_funnel::{DateCount, FilterSet};

use crate::dashboards::d402_sales_funnel::stage_order::{canonical_stage_detail, warn_unordered_labels};
use crate::dashboards::d402_sales_funnel::{catalog::StageCatalog, views};
use crate::domain::a025_crm_deal::MasterTable;
use crate::shared::config::DashboardConfig;

/// Everything the HTTP layer reads, built once after the startup fetch.
///
/// Shared as `Arc<AppState>`; nothing in it changes while the process runs.
#[derive(Debug)]
pub struct AppState {
    pub master: MasterTable,
    /// Funnel chart axis (in-progress deals, housekeeping stages left out)
    pub catalog: StageCatalog,
    /// Computed once with the startup lookback, not re-filterable
    pub leads_trend: Vec<DateCount>,
    pub dashboard: DashboardConfig,
    /// "Today" for the default filter range
    pub started_on: NaiveDate,
}

impl AppState {
    pub fn build(master: MasterTable, dashboard: DashboardConfig, today: NaiveDate) -> Self {
        let catalog = StageCatalog::from_rows(master.in_progress());
        let leads_since = days_before(today, dashboard.leads_lookback_days);
        let leads_trend = views::leads_trend(master.in_progress(), leads_since);

        warn_unordered_labels(
            master
                .rows()
                .iter()
                .map(|row| canonical_stage_detail(&row.stage_detail)),
        );

        if catalog.is_empty() {
            tracing::warn!("No in-progress deals: the funnel chart axis is empty");
        }

        tracing::info!(
            "Dashboard state: {} deals, {} catalog stages, {} lead days since {}",
            master.len(),
            catalog.len(),
            leads_trend.len(),
            leads_since
        );

        Self {
            master,
            catalog,
            leads_trend,
            dashboard,
            started_on: today,
        }
    }

    /// [today - default_range_days, today]
    pub fn default_range(&self) -> (NaiveDate, NaiveDate) {
        let start = days_before(self.started_on, self.dashboard.default_range_days);
        (start, self.started_on)
    }

    /// Initial filter state: a single "Filter 1" over the default range
    pub fn default_filters(&self) -> FilterSet {
        let (start, end) = self.default_range();
        FilterSet::with_default_range(start, end)
    }
}

/// `days` before `date`, clamped to the earliest representable date.
/// Negative counts are treated as zero.
fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days.max(0))
        .and_then(|span| date.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}
