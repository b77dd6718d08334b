use contracts::dashboards::d402_sales_funnel::{CategorySelector, StageCatalogEntry};
use contracts::domain::a025_crm_deal::DealRow;
use std::collections::HashSet;

use super::stage_order::{canonical_stage_detail, is_housekeeping_stage, sort_by_stage};

/// Fixed category axis of the funnel chart.
///
/// Every observed (funnel, canonical stage) pair, in pipeline order, so that a
/// stage with no deals in the selected range still shows up as zero.
#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    entries: Vec<StageCatalogEntry>,
}

impl StageCatalog {
    /// Build from the rows the funnel chart plots (housekeeping stages are left out)
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a DealRow>) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for row in rows {
            let detail = canonical_stage_detail(&row.stage_detail);
            if is_housekeeping_stage(detail) {
                continue;
            }
            let entry = StageCatalogEntry {
                stage_name: row.stage_name.clone(),
                stage_detail: detail.to_string(),
            };
            if seen.insert(entry.clone()) {
                entries.push(entry);
            }
        }

        sort_by_stage(&mut entries, |entry| entry.stage_detail.as_str());
        Self { entries }
    }

    pub fn entries(&self) -> &[StageCatalogEntry] {
        &self.entries
    }

    /// Distinct stage details for the selector, in pipeline order
    pub fn details_for(&self, category: &CategorySelector) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| category.matches(&entry.stage_name))
            .map(|entry| entry.stage_detail.as_str())
            .filter(|detail| seen.insert(*detail))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
