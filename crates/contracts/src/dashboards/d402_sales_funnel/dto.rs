use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filters::{FilterAction, FilterSet, NamedRange};

/// Selector value that disables stage-name filtering
pub const ALL_CATEGORIES: &str = "ALL";

/// Label of the synthetic row appended to loss-reason series
pub const TOTAL_LABEL: &str = "Total";

/// Bucket used for lost deals without a recorded reason
pub const OTHER_REASON_LABEL: &str = "Other";

/// Category selector: "ALL" or a single funnel (`stage_name`)
///
/// Serialized as a plain string so the UI can bind it straight to a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategorySelector {
    All,
    Stage(String),
}

impl CategorySelector {
    pub fn is_all(&self) -> bool {
        matches!(self, CategorySelector::All)
    }

    /// Stage name to filter on, `None` for "ALL"
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            CategorySelector::All => None,
            CategorySelector::Stage(name) => Some(name),
        }
    }

    /// True when `stage_name` passes this selector
    pub fn matches(&self, stage_name: &str) -> bool {
        match self {
            CategorySelector::All => true,
            CategorySelector::Stage(name) => name == stage_name,
        }
    }
}

impl Default for CategorySelector {
    fn default() -> Self {
        CategorySelector::All
    }
}

impl From<String> for CategorySelector {
    fn from(value: String) -> Self {
        if value == ALL_CATEGORIES {
            CategorySelector::All
        } else {
            CategorySelector::Stage(value)
        }
    }
}

impl From<CategorySelector> for String {
    fn from(value: CategorySelector) -> Self {
        match value {
            CategorySelector::All => ALL_CATEGORIES.to_string(),
            CategorySelector::Stage(name) => name,
        }
    }
}

/// Views the filter evaluator can recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    Funnel,
    ClientStageTable,
    Overview,
    Won,
    Lost,
    LossReasons,
    LeadsTrend,
}

impl DashboardView {
    pub fn all() -> Vec<DashboardView> {
        vec![
            DashboardView::Funnel,
            DashboardView::ClientStageTable,
            DashboardView::Overview,
            DashboardView::Won,
            DashboardView::Lost,
            DashboardView::LossReasons,
            DashboardView::LeadsTrend,
        ]
    }
}

/// Single (category, count) cell of an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
    /// Synthetic total row, never counted into another total
    #[serde(default)]
    pub is_total: bool,
}

impl CategoryCount {
    pub fn new(category: impl Into<String>, count: u64) -> Self {
        Self {
            category: category.into(),
            count,
            is_total: false,
        }
    }

    pub fn total(count: u64) -> Self {
        Self {
            category: TOTAL_LABEL.to_string(),
            count,
            is_total: true,
        }
    }
}

/// Number of leads created on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Series computed for one named date-range filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSeries {
    pub filter_id: u32,
    /// Legend label, e.g. "Filter 2"
    pub name: String,
    pub rows: Vec<CategoryCount>,
}

impl CountSeries {
    pub fn for_range(range: &NamedRange, rows: Vec<CategoryCount>) -> Self {
        Self {
            filter_id: range.id,
            name: range.name.clone(),
            rows,
        }
    }
}

/// Observed (funnel, stage) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageCatalogEntry {
    pub stage_name: String,
    pub stage_detail: String,
}

/// POST /api/d402/evaluate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub filters: FilterSet,
    #[serde(default)]
    pub category: CategorySelector,
    /// Views to recompute; all of them when omitted
    #[serde(default)]
    pub views: Option<Vec<DashboardView>>,
}

/// Recomputed views. A `None` field was either not requested or is not
/// defined for the current category selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardUpdate {
    pub category: CategorySelector,
    /// One series per active filter, categories in pipeline order
    pub funnel: Option<Vec<CountSeries>>,
    pub client_stage_table: Option<Vec<CategoryCount>>,
    pub overview: Option<Vec<CategoryCount>>,
    /// Only for the "ALL" selector
    pub won: Option<Vec<CountSeries>>,
    /// Only for the "ALL" selector
    pub lost: Option<Vec<CountSeries>>,
    pub loss_reasons: Option<Vec<CountSeries>>,
    /// Only for the "ALL" selector
    pub leads_trend: Option<Vec<DateCount>>,
}

impl DashboardUpdate {
    pub fn empty(category: CategorySelector) -> Self {
        Self {
            category,
            ..Default::default()
        }
    }
}

/// POST /api/d402/filters/apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyFilterRequest {
    pub filters: FilterSet,
    pub action: FilterAction,
}

/// GET /api/d402/catalog?category=VAREJO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: CategorySelector,
}

/// GET /api/d402/categories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOptionsResponse {
    /// "ALL" first, then stage names alphabetically
    pub options: Vec<String>,
}
