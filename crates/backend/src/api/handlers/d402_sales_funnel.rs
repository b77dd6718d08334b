use axum::{
    extract::{Query, State},
    Json,
};
use contracts::dashboards::d402_sales_funnel::{
    ApplyFilterRequest, CatalogQuery, CategoryOptionsResponse, DashboardUpdate, DateCount,
    EvaluateRequest, FilterSet, StageCatalogEntry,
};
use contracts::domain::a025_crm_deal::DealRow;
use std::sync::Arc;

use crate::dashboards::d402_sales_funnel::service;
use crate::shared::state::AppState;

/// GET /api/d402/categories
pub async fn get_categories(State(state): State<Arc<AppState>>) -> Json<CategoryOptionsResponse> {
    let options = service::category_options(&state);
    tracing::info!("D402 Dashboard: Returning {} category options", options.len());
    Json(CategoryOptionsResponse { options })
}

/// GET /api/d402/catalog?category=ALL
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<StageCatalogEntry>> {
    let entries = service::stage_catalog(&state, &query.category);
    tracing::info!(
        "D402 Dashboard: Returning {} catalog stages for {}",
        entries.len(),
        String::from(query.category)
    );
    Json(entries)
}

/// GET /api/d402/deals
pub async fn list_deals(State(state): State<Arc<AppState>>) -> Json<Vec<DealRow>> {
    tracing::info!("D402 Dashboard: Returning {} deals", state.master.len());
    Json(state.master.rows().to_vec())
}

/// GET /api/d402/leads-trend
pub async fn get_leads_trend(State(state): State<Arc<AppState>>) -> Json<Vec<DateCount>> {
    Json(state.leads_trend.clone())
}

/// GET /api/d402/filters/default
pub async fn get_default_filters(State(state): State<Arc<AppState>>) -> Json<FilterSet> {
    Json(state.default_filters())
}

/// POST /api/d402/filters/apply
pub async fn apply_filter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApplyFilterRequest>,
) -> Json<FilterSet> {
    tracing::info!("D402 Dashboard: Applying filter action {:?}", request.action);
    Json(service::apply_filter_action(
        &state,
        request.filters,
        request.action,
    ))
}

/// POST /api/d402/evaluate
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EvaluateRequest>,
) -> Json<DashboardUpdate> {
    let started = std::time::Instant::now();
    let update = service::evaluate(&state, &request);

    tracing::info!(
        "D402 Dashboard: Evaluated {} active filters for {} in {:?}",
        request.filters.active().count(),
        String::from(request.category.clone()),
        started.elapsed()
    );
    Json(update)
}
