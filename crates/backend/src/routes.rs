use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::shared::state::AppState;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // D402 Sales Funnel Dashboard
        .route(
            "/api/d402/categories",
            get(handlers::d402_sales_funnel::get_categories),
        )
        .route(
            "/api/d402/catalog",
            get(handlers::d402_sales_funnel::get_catalog),
        )
        .route("/api/d402/deals", get(handlers::d402_sales_funnel::list_deals))
        .route(
            "/api/d402/leads-trend",
            get(handlers::d402_sales_funnel::get_leads_trend),
        )
        .route(
            "/api/d402/filters/default",
            get(handlers::d402_sales_funnel::get_default_filters),
        )
        .route(
            "/api/d402/filters/apply",
            post(handlers::d402_sales_funnel::apply_filter),
        )
        .route(
            "/api/d402/evaluate",
            post(handlers::d402_sales_funnel::evaluate),
        )
        .with_state(state)
}
