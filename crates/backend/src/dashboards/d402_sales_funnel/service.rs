use chrono::NaiveDate;
use contracts::dashboards::d402_sales_funnel::{
    CategoryCount, CategorySelector, CountSeries, DashboardUpdate, DashboardView, EvaluateRequest, FilterAction,
    FilterSet, StageCatalogEntry, ALL_CATEGORIES,
};
use contracts::domain::a025_crm_deal::StageStatus;
use std::collections::BTreeSet;

use super::views;
use crate::shared::state::AppState;

/// Recompute the requested views for the current filters and category.
///
/// Filters missing a bound contribute no series. Won, Lost and the leads
/// trend exist only for the "ALL" selector and stay `None` otherwise.
pub fn evaluate(state: &AppState, request: &EvaluateRequest) -> DashboardUpdate {
    let category = &request.category;
    let requested = request.views.clone().unwrap_or_else(DashboardView::all);
    let mut update = DashboardUpdate::empty(category.clone());

    for view in requested {
        match view {
            DashboardView::Funnel => {
                update.funnel = Some(per_range(&request.filters, |start, end| {
                    views::funnel_series(
                        state.master.in_progress(),
                        &state.catalog,
                        category,
                        start,
                        end,
                    )
                }));
            }
            DashboardView::ClientStageTable => {
                update.client_stage_table = Some(views::client_stage_table(
                    state.master.in_progress(),
                    category,
                ));
            }
            DashboardView::Overview => {
                update.overview = Some(match category.stage_name() {
                    None => views::overview_aggregate(
                        state.master.in_progress(),
                        &state.dashboard.core_funnel,
                        &state.dashboard.description_marker,
                    ),
                    Some(stage_name) => {
                        views::stage_overview(state.master.in_progress(), stage_name)
                    }
                });
            }
            DashboardView::Won if category.is_all() => {
                update.won = Some(outcome_series(state, &request.filters, StageStatus::Won));
            }
            DashboardView::Lost if category.is_all() => {
                update.lost = Some(outcome_series(state, &request.filters, StageStatus::Lost));
            }
            DashboardView::LossReasons => {
                update.loss_reasons = Some(per_range(&request.filters, |start, end| {
                    views::loss_reason_aggregate(state.master.rows(), category, start, end)
                }));
            }
            DashboardView::LeadsTrend if category.is_all() => {
                update.leads_trend = Some(state.leads_trend.clone());
            }
            DashboardView::Won | DashboardView::Lost | DashboardView::LeadsTrend => {}
        }
    }

    update
}

/// One named series per filter that has both bounds
fn per_range<F>(filters: &FilterSet, derive: F) -> Vec<CountSeries>
where
    F: Fn(NaiveDate, NaiveDate) -> Vec<CategoryCount>,
{
    filters
        .active()
        .map(|(range, start, end)| CountSeries::for_range(range, derive(start, end)))
        .collect()
}

fn outcome_series(state: &AppState, filters: &FilterSet, status: StageStatus) -> Vec<CountSeries> {
    per_range(filters, |start, end| {
        views::outcome_aggregate(state.master.rows(), status, start, end)
    })
}

/// Category selector options: "ALL", then the funnels with open deals
/// alphabetically, minus the hidden ones
pub fn category_options(state: &AppState) -> Vec<String> {
    let names: BTreeSet<&str> = state
        .master
        .in_progress()
        .map(|row| row.stage_name.as_str())
        .filter(|name| {
            !state
                .dashboard
                .hidden_categories
                .iter()
                .any(|hidden| hidden.as_str() == *name)
        })
        .collect();

    std::iter::once(ALL_CATEGORIES)
        .chain(names)
        .map(str::to_string)
        .collect()
}

/// Apply a filter transition. A new filter without dates gets the default range.
pub fn apply_filter_action(state: &AppState, filters: FilterSet, action: FilterAction) -> FilterSet {
    let action = match action {
        FilterAction::Add {
            start: None,
            end: None,
        } => {
            let (start, end) = state.default_range();
            FilterAction::Add {
                start: Some(start),
                end: Some(end),
            }
        }
        other => other,
    };
    filters.apply(action)
}

/// Catalog pairs, optionally narrowed to one funnel, in pipeline order
pub fn stage_catalog(state: &AppState, category: &CategorySelector) -> Vec<StageCatalogEntry> {
    state
        .catalog
        .entries()
        .iter()
        .filter(|entry| category.matches(&entry.stage_name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a025_crm_deal::fixtures::{date, DealBuilder};
    use crate::domain::a025_crm_deal::MasterTable;
    use crate::shared::config::DashboardConfig;
    use contracts::dashboards::d402_sales_funnel::NamedRange;

    fn state() -> AppState {
        let rows = vec![
            DealBuilder::new(1, "AMBULANTE ESSENCIAL", "2.2 PROPOSTA")
                .created(date(2024, 6, 10))
                .build(),
            DealBuilder::new(2, "VAREJO", "CONTATO").created(date(2024, 6, 15)).build(),
            DealBuilder::new(3, "VAREJO", "2.2 PROPOSTA")
                .created(date(2024, 6, 1))
                .description("cliente CA")
                .build(),
            DealBuilder::new(4, "PARCEIROS", "5 ARQUIVO")
                .created(date(2024, 6, 2))
                .description("CA parceiro")
                .build(),
            DealBuilder::new(5, "VAREJO", "3.2 PAGO").won(date(2024, 6, 20)).build(),
            DealBuilder::new(6, "ATACADO", "2.2 PROPOSTA")
                .lost(date(2024, 6, 21), Some("Preço"))
                .build(),
        ];
        AppState::build(
            MasterTable::new(rows),
            DashboardConfig::default(),
            date(2024, 7, 1),
        )
    }

    fn request(filters: FilterSet, category: CategorySelector) -> EvaluateRequest {
        EvaluateRequest {
            filters,
            category,
            views: None,
        }
    }

    #[test]
    fn test_evaluate_all_views() {
        let state = state();
        let update = evaluate(&state, &request(state.default_filters(), CategorySelector::All));

        let funnel = update.funnel.unwrap();
        assert_eq!(funnel.len(), 1);
        assert_eq!(funnel[0].name, "Filter 1");
        assert_eq!(funnel[0].rows.iter().map(|c| c.count).sum::<u64>(), 3);

        let won = update.won.unwrap();
        assert_eq!(won[0].rows[0].category, "VAREJO");
        assert_eq!(update.lost.unwrap()[0].rows[0].category, "ATACADO");
        assert_eq!(update.loss_reasons.unwrap()[0].rows[0].count, 1);
        assert!(update.leads_trend.is_some());

        // Housekeeping stages stay out of the funnel but not out of the overview
        let overview: Vec<(String, u64)> = update
            .overview
            .unwrap()
            .into_iter()
            .map(|c| (c.category, c.count))
            .collect();
        assert_eq!(
            overview,
            vec![("2.2 PROPOSTA".to_string(), 2), ("5 ARQUIVO".to_string(), 1)]
        );
        assert!(funnel[0].rows.iter().all(|c| c.category != "5 ARQUIVO"));
    }

    #[test]
    fn test_selected_stage_hides_all_only_views() {
        let state = state();
        let varejo = CategorySelector::Stage("VAREJO".to_string());
        let update = evaluate(&state, &request(state.default_filters(), varejo.clone()));

        assert_eq!(update.category, varejo);
        assert!(update.won.is_none());
        assert!(update.lost.is_none());
        assert!(update.leads_trend.is_none());

        let funnel = &update.funnel.unwrap()[0];
        let categories: Vec<&str> = funnel.rows.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["1.1 LEADS", "2.2 PROPOSTA"]);

        let overview = update.overview.unwrap();
        assert_eq!(overview[0].category, "1.1 LEADS");
    }

    #[test]
    fn test_empty_and_incomplete_filters_give_no_series() {
        let state = state();
        let filters = FilterSet::empty().apply(FilterAction::Add {
            start: Some(date(2024, 6, 1)),
            end: None,
        });

        let update = evaluate(&state, &request(filters, CategorySelector::All));
        assert_eq!(update.funnel, Some(Vec::new()));
        assert_eq!(update.loss_reasons, Some(Vec::new()));

        let update = evaluate(&state, &request(FilterSet::empty(), CategorySelector::All));
        assert_eq!(update.won, Some(Vec::new()));
    }

    #[test]
    fn test_only_requested_views() {
        let state = state();
        let mut req = request(state.default_filters(), CategorySelector::All);
        req.views = Some(vec![DashboardView::Overview]);

        let update = evaluate(&state, &req);
        assert!(update.overview.is_some());
        assert!(update.funnel.is_none());
        assert!(update.client_stage_table.is_none());
    }

    #[test]
    fn test_two_ranges_two_series() {
        let state = state();
        let filters = state
            .default_filters()
            .apply(FilterAction::Add {
                start: Some(date(2024, 6, 12)),
                end: Some(date(2024, 6, 30)),
            });

        let update = evaluate(&state, &request(filters, CategorySelector::All));
        let funnel = update.funnel.unwrap();
        let names: Vec<&str> = funnel.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Filter 1", "Filter 2"]);
        assert_eq!(funnel[1].rows.iter().map(|c| c.count).sum::<u64>(), 1);
    }

    #[test]
    fn test_category_options() {
        let state = state();
        // Won/lost funnels and the hidden core funnel are not offered
        assert_eq!(category_options(&state), vec!["ALL", "PARCEIROS", "VAREJO"]);
    }

    #[test]
    fn test_apply_filter_action_fills_default_range() {
        let state = state();
        let filters = apply_filter_action(
            &state,
            state.default_filters(),
            FilterAction::Add { start: None, end: None },
        );

        assert_eq!(
            filters.get(2),
            Some(&NamedRange::new(2, Some(date(2024, 5, 2)), Some(date(2024, 7, 1))))
        );

        let filters = apply_filter_action(&state, filters, FilterAction::Remove { id: 1 });
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_stage_catalog_for_selector() {
        let state = state();
        assert_eq!(stage_catalog(&state, &CategorySelector::All).len(), 3);
        let varejo = stage_catalog(&state, &CategorySelector::Stage("VAREJO".to_string()));
        assert_eq!(varejo.len(), 2);
        assert!(varejo.iter().all(|e| e.stage_name == "VAREJO"));
    }
}
