//! Pure derivations of the sales funnel dashboard.
//!
//! Each function takes deal rows (already narrowed to the right status subset
//! by the caller) plus the filter parameters and returns a fresh aggregate.

use chrono::NaiveDate;
use contracts::dashboards::d402_sales_funnel::{
    CategoryCount, CategorySelector, DateCount, OTHER_REASON_LABEL,
};
use contracts::domain::a025_crm_deal::{DealRow, EntityId, StageStatus};
use std::collections::{BTreeMap, HashMap};

use super::catalog::StageCatalog;
use super::stage_order::{canonical_stage_detail, is_housekeeping_stage, sort_by_stage, LEADS_STAGE};

/// Current stage of every client: the row with the latest `date_created` per
/// entity. Rows without an entity are dropped; on a date tie the first row
/// wins. Output is ordered by entity id, so applying it twice changes nothing.
pub fn latest_per_entity<'a, I>(rows: I) -> Vec<&'a DealRow>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let mut latest: BTreeMap<EntityId, &'a DealRow> = BTreeMap::new();

    for row in rows {
        let Some(entity_id) = row.entity_id else {
            continue;
        };
        latest
            .entry(entity_id)
            .and_modify(|current| {
                if row.date_created > current.date_created {
                    *current = row;
                }
            })
            .or_insert(row);
    }

    latest.into_values().collect()
}

fn in_range(date: Option<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    date.map_or(false, |d| d >= start && d <= end)
}

/// Count rows per key, keeping first-seen order of the keys
fn count_by<'a, I, F>(rows: I, key_of: F) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
    F: Fn(&'a DealRow) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for row in rows {
        let key = key_of(row);
        match index.get(&key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(CategoryCount::new(key, 1));
            }
        }
    }

    counts
}

fn canonical_detail_of(row: &DealRow) -> String {
    canonical_stage_detail(&row.stage_detail).to_string()
}

/// Funnel chart series for one date range.
///
/// Rows created inside `[start, end]` (and in the selected funnel) are reduced
/// to their latest record per client, counted per canonical stage and
/// left-joined onto the catalog axis, so unseen stages come out as zero.
pub fn funnel_series<'a, I>(
    in_progress: I,
    catalog: &StageCatalog,
    category: &CategorySelector,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let in_window = in_progress.into_iter().filter(|row| {
        !is_housekeeping_stage(canonical_stage_detail(&row.stage_detail))
            && in_range(row.date_created, start, end)
            && category.matches(&row.stage_name)
    });

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for row in latest_per_entity(in_window) {
        *counts
            .entry(canonical_stage_detail(&row.stage_detail))
            .or_insert(0) += 1;
    }

    catalog
        .details_for(category)
        .into_iter()
        .map(|detail| CategoryCount::new(detail, counts.get(detail).copied().unwrap_or(0)))
        .collect()
}

/// Overview bar chart for the "ALL" selector.
///
/// Eligible deals belong to the core funnel or carry the marker in their
/// description. Stages whose label contains "1" are left out; only observed
/// stages are returned.
pub fn overview_aggregate<'a, I>(
    in_progress: I,
    core_funnel: &str,
    description_marker: &str,
) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let eligible = in_progress.into_iter().filter(|row| {
        row.stage_name == core_funnel || row.description_contains(description_marker)
    });

    let latest = latest_per_entity(eligible)
        .into_iter()
        .filter(|row| !canonical_stage_detail(&row.stage_detail).contains('1'));

    let mut counts = count_by(latest, canonical_detail_of);
    sort_by_stage(&mut counts, |c| c.category.as_str());
    counts
}

/// Overview bar chart for a single funnel: current stage of its clients
pub fn stage_overview<'a, I>(in_progress: I, stage_name: &str) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let selected = in_progress
        .into_iter()
        .filter(|row| row.stage_name == stage_name);

    let mut counts = count_by(latest_per_entity(selected), canonical_detail_of);
    sort_by_stage(&mut counts, |c| c.category.as_str());
    counts
}

/// Won or lost deals per funnel inside `[start, end]`.
///
/// The range applies to `date_won` or `date_lost` depending on `status`.
/// Every deal counts, with no per-client reduction. Funnels come out
/// alphabetically.
pub fn outcome_aggregate<'a, I>(
    rows: I,
    status: StageStatus,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();

    for row in rows {
        let date = match status {
            StageStatus::Won => row.date_won,
            StageStatus::Lost => row.date_lost,
            StageStatus::InProgress => None,
        };
        if row.stage_status == status && in_range(date, start, end) {
            *counts.entry(row.stage_name.as_str()).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|(stage_name, count)| CategoryCount::new(stage_name, count))
        .collect()
}

/// Loss reasons of deals lost inside `[start, end]`, with a "Total" row,
/// biggest first
pub fn loss_reason_aggregate<'a, I>(
    rows: I,
    category: &CategorySelector,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();

    for row in rows {
        if row.stage_status == StageStatus::Lost
            && in_range(row.date_lost, start, end)
            && category.matches(&row.stage_name)
        {
            let reason = row.loss_reason.as_deref().unwrap_or(OTHER_REASON_LABEL);
            *counts.entry(reason).or_insert(0) += 1;
        }
    }

    let mut series: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(reason, count)| CategoryCount::new(reason, count))
        .collect();
    append_total(&mut series);
    series.sort_by(|a, b| b.count.cmp(&a.count));
    series
}

/// Append the synthetic total row; an existing total is replaced, never summed
pub fn append_total(series: &mut Vec<CategoryCount>) {
    series.retain(|row| !row.is_total);
    let total = series.iter().map(|row| row.count).sum();
    series.push(CategoryCount::total(total));
}

/// New leads per creation day since `since` (inclusive), oldest first
pub fn leads_trend<'a, I>(in_progress: I, since: NaiveDate) -> Vec<DateCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for row in in_progress {
        if canonical_stage_detail(&row.stage_detail) != LEADS_STAGE {
            continue;
        }
        if let Some(created) = row.date_created.filter(|d| *d >= since) {
            *per_day.entry(created).or_insert(0) += 1;
        }
    }

    per_day
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

/// "Clients per stage" table.
///
/// "ALL": current funnel of every client, most populated first. A single
/// funnel: current stage of its clients, in pipeline order.
pub fn client_stage_table<'a, I>(in_progress: I, category: &CategorySelector) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a DealRow>,
{
    let latest = latest_per_entity(in_progress);

    match category.stage_name() {
        None => {
            let mut counts = count_by(latest, |row| row.stage_name.clone());
            counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
            counts
        }
        Some(stage_name) => {
            let selected = latest.into_iter().filter(|row| row.stage_name == stage_name);
            let mut counts = count_by(selected, canonical_detail_of);
            sort_by_stage(&mut counts, |c| c.category.as_str());
            counts
        }
    }
}
