//! Pipeline order of stage labels.
//!
//! Agendor stage names are free text, but the sales team prefixes them with a
//! dotted ordinal ("2.1 VALIDATION", "10.3 POS-VENDA"). Every axis and table
//! that lists stages goes through this module, so a change in the label
//! format only touches this file.

use std::collections::BTreeSet;

/// Canonical label of the first-contact stage
pub const LEADS_STAGE: &str = "1.1 LEADS";
pub const VALIDATION_STAGE: &str = "2.1 VALIDATION";
pub const ACTIVE_STAGE: &str = "3.1 ACTIVE";

/// Raw labels the CRM uses for stages that have no ordinal of their own
const CANONICAL_LABELS: [(&str, &str); 3] = [
    ("CONTATO", LEADS_STAGE),
    ("TYPEFORM", VALIDATION_STAGE),
    ("CONTRATO", ACTIVE_STAGE),
];

/// Map the three unnumbered raw labels to their pipeline names; any other
/// label is returned as is.
pub fn canonical_stage_detail(raw: &str) -> &str {
    CANONICAL_LABELS
        .iter()
        .find(|(from, _)| *from == raw)
        .map_or(raw, |(_, to)| *to)
}

/// Late stages ("5 ...", "6 ...") are housekeeping, not funnel progress
pub fn is_housekeeping_stage(canonical: &str) -> bool {
    canonical.starts_with('5') || canonical.starts_with('6')
}

/// Orderable position of a stage label.
///
/// `Unordered` sorts after every ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageSortKey {
    Ordinal(Vec<u64>),
    Unordered,
}

/// Parse the leading token of `label` as a dotted ordinal.
///
/// Non-numeric segments count as 0 ("2.x" is (2, 0)). A token without any
/// numeric segment gives `StageSortKey::Unordered`.
pub fn stage_sort_key(label: &str) -> StageSortKey {
    let token = label.split_whitespace().next().unwrap_or("");

    let mut any_numeric = false;
    let parts: Vec<u64> = token
        .split('.')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                any_numeric = true;
                segment.parse().unwrap_or(u64::MAX)
            } else {
                0
            }
        })
        .collect();

    if any_numeric {
        StageSortKey::Ordinal(parts)
    } else {
        StageSortKey::Unordered
    }
}

/// Distinct labels without an ordinal, alphabetically
pub fn unordered_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> BTreeSet<&'a str> {
    labels
        .into_iter()
        .filter(|label| stage_sort_key(label) == StageSortKey::Unordered)
        .collect()
}

/// Warn once per label that will sort last on every axis
pub fn warn_unordered_labels<'a>(labels: impl IntoIterator<Item = &'a str>) {
    for label in unordered_labels(labels) {
        tracing::warn!("Stage label without ordinal, sorted last: '{}'", label);
    }
}

/// Sort items by the stage label `label_of` returns; label text breaks ties
pub fn sort_by_stage<T, F>(items: &mut [T], label_of: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| {
        let label = label_of(item);
        (stage_sort_key(label), label.to_string())
    });
}
