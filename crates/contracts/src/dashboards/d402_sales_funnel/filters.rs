//! Named date-range filters of the sales funnel dashboard.
//!
//! The UI keeps a `FilterSet` and sends it along with every evaluation request.
//! Adding, removing and editing filters are transitions on that value, so the
//! server never has to diff widget trees or keep per-client state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One date-range filter; a bound left empty makes the filter inactive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    pub id: u32,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl NamedRange {
    pub fn new(id: u32, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            id,
            name: format!("Filter {}", id),
            start,
            end,
        }
    }

    /// Both bounds, or `None` when the filter is incomplete
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Transition applied to a `FilterSet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterAction {
    Add {
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
    Remove {
        id: u32,
    },
    Edit {
        id: u32,
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
}

/// Ordered collection of named filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    ranges: Vec<NamedRange>,
    /// Next id to hand out; ids (and names) are never reused
    next_id: u32,
}

impl FilterSet {
    pub fn empty() -> Self {
        Self {
            ranges: Vec::new(),
            next_id: 1,
        }
    }

    /// Initial state of the dashboard: a single "Filter 1"
    pub fn with_default_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self::empty().apply(FilterAction::Add {
            start: Some(start),
            end: Some(end),
        })
    }

    pub fn ranges(&self) -> &[NamedRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&NamedRange> {
        self.ranges.iter().find(|range| range.id == id)
    }

    /// Filters that have both bounds set
    pub fn active(&self) -> impl Iterator<Item = (&NamedRange, NaiveDate, NaiveDate)> {
        self.ranges
            .iter()
            .filter_map(|range| range.bounds().map(|(start, end)| (range, start, end)))
    }

    /// Apply a transition and return the new set.
    ///
    /// Removing or editing an unknown id leaves the set unchanged, and so
    /// does adding once the id space is used up.
    pub fn apply(mut self, action: FilterAction) -> Self {
        match action {
            FilterAction::Add { start, end } => {
                if let Some(id) = self.allocate_id() {
                    self.ranges.push(NamedRange::new(id, start, end));
                }
            }
            FilterAction::Remove { id } => {
                self.ranges.retain(|range| range.id != id);
            }
            FilterAction::Edit { id, start, end } => {
                if let Some(range) = self.ranges.iter_mut().find(|range| range.id == id) {
                    range.start = start;
                    range.end = end;
                }
            }
        }
        self
    }

    // A set deserialized from a client may carry a stale or hostile counter.
    // `u32::MAX` is never handed out, so the counter can always move past
    // every id it has issued.
    fn allocate_id(&mut self) -> Option<u32> {
        let max_existing = self.ranges.iter().map(|range| range.id).max().unwrap_or(0);
        let id = self.next_id.max(max_existing.checked_add(1)?).max(1);
        self.next_id = id.checked_add(1)?;
        Some(id)
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range_creates_filter_one() {
        let set = FilterSet::with_default_range(date(2024, 1, 1), date(2024, 3, 1));
        assert_eq!(set.len(), 1);
        assert_eq!(set.ranges()[0].name, "Filter 1");
        assert_eq!(
            set.ranges()[0].bounds(),
            Some((date(2024, 1, 1), date(2024, 3, 1)))
        );
    }

    #[test]
    fn test_add_remove_never_reuses_names() {
        let set = FilterSet::with_default_range(date(2024, 1, 1), date(2024, 3, 1))
            .apply(FilterAction::Add { start: None, end: None })
            .apply(FilterAction::Remove { id: 2 })
            .apply(FilterAction::Add {
                start: Some(date(2024, 2, 1)),
                end: Some(date(2024, 2, 10)),
            });

        let names: Vec<&str> = set.ranges().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Filter 1", "Filter 3"]);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let set = FilterSet::with_default_range(date(2024, 1, 1), date(2024, 3, 1));
        let after = set.clone().apply(FilterAction::Remove { id: 42 });
        assert_eq!(set, after);
    }

    #[test]
    fn test_edit_and_active_skips_incomplete() {
        let set = FilterSet::with_default_range(date(2024, 1, 1), date(2024, 3, 1))
            .apply(FilterAction::Add { start: None, end: None })
            .apply(FilterAction::Edit {
                id: 1,
                start: Some(date(2024, 5, 1)),
                end: None,
            });

        assert_eq!(set.get(1).unwrap().start, Some(date(2024, 5, 1)));
        assert_eq!(set.active().count(), 0);
    }

    #[test]
    fn test_stale_counter_from_client() {
        let json = r#"{"ranges":[{"id":4,"name":"Filter 4","start":null,"end":null}],"next_id":1}"#;
        let set: FilterSet = serde_json::from_str(json).unwrap();
        let set = set.apply(FilterAction::Add { start: None, end: None });
        assert_eq!(set.ranges()[1].id, 5);
    }

    #[test]
    fn test_exhausted_counter_leaves_set_unchanged() {
        let set: FilterSet = serde_json::from_str(r#"{"ranges":[],"next_id":4294967295}"#).unwrap();
        let after = set.clone().apply(FilterAction::Add { start: None, end: None });
        assert_eq!(set, after);

        let json = r#"{"ranges":[{"id":4294967295,"name":"Filter X","start":null,"end":null}],"next_id":1}"#;
        let set: FilterSet = serde_json::from_str(json).unwrap();
        let after = set.clone().apply(FilterAction::Add { start: None, end: None });
        assert_eq!(set, after);
    }

    #[test]
    fn test_last_id_is_not_reissued_after_remove() {
        let json = r#"{"ranges":[],"next_id":4294967294}"#;
        let set: FilterSet = serde_json::from_str(json).unwrap();
        let set = set
            .apply(FilterAction::Add { start: None, end: None })
            .apply(FilterAction::Remove { id: u32::MAX - 1 })
            .apply(FilterAction::Add { start: None, end: None });

        assert!(set.is_empty());
        assert!(set.get(u32::MAX).is_none());
    }

    #[test]
    fn test_action_wire_format() {
        let action: FilterAction = serde_json::from_str(r#"{"type":"remove","id":3}"#).unwrap();
        assert_eq!(action, FilterAction::Remove { id: 3 });

        let action: FilterAction = serde_json::from_str(r#"{"type":"add"}"#).unwrap();
        assert_eq!(action, FilterAction::Add { start: None, end: None });
    }
}
