//! Single-occurrence overrides.
//!
//! An override moves one occurrence of a series to another date without
//! touching the series. Overrides live in a sparse table keyed by
//! `(source_event_id, original_occurrence_date)` and are owned by the caller.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A persisted exception for one occurrence of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    pub source_event_id: String,
    pub original_occurrence_date: NaiveDateTime,
    pub new_date: NaiveDateTime,
}

/// Sparse override table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    entries: BTreeMap<(String, NaiveDateTime), NaiveDateTime>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an override, replacing any earlier one for the same occurrence.
    /// Returns the replaced target date.
    pub fn insert(&mut self, ov: Override) -> Option<NaiveDateTime> {
        self.entries
            .insert((ov.source_event_id, ov.original_occurrence_date), ov.new_date)
    }

    pub fn remove(&mut self, event_id: &str, original: NaiveDateTime) -> Option<Override> {
        self.entries
            .remove(&(event_id.to_string(), original))
            .map(|new_date| Override {
                source_event_id: event_id.to_string(),
                original_occurrence_date: original,
                new_date,
            })
    }

    /// Where the occurrence at `original` was moved to, if anywhere.
    pub fn get(&self, event_id: &str, original: NaiveDateTime) -> Option<NaiveDateTime> {
        self.entries.get(&(event_id.to_string(), original)).copied()
    }

    /// Overrides of one series, ordered by original date.
    pub fn for_event<'a>(&'a self, event_id: &'a str) -> impl Iterator<Item = Override> + 'a {
        self.entries
            .iter()
            .filter(move |((id, _), _)| id == event_id)
            .map(|((id, original), new_date)| Override {
                source_event_id: id.clone(),
                original_occurrence_date: *original,
                new_date: *new_date,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Override> for OverrideTable {
    fn from_iter<I: IntoIterator<Item = Override>>(iter: I) -> Self {
        let mut table = OverrideTable::new();
        for ov in iter {
            table.insert(ov);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn ov(id: &str, original: NaiveDateTime, new_date: NaiveDateTime) -> Override {
        Override {
            source_event_id: id.to_string(),
            original_occurrence_date: original,
            new_date,
        }
    }

    #[test]
    fn later_override_for_same_occurrence_wins() {
        let mut table = OverrideTable::new();
        assert_eq!(table.insert(ov("a", at(1, 9), at(2, 9))), None);
        assert_eq!(table.insert(ov("a", at(1, 9), at(3, 9))), Some(at(2, 9)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a", at(1, 9)), Some(at(3, 9)));
    }

    #[test]
    fn for_event_only_yields_that_series() {
        let table: OverrideTable = [
            ov("a", at(8, 9), at(9, 9)),
            ov("b", at(1, 9), at(2, 9)),
            ov("a", at(1, 9), at(1, 12)),
        ]
        .into_iter()
        .collect();

        let originals: Vec<_> = table
            .for_event("a")
            .map(|o| o.original_occurrence_date)
            .collect();
        assert_eq!(originals, vec![at(1, 9), at(8, 9)]);
    }

    #[test]
    fn remove_returns_the_override() {
        let mut table: OverrideTable = [ov("a", at(1, 9), at(2, 9))].into_iter().collect();
        let removed = table.remove("a", at(1, 9)).unwrap();
        assert_eq!(removed.new_date, at(2, 9));
        assert!(table.is_empty());
        assert!(table.remove("a", at(1, 9)).is_none());
    }
}
