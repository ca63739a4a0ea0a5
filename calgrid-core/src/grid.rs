//! Month/week/day grid placement.
//!
//! Works out which days a view shows and drops occurrences into day cells
//! and hour slots. Drawing the cells is left to the caller.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::{CalGridError, CalGridResult};
use crate::event::Event;
use crate::overrides::OverrideTable;
use crate::recurrence::{Occurrence, expand_with_overrides};

/// Grid layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Month,
    Week,
    Day,
}

/// A day shown by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    /// Leading/trailing day of a month view that belongs to a neighbour month
    pub is_outside_month: bool,
}

/// A public holiday supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

impl Holiday {
    /// Name to show, preferring the local one.
    pub fn label(&self) -> &str {
        self.local_name.as_deref().unwrap_or(&self.name)
    }
}

/// Contents of one day cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub day: GridDay,
    pub holidays: Vec<Holiday>,
    pub occurrences: Vec<Occurrence>,
}

/// Occurrences of many events, with the events that failed to expand.
#[derive(Debug, Default)]
pub struct ExpandReport {
    pub occurrences: Vec<Occurrence>,
    /// (event id, error) for each event that could not be expanded
    pub failures: Vec<(String, CalGridError)>,
}

/// Days shown by `view` around `date`.
///
/// Month views cover whole weeks, so they start before the 1st and end after
/// the last day of the month whenever the month does not line up with
/// `week_start`.
pub fn visible_days(view: View, date: NaiveDate, week_start: Weekday) -> Vec<GridDay> {
    match view {
        View::Day => vec![GridDay {
            date,
            is_outside_month: false,
        }],
        View::Week => {
            let first = start_of_week(date, week_start);
            first
                .iter_days()
                .take(7)
                .map(|d| GridDay {
                    date: d,
                    is_outside_month: false,
                })
                .collect()
        }
        View::Month => {
            let first_of_month = date.with_day(1).unwrap_or(date);
            let last_of_month = first_of_month
                .checked_add_months(Months::new(1))
                .and_then(|d| d.pred_opt())
                .unwrap_or(first_of_month);
            let first = start_of_week(first_of_month, week_start);
            let last = start_of_week(last_of_month, week_start) + Days::new(6);

            first
                .iter_days()
                .take_while(|d| *d <= last)
                .map(|d| GridDay {
                    date: d,
                    is_outside_month: d.month() != first_of_month.month(),
                })
                .collect()
        }
    }
}

/// Inclusive range covering every day in `days`.
pub fn visible_range(days: &[GridDay]) -> Option<DateRange> {
    let first = days.first()?;
    let last = days.last()?;
    Some(DateRange::for_days(first.date, last.date))
}

/// Expand every event over `range`. An event that fails to expand is reported
/// in `failures` and does not affect the others.
pub fn expand_all(events: &[Event], overrides: &OverrideTable, range: &DateRange) -> ExpandReport {
    let mut report = ExpandReport::default();

    for event in events {
        match expand_with_overrides(event, overrides, range.start, range.end) {
            Ok(occurrences) => report.occurrences.extend(occurrences),
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Could not expand event");
                report.failures.push((event.id.clone(), e));
            }
        }
    }

    report
        .occurrences
        .sort_by(|a, b| a.occurrence_date.cmp(&b.occurrence_date));
    report
}

/// Put occurrences and holidays into the cells of `days`, matching on the
/// day an occurrence starts.
pub fn bucket_days(days: &[GridDay], occurrences: &[Occurrence], holidays: &[Holiday]) -> Vec<DayCell> {
    days.iter()
        .map(|day| {
            let mut in_day: Vec<Occurrence> = occurrences
                .iter()
                .filter(|o| o.occurrence_date.date() == day.date)
                .cloned()
                .collect();
            in_day.sort_by(|a, b| a.occurrence_date.cmp(&b.occurrence_date));

            DayCell {
                day: *day,
                holidays: holidays.iter().filter(|h| h.date == day.date).cloned().collect(),
                occurrences: in_day,
            }
        })
        .collect()
}

/// Hour slots of a day view, indexed by the hour an occurrence starts.
pub fn bucket_hours(day: NaiveDate, occurrences: &[Occurrence]) -> [Vec<Occurrence>; 24] {
    let mut slots: [Vec<Occurrence>; 24] = std::array::from_fn(|_| Vec::new());
    for occ in occurrences.iter().filter(|o| o.occurrence_date.date() == day) {
        slots[occ.occurrence_date.hour() as usize].push(occ.clone());
    }
    slots
}

/// Start of a new event created by clicking an hour slot.
pub fn slot_start(day: NaiveDate, hour: u32) -> CalGridResult<NaiveDateTime> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .map(|t| day.and_time(t))
        .ok_or_else(|| CalGridError::InvalidEvent(format!("Hour {} is not between 0 and 23", hour)))
}

/// First day of the week containing `date`.
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - Days::new(u64::from(back))
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            View::Month => "month",
            View::Week => "week",
            View::Day => "day",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for View {
    type Err = CalGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(View::Month),
            "week" => Ok(View::Week),
            "day" => Ok(View::Day),
            other => Err(CalGridError::Parse(format!(
                "Unknown view '{}'. Expected month, week or day",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Recurrence, Repeat};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn occ(id: &str, start: NaiveDateTime) -> Occurrence {
        Occurrence {
            source_event_id: id.to_string(),
            occurrence_date: start,
            occurrence_end_date: start,
            moved_from: None,
        }
    }

    #[test]
    fn month_view_covers_whole_weeks() {
        // February 2024 starts on a Thursday and ends on a Thursday
        let days = visible_days(View::Month, day(2024, 2, 14), Weekday::Sun);

        assert_eq!(days.len(), 35);
        assert_eq!(days.first().unwrap().date, day(2024, 1, 28));
        assert_eq!(days.last().unwrap().date, day(2024, 3, 2));
        assert!(days[0].is_outside_month);
        assert!(!days[4].is_outside_month);
        assert_eq!(days[4].date, day(2024, 2, 1));
        assert_eq!(days.iter().filter(|d| !d.is_outside_month).count(), 29);
    }

    #[test]
    fn month_view_respects_monday_week_start() {
        let days = visible_days(View::Month, day(2024, 4, 1), Weekday::Mon);
        // April 2024 starts on a Monday
        assert_eq!(days.first().unwrap().date, day(2024, 4, 1));
        assert_eq!(days.last().unwrap().date, day(2024, 5, 5));
        assert_eq!(days.len() % 7, 0);
    }

    #[test]
    fn week_view_is_seven_days_from_week_start() {
        let days = visible_days(View::Week, day(2024, 1, 3), Weekday::Sun);
        let dates: Vec<_> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates.first(), Some(&day(2023, 12, 31)));
        assert_eq!(dates.last(), Some(&day(2024, 1, 6)));
        assert!(days.iter().all(|d| !d.is_outside_month));
    }

    #[test]
    fn visible_range_spans_first_to_last_day() {
        let days = visible_days(View::Week, day(2024, 1, 3), Weekday::Mon);
        let range = visible_range(&days).unwrap();
        assert_eq!(range.start, at(2024, 1, 1, 0));
        assert_eq!(range.end.date(), day(2024, 1, 7));
        assert!(visible_range(&[]).is_none());
    }

    #[test]
    fn day_cells_match_on_start_day_and_collect_holidays() {
        let days = visible_days(View::Week, day(2024, 12, 25), Weekday::Sun);
        let occurrences = vec![
            occ("b", at(2024, 12, 25, 15)),
            occ("a", at(2024, 12, 25, 9)),
            occ("c", at(2024, 12, 26, 23)),
            occ("d", at(2025, 1, 10, 9)),
        ];
        let holidays = vec![Holiday {
            date: day(2024, 12, 25),
            name: "Christmas Day".into(),
            local_name: Some("Weihnachten".into()),
        }];

        let cells = bucket_days(&days, &occurrences, &holidays);
        let christmas = cells.iter().find(|c| c.day.date == day(2024, 12, 25)).unwrap();

        let ids: Vec<_> = christmas.occurrences.iter().map(|o| o.source_event_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(christmas.holidays[0].label(), "Weihnachten");
        assert_eq!(cells.iter().map(|c| c.occurrences.len()).sum::<usize>(), 3);
    }

    #[test]
    fn hour_slots_use_start_hour() {
        let occurrences = vec![
            occ("a", at(2024, 5, 1, 0)),
            occ("b", at(2024, 5, 1, 13)),
            occ("c", day(2024, 5, 1).and_hms_opt(13, 45, 0).unwrap()),
            occ("d", at(2024, 5, 2, 13)),
        ];

        let slots = bucket_hours(day(2024, 5, 1), &occurrences);
        assert_eq!(slots[0].len(), 1);
        assert_eq!(slots[13].len(), 2);
        assert_eq!(slots.iter().map(Vec::len).sum::<usize>(), 3);
    }

    #[test]
    fn slot_start_rejects_hour_24() {
        assert_eq!(slot_start(day(2024, 5, 1), 8).unwrap(), at(2024, 5, 1, 8));
        assert!(slot_start(day(2024, 5, 1), 24).is_err());
    }

    #[test_log::test]
    fn broken_event_does_not_hide_the_others() {
        let good = Event::new("Good", at(2024, 1, 2, 9), 30)
            .with_id("good")
            .with_recurrence(Recurrence::new(Repeat::Daily));
        let broken = Event::new("Broken", at(2024, 1, 1, 9), 30)
            .with_id("broken")
            .with_recurrence(Recurrence::new(Repeat::Daily).every(0));
        let single = Event::new("Single", at(2024, 1, 3, 7), 30).with_id("single");

        let range = DateRange::for_days(day(2024, 1, 1), day(2024, 1, 3));
        let report = expand_all(&[good, broken, single], &OverrideTable::new(), &range);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "broken");
        let starts: Vec<_> = report.occurrences.iter().map(|o| o.occurrence_date).collect();
        assert_eq!(starts, vec![at(2024, 1, 2, 9), at(2024, 1, 3, 7), at(2024, 1, 3, 9)]);
    }

    #[test]
    fn view_parses_from_str() {
        assert_eq!("Week".parse::<View>().unwrap(), View::Week);
        assert!("year".parse::<View>().is_err());
    }
}
