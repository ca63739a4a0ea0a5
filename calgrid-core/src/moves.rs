//! Moving occurrences and series.
//!
//! Drag-and-drop and edits arrive as [`Command`] values. Applying one never
//! mutates the stored event: the outcome is either an updated series or an
//! [`Override`] for the caller to persist.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CalGridError, CalGridResult};
use crate::event::{Event, Repeat, RepeatEnd, rotate_weekday};
use crate::overrides::Override;
use crate::recurrence::is_anchor;

/// What a move applies to. The caller decides, it cannot be inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveScope {
    /// Only the occurrence that was dragged
    #[default]
    Occurrence,
    /// The whole series
    Series,
}

/// Result of a move, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveOutcome {
    Series(Event),
    Override(Override),
}

/// Move the occurrence of `event` at `occurrence_date` to `new_date`.
///
/// Non-repeating events are always moved as a whole. Fails with `OutOfRange`
/// when `occurrence_date` is not an occurrence of the event.
pub fn apply_move(
    event: &Event,
    occurrence_date: NaiveDateTime,
    new_date: NaiveDateTime,
    scope: MoveScope,
) -> CalGridResult<MoveOutcome> {
    if !is_anchor(event, occurrence_date)? {
        return Err(CalGridError::OutOfRange {
            event_id: event.id.clone(),
            date: occurrence_date,
        });
    }

    if scope == MoveScope::Series || !event.is_recurring() {
        let shifted = shift_series(event, new_date - occurrence_date);
        tracing::debug!(event_id = %event.id, from = %event.date, to = %shifted.date, "Moved series");
        return Ok(MoveOutcome::Series(shifted));
    }

    tracing::debug!(event_id = %event.id, %occurrence_date, %new_date, "Moved one occurrence");
    Ok(MoveOutcome::Override(Override {
        source_event_id: event.id.clone(),
        original_occurrence_date: occurrence_date,
        new_date,
    }))
}

/// Shift the whole series by `delta`, keeping its duration.
///
/// Rule fields tied to the calendar move with it: weekly days and the week
/// start rotate by the number of days shifted and an end date shifts by the
/// same amount.
fn shift_series(event: &Event, delta: Duration) -> Event {
    let mut shifted = event.clone();
    shifted.date = event.date + delta;
    shifted.end_date = if event.is_all_day {
        crate::event::end_of_day(shifted.date.date())
    } else {
        event.end_date + delta
    };

    let day_shift = (shifted.date.date() - event.date.date()).num_days();
    if event.recurrence.repeat == Repeat::Weekly {
        // The week grid moves with the days so alternate weeks stay intact
        shifted.recurrence.days = event.recurrence.days.rotate(day_shift);
        shifted.recurrence.week_start = rotate_weekday(event.recurrence.week_start, day_shift);
    }
    if let RepeatEnd::On(last_day) = event.recurrence.end {
        shifted.recurrence.end = RepeatEnd::On(last_day + Duration::days(day_shift));
    }

    shifted
}

/// A date change requested by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Move an occurrence to an exact date and time (edit dialog)
    Move {
        event_id: String,
        occurrence_date: NaiveDateTime,
        new_date: NaiveDateTime,
        scope: MoveScope,
    },
    /// Drop an occurrence onto a grid day, keeping its time of day
    Drop {
        event_id: String,
        occurrence_date: NaiveDateTime,
        day: NaiveDate,
        scope: MoveScope,
    },
}

impl Command {
    pub fn event_id(&self) -> &str {
        match self {
            Command::Move { event_id, .. } | Command::Drop { event_id, .. } => event_id,
        }
    }

    /// Resolve the command against the caller's events.
    pub fn apply(&self, events: &[Event]) -> CalGridResult<MoveOutcome> {
        let event = events
            .iter()
            .find(|e| e.id == self.event_id())
            .ok_or_else(|| CalGridError::EventNotFound(self.event_id().to_string()))?;

        match self {
            Command::Move {
                occurrence_date,
                new_date,
                scope,
                ..
            } => apply_move(event, *occurrence_date, *new_date, *scope),
            Command::Drop {
                occurrence_date,
                day,
                scope,
                ..
            } => {
                let new_date = day.and_time(occurrence_date.time());
                apply_move(event, *occurrence_date, new_date, *scope)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Recurrence, RepeatDays};
    use crate::overrides::OverrideTable;
    use chrono::Weekday;
    use crate::recurrence::{expand, expand_with_overrides};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn daily(count: u32) -> Event {
        Event::new("Daily", at(2024, 1, 1, 9), 30)
            .with_id("daily")
            .with_recurrence(Recurrence::new(Repeat::Daily).until(RepeatEnd::After(count)))
    }

    #[test]
    fn single_occurrence_move_becomes_an_override() {
        let event = daily(10);
        let outcome = apply_move(&event, at(2024, 1, 3, 9), at(2024, 1, 20, 14), MoveScope::Occurrence)
            .unwrap();

        let MoveOutcome::Override(ov) = outcome else {
            panic!("expected an override, got {outcome:?}");
        };
        assert_eq!(ov.source_event_id, "daily");

        let table: OverrideTable = [ov].into_iter().collect();
        let got = expand_with_overrides(&event, &table, at(2024, 1, 1, 0), at(2024, 1, 31, 0)).unwrap();
        let starts: Vec<_> = got.iter().map(|o| o.occurrence_date).collect();

        assert!(!starts.contains(&at(2024, 1, 3, 9)));
        assert!(starts.contains(&at(2024, 1, 20, 14)));
        assert_eq!(got.len(), 10, "series size must not change");
    }

    #[test]
    fn series_move_shifts_every_occurrence_by_the_same_delta() {
        let event = daily(5);
        let outcome = apply_move(&event, at(2024, 1, 2, 9), at(2024, 1, 4, 11), MoveScope::Series)
            .unwrap();
        let MoveOutcome::Series(moved) = outcome else {
            panic!("expected a series move");
        };

        assert_eq!(moved.date, at(2024, 1, 3, 11));
        assert_eq!(moved.end_date - moved.date, event.end_date - event.date);
        assert_eq!(moved.recurrence, event.recurrence);

        let before: Vec<_> = expand(&event, at(2024, 1, 1, 0), at(2024, 2, 1, 0)).unwrap().collect();
        let after: Vec<_> = expand(&moved, at(2024, 1, 1, 0), at(2024, 2, 1, 0)).unwrap().collect();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(a.occurrence_date - b.occurrence_date, Duration::hours(50));
        }
    }

    #[test]
    fn weekly_series_move_rotates_days_and_end_date() {
        let rule = Recurrence::new(Repeat::Weekly)
            .on_days(RepeatDays::from_indices(&[1, 3]).unwrap())
            .until(RepeatEnd::On(day(2024, 1, 31)));
        let event = Event::new("Class", at(2024, 1, 1, 18), 90)
            .with_id("class")
            .with_recurrence(rule);

        let MoveOutcome::Series(moved) =
            apply_move(&event, at(2024, 1, 3, 18), at(2024, 1, 4, 18), MoveScope::Series).unwrap()
        else {
            panic!("expected a series move");
        };

        assert_eq!(moved.recurrence.days.indices(), vec![2, 4]);
        assert_eq!(moved.recurrence.end, RepeatEnd::On(day(2024, 2, 1)));

        let before: Vec<_> = expand(&event, at(2024, 1, 1, 0), at(2024, 3, 1, 0)).unwrap().collect();
        let after: Vec<_> = expand(&moved, at(2024, 1, 1, 0), at(2024, 3, 1, 0)).unwrap().collect();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(a.occurrence_date - b.occurrence_date, Duration::days(1));
        }
    }

    #[test]
    fn alternate_week_series_move_across_week_boundary() {
        let rule = Recurrence::new(Repeat::Weekly)
            .every(2)
            .on_days(RepeatDays::from_weekdays(&[Weekday::Fri, Weekday::Sat]))
            .until(RepeatEnd::After(6));
        let event = Event::new("Shift", at(2024, 1, 5, 9), 60)
            .with_id("shift")
            .with_recurrence(rule);

        let MoveOutcome::Series(moved) =
            apply_move(&event, at(2024, 1, 5, 9), at(2024, 1, 6, 9), MoveScope::Series).unwrap()
        else {
            panic!("expected a series move");
        };

        let after: Vec<_> = expand(&moved, at(2024, 1, 1, 0), at(2024, 3, 1, 0))
            .unwrap()
            .map(|o| o.occurrence_date.date())
            .collect();
        assert_eq!(
            after,
            vec![
                day(2024, 1, 6),
                day(2024, 1, 7),
                day(2024, 1, 20),
                day(2024, 1, 21),
                day(2024, 2, 3),
                day(2024, 2, 4)
            ]
        );

        let before: Vec<_> = expand(&event, at(2024, 1, 1, 0), at(2024, 3, 1, 0)).unwrap().collect();
        let shifted: Vec<_> = expand(&moved, at(2024, 1, 1, 0), at(2024, 3, 1, 0)).unwrap().collect();
        for (b, a) in before.iter().zip(&shifted) {
            assert_eq!(a.occurrence_date - b.occurrence_date, Duration::days(1));
        }
    }

    #[test]
    fn non_repeating_event_always_moves_whole() {
        let event = Event::new("Dentist", at(2024, 3, 5, 10), 45).with_id("dentist");
        let outcome = apply_move(&event, at(2024, 3, 5, 10), at(2024, 3, 7, 8), MoveScope::Occurrence)
            .unwrap();

        let MoveOutcome::Series(moved) = outcome else {
            panic!("expected the event itself to move");
        };
        assert_eq!(moved.date, at(2024, 3, 7, 8));
        assert_eq!(moved.end_date, at(2024, 3, 7, 8) + Duration::minutes(45));
    }

    #[test]
    fn all_day_move_keeps_end_of_day() {
        let event = Event::all_day("Trip", day(2024, 3, 5)).with_id("trip");
        let MoveOutcome::Series(moved) =
            apply_move(&event, event.date, at(2024, 3, 9, 0), MoveScope::Series).unwrap()
        else {
            panic!("expected a series move");
        };
        assert_eq!(moved.end_date, crate::event::end_of_day(day(2024, 3, 9)));
    }

    #[test]
    fn moving_a_date_that_is_not_an_occurrence_fails() {
        let event = daily(3);
        let err = apply_move(&event, at(2024, 1, 5, 9), at(2024, 1, 6, 9), MoveScope::Occurrence)
            .unwrap_err();
        assert!(matches!(err, CalGridError::OutOfRange { .. }));

        let err = apply_move(&event, at(2024, 1, 2, 10), at(2024, 1, 6, 9), MoveScope::Series)
            .unwrap_err();
        assert!(matches!(err, CalGridError::OutOfRange { .. }));
    }

    #[test]
    fn drop_keeps_time_of_day() {
        let events = vec![daily(10)];
        let command = Command::Drop {
            event_id: "daily".into(),
            occurrence_date: at(2024, 1, 2, 9),
            day: day(2024, 1, 15),
            scope: MoveScope::Occurrence,
        };

        let MoveOutcome::Override(ov) = command.apply(&events).unwrap() else {
            panic!("expected an override");
        };
        assert_eq!(ov.new_date, at(2024, 1, 15, 9));
        assert_eq!(ov.original_occurrence_date, at(2024, 1, 2, 9));
    }

    #[test]
    fn command_for_unknown_event_fails() {
        let command = Command::Move {
            event_id: "missing".into(),
            occurrence_date: at(2024, 1, 2, 9),
            new_date: at(2024, 1, 3, 9),
            scope: MoveScope::Series,
        };
        assert!(matches!(
            command.apply(&[daily(2)]),
            Err(CalGridError::EventNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let json = r#"{"type":"drop","eventId":"daily","occurrenceDate":"2024-01-02T09:00:00","day":"2024-01-09","scope":"series"}"#;
        let command: Command = serde_json::from_str(json).unwrap();
        assert_eq!(command.event_id(), "daily");
        assert!(matches!(command, Command::Drop { scope: MoveScope::Series, .. }));
    }
}
