//! Recurrence expansion.
//!
//! Expands an event's repeat rule into concrete occurrences within a date
//! range, and applies single-occurrence overrides on top.
//!
//! Anchors are generated from the series start by an index-based stride, so
//! the generator can seek straight to the start of a query range while still
//! knowing how many occurrences precede it (needed for `After(n)` series).

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CalGridError, CalGridResult};
use crate::event::{Event, Repeat, RepeatDays, RepeatEnd, end_of_day, rotate_weekday, weekday_index};
use crate::overrides::OverrideTable;

/// Generation never runs further than this past the end of a query range.
pub const SAFETY_HORIZON_YEARS: u32 = 10;

/// One concrete occurrence of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub source_event_id: String,
    pub occurrence_date: NaiveDateTime,
    pub occurrence_end_date: NaiveDateTime,
    /// Original anchor when this occurrence was moved by an override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_from: Option<NaiveDateTime>,
}

impl Occurrence {
    fn at(event: &Event, date: NaiveDateTime) -> Self {
        Occurrence {
            source_event_id: event.id.clone(),
            occurrence_date: date,
            occurrence_end_date: event.occurrence_end(date),
            moved_from: None,
        }
    }

    /// The anchor this occurrence belongs to in its series.
    pub fn original_date(&self) -> NaiveDateTime {
        self.moved_from.unwrap_or(self.occurrence_date)
    }

    pub fn is_moved(&self) -> bool {
        self.moved_from.is_some()
    }
}

/// Validated step between anchors.
#[derive(Debug, Clone, Copy)]
enum Stride {
    Once,
    Days(u32),
    Weeks {
        interval: u32,
        days: RepeatDays,
        week_start: Weekday,
    },
    Months(u32),
}

impl Stride {
    fn for_event(event: &Event) -> CalGridResult<Self> {
        let rule = &event.recurrence;

        if rule.repeat == Repeat::Never {
            return Ok(Stride::Once);
        }
        if rule.interval < 1 {
            return Err(CalGridError::InvalidRule(format!(
                "Repeat interval must be at least 1 (event '{}')",
                event.id
            )));
        }
        if rule.end == RepeatEnd::After(0) {
            return Err(CalGridError::InvalidRule(format!(
                "Repeat count must be at least 1 (event '{}')",
                event.id
            )));
        }

        let stride = match rule.repeat {
            Repeat::Never => Stride::Once,
            Repeat::Daily => Stride::Days(rule.interval),
            Repeat::Weekly => {
                // No days picked: repeat on the start's own weekday
                let days = if rule.days.is_empty() {
                    RepeatDays::from_weekdays(&[event.start_weekday()])
                } else {
                    rule.days
                };
                Stride::Weeks {
                    interval: rule.interval,
                    days,
                    week_start: rule.week_start,
                }
            }
            Repeat::Monthly => Stride::Months(rule.interval),
            Repeat::Yearly => Stride::Months(rule.interval.checked_mul(12).ok_or_else(|| {
                CalGridError::InvalidRule(format!(
                    "Repeat interval {} years is too large",
                    rule.interval
                ))
            })?),
        };

        Ok(stride)
    }
}

/// Lazy, ascending sequence of anchor dates of a series.
#[derive(Debug, Clone)]
pub struct Anchors {
    start: NaiveDateTime,
    stride: Stride,
    end: RepeatEnd,
    horizon: NaiveDateTime,
    /// Current period (day/week/month step number)
    period: u64,
    /// Day slot within the current week, 0 = the rule's week start
    slot: usize,
    /// Number of anchors generated since the start of the series
    index: u64,
    done: bool,
}

impl Anchors {
    /// Anchors of `event` up to and including `horizon`.
    pub fn new(event: &Event, horizon: NaiveDateTime) -> CalGridResult<Self> {
        let stride = Stride::for_event(event)?;
        let end = match stride {
            Stride::Once => RepeatEnd::Never,
            _ => event.recurrence.end,
        };

        Ok(Anchors {
            start: event.date,
            stride,
            end,
            horizon,
            period: 0,
            slot: 0,
            index: 0,
            done: false,
        })
    }

    /// How many anchors precede the next one, counted from the series start.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Skip ahead so that no anchor at or after `target` is missed, without
    /// walking the periods in between.
    pub fn seek(&mut self, target: NaiveDateTime) {
        if target <= self.start || self.period > 0 || self.slot > 0 {
            return;
        }

        match self.stride {
            Stride::Once => {}
            Stride::Days(n) => {
                let elapsed_days = (target.date() - self.start.date()).num_days().max(0) as u64;
                // Anchor k falls on day k * n; the one before `target`'s day is safe to start at
                let k = elapsed_days.saturating_sub(1) / u64::from(n);
                self.period = k;
                self.index = k;
            }
            Stride::Months(n) => {
                let k = months_between(self.start.date(), target.date()) / u64::from(n);
                self.period = k;
                self.index = k;
            }
            Stride::Weeks {
                interval,
                days,
                week_start: first_day,
            } => {
                let week0 = week_start(self.start.date(), first_day);
                let weeks = ((target.date() - week0).num_days().max(0) / 7) as u64;
                let k = weeks / u64::from(interval);
                if k == 0 {
                    return;
                }
                let first_week = days
                    .iter()
                    .filter(|wd| week0 + Days::new(day_offset(*wd, first_day)) >= self.start.date())
                    .count() as u64;
                self.period = k;
                self.index = first_week + (k - 1) * days.len() as u64;
            }
        }
    }

    fn next_candidate(&mut self) -> Option<NaiveDateTime> {
        match self.stride {
            Stride::Once => (self.period == 0).then_some(self.start),
            Stride::Days(n) => {
                let days = self.period.checked_mul(u64::from(n))?;
                self.start.checked_add_days(Days::new(days))
            }
            Stride::Months(n) => {
                let months = u32::try_from(self.period.checked_mul(u64::from(n))?).ok()?;
                // chrono clamps to the last day of a shorter month
                self.start.checked_add_months(Months::new(months))
            }
            Stride::Weeks {
                interval,
                days,
                week_start: first_day,
            } => {
                let week0 = week_start(self.start.date(), first_day);
                loop {
                    if self.slot >= 7 {
                        self.period += 1;
                        self.slot = 0;
                    }
                    let weekday = rotate_weekday(first_day, self.slot as i64);
                    let offset = self.slot as u64;
                    self.slot += 1;

                    if !days.contains(weekday) {
                        continue;
                    }
                    let week_offset = self.period.checked_mul(u64::from(interval))?.checked_mul(7)?;
                    let date = week0.checked_add_days(Days::new(week_offset + offset))?;
                    if date < self.start.date() {
                        continue;
                    }
                    return Some(date.and_time(self.start.time()));
                }
            }
        }
    }
}

impl Iterator for Anchors {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(anchor) = self.next_candidate() else {
            self.done = true;
            return None;
        };

        let past_end = match self.end {
            RepeatEnd::Never => false,
            RepeatEnd::On(last_day) => anchor.date() > last_day,
            RepeatEnd::After(count) => self.index >= u64::from(count),
        };
        if past_end || anchor > self.horizon {
            self.done = true;
            return None;
        }

        self.index += 1;
        if !matches!(self.stride, Stride::Weeks { .. }) {
            self.period += 1;
        }
        Some(anchor)
    }
}

/// Occurrences of one event inside an inclusive range, in ascending order.
#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    event: &'a Event,
    anchors: Anchors,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
}

impl Iterator for Expansion<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let anchor = self.anchors.next()?;
            if anchor > self.range_end {
                return None;
            }
            if anchor >= self.range_start {
                return Some(Occurrence::at(self.event, anchor));
            }
        }
    }
}

/// The furthest instant generation may reach for a range ending at `range_end`.
pub fn safety_horizon(range_end: NaiveDateTime) -> NaiveDateTime {
    range_end
        .checked_add_months(Months::new(SAFETY_HORIZON_YEARS * 12))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Expand `event` into its occurrences starting within `[range_start, range_end]`.
///
/// The returned iterator is lazy and finite. Fails with `InvalidRule` when the
/// repeat interval or count is zero.
pub fn expand(
    event: &Event,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> CalGridResult<Expansion<'_>> {
    let mut anchors = Anchors::new(event, safety_horizon(range_end))?;
    anchors.seek(range_start);

    tracing::trace!(
        event_id = %event.id,
        repeat = %event.recurrence.repeat,
        %range_start,
        %range_end,
        skipped = anchors.index(),
        "Expanding event"
    );

    Ok(Expansion {
        event,
        anchors,
        range_start,
        range_end,
    })
}

/// Expand `event` and apply its overrides: moved anchors are suppressed and
/// re-inserted at their new date when that date is in range.
pub fn expand_with_overrides(
    event: &Event,
    overrides: &OverrideTable,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> CalGridResult<Vec<Occurrence>> {
    let mut occurrences: Vec<Occurrence> = expand(event, range_start, range_end)?
        .filter(|occ| overrides.get(&event.id, occ.occurrence_date).is_none())
        .collect();

    for ov in overrides.for_event(&event.id) {
        if !is_anchor(event, ov.original_occurrence_date)? {
            tracing::warn!(
                event_id = %event.id,
                original = %ov.original_occurrence_date,
                "Ignoring override for a date that is not an occurrence"
            );
            continue;
        }
        if ov.new_date >= range_start && ov.new_date <= range_end {
            occurrences.push(Occurrence {
                moved_from: Some(ov.original_occurrence_date),
                ..Occurrence::at(event, ov.new_date)
            });
        }
    }

    occurrences.sort_by(|a, b| a.occurrence_date.cmp(&b.occurrence_date));
    Ok(occurrences)
}

/// Whether `date` is one of the anchors the series generates.
pub fn is_anchor(event: &Event, date: NaiveDateTime) -> CalGridResult<bool> {
    let mut anchors = Anchors::new(event, date)?;
    anchors.seek(date);
    Ok(anchors.any(|anchor| anchor == date))
}

/// Total number of occurrences in the series, or `None` if it never ends.
pub fn series_len(event: &Event) -> CalGridResult<Option<u64>> {
    let anchors = Anchors::new(event, NaiveDateTime::MAX)?;
    match (event.recurrence.repeat, event.recurrence.end) {
        (Repeat::Never, _) => Ok(Some(1)),
        (_, RepeatEnd::Never) => Ok(None),
        (_, RepeatEnd::On(last_day)) => {
            let mut anchors = anchors;
            anchors.horizon = end_of_day(last_day);
            Ok(Some(anchors.count() as u64))
        }
        (_, RepeatEnd::After(_)) => Ok(Some(anchors.count() as u64)),
    }
}

/// First day of the week containing `date`, for weeks starting on `first_day`.
fn week_start(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    date - Days::new(day_offset(date.weekday(), first_day))
}

/// Days from `first_day` forward to `weekday`, 0..=6.
fn day_offset(weekday: Weekday, first_day: Weekday) -> u64 {
    u64::from((7 + weekday_index(weekday) - weekday_index(first_day)) % 7)
}

/// Whole calendar months from `from`'s month to `to`'s month.
fn months_between(from: NaiveDate, to: NaiveDate) -> u64 {
    let from_months = i64::from(from.year()) * 12 + i64::from(from.month0());
    let to_months = i64::from(to.year()) * 12 + i64::from(to.month0());
    (to_months - from_months).max(0) as u64
}
